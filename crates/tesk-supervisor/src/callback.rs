//! Callback Emitter.

use serde_json::json;

pub struct CallbackEmitter {
    url: Option<String>,
    task_id: String,
    client: reqwest::Client,
}

impl CallbackEmitter {
    pub fn new(url: Option<String>, task_id: impl Into<String>) -> Self {
        Self {
            url,
            task_id: task_id.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST `{"id": task_id, "state": state}`. No-op if no callback URL is
    /// configured. Retries up to 3 additional times on a transport timeout
    /// (4 attempts total, no backoff, matching the original's
    /// `retries > 3` break condition); gives up immediately, logging, on a
    /// redirect loop or any other transport error.
    pub async fn emit(&self, state: &str) -> Option<reqwest::Response> {
        let url = self.url.as_ref()?;
        let body = json!({ "id": self.task_id, "state": state });

        let mut attempts = 0;
        loop {
            match self.client.post(url).json(&body).send().await {
                Ok(resp) => return Some(resp),
                Err(err) if err.is_timeout() => {
                    attempts += 1;
                    if attempts > 3 {
                        tracing::error!("callback timeout");
                        return None;
                    }
                }
                Err(err) if err.is_redirect() => {
                    tracing::error!("bad callback url: {err}");
                    return None;
                }
                Err(err) => {
                    tracing::error!("{err}");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_op_without_configured_url() {
        let emitter = CallbackEmitter::new(None, "task-1");
        assert!(emitter.emit("Complete").await.is_none());
    }
}
