//! Cancellation Probe.

use std::path::PathBuf;

pub struct CancellationProbe {
    path: PathBuf,
}

impl CancellationProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("/podinfo/labels")
    }

    /// Any label line whose value is `"Cancelled"` triggers cancellation;
    /// the label *key* is never inspected, per the original
    /// `is_task_cancelled`. A missing file means no signal yet, not an
    /// error; any other read error is logged and also treated as "not
    /// cancelled" since this runs on every poll cycle and must never abort
    /// a hot loop on a transient glitch.
    pub fn is_cancelled(&self) -> bool {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return false,
            Err(err) => {
                tracing::warn!("failed to read cancellation label file: {err}");
                return false;
            }
        };
        contents.lines().any(line_signals_cancel)
    }
}

/// Split on the first `=` only; a value containing `=` would be truncated,
/// matching the original's conceptual single-split.
fn line_signals_cancel(line: &str) -> bool {
    match line.split_once('=') {
        Some((_, value)) => value.trim().trim_matches('"') == "Cancelled",
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_cancelled() {
        let probe = CancellationProbe::new("/nonexistent/path/for/tests");
        assert!(!probe.is_cancelled());
    }

    #[test]
    fn running_label_does_not_trigger_cancel() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"foo="Running""#).unwrap();
        let probe = CancellationProbe::new(file.path());
        assert!(!probe.is_cancelled());
    }

    #[test]
    fn any_label_valued_cancelled_triggers_cancel() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"foo="Running""#).unwrap();
        writeln!(file, r#"state="Cancelled""#).unwrap();
        let probe = CancellationProbe::new(file.path());
        assert!(probe.is_cancelled());
    }

    #[test]
    fn key_name_is_irrelevant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"anything-goes-here="Cancelled""#).unwrap();
        let probe = CancellationProbe::new(file.path());
        assert!(probe.is_cancelled());
    }
}
