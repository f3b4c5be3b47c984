//! FTP transput variant.
//!
//! `suppaftp` is a synchronous client, so the whole connection lifetime
//! (connect, login, recursive directory walk, quit) runs inside one
//! `spawn_blocking` closure. That single closure *is* the scoped
//! acquisition: the connection is opened on entry and closed on every exit
//! path (including early returns via `?`), which is the natural Rust
//! reading of the original's "owner closes, recursive calls inherit"
//! lexical-scoping rule: there is only ever one owner because there is
//! only one blocking closure.

use crate::error::TransputError;
use regex::Regex;
use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;
use suppaftp::{FtpError, FtpStream};
use tesk_protocol::{subfolders_in, IoType};

#[derive(Debug, Clone, Default)]
pub struct FtpCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl FtpCredentials {
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("TESK_FTP_USERNAME").ok(),
            password: std::env::var("TESK_FTP_PASSWORD").ok(),
        }
    }
}

fn ftp_err(err: FtpError) -> TransputError {
    TransputError::Ftp(err.to_string())
}

fn to_addr(netloc: &str) -> String {
    if netloc.contains(':') {
        netloc.to_string()
    } else {
        format!("{netloc}:21")
    }
}

/// Login policy: authenticated login if both env vars are set, falling
/// back to anonymous on a permission error; anonymous otherwise.
fn login(stream: &mut FtpStream, creds: &FtpCredentials) -> Result<(), FtpError> {
    match (&creds.username, &creds.password) {
        (Some(user), Some(pass)) => match stream.login(user, pass) {
            Ok(()) => Ok(()),
            Err(_) => stream.login("anonymous", "anonymous"),
        },
        _ => stream.login("anonymous", "anonymous"),
    }
}

fn list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<dir>[\-ld])(?P<permission>([\-r][\-w][\-xs]){3})\s+(?P<filecode>\d+)\s+(?P<owner>\w+)\s+(?P<group>\w+)\s+(?P<size>\d+)\s+(?P<timestamp>((\w{3})\s+(\d{2})\s+(\d{1,2}):(\d{2}))|((\w{3})\s+(\d{1,2})\s+(\d{4})))\s+(?P<name>.+)$",
        )
        .expect("LIST regex is a compile-time constant")
    })
}

/// Walk up to `path`, `cwd`-ing into each prefix and `mkdir`-ing the ones
/// that don't exist, restoring the original working directory before
/// returning either way.
fn ftp_make_dirs(stream: &mut FtpStream, path: &str) -> Result<(), TransputError> {
    let original = stream.pwd().map_err(ftp_err)?;
    if stream.cwd(path).is_ok() {
        stream.cwd(&original).map_err(ftp_err)?;
        return Ok(());
    }

    for subfolder in subfolders_in(path) {
        if stream.cwd(&subfolder).is_err() {
            stream
                .mkdir(&subfolder)
                .map_err(|e| ftp_err_ctx(e, &format!("creating remote directory \"{subfolder}\"")))?;
        }
    }

    stream.cwd(&original).map_err(ftp_err)?;
    Ok(())
}

fn ftp_err_ctx(err: FtpError, ctx: &str) -> TransputError {
    TransputError::Ftp(format!("{ctx}: {err}"))
}

/// True if `path` already exists and is a directory. Upload must reject
/// this: the engine is not `scp`, it won't invent a filename.
fn ftp_check_directory(stream: &mut FtpStream, path: &str) -> Result<bool, TransputError> {
    let original = stream.pwd().map_err(ftp_err)?;
    let is_directory = stream.cwd(path).is_ok();
    if is_directory {
        tracing::error!(
            "path \"{path}\" already exists and is a directory; specify a target filename and retry"
        );
    }
    stream.cwd(&original).map_err(ftp_err)?;
    Ok(is_directory)
}

fn download_file_sync(stream: &mut FtpStream, local_path: &str, remote_path: &str) -> Result<(), TransputError> {
    if let Some(parent) = Path::new(local_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let cursor: Cursor<Vec<u8>> = stream.retr_as_buffer(remote_path).map_err(ftp_err)?;
    std::fs::write(local_path, cursor.into_inner())?;
    Ok(())
}

fn upload_file_sync(stream: &mut FtpStream, local_path: &str, remote_path: &str) -> Result<(), TransputError> {
    let remote_dir = Path::new(remote_path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    ftp_make_dirs(stream, &remote_dir)?;

    if ftp_check_directory(stream, remote_path)? {
        return Err(TransputError::Protocol(format!(
            "remote path \"{remote_path}\" is already a directory"
        )));
    }

    let mut file = std::fs::File::open(local_path)?;
    stream
        .put_file(remote_path, &mut file)
        .map_err(|e| ftp_err_ctx(e, &format!("uploading \"{local_path}\" to \"{remote_path}\"")))?;
    Ok(())
}

fn download_dir_sync(stream: &mut FtpStream, local_path: &str, remote_path: &str) -> Result<(), TransputError> {
    stream.cwd(remote_path).map_err(ftp_err)?;
    let lines = stream.list(None).map_err(ftp_err)?;

    for line in lines {
        let caps = list_regex().captures(&line).ok_or_else(|| {
            TransputError::Protocol(format!("unparseable FTP LIST line: \"{line}\""))
        })?;
        let dirbit = &caps["dir"];
        let name = &caps["name"];

        let child_local = format!("{local_path}/{name}");
        let child_remote = format!("{remote_path}/{name}");

        if dirbit == "d" {
            download_dir_sync(stream, &child_local, &child_remote)?;
        } else {
            download_file_sync(stream, &child_local, &child_remote)?;
        }
    }
    Ok(())
}

fn upload_dir_sync(stream: &mut FtpStream, local_path: &str, remote_path: &str) -> Result<(), TransputError> {
    for entry in std::fs::read_dir(local_path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_local = format!("{local_path}/{name}");
        let child_remote = format!("{remote_path}/{name}");
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            upload_dir_sync(stream, &child_local, &child_remote)?;
        } else if file_type.is_file() {
            upload_file_sync(stream, &child_local, &child_remote)?;
        } else {
            return Err(TransputError::Protocol(format!(
                "directory listing \"{child_local}\" is neither file nor directory"
            )));
        }
    }
    Ok(())
}

pub async fn download(
    creds: FtpCredentials,
    local_path: String,
    netloc: String,
    remote_path: String,
    ty: IoType,
) -> Result<(), TransputError> {
    tokio::task::spawn_blocking(move || {
        let mut stream = FtpStream::connect(to_addr(&netloc)).map_err(ftp_err)?;
        login(&mut stream, &creds).map_err(ftp_err)?;
        let result = match ty {
            IoType::File => download_file_sync(&mut stream, &local_path, &remote_path),
            IoType::Directory => download_dir_sync(&mut stream, &local_path, &remote_path),
        };
        let _ = stream.quit();
        result
    })
    .await
    .map_err(|e| TransputError::Ftp(format!("blocking task join error: {e}")))?
}

pub async fn upload(
    creds: FtpCredentials,
    local_path: String,
    netloc: String,
    remote_path: String,
    ty: IoType,
) -> Result<(), TransputError> {
    tokio::task::spawn_blocking(move || {
        let mut stream = FtpStream::connect(to_addr(&netloc)).map_err(ftp_err)?;
        login(&mut stream, &creds).map_err(ftp_err)?;
        let result = match ty {
            IoType::File => upload_file_sync(&mut stream, &local_path, &remote_path),
            IoType::Directory => upload_dir_sync(&mut stream, &local_path, &remote_path),
        };
        let _ = stream.quit();
        result
    })
    .await
    .map_err(|e| TransputError::Ftp(format!("blocking task join error: {e}")))?
}
