//! Protocol-polymorphic file/directory transfer engine. Built as a
//! dispatcher over three concrete protocol implementations instead of the
//! original's class hierarchy. `Engine::process` is the single uniform
//! upload/download entry point every caller uses.

mod content;
mod dispatch;
mod error;
mod ftp;
mod http;
mod s3;

pub use content::write_content;
pub use dispatch::Engine;
pub use error::TransputError;
pub use ftp::FtpCredentials;
pub use s3::S3Credentials;
