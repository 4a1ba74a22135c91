//! IO modules - side effects (network)

pub mod download;

pub use download::{DownloadError, HttpMirror, MirrorClient, Timeouts};
