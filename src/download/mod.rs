//! HTTP download engine for streaming files to disk.
//!
//! Downloads are idempotent by file existence: a save path that already
//! exists short-circuits without any network traffic, so an interrupted run
//! can simply be re-invoked. Bodies are streamed chunk-by-chunk to keep
//! memory bounded regardless of file size, and every completed download is
//! checked against its claimed type before being reported.

mod client;
mod error;
mod validate;

pub use client::{DownloadOutcome, DownloadStatus, download_file};
pub use error::DownloadError;
pub use validate::{ValidationReport, validate_file_content};
