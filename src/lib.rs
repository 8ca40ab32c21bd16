//! Coursedump Core Library
//!
//! This library provides the core functionality for the coursedump tool,
//! which archives the content of a Canvas-style learning-management site:
//! course file attachments are downloaded and verified, and content pages
//! are converted to Markdown with embedded file references rewritten to
//! point at the local copies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Cookie file loading for the authenticated session
//! - [`catalog`] - Course/module/item enumeration from dashboard HTML
//! - [`links`] - Link classification and filename resolution
//! - [`resolver`] - Landing-page indirection to direct-download endpoints
//! - [`download`] - Streamed, idempotent, validated file downloads
//! - [`page`] - Page body extraction, link rehoming, Markdown conversion
//! - [`archive`] - The sequential course walk tying everything together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod auth;
pub mod catalog;
pub mod download;
pub mod links;
pub mod page;
pub mod resolver;
pub mod session;
mod urls;

// Re-export commonly used types
pub use archive::{ArchiveStats, Archiver};
pub use auth::{CookieError, CookieRecord, load_cookies_into_jar, parse_cookie_file};
pub use catalog::{Course, Module, ModuleItem};
pub use download::{
    DownloadError, DownloadOutcome, DownloadStatus, ValidationReport, download_file,
    validate_file_content,
};
pub use links::{CandidateLink, ResolvedLink, classify, resolve_filename, sanitize_component};
pub use page::{extract_embedded_body, find_direct_file_link, render_page_markdown};
pub use resolver::resolve_file_url;
pub use session::{FetchError, FetchedPage, Session};
