//! Streamed file download with idempotence, progress, and validation.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use super::validate::validate_file_content;
use crate::resolver;
use crate::session::Session;

/// What a completed download produced.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Where the file was written.
    pub local_path: PathBuf,
    /// Total bytes written.
    pub byte_count: u64,
    /// Whether content validation passed.
    pub validated: bool,
    /// Validation verdict message.
    pub validation_message: String,
}

/// Result of a download request, distinguishing the idempotent no-op.
#[derive(Debug)]
pub enum DownloadStatus {
    /// The save path already exists; no network traffic was performed.
    AlreadyPresent,
    /// A fresh download completed (validation verdict inside).
    Completed(DownloadOutcome),
}

/// Downloads a URL to `save_path`, resolving landing-page indirection first.
///
/// Parent directories are created as needed. An existing file short-circuits
/// as [`DownloadStatus::AlreadyPresent`] — re-running never re-fetches. The
/// body is streamed to disk, then checked against the save path's claimed
/// extension; an invalid verdict is logged and recorded in the outcome but
/// the file is kept for the operator to inspect.
///
/// # Errors
///
/// Returns [`DownloadError`] on transport or filesystem failure. Callers
/// treat this as "item skipped" — it never aborts the surrounding run. A
/// partial file left by a mid-stream failure is removed so the next run
/// retries it.
#[instrument(level = "debug", skip(session), fields(path = %save_path.display()))]
pub async fn download_file(
    session: &Session,
    url: &str,
    save_path: &Path,
) -> Result<DownloadStatus, DownloadError> {
    if let Some(parent) = save_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    if tokio::fs::try_exists(save_path).await.unwrap_or(false) {
        debug!("already downloaded");
        return Ok(DownloadStatus::AlreadyPresent);
    }

    let resolved = resolver::resolve_file_url(session, url).await;
    if resolved != url {
        debug!(resolved = %resolved, "resolved download URL");
    }

    let response = session
        .client()
        .get(&resolved)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(&resolved)
            } else {
                DownloadError::network(&resolved, e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::http_status(&resolved, status.as_u16()));
    }

    let progress = byte_progress_bar(save_path, response.content_length());
    let stream_result = stream_to_file(response, &resolved, save_path, &progress).await;
    progress.finish_and_clear();

    let byte_count = match stream_result {
        Ok(bytes) => bytes,
        Err(error) => {
            // Don't leave a partial file that the idempotence check would
            // mistake for a completed download on the next run.
            let _ = tokio::fs::remove_file(save_path).await;
            return Err(error);
        }
    };

    let extension = save_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let report = validate_file_content(save_path, &extension);

    if report.valid {
        info!(bytes = byte_count, "download complete");
    } else {
        warn!(
            bytes = byte_count,
            verdict = %report.message,
            "downloaded file failed content validation; keeping it for inspection"
        );
    }

    Ok(DownloadStatus::Completed(DownloadOutcome {
        local_path: save_path.to_path_buf(),
        byte_count,
        validated: report.valid,
        validation_message: report.message,
    }))
}

/// Streams the response body to disk, returning bytes written.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    save_path: &Path,
    progress: &ProgressBar,
) -> Result<u64, DownloadError> {
    let file = File::create(save_path)
        .await
        .map_err(|e| DownloadError::io(save_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(save_path, e))?;
        bytes_written += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(save_path, e))?;

    Ok(bytes_written)
}

/// Per-file byte progress: a sized bar when Content-Length is known,
/// a spinner otherwise.
fn byte_progress_bar(save_path: &Path, content_length: Option<u64>) -> ProgressBar {
    let name = save_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bar = match content_length {
        Some(total) => ProgressBar::new(total).with_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        ),
        None => ProgressBar::new_spinner(),
    };
    bar.set_message(name);
    bar
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reqwest::cookie::Jar;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_session(base: &str) -> Session {
        Session::new(Url::parse(base).unwrap(), Arc::new(Jar::default())).unwrap()
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/notes.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 content".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let save_path = dir.path().join("notes.pdf");

        let status = download_file(
            &session,
            &format!("{}/files/notes.pdf", server.uri()),
            &save_path,
        )
        .await
        .unwrap();

        match status {
            DownloadStatus::Completed(outcome) => {
                assert_eq!(outcome.byte_count, 16);
                assert!(outcome.validated, "got: {}", outcome.validation_message);
                assert_eq!(outcome.local_path, save_path);
            }
            DownloadStatus::AlreadyPresent => panic!("expected a fresh download"),
        }
        assert_eq!(std::fs::read(&save_path).unwrap(), b"%PDF-1.4 content");
    }

    #[tokio::test]
    async fn test_download_is_idempotent_by_file_existence() {
        let server = MockServer::start().await;
        // The resolver probe and the download itself are each one GET;
        // a second invocation must add zero requests.
        Mock::given(method("GET"))
            .and(path("/files/notes.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 v1".to_vec()))
            .expect(2)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let url = format!("{}/files/notes.pdf", server.uri());
        let save_path = dir.path().join("notes.pdf");

        let first = download_file(&session, &url, &save_path).await.unwrap();
        assert!(matches!(first, DownloadStatus::Completed(_)));
        let bytes_after_first = std::fs::read(&save_path).unwrap();

        let second = download_file(&session, &url, &save_path).await.unwrap();
        assert!(matches!(second, DownloadStatus::AlreadyPresent));
        assert_eq!(
            std::fs::read(&save_path).unwrap(),
            bytes_after_first,
            "second invocation must leave the file byte-identical"
        );
    }

    #[tokio::test]
    async fn test_download_creates_parent_directories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"text".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let save_path = dir.path().join("Course").join("Module 1").join("a.txt");

        let status = download_file(
            &session,
            &format!("{}/files/a.txt", server.uri()),
            &save_path,
        )
        .await
        .unwrap();

        assert!(matches!(status, DownloadStatus::Completed(_)));
        assert!(save_path.exists());
    }

    #[tokio::test]
    async fn test_download_follows_landing_page_indirection() {
        let server = MockServer::start().await;
        let landing = format!(
            r#"<html><a download="true" href="{}/files/9/download?download_frd=1">Download</a></html>"#,
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/courses/1/files/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/9/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 real".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let save_path = dir.path().join("real.pdf");

        let status = download_file(
            &session,
            &format!("{}/courses/1/files/9", server.uri()),
            &save_path,
        )
        .await
        .unwrap();

        assert!(matches!(status, DownloadStatus::Completed(_)));
        assert_eq!(std::fs::read(&save_path).unwrap(), b"%PDF-1.4 real");
    }

    #[tokio::test]
    async fn test_download_reports_invalid_content_but_keeps_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/fake.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"<html>Please log in</html>".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let save_path = dir.path().join("fake.pdf");

        let status = download_file(
            &session,
            &format!("{}/files/fake.pdf", server.uri()),
            &save_path,
        )
        .await
        .unwrap();

        match status {
            DownloadStatus::Completed(outcome) => {
                assert!(!outcome.validated);
                assert!(outcome.validation_message.contains("HTML"));
            }
            DownloadStatus::AlreadyPresent => panic!("expected a fresh download"),
        }
        assert!(save_path.exists(), "flagged files are retained");
    }

    #[tokio::test]
    async fn test_download_http_error_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/gone.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = test_session(&server.uri());
        let save_path = dir.path().join("gone.pdf");

        let result = download_file(
            &session,
            &format!("{}/files/gone.pdf", server.uri()),
            &save_path,
        )
        .await;

        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
        assert!(!save_path.exists());
    }
}
