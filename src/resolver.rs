//! Indirection resolver: follows an opaque file URL through redirect and
//! landing pages to the platform's direct-download endpoint.
//!
//! The platform rarely links raw bytes directly; a file reference usually
//! leads to an HTML landing page whose download button carries the real
//! endpoint. Resolution never fails — when anything goes wrong the original
//! URL is returned and the downloader takes its chances with it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::session::{FetchError, Session};
use crate::urls::{absolutize_url, canonical_host, compile_static_regex, hosts_match};

/// Query marker signaling "serve raw bytes, not a landing page".
pub const DIRECT_DOWNLOAD_MARKER: &str = "download_frd=1";

/// Matches an anchor tag explicitly marked as a download action.
static DOWNLOAD_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<a\b[^>]*\bdownload\s*=\s*["']true["'][^>]*>"#)
});

/// Extracts the href from within a matched anchor tag.
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)\bhref\s*=\s*["']([^"']+)["']"#));

/// Matches any href carrying the direct-download marker.
static MARKED_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)\bhref\s*=\s*["']([^"']*download_frd=1[^"']*)["']"#)
});

/// Resolves a file URL to the platform's direct-download endpoint.
///
/// Follows redirects; when the final URL already carries the
/// direct-download marker it is returned unchanged. When the request lands
/// on a platform content page instead, its body is scanned for a download
/// anchor. Transport errors are swallowed and the original URL returned —
/// this probe must never abort the pipeline.
#[instrument(level = "debug", skip(session))]
pub async fn resolve_file_url(session: &Session, url: &str) -> String {
    match try_resolve(session, url).await {
        Ok(resolved) => resolved,
        Err(error) => {
            warn!(url, %error, "could not resolve file URL; using it as-is");
            url.to_string()
        }
    }
}

async fn try_resolve(session: &Session, url: &str) -> Result<String, FetchError> {
    let page = session.get_html(url).await?;

    if page.final_url.as_str().contains(DIRECT_DOWNLOAD_MARKER) {
        return Ok(page.final_url.into());
    }

    if is_platform_file_page(&page.final_url, session.base_url())
        && let Some(href) = find_marked_download_href(&page.body)
        && let Some(absolute) = absolutize_url(&href, &page.final_url)
    {
        debug!(resolved = %absolute, "found download anchor on landing page");
        return Ok(absolute);
    }

    Ok(page.final_url.into())
}

/// True when the URL still looks like a platform content page worth scanning
/// for a download anchor.
fn is_platform_file_page(url: &Url, base_url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default();
    let on_platform = base_url
        .host_str()
        .is_some_and(|base_host| hosts_match(host, base_host))
        || canonical_host(host).ends_with("instructure.com");

    on_platform && (url.path().contains("/files/") || url.path().contains("/courses/"))
}

/// Scans landing-page markup for the download endpoint: an anchor marked
/// `download="true"` first, then any href carrying the direct-download marker.
pub(crate) fn find_marked_download_href(html: &str) -> Option<String> {
    if let Some(tag) = DOWNLOAD_ANCHOR_RE.find(html)
        && let Some(caps) = HREF_RE.captures(tag.as_str())
    {
        return Some(caps[1].trim().to_string());
    }

    MARKED_HREF_RE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
}
