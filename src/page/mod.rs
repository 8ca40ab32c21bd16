//! Page content transformation: extract a page's rich-content body, rehome
//! its embedded file references, and convert the result to Markdown.
//!
//! The anchor rewrite is an explicit two-phase pipeline — collect candidate
//! links, download, rewrite, serialize — rather than interleaved mutation
//! during a single traversal, so the rewrite step stays deterministic and
//! testable in isolation.

mod body;

pub use body::extract_embedded_body;

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use lol_html::{HtmlRewriter, Settings, element};
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::download::{self, DownloadStatus};
use crate::links::{CandidateLink, ResolvedLink, resolve_filename, sanitize_component};
use crate::links::filename::strip_download_prefix;
use crate::resolver::DIRECT_DOWNLOAD_MARKER;
use crate::session::Session;
use crate::urls::{absolutize_url, compile_static_selector};

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("a[href]"));

static MARKED_ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"a[download="true"]"#));

/// Renders a content page to Markdown, downloading embedded file references
/// into `download_dir` and rewriting their anchors to the local filenames.
///
/// Returns `None` when the page carries no renderable body. A link whose
/// download fails keeps its original remote href, so the output never
/// references a local path that does not exist.
#[instrument(level = "debug", skip_all)]
pub async fn render_page_markdown(
    session: &Session,
    page_html: &str,
    download_dir: &Path,
) -> Option<String> {
    let body_html = extract_embedded_body(page_html)?;

    // Phase 1: collect.
    let document = Html::parse_fragment(&body_html);
    let candidates = collect_candidate_links(&document, session.base_url());
    let total = candidates.len();
    let downloadable: Vec<ResolvedLink> = candidates
        .into_iter()
        .filter_map(CandidateLink::resolve)
        .collect();
    debug!(
        downloadable = downloadable.len(),
        total, "collected candidate links"
    );

    // Phase 2: download; a link is rehomed only once its file is on disk.
    let mut replacements: HashMap<String, String> = HashMap::new();
    for link in &downloadable {
        let target = download_dir.join(&link.filename);
        match download::download_file(session, &link.absolute_url, &target).await {
            Ok(DownloadStatus::Completed(_) | DownloadStatus::AlreadyPresent) => {
                replacements.insert(link.raw_href.clone(), link.filename.clone());
            }
            Err(error) => {
                warn!(
                    filename = %link.filename,
                    %error,
                    "embedded file download failed; keeping remote link"
                );
            }
        }
    }

    // Phases 3 and 4: rewrite, then serialize to Markdown.
    let rewritten = rewrite_anchor_hrefs(&body_html, &replacements);
    Some(html2md::parse_html(&rewritten))
}

/// Walks every anchor in parsed markup, producing one candidate per usable
/// href (empty, fragment-only, and `mailto:`/`javascript:` hrefs are not
/// usable).
pub(crate) fn collect_candidate_links(document: &Html, base_url: &Url) -> Vec<CandidateLink> {
    let mut links = Vec::new();
    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Some(absolute_url) = absolutize_url(href, base_url) else {
            continue;
        };
        let anchor_text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
        links.push(CandidateLink {
            raw_href: href.to_string(),
            absolute_url,
            anchor_text,
        });
    }
    links
}

/// Streams markup through `lol_html`, swapping each rehomed anchor's href
/// for its local filename. Unmatched hrefs pass through untouched; a
/// rewriter failure degrades to the original markup.
pub(crate) fn rewrite_anchor_hrefs(
    body_html: &str,
    replacements: &HashMap<String, String>,
) -> String {
    if replacements.is_empty() {
        return body_html.to_string();
    }

    let mut output = Vec::with_capacity(body_html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Some(local) = replacements.get(href.trim())
                {
                    el.set_attribute("href", local)?;
                }
                Ok(())
            })],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    let write_result = rewriter.write(body_html.as_bytes());
    let end_result = rewriter.end();
    if let Err(error) = write_result.and(end_result) {
        warn!(%error, "anchor rewrite failed; keeping original markup");
        return body_html.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| body_html.to_string())
}

/// Interprets an item landing page as a file reference, if it is one.
///
/// The anchor explicitly marked `download="true"` and carrying the
/// direct-download marker wins; its text (minus a `"download "` prefix)
/// names the file. Otherwise the first anchor the classifier accepts is
/// used. Returns `(filename, url)`.
#[must_use]
pub fn find_direct_file_link(page_html: &str, base_url: &Url) -> Option<(String, String)> {
    let document = Html::parse_document(page_html);

    for element in document.select(&MARKED_ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if !href.contains(DIRECT_DOWNLOAD_MARKER) {
            continue;
        }
        let Some(url) = absolutize_url(href, base_url) else {
            continue;
        };
        let text = element.text().collect::<Vec<_>>().join(" ");
        let name = sanitize_component(strip_download_prefix(text.trim()).trim());
        let name = if name.is_empty() {
            resolve_filename(&url, "")
        } else {
            name
        };
        return Some((name, url));
    }

    collect_candidate_links(&document, base_url)
        .into_iter()
        .filter_map(CandidateLink::resolve)
        .next()
        .map(|link| (link.filename, link.absolute_url))
}
