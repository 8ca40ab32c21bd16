//! Tolerant extraction of the rich-content body embedded in page markup.
//!
//! The platform ships a page's content not as rendered markup but as an
//! escaped JSON string literal inside a script payload. Locating a named
//! string field inside that loosely structured payload is inherently
//! fragile, so every surprise degrades to "no body found" instead of an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::urls::compile_static_regex;

/// Matches the `"body":"..."` string literal, honoring backslash escapes.
static BODY_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#""body":"((?:[^"\\]|\\.)*)""#));

/// Recovers the page's rich-content markup from raw page HTML.
///
/// Returns `None` when the body literal is absent or its escaping cannot be
/// decoded — the page simply has no renderable content.
#[must_use]
pub fn extract_embedded_body(page_html: &str) -> Option<String> {
    let literal = BODY_LITERAL_RE.captures(page_html)?.get(1)?.as_str();

    // The literal is a JSON string body; re-wrap and let serde handle every
    // escape form (\", \\, \n, \uXXXX, ...).
    let unescaped: String = match serde_json::from_str(&format!("\"{literal}\"")) {
        Ok(markup) => markup,
        Err(error) => {
            warn!(%error, "embedded page body had unexpected escaping; treating as no content");
            return None;
        }
    };

    Some(html_escape::decode_html_entities(&unescaped).into_owned())
}
