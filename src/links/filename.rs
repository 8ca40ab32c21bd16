//! Filename derivation and filesystem-name sanitization.
//!
//! Filenames come from the URL path when it carries a usable segment, and
//! from the anchor text otherwise. The same sanitization rule is applied to
//! course/module/page titles used as directory components.

/// Sentinel name used when nothing usable can be derived.
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Longest extension (without the dot) worth copying from a URL path;
/// anything longer is assumed to be a spurious dotted segment.
const MAX_BORROWED_EXTENSION_LEN: usize = 4;

/// Derives a safe local filename from a URL and its anchor text. Never empty.
///
/// The query string is stripped and the final path segment (percent-decoded)
/// is the first candidate. An empty, purely numeric, or extensionless
/// candidate falls back to the anchor text, stripped of a leading
/// `"download "` prefix; an extensionless fallback borrows the URL's own
/// extension when it has a short one.
#[must_use]
pub fn resolve_filename(url: &str, anchor_text: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or_default();
    let candidate = urlencoding::decode(segment)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| segment.to_string());

    let unusable = candidate.is_empty()
        || candidate.chars().all(|c| c.is_ascii_digit())
        || !candidate.contains('.');

    let name = if unusable {
        let mut fallback = strip_download_prefix(anchor_text.trim()).trim().to_string();
        if !fallback.contains('.')
            && let Some(ext) = url_path_extension(path)
        {
            fallback.push('.');
            fallback.push_str(&ext);
        }
        fallback
    } else {
        candidate
    };

    let name = sanitize_component(&name);
    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

/// Strips a leading `"download "` prefix, case-insensitively.
pub(crate) fn strip_download_prefix(text: &str) -> &str {
    const PREFIX: &str = "download ";
    match text.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &text[PREFIX.len()..],
        _ => text,
    }
}

/// Extension (without the dot) after the last dot of the query-stripped URL,
/// when short enough. The length cap is what keeps dotted host or directory
/// segments from being mistaken for extensions.
fn url_path_extension(path: &str) -> Option<String> {
    let dot = path.rfind('.')?;
    let ext = &path[dot + 1..];
    (!ext.is_empty() && ext.len() <= MAX_BORROWED_EXTENSION_LEN).then(|| ext.to_string())
}

/// Strips characters illegal in filesystem names.
///
/// Removes `\ / * ? : " < > |` and control characters, then trims
/// surrounding whitespace. May return an empty string; callers substitute
/// their own fallback.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .filter(|&c| {
            !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|') && !c.is_control()
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url_path_segment() {
        assert_eq!(
            resolve_filename("https://school.edu/files/notes.pdf", "irrelevant"),
            "notes.pdf"
        );
    }

    #[test]
    fn test_filename_strips_query_string() {
        assert_eq!(
            resolve_filename("https://school.edu/files/notes.pdf?verifier=abc&x=1", ""),
            "notes.pdf"
        );
    }

    #[test]
    fn test_filename_percent_decoded() {
        assert_eq!(
            resolve_filename("https://school.edu/files/week%201.pdf", ""),
            "week 1.pdf"
        );
    }

    #[test]
    fn test_numeric_segment_falls_back_to_anchor_text() {
        // Numeric file id in the path, "Download " prefix on the text.
        assert_eq!(
            resolve_filename(
                "https://x/files/42/download?x=1",
                "Download Syllabus.pdf"
            ),
            "Syllabus.pdf"
        );
    }

    #[test]
    fn test_download_prefix_stripped_case_insensitively() {
        assert_eq!(strip_download_prefix("download notes.pdf"), "notes.pdf");
        assert_eq!(strip_download_prefix("Download notes.pdf"), "notes.pdf");
        assert_eq!(strip_download_prefix("downloads.pdf"), "downloads.pdf");
    }

    #[test]
    fn test_extensionless_fallback_borrows_short_url_extension() {
        // Trailing slash empties the final segment; the fallback text borrows
        // the short extension still visible in the path.
        assert_eq!(
            resolve_filename("https://school.edu/media/lecture.mp4/", "Week 2 recording"),
            "Week 2 recording.mp4"
        );
    }

    #[test]
    fn test_dotted_host_not_borrowed_as_extension() {
        // The only dot is in the host; "productions/files/42" is far too long
        // to pass for an extension.
        assert_eq!(
            resolve_filename("https://school.productions/files/42", "Trailer"),
            "Trailer"
        );
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(resolve_filename("", ""), FALLBACK_FILENAME);
        assert_eq!(resolve_filename("https://x/", "???"), FALLBACK_FILENAME);
        assert_eq!(resolve_filename("https://school.edu/42", "  "), FALLBACK_FILENAME);
    }

    #[test]
    fn test_sanitize_component_removes_illegal_chars() {
        assert_eq!(sanitize_component(r#"a\b/c*d?e:f"g<h>i|j"#), "abcdefghij");
        assert_eq!(sanitize_component("CS 101: Intro"), "CS 101 Intro");
        assert_eq!(sanitize_component("tab\there"), "tabhere");
    }

    #[test]
    fn test_sanitize_component_preserves_unicode() {
        assert_eq!(sanitize_component("Données épisode 1"), "Données épisode 1");
    }
}
