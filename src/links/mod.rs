//! Link classification and filename resolution.
//!
//! Anchors found in scraped markup are turned into [`CandidateLink`] values,
//! classified as downloadable or navigational by the ordered rule cascade in
//! [`classifier`], and refined into [`ResolvedLink`] values carrying a safe
//! local filename.

pub mod classifier;
pub mod filename;

pub use classifier::{LinkClass, classify, evaluate};
pub use filename::{FALLBACK_FILENAME, resolve_filename, sanitize_component};

/// A hyperlink occurrence found while walking markup.
///
/// Ephemeral: one per anchor element, not persisted.
#[derive(Debug, Clone)]
pub struct CandidateLink {
    /// The href exactly as it appears in the markup.
    pub raw_href: String,
    /// The href absolutized against the page base URL.
    pub absolute_url: String,
    /// The anchor's text content, trimmed.
    pub anchor_text: String,
}

/// A candidate link that passed classification, with its local filename.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    /// The href exactly as it appears in the markup.
    pub raw_href: String,
    /// The absolutized URL to download from.
    pub absolute_url: String,
    /// The anchor's text content, trimmed.
    pub anchor_text: String,
    /// Safe local filename for the downloaded copy.
    pub filename: String,
}

impl CandidateLink {
    /// Classifies the link and, when downloadable, resolves its filename.
    ///
    /// Returns `None` for navigational links.
    #[must_use]
    pub fn resolve(self) -> Option<ResolvedLink> {
        if !classify(&self.absolute_url, &self.anchor_text) {
            return None;
        }
        let filename = resolve_filename(&self.absolute_url, &self.anchor_text);
        Some(ResolvedLink {
            raw_href: self.raw_href,
            absolute_url: self.absolute_url,
            anchor_text: self.anchor_text,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(href: &str, text: &str) -> CandidateLink {
        CandidateLink {
            raw_href: href.to_string(),
            absolute_url: href.to_string(),
            anchor_text: text.to_string(),
        }
    }

    #[test]
    fn test_resolve_downloadable_link_carries_filename() {
        let resolved = candidate("https://school.edu/files/notes.pdf", "Lecture notes")
            .resolve()
            .expect("extension link must classify downloadable");
        assert_eq!(resolved.filename, "notes.pdf");
        assert_eq!(resolved.raw_href, "https://school.edu/files/notes.pdf");
    }

    #[test]
    fn test_resolve_navigational_link_is_none() {
        assert!(
            candidate("https://school.edu/courses/1/discussion_topics", "Discussion board")
                .resolve()
                .is_none()
        );
    }
}
