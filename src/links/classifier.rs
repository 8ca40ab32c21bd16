//! Ordered rule cascade deciding whether a link is downloadable.
//!
//! The cascade is an explicit list of named rules evaluated first-match-wins,
//! so rule order and precedence are independently testable. Extension and
//! platform-path signals are unambiguous and dominate; anchor-text keyword
//! heuristics come last.

use std::sync::LazyLock;

use regex::Regex;

use crate::urls::compile_static_regex;

/// File extensions that mark a URL as a downloadable artifact.
pub const DOWNLOADABLE_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".zip", ".rar", ".7z", ".tar",
    ".gz", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".mp3", ".mp4", ".avi", ".mov",
    ".wav", ".txt", ".csv", ".json", ".xml", ".html", ".css", ".js", ".py", ".java", ".cpp",
    ".c", ".h", ".sql", ".db", ".sqlite", ".rtf", ".odt", ".ods", ".odp",
];

/// URL patterns the platform uses for file references, with or without an
/// extension in the path.
static PLATFORM_FILE_PATTERNS: LazyLock<[Regex; 6]> = LazyLock::new(|| {
    [
        compile_static_regex(r"/courses/\d+/files/\d+"),
        compile_static_regex(r"/files/\d+"),
        compile_static_regex(r"/download\?download_frd=1"),
        compile_static_regex(r"/courses/\d+/file_contents/"),
        compile_static_regex(r"/users/\d+/files/\d+"),
        compile_static_regex(r"instructure\.com.*files"),
    ]
});

/// Anchor-text fragments suggesting the link serves a file.
const FILE_TEXT_KEYWORDS: &[&str] = &[
    "download",
    "attachment",
    "file",
    ".pdf",
    ".doc",
    ".ppt",
    ".xls",
    "handout",
    "worksheet",
    "assignment",
    "syllabus",
    "slides",
];

/// Anchor-text fragments suggesting ordinary course navigation.
const NAV_TEXT_KEYWORDS: &[&str] = &[
    "http://www.",
    "https://www.",
    "wiki",
    "page",
    "module",
    "discussion",
    "assignment submission",
    "grade",
    "course",
];

/// Outcome of classifying a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    /// The link refers to a downloadable artifact.
    Downloadable,
    /// The link refers to a navigable page.
    Navigational,
}

/// Precomputed signals a rule can consult.
struct LinkFacts {
    url_lower: String,
    text_lower: String,
    /// The URL path (query/fragment ignored) ends in a known extension.
    has_extension: bool,
    /// A known extension appears anywhere in the URL.
    mentions_extension: bool,
}

impl LinkFacts {
    fn new(url: &str, anchor_text: &str) -> Self {
        let url_lower = url.to_ascii_lowercase();
        let path_lower = url_lower
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        let has_extension = DOWNLOADABLE_EXTENSIONS
            .iter()
            .any(|ext| path_lower.ends_with(ext));
        let mentions_extension = DOWNLOADABLE_EXTENSIONS
            .iter()
            .any(|ext| url_lower.contains(ext));
        Self {
            url_lower,
            text_lower: anchor_text.to_ascii_lowercase(),
            has_extension,
            mentions_extension,
        }
    }
}

/// A named classification rule. Returning `None` passes to the next rule.
struct Rule {
    name: &'static str,
    eval: fn(&LinkFacts) -> Option<LinkClass>,
}

fn rule_extension(facts: &LinkFacts) -> Option<LinkClass> {
    facts.has_extension.then_some(LinkClass::Downloadable)
}

fn rule_platform_file_path(facts: &LinkFacts) -> Option<LinkClass> {
    PLATFORM_FILE_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(&facts.url_lower))
        .then_some(LinkClass::Downloadable)
}

fn rule_file_keyword(facts: &LinkFacts) -> Option<LinkClass> {
    FILE_TEXT_KEYWORDS
        .iter()
        .any(|keyword| facts.text_lower.contains(keyword))
        .then_some(LinkClass::Downloadable)
}

fn rule_navigation_keyword(facts: &LinkFacts) -> Option<LinkClass> {
    let looks_navigational = NAV_TEXT_KEYWORDS
        .iter()
        .any(|keyword| facts.text_lower.contains(keyword));
    (looks_navigational && !facts.mentions_extension).then_some(LinkClass::Navigational)
}

/// Cascade order matters: unambiguous URL signals before text heuristics.
const RULES: &[Rule] = &[
    Rule {
        name: "extension",
        eval: rule_extension,
    },
    Rule {
        name: "platform-file-path",
        eval: rule_platform_file_path,
    },
    Rule {
        name: "file-keyword",
        eval: rule_file_keyword,
    },
    Rule {
        name: "navigation-keyword",
        eval: rule_navigation_keyword,
    },
];

/// Classifies a link, reporting which rule decided.
#[must_use]
pub fn evaluate(url: &str, anchor_text: &str) -> (LinkClass, &'static str) {
    let facts = LinkFacts::new(url, anchor_text);
    for rule in RULES {
        if let Some(class) = (rule.eval)(&facts) {
            return (class, rule.name);
        }
    }
    (LinkClass::Navigational, "default")
}

/// Returns true if the link should be downloaded rather than navigated.
#[must_use]
pub fn classify(url: &str, anchor_text: &str) -> bool {
    matches!(evaluate(url, anchor_text).0, LinkClass::Downloadable)
}
