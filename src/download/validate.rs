//! Best-effort content validation for downloaded files.
//!
//! An authenticated session that silently expired yields HTML login pages
//! saved under binary filenames; this check catches that. Only the first
//! 1024 bytes are inspected and only a closed set of formats gets a magic
//! signature check — false negatives are acceptable, flagging a real file as
//! invalid is not.

use std::io::Read;
use std::path::Path;

/// How much of the file header is inspected.
const HEADER_LEN: usize = 1024;

/// Verdict of a content validation check.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Whether the content is consistent with the claimed extension.
    pub valid: bool,
    /// Human-readable explanation of the verdict.
    pub message: String,
}

impl ValidationReport {
    fn passed() -> Self {
        Self {
            valid: true,
            message: "file appears valid".to_string(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Canonical magic signatures for the formats we can positively identify.
struct Signature {
    extensions: &'static [&'static str],
    magics: &'static [&'static [u8]],
    label: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        extensions: &[".pdf"],
        magics: &[b"%PDF-"],
        label: "PDF",
    },
    Signature {
        extensions: &[".zip"],
        magics: &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"],
        label: "ZIP archive",
    },
    Signature {
        extensions: &[".rar"],
        magics: &[b"Rar!\x1a\x07"],
        label: "RAR archive",
    },
    Signature {
        extensions: &[".7z"],
        magics: &[b"7z\xbc\xaf\x27\x1c"],
        label: "7z archive",
    },
    Signature {
        extensions: &[".jpg", ".jpeg"],
        magics: &[b"\xff\xd8\xff"],
        label: "JPEG image",
    },
    Signature {
        extensions: &[".png"],
        magics: &[b"\x89PNG\r\n\x1a\n"],
        label: "PNG image",
    },
];

/// Checks whether a downloaded file's header matches its claimed extension.
///
/// For extensions outside the signature table the sole check is "does this
/// look like HTML". An unreadable file is reported invalid with the reason.
#[must_use]
pub fn validate_file_content(path: &Path, extension: &str) -> ValidationReport {
    let header = match read_header(path) {
        Ok(header) => header,
        Err(error) => {
            return ValidationReport::failed(format!("could not read file for validation: {error}"));
        }
    };

    let extension = extension.to_ascii_lowercase();
    if let Some(signature) = SIGNATURES
        .iter()
        .find(|s| s.extensions.contains(&extension.as_str()))
    {
        if signature
            .magics
            .iter()
            .any(|magic| header.starts_with(magic))
        {
            return ValidationReport::passed();
        }
        if looks_like_html(&header) {
            return ValidationReport::failed(format!(
                "received HTML instead of {}",
                signature.label
            ));
        }
        return ValidationReport::failed(format!("not a valid {} header", signature.label));
    }

    if looks_like_html(&header) {
        return ValidationReport::failed("received HTML instead of the expected file type");
    }

    ValidationReport::passed()
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(HEADER_LEN);
    std::fs::File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn looks_like_html(header: &[u8]) -> bool {
    let lower = header.to_ascii_lowercase();
    contains_subslice(&lower, b"<html") || contains_subslice(&lower, b"<!doctype")
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
