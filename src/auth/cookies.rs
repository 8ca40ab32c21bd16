//! JSON cookie file parser and reqwest jar loader.
//!
//! Accepts the two shapes browsers commonly export: a flat
//! `{"name": "value"}` object, or an array of cookie records with optional
//! `domain`/`path`/`secure`/`expirationDate` fields (the Cookie-Editor style
//! export). Parsed cookies are loaded into a `reqwest::cookie::Jar` for use
//! with the HTTP client.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

/// A single cookie parsed from a JSON cookie export.
///
/// The value field is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive cookie data.
#[derive(Clone)]
pub struct CookieRecord {
    /// Cookie name.
    pub name: String,
    /// The domain the cookie belongs to, when the export carries one.
    pub domain: Option<String>,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (None = session cookie).
    pub expires: Option<u64>,
    /// Cookie value (sensitive — never log).
    value: String,
}

impl CookieRecord {
    /// Creates a bare name/value cookie as produced by the flat-object format.
    #[must_use]
    pub fn new(name: String, value: String) -> Self {
        Self {
            name,
            domain: None,
            path: "/".to_string(),
            secure: false,
            expires: None,
            value,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive — avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while parsing a cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The file is not valid JSON in either accepted shape.
    #[error("cookie file is not a JSON object or cookie array: {0}")]
    Parse(#[from] serde_json::Error),

    /// No usable cookies found in a non-empty file.
    #[error("no usable cookies found in file ({skipped_count} entries skipped)")]
    NoCookiesFound {
        /// Number of entries skipped for missing names.
        skipped_count: usize,
    },
}

/// One record of the array-shaped export format.
///
/// Unknown fields (hostOnly, sameSite, session, ...) are ignored.
#[derive(Debug, Deserialize)]
struct RawCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    secure: bool,
    #[serde(default, rename = "expirationDate")]
    expiration_date: Option<f64>,
}

/// The two accepted cookie file shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieFile {
    Records(Vec<RawCookie>),
    Map(BTreeMap<String, String>),
}

/// Parses a JSON cookie export from a reader.
///
/// # Errors
///
/// Returns [`CookieError::Parse`] when the JSON matches neither shape, or
/// [`CookieError::NoCookiesFound`] when a non-empty file yields zero usable
/// cookies. Entries with an empty name are skipped with a warning (partial
/// success).
#[instrument(level = "debug", skip(reader))]
pub fn parse_cookie_file(reader: impl Read) -> Result<Vec<CookieRecord>, CookieError> {
    let parsed: CookieFile = serde_json::from_reader(reader)?;

    let mut skipped = 0;
    let cookies: Vec<CookieRecord> = match parsed {
        CookieFile::Map(map) => map
            .into_iter()
            .filter(|(name, _)| {
                if name.is_empty() {
                    skipped += 1;
                    warn!("skipping cookie entry with empty name");
                }
                !name.is_empty()
            })
            .map(|(name, value)| CookieRecord::new(name, value))
            .collect(),
        CookieFile::Records(records) => records
            .into_iter()
            .filter_map(|raw| {
                if raw.name.is_empty() {
                    skipped += 1;
                    warn!("skipping cookie entry with empty name");
                    return None;
                }
                debug!(name = %raw.name, domain = ?raw.domain, "parsed cookie");
                Some(CookieRecord {
                    name: raw.name,
                    domain: raw.domain,
                    path: raw.path.unwrap_or_else(|| "/".to_string()),
                    secure: raw.secure,
                    // Exports carry fractional-second timestamps; whole
                    // seconds are enough for an Expires attribute.
                    expires: raw
                        .expiration_date
                        .filter(|ts| ts.is_finite() && *ts > 0.0)
                        .map(|ts| ts as u64),
                    value: raw.value,
                })
            })
            .collect(),
    };

    if cookies.is_empty() {
        return Err(CookieError::NoCookiesFound {
            skipped_count: skipped,
        });
    }

    Ok(cookies)
}

/// Loads parsed cookies into a `reqwest::cookie::Jar`.
///
/// Each record is converted to a `Set-Cookie` header string and added
/// against its own domain, falling back to the LMS base URL for records
/// without one (the flat-object export format).
///
/// # Returns
///
/// An `Arc<Jar>` suitable for passing to `reqwest::ClientBuilder::cookie_provider()`.
#[instrument(level = "debug", skip(cookies))]
pub fn load_cookies_into_jar(cookies: &[CookieRecord], base_url: &Url) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());

    for cookie in cookies {
        let set_cookie = build_set_cookie_string(cookie);
        let origin_url = build_origin_url(cookie, base_url);

        if let Ok(url) = origin_url.parse::<Url>() {
            jar.add_cookie_str(&set_cookie, &url);
            debug!(
                name = %cookie.name,
                origin = %url,
                "loaded cookie into jar"
            );
        } else {
            warn!(
                domain = ?cookie.domain,
                name = %cookie.name,
                "skipping cookie with unparseable domain"
            );
        }
    }

    jar
}

/// Builds a `Set-Cookie` header string from a `CookieRecord`.
fn build_set_cookie_string(cookie: &CookieRecord) -> String {
    let mut parts = vec![format!("{}={}", cookie.name, cookie.value())];

    if let Some(domain) = &cookie.domain {
        parts.push(format!("Domain={domain}"));
    }

    parts.push(format!("Path={}", cookie.path));

    if cookie.secure {
        parts.push("Secure".to_string());
    }

    if let Some(expires) = cookie.expires {
        if let Some(expires_str) = unix_to_http_date(expires) {
            parts.push(format!("Expires={expires_str}"));
        } else {
            warn!(
                name = %cookie.name,
                expires,
                "cookie expiry timestamp overflows SystemTime; treating as session cookie"
            );
        }
    }

    parts.join("; ")
}

/// Builds the origin URL for `Jar::add_cookie_str`.
///
/// Uses the record's own domain when present (https for secure cookies),
/// otherwise the LMS base URL.
fn build_origin_url(cookie: &CookieRecord, base_url: &Url) -> String {
    match &cookie.domain {
        Some(domain) => {
            let scheme = if cookie.secure { "https" } else { "http" };
            let host = domain.strip_prefix('.').unwrap_or(domain);
            format!("{scheme}://{host}{}", cookie.path)
        }
        None => base_url.to_string(),
    }
}

/// Converts a Unix timestamp to an HTTP-date string (RFC 7231).
fn unix_to_http_date(timestamp: u64) -> Option<String> {
    use std::time::{Duration, UNIX_EPOCH};

    let time = UNIX_EPOCH.checked_add(Duration::from_secs(timestamp))?;
    Some(httpdate::fmt_http_date(time))
}
