//! Authentication and cookie management.
//!
//! This module provides cookie loading from JSON cookie exports, which can
//! be saved from browsers or browser extensions after logging in to the LMS.

mod cookies;

pub use cookies::{CookieError, CookieRecord, load_cookies_into_jar, parse_cookie_file};
