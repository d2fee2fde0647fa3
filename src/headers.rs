//! Case-insensitive, transport-normalized header resolution.
//!
//! Header names arrive in different shapes depending on how the request was
//! transported: `X-Request-Id` from an HTTP client, `HTTP_X_REQUEST_ID` from a
//! CGI-style gateway that folded headers into environment variables. Both the
//! claims builder and the verifier resolve header names through [`fetch`] so
//! the two sides can never disagree about what a name refers to.

use {http::header::HeaderMap, lazy_static::lazy_static, regex::Regex};

lazy_static! {
    /// Environment-variable style transport prefix (`HTTP_` / `HTTP-`).
    static ref TRANSPORT_PREFIX: Regex = Regex::new("(?i)^http[-_]").unwrap();
}

/// Reduce a header name to its canonical lookup form: the transport prefix is
/// stripped, underscores become dashes, and the result is lower-cased.
///
/// `HTTP_X_REQUEST_ID`, `X_Request_Id`, and `x-request-id` all canonicalize to
/// `x-request-id`.
pub fn canonical_header_name(name: &str) -> String {
    TRANSPORT_PREFIX.replace(name, "").replace('_', "-").to_ascii_lowercase()
}

/// Resolve a header name against a request's headers.
///
/// The lookup is case-insensitive and tolerates the environment-variable
/// naming convention on either side. Returns `None` when no header matches or
/// the matching value is not valid UTF-8.
pub fn fetch(name: &str, headers: &HeaderMap) -> Option<String> {
    let wanted = canonical_header_name(name);

    for (key, value) in headers.iter() {
        if canonical_header_name(key.as_str()) == wanted {
            return value.to_str().ok().map(str::to_string);
        }
    }

    None
}
