//! Canonical claim construction.
//!
//! A [`Claims`] value binds a token to one specific request: the method, the
//! path (or path plus a query-string digest), a digest of the body, and the
//! values of a configured set of headers are all derived from the request at
//! signing time and embedded in the token payload. Generation is pure and
//! deterministic; identical inputs always produce identical claims.

use {
    crate::{
        constants::DEFAULT_HEADERS_TO_SIGN,
        crypto::sha256_hex,
        headers::{canonical_header_name, fetch},
    },
    http::{header::HeaderMap, method::Method},
    log::trace,
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    std::collections::HashSet,
};

/// The claim set embedded in a signed-request token.
///
/// Built once per signing operation and handed straight to the token encoder;
/// claims have no life beyond the token that carries them. Unknown fields in a
/// decoded token are ignored, and a missing request-binding field deserializes
/// to an empty value so that verification fails by comparison rather than by
/// parse error.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    /// Lower-cased HTTP method.
    #[serde(default)]
    method: String,

    /// Request path. Includes the raw query string verbatim unless
    /// `query_string_hash` is present, in which case the query string is
    /// hashed separately and excluded from the path.
    #[serde(default)]
    path: String,

    /// Lower-case hex SHA-256 of the raw body bytes.
    #[serde(default)]
    body_sha: String,

    /// JSON-encoded object mapping each signed header name, as originally
    /// cased, to its resolved value at signing time.
    #[serde(default)]
    headers: String,

    /// Lower-case hex SHA-256 of the raw query string. Present only when
    /// query-string-hash mode was enabled at signing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query_string_hash: Option<String>,

    /// Issuer, when one was supplied at signing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,

    /// Issued-at, passed through untouched for the token layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<u64>,

    /// Expiry, passed through untouched for the token layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
}

impl Claims {
    /// Generate the canonical claim set for a request.
    ///
    /// The signed-header set is the default set plus
    /// `additional_headers_to_sign`, deduplicated case-insensitively in that
    /// order. A signed header that does not resolve against `headers` is
    /// omitted from the claim rather than recorded with an empty value; the
    /// verifier applies the same rule by only checking names present in the
    /// decoded map.
    ///
    /// With `query_string_hash` enabled, `path` is split at the first `?`:
    /// the claim's path carries only the path component and the query
    /// component (empty if there is none) is hashed into a separate claim.
    pub fn generate(
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
        additional_headers_to_sign: &[String],
        issuer: Option<&str>,
        query_string_hash: bool,
    ) -> Self {
        let (path, query_hash) = if query_string_hash {
            let (path_component, query_component) = match path.split_once('?') {
                Some((p, q)) => (p, q),
                None => (path, ""),
            };
            (path_component.to_string(), Some(sha256_hex(query_component.as_bytes())))
        } else {
            (path.to_string(), None)
        };

        let claims = Claims {
            method: method.as_str().to_lowercase(),
            path,
            body_sha: sha256_hex(body),
            headers: signed_headers_json(headers, additional_headers_to_sign),
            query_string_hash: query_hash,
            iss: issuer.filter(|iss| !iss.is_empty()).map(str::to_string),
            iat: None,
            exp: None,
        };

        trace!("Generated claims: {:?}", claims);
        claims
    }

    /// Attach token lifecycle fields. The core never computes these; they are
    /// carried verbatim for the token layer to enforce.
    pub fn with_lifecycle(mut self, iat: Option<u64>, exp: Option<u64>) -> Self {
        self.iat = iat;
        self.exp = exp;
        self
    }

    /// Retrieve the signed (lower-cased) method.
    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Retrieve the signed path.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the signed body digest.
    #[inline(always)]
    pub fn body_sha(&self) -> &str {
        &self.body_sha
    }

    /// Retrieve the JSON-encoded signed header map.
    #[inline(always)]
    pub fn headers_json(&self) -> &str {
        &self.headers
    }

    /// Retrieve the signed query-string digest, if query-string-hash mode was
    /// enabled at signing time.
    #[inline(always)]
    pub fn query_string_hash(&self) -> Option<&str> {
        self.query_string_hash.as_deref()
    }

    /// Retrieve the issuer, if one was signed.
    #[inline(always)]
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Retrieve the issued-at passed through at signing time.
    #[inline(always)]
    pub fn issued_at(&self) -> Option<u64> {
        self.iat
    }

    /// Retrieve the expiry passed through at signing time.
    #[inline(always)]
    pub fn expiry(&self) -> Option<u64> {
        self.exp
    }
}

/// Serialize the resolved signed-header map to JSON.
///
/// Names keep their original casing as keys; duplicates (after
/// canonicalization) are dropped, first occurrence winning, so the result is
/// deterministic for a given input order.
fn signed_headers_json(headers: &HeaderMap, additional_headers_to_sign: &[String]) -> String {
    let mut seen = HashSet::new();
    let mut resolved = Map::new();

    let names = DEFAULT_HEADERS_TO_SIGN
        .iter()
        .map(|name| name.to_string())
        .chain(additional_headers_to_sign.iter().cloned());

    for name in names {
        if !seen.insert(canonical_header_name(&name)) {
            continue;
        }
        if let Some(value) = fetch(&name, headers) {
            resolved.insert(name, Value::String(value));
        }
    }

    Value::Object(resolved).to_string()
}
