//! Signed request verification.
//!
//! Verification re-derives the canonical claims from the live request and
//! compares them against the claims carried by the token. All four request
//! bindings (method, path, body, signed headers) must hold; the cheap string
//! comparisons run before the body digest so the common mismatch cases fail
//! fast.

use {
    crate::{
        body::IntoRequestBytes,
        claims::Claims,
        constants::{AUTHORIZATION, BEARER_PREFIX, DEFAULT_ALGORITHM, MSG_MISSING_AUTHORIZATION_HEADER},
        crypto::{digest_eq, sha256_hex},
        error::{SignatureError, VerificationFailure},
        headers,
        key_store::SecretKey,
        token::decode_token,
    },
    bytes::Bytes,
    http::request::{Parts, Request},
    jsonwebtoken::Algorithm,
    log::{debug, trace},
    std::collections::HashMap,
};

/// Options that configure signed request verification.
#[derive(Clone, Copy, Debug)]
pub struct VerificationOptions {
    /// The algorithm tokens are expected to be signed with.
    pub algorithm: Algorithm,

    /// Expiry tolerance in seconds. `None` disables expiry checking; tokens
    /// carrying an `exp` claim are then accepted regardless of age.
    pub exp_leeway: Option<u64>,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM,
            exp_leeway: None,
        }
    }
}

/// Verify a signed HTTP request.
///
/// The body is buffered first; every check borrows the buffered bytes, and on
/// success the request parts and body are handed back so downstream consumers
/// can keep using them. Use [`verify_parts`] directly when the request must
/// survive a failed verification as well.
///
/// # Errors
/// * [`SignatureError::MissingAuthorizationHeader`]: no token on the request.
/// * [`SignatureError::TokenDecode`]: the token is malformed, carries an
///   invalid signature, or is expired beyond the configured leeway.
/// * [`SignatureError::VerificationFailed`]: the token decoded but its
///   claims do not match the live request.
pub async fn verify_request<B>(
    request: Request<B>,
    secret: &SecretKey,
    options: &VerificationOptions,
) -> Result<(Parts, Bytes, Claims), SignatureError>
where
    B: IntoRequestBytes,
{
    let (parts, body) = request.into_parts();
    let body = body.into_request_bytes().await.map_err(SignatureError::from)?;

    let claims = verify_parts(&parts, &body, secret, options)?;
    Ok((parts, body, claims))
}

/// Verify an already-buffered request, borrowing it untouched on every exit
/// path.
///
/// This is the whole verification pipeline minus body buffering: token
/// extraction, decoding, and the four claim comparisons.
pub fn verify_parts(
    parts: &Parts,
    body: &Bytes,
    secret: &SecretKey,
    options: &VerificationOptions,
) -> Result<Claims, SignatureError> {
    let token = headers::fetch(AUTHORIZATION, &parts.headers)
        .ok_or_else(|| SignatureError::MissingAuthorizationHeader(MSG_MISSING_AUTHORIZATION_HEADER.to_string()))?;
    let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(&token);

    let claims = decode_token(token, secret, options)?;
    trace!("Decoded claims: {:?}", claims);

    verify_claims(&claims, parts, body)?;
    Ok(claims)
}

/// Compare decoded claims against the live request.
///
/// All four checks are mandatory; the first mismatch wins. Digest comparisons
/// run in constant time.
pub(crate) fn verify_claims(claims: &Claims, parts: &Parts, body: &[u8]) -> Result<(), VerificationFailure> {
    verify_method(claims, parts)?;
    verify_path(claims, parts)?;
    verify_body(claims, body)?;
    verify_headers(claims, parts)
}

fn verify_method(claims: &Claims, parts: &Parts) -> Result<(), VerificationFailure> {
    if claims.method().eq_ignore_ascii_case(parts.method.as_str()) {
        return Ok(());
    }

    debug!("Method mismatch: signed {:?}, live {:?}", claims.method(), parts.method);
    Err(VerificationFailure::MethodMismatch(format!(
        "Request method '{}' does not match signed method '{}'",
        parts.method,
        claims.method()
    )))
}

fn verify_path(claims: &Claims, parts: &Parts) -> Result<(), VerificationFailure> {
    match claims.query_string_hash() {
        Some(signed_query_hash) => {
            // Signed with query-string-hash mode: the signed path excludes
            // the query string, which is bound through its own digest.
            let live_path = parts.uri.path();
            let live_query = parts.uri.query().unwrap_or("");

            if claims.path() != live_path {
                debug!("Path mismatch: signed {:?}, live {:?}", claims.path(), live_path);
                return Err(VerificationFailure::PathMismatch(format!(
                    "Request path '{}' does not match signed path '{}'",
                    live_path,
                    claims.path()
                )));
            }

            if !digest_eq(&sha256_hex(live_query.as_bytes()), signed_query_hash) {
                debug!("Query string digest mismatch for path {:?}", live_path);
                return Err(VerificationFailure::PathMismatch(
                    "Request query string does not match signed query string digest".to_string(),
                ));
            }

            Ok(())
        }
        None => {
            let live_fullpath = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| parts.uri.path());

            if claims.path() != live_fullpath {
                debug!("Path mismatch: signed {:?}, live {:?}", claims.path(), live_fullpath);
                return Err(VerificationFailure::PathMismatch(format!(
                    "Request path '{}' does not match signed path '{}'",
                    live_fullpath,
                    claims.path()
                )));
            }

            Ok(())
        }
    }
}

fn verify_body(claims: &Claims, body: &[u8]) -> Result<(), VerificationFailure> {
    if digest_eq(&sha256_hex(body), claims.body_sha()) {
        return Ok(());
    }

    debug!("Body digest mismatch: signed {:?}", claims.body_sha());
    Err(VerificationFailure::BodyMismatch(
        "Request body does not match signed body digest".to_string(),
    ))
}

fn verify_headers(claims: &Claims, parts: &Parts) -> Result<(), VerificationFailure> {
    // A headers claim that does not parse back to a string map binds nothing;
    // an empty signed set passes trivially.
    let signed: HashMap<String, String> = serde_json::from_str(claims.headers_json()).unwrap_or_default();

    for (name, signed_value) in &signed {
        match headers::fetch(name, &parts.headers) {
            Some(live_value) if live_value == *signed_value => {}
            Some(_) => {
                debug!("Signed header {:?} value differs on live request", name);
                return Err(VerificationFailure::HeaderMismatch(format!(
                    "Request header '{}' does not match its signed value",
                    name
                )));
            }
            None => {
                debug!("Signed header {:?} missing from live request", name);
                return Err(VerificationFailure::HeaderMismatch(format!(
                    "Request header '{}' is missing but was signed",
                    name
                )));
            }
        }
    }

    Ok(())
}
