//! Common constants used throughout the crate.
//!
//! Consolidated here so the crate stays on the same page about these values.
//! Tests that check the content of an error code or message should use
//! hard-coded strings so the tests also catch misspellings.
//!
//! Please keep this file organized alphabetically.

use jsonwebtoken::Algorithm;

/// Header that carries the token on the verification side.
pub(crate) const AUTHORIZATION: &str = "Authorization";

/// Optional scheme prefix stripped from the Authorization header value.
pub(crate) const BEARER_PREFIX: &str = "Bearer ";

/// Signing algorithm used when neither the caller nor the key store names one.
pub(crate) const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Header names bound into every token in addition to caller-supplied ones.
pub(crate) const DEFAULT_HEADERS_TO_SIGN: &[&str] = &["Content-Type"];

/// Error code: InternalFailure
pub(crate) const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: MissingAuthorizationHeader
pub(crate) const ERR_CODE_MISSING_AUTHORIZATION_HEADER: &str = "MissingAuthorizationHeader";

/// Error code: MissingSigningKey
pub(crate) const ERR_CODE_MISSING_SIGNING_KEY: &str = "MissingSigningKey";

/// Error code: TokenDecodeError
pub(crate) const ERR_CODE_TOKEN_DECODE_ERROR: &str = "TokenDecodeError";

/// Error code: VerificationFailed
pub(crate) const ERR_CODE_VERIFICATION_FAILED: &str = "VerificationFailed";

/// Error message: `"Missing Authorization header in the request"`
pub(crate) const MSG_MISSING_AUTHORIZATION_HEADER: &str = "Missing Authorization header in the request";

/// Error message: `"No secret key or lookup key id was provided"`
pub(crate) const MSG_NO_KEY_MATERIAL: &str = "No secret key or lookup key id was provided";
