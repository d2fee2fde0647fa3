use {
    crate::constants::*,
    http::status::StatusCode,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
        io::Error as IOError,
    },
};

/// Error returned when signing a request or validating a signed request fails.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// Signing or validation failed due to an internal service error.
    InternalServiceError(Box<dyn Error + Send + Sync>),

    /// Signing or validation failed due to an underlying I/O error.
    Io(IOError),

    /// The request carries no `Authorization` header, so there is no token to
    /// validate.
    MissingAuthorizationHeader(/* message */ String),

    /// The key identifier given for signing is not known to the key store, or
    /// no key material was provided at all.
    MissingSigningKey(/* message */ String),

    /// The token could not be decoded: the signature is invalid, the token is
    /// malformed, or the token is expired beyond the configured leeway.
    TokenDecode(/* message */ String),

    /// The token decoded successfully but its claims do not match the live
    /// request. The inner [`VerificationFailure`] names the first check that
    /// failed.
    VerificationFailed(VerificationFailure),
}

impl SignatureError {
    /// A short stable code identifying the kind of failure.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InternalServiceError(_) | Self::Io(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::MissingAuthorizationHeader(_) => ERR_CODE_MISSING_AUTHORIZATION_HEADER,
            Self::MissingSigningKey(_) => ERR_CODE_MISSING_SIGNING_KEY,
            Self::TokenDecode(_) => ERR_CODE_TOKEN_DECODE_ERROR,
            Self::VerificationFailed(_) => ERR_CODE_VERIFICATION_FAILED,
        }
    }

    /// The HTTP status a service should answer with when surfacing this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InternalServiceError(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::Io(ref e) => Display::fmt(e, f),
            Self::MissingAuthorizationHeader(msg) => f.write_str(msg),
            Self::MissingSigningKey(msg) => f.write_str(msg),
            Self::TokenDecode(msg) => f.write_str(msg),
            Self::VerificationFailed(failure) => Display::fmt(failure, f),
        }
    }
}

impl Error for SignatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<IOError> for SignatureError {
    fn from(e: IOError) -> SignatureError {
        SignatureError::Io(e)
    }
}

impl From<VerificationFailure> for SignatureError {
    fn from(failure: VerificationFailure) -> SignatureError {
        SignatureError::VerificationFailed(failure)
    }
}

impl From<Box<dyn Error + Send + Sync>> for SignatureError {
    fn from(e: Box<dyn Error + Send + Sync>) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::InternalServiceError(e),
        }
    }
}

/// The first claim comparison that failed while validating a signed request.
///
/// Every variant maps onto the same outward [`SignatureError::VerificationFailed`]
/// kind; the distinction exists so callers and tests can tell which part of
/// the request diverged from what was signed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerificationFailure {
    /// The live request method differs from the signed method.
    MethodMismatch(/* message */ String),

    /// The live request path or query string differs from what was signed.
    PathMismatch(/* message */ String),

    /// The live request body hashes to a different digest than the signed one.
    BodyMismatch(/* message */ String),

    /// A signed header is missing from the live request or carries a
    /// different value.
    HeaderMismatch(/* message */ String),
}

impl Display for VerificationFailure {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::MethodMismatch(msg) => f.write_str(msg),
            Self::PathMismatch(msg) => f.write_str(msg),
            Self::BodyMismatch(msg) => f.write_str(msg),
            Self::HeaderMismatch(msg) => f.write_str(msg),
        }
    }
}

impl Error for VerificationFailure {}
