//! Request body buffering.
//!
//! Verification hashes the raw body bytes, so the whole body has to be in
//! memory before the claim comparison runs. Implementations of
//! [`IntoRequestBytes`] convert a host framework's body type into [`Bytes`];
//! the buffered bytes are handed back to the caller after verification so the
//! body stays readable by downstream consumers.

use {bytes::Bytes, std::future::Future, tower::BoxError};

/// Conversion of a request body into a single [`Bytes`] buffer.
pub trait IntoRequestBytes {
    /// Read this body to completion and return its raw bytes.
    fn into_request_bytes(self) -> impl Future<Output = Result<Bytes, BoxError>> + Send + Sync;
}

impl IntoRequestBytes for () {
    /// A bodiless request buffers to an empty byte sequence.
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::new())
    }
}

impl IntoRequestBytes for Vec<u8> {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(self))
    }
}

impl IntoRequestBytes for String {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(self))
    }
}

impl IntoRequestBytes for &'static str {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(Bytes::from(self))
    }
}

impl IntoRequestBytes for Bytes {
    async fn into_request_bytes(self) -> Result<Bytes, BoxError> {
        Ok(self)
    }
}
