//! Signing key resolution.
//!
//! Key material is never baked into call sites: signing resolves a key
//! identifier through a [`tower::Service`] so the mapping from identifier to
//! `{secret, algorithm}` can live wherever the deployment keeps it.
//! [`MemoryKeyStore`] covers the in-process case and doubles as the reference
//! implementation of the contract.

use {
    crate::error::SignatureError,
    derive_builder::Builder,
    jsonwebtoken::Algorithm,
    std::{
        collections::HashMap,
        fmt::{Debug, Display, Formatter, Result as FmtResult},
        future::{ready, Future, Ready},
        task::{Context, Poll},
    },
    tower::{service_fn, util::ServiceFn, BoxError, Service},
};

/// Raw secret key material.
///
/// The wrapper exists so key bytes never leak through `Debug` or `Display`
/// output; both render as the bare type name.
#[derive(Clone, Eq, PartialEq)]
pub struct SecretKey {
    /// The key bytes.
    key: Vec<u8>,
}

impl SecretKey {
    /// Create a secret key from raw bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
        }
    }

    /// Retrieve the key bytes.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl From<&str> for SecretKey {
    fn from(key: &str) -> Self {
        Self::new(key.as_bytes().to_vec())
    }
}

impl From<&[u8]> for SecretKey {
    fn from(key: &[u8]) -> Self {
        Self::new(key.to_vec())
    }
}

impl From<Vec<u8>> for SecretKey {
    fn from(key: Vec<u8>) -> Self {
        Self::new(key)
    }
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SecretKey")
    }
}

impl Display for SecretKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SecretKey")
    }
}

/// A request for the signing key registered under a key identifier.
///
/// GetSigningKeyRequest structs are immutable. Use [`GetSigningKeyRequestBuilder`]
/// to programmatically construct a request.
#[derive(Builder, Clone, Debug)]
#[non_exhaustive]
pub struct GetSigningKeyRequest {
    /// The key identifier to resolve.
    #[builder(setter(into))]
    key_id: String,
}

impl GetSigningKeyRequest {
    /// Create a [GetSigningKeyRequestBuilder] to construct a [GetSigningKeyRequest].
    #[inline]
    pub fn builder() -> GetSigningKeyRequestBuilder {
        GetSigningKeyRequestBuilder::default()
    }

    /// Retrieve the key identifier to resolve.
    #[inline]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// A response from the signing key provider.
///
/// GetSigningKeyResponse structs are immutable. Use [`GetSigningKeyResponseBuilder`]
/// to programmatically construct a response.
#[derive(Builder, Clone, Debug)]
pub struct GetSigningKeyResponse {
    /// The secret key registered under the requested identifier.
    #[builder(setter(into))]
    secret: SecretKey,

    /// The algorithm the key is meant to sign with.
    algorithm: Algorithm,
}

impl GetSigningKeyResponse {
    /// Create a [GetSigningKeyResponseBuilder] to construct a [GetSigningKeyResponse].
    #[inline]
    pub fn builder() -> GetSigningKeyResponseBuilder {
        GetSigningKeyResponseBuilder::default()
    }

    /// Retrieve the secret key.
    #[inline]
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Retrieve the algorithm the key is meant to sign with.
    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Create a Service that wraps a function that can produce a signing key.
pub fn service_for_signing_key_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: FnMut(GetSigningKeyRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<GetSigningKeyResponse, BoxError>> + Send + 'static,
{
    service_fn(f)
}

/// An in-process key store mapping key identifiers to signing keys.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyStore {
    /// Registered signing keys by identifier.
    keys: HashMap<String, GetSigningKeyResponse>,
}

impl MemoryKeyStore {
    /// Create an empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signing key under an identifier, replacing any previous
    /// registration.
    pub fn add_signing_key(&mut self, key_id: impl Into<String>, secret: impl Into<SecretKey>, algorithm: Algorithm) {
        self.keys.insert(
            key_id.into(),
            GetSigningKeyResponse {
                secret: secret.into(),
                algorithm,
            },
        );
    }

    /// Resolve a key identifier, failing with [`SignatureError::MissingSigningKey`]
    /// when it is unknown.
    pub fn get_signing_key(&self, key_id: &str) -> Result<GetSigningKeyResponse, SignatureError> {
        self.keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| SignatureError::MissingSigningKey(format!("Unknown key id: {}", key_id)))
    }
}

impl Service<GetSigningKeyRequest> for MemoryKeyStore {
    type Response = GetSigningKeyResponse;
    type Error = BoxError;
    type Future = Ready<Result<GetSigningKeyResponse, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), BoxError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: GetSigningKeyRequest) -> Self::Future {
        ready(self.get_signing_key(request.key_id()).map_err(BoxError::from))
    }
}
