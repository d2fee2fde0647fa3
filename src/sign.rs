//! Request signing.
//!
//! Signing derives the canonical claim set for a request and encodes it into
//! a token with either caller-supplied key material or a key resolved through
//! the signing key service. The resulting token goes verbatim into the
//! `Authorization` header of the outbound request.

use {
    crate::{
        claims::Claims,
        constants::{DEFAULT_ALGORITHM, MSG_NO_KEY_MATERIAL},
        error::SignatureError,
        key_store::{GetSigningKeyRequest, GetSigningKeyResponse, SecretKey},
        token::encode_token,
    },
    bytes::Bytes,
    derive_builder::Builder,
    http::{header::HeaderMap, method::Method},
    jsonwebtoken::Algorithm,
    log::trace,
    std::future::Future,
    tower::{BoxError, Service, ServiceExt},
};

/// A description of the request to sign.
///
/// SignRequest structs are immutable. Use [`SignRequestBuilder`] to
/// programmatically construct a request:
///
/// ```
/// use jwt_signed_request::{sign, SecretKey, SignRequest};
/// use jsonwebtoken::Algorithm;
/// use http::method::Method;
///
/// let request = SignRequest::builder()
///     .method(Method::POST)
///     .path("/orders?id=1")
///     .body(&br#"{"a":1}"#[..])
///     .secret(SecretKey::from("s3cr3t"))
///     .algorithm(Algorithm::HS256)
///     .build()
///     .unwrap();
/// let token = sign(&request).unwrap();
/// ```
#[derive(Builder, Clone, Debug)]
#[non_exhaustive]
pub struct SignRequest {
    /// The HTTP method of the request being signed.
    method: Method,

    /// The request path. Includes the query string; when `query_string_hash`
    /// is enabled the query string is split off and hashed separately.
    #[builder(setter(into))]
    path: String,

    /// The raw request body. Empty when the request carries none.
    #[builder(setter(into), default)]
    body: Bytes,

    /// The request headers the signed-header set is resolved against.
    #[builder(default)]
    headers: HeaderMap,

    /// Explicit key material. When set, the signing key service is not
    /// consulted.
    #[builder(setter(into, strip_option), default)]
    secret: Option<SecretKey>,

    /// The signing algorithm. Falls back to the key store's registered
    /// algorithm, then to the crate default.
    #[builder(setter(strip_option), default)]
    algorithm: Option<Algorithm>,

    /// Key identifier advertised in the token's `kid` header.
    #[builder(setter(into, strip_option), default)]
    key_id: Option<String>,

    /// Key identifier used to resolve the signing key, when it differs from
    /// the advertised `key_id`.
    #[builder(setter(into, strip_option), default)]
    lookup_key_id: Option<String>,

    /// Issuer recorded in the claims when non-empty.
    #[builder(setter(into, strip_option), default)]
    issuer: Option<String>,

    /// Header names bound into the token in addition to the default set.
    #[builder(setter(into), default)]
    additional_headers_to_sign: Vec<String>,

    /// Hash the query string separately from the path instead of embedding it
    /// in the signed path.
    #[builder(default)]
    query_string_hash: bool,

    /// Issued-at to pass through into the claims.
    #[builder(setter(strip_option), default)]
    iat: Option<u64>,

    /// Expiry to pass through into the claims.
    #[builder(setter(strip_option), default)]
    exp: Option<u64>,
}

impl SignRequest {
    /// Create a [SignRequestBuilder] to construct a [SignRequest].
    #[inline]
    pub fn builder() -> SignRequestBuilder {
        SignRequestBuilder::default()
    }

    /// The key identifier used for key-store resolution: `lookup_key_id` when
    /// set, otherwise the advertised `key_id`.
    fn resolution_key_id(&self) -> Option<&str> {
        self.lookup_key_id.as_deref().or(self.key_id.as_deref())
    }

    /// Generate the canonical claims for this request.
    fn claims(&self) -> Claims {
        Claims::generate(
            &self.method,
            &self.path,
            &self.headers,
            &self.body,
            &self.additional_headers_to_sign,
            self.issuer.as_deref(),
            self.query_string_hash,
        )
        .with_lifecycle(self.iat, self.exp)
    }
}

/// Sign a request with explicit key material.
///
/// # Errors
/// Fails with [`SignatureError::MissingSigningKey`] when the request carries
/// no `secret`; use [`sign_with_key_service`] to resolve a key identifier
/// through a key store instead.
pub fn sign(request: &SignRequest) -> Result<String, SignatureError> {
    let secret = request
        .secret
        .as_ref()
        .ok_or_else(|| SignatureError::MissingSigningKey(MSG_NO_KEY_MATERIAL.to_string()))?;
    let algorithm = request.algorithm.unwrap_or(DEFAULT_ALGORITHM);

    encode_with(request, secret, algorithm)
}

/// Sign a request, resolving the signing key through a key service when the
/// request does not carry explicit key material.
///
/// # Errors
/// Fails with [`SignatureError::MissingSigningKey`] when the request names no
/// key and the service does not know the identifier, and with whatever the
/// service itself fails with (folded into [`SignatureError`]) on lookup
/// errors.
pub async fn sign_with_key_service<G, F>(
    request: &SignRequest,
    get_signing_key: &mut G,
) -> Result<String, SignatureError>
where
    G: Service<GetSigningKeyRequest, Response = GetSigningKeyResponse, Error = BoxError, Future = F> + Send,
    F: Future<Output = Result<GetSigningKeyResponse, BoxError>> + Send,
{
    if request.secret.is_some() {
        return sign(request);
    }

    let key_id = request
        .resolution_key_id()
        .ok_or_else(|| SignatureError::MissingSigningKey(MSG_NO_KEY_MATERIAL.to_string()))?;

    let lookup = GetSigningKeyRequest::builder()
        .key_id(key_id)
        .build()
        .map_err(|e| SignatureError::InternalServiceError(Box::new(e)))?;
    let response = get_signing_key.oneshot(lookup).await.map_err(SignatureError::from)?;

    trace!("Resolved signing key for key id {}", key_id);

    let algorithm = request.algorithm.unwrap_or_else(|| response.algorithm());
    encode_with(request, response.secret(), algorithm)
}

fn encode_with(request: &SignRequest, secret: &SecretKey, algorithm: Algorithm) -> Result<String, SignatureError> {
    encode_token(&request.claims(), secret, algorithm, request.key_id.as_deref())
}
