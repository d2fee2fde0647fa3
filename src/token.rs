//! Thin wrapper over the token primitive.
//!
//! Encoding and decoding are delegated wholesale to `jsonwebtoken`; this
//! module only pins down the crate's policy choices (which registered claims
//! are enforced, how leeway applies) and folds the primitive's errors into
//! [`SignatureError`].

use {
    crate::{claims::Claims, key_store::SecretKey, verify::VerificationOptions, SignatureError},
    jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation},
    std::collections::HashSet,
};

/// Encode a claim set into a signed token.
///
/// When `key_id` is given it is advertised in the token's `kid` header so the
/// receiving side can resolve the matching verification key.
pub(crate) fn encode_token(
    claims: &Claims,
    secret: &SecretKey,
    algorithm: Algorithm,
    key_id: Option<&str>,
) -> Result<String, SignatureError> {
    let mut header = Header::new(algorithm);
    header.kid = key_id.map(str::to_string);

    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| SignatureError::InternalServiceError(Box::new(e)))
}

/// Decode a token and validate its signature, returning the raw claims.
///
/// Signature validation is unconditional. Expiry is enforced only when the
/// caller configured an `exp_leeway`; without one, a present `exp` claim is
/// carried but not checked, matching the signing side which never computes
/// lifecycle fields itself.
pub(crate) fn decode_token(
    token: &str,
    secret: &SecretKey,
    options: &VerificationOptions,
) -> Result<Claims, SignatureError> {
    let mut validation = Validation::new(options.algorithm);
    validation.required_spec_claims = HashSet::new();

    match options.exp_leeway {
        Some(leeway) => {
            validation.validate_exp = true;
            validation.leeway = leeway;
        }
        None => {
            validation.validate_exp = false;
            validation.leeway = 0;
        }
    }

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| SignatureError::TokenDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use {
        super::{decode_token, encode_token},
        crate::{claims::Claims, key_store::SecretKey, verify::VerificationOptions},
        http::method::Method,
        jsonwebtoken::Algorithm,
        std::time::{SystemTime, UNIX_EPOCH},
    };

    fn unix_now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn sample_claims() -> Claims {
        Claims::generate(&Method::GET, "/ping", &http::HeaderMap::new(), b"", &[], None, false)
    }

    #[test_log::test]
    fn test_round_trip() {
        let secret = SecretKey::from("s3cr3t");
        let token = encode_token(&sample_claims(), &secret, Algorithm::HS256, None).unwrap();
        let claims = decode_token(&token, &secret, &VerificationOptions::default()).unwrap();
        assert_eq!(claims, sample_claims());
    }

    #[test_log::test]
    fn test_kid_header() {
        let secret = SecretKey::from("s3cr3t");
        let token = encode_token(&sample_claims(), &secret, Algorithm::HS256, Some("client-7")).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("client-7"));
    }

    #[test_log::test]
    fn test_wrong_secret_rejected() {
        let token = encode_token(&sample_claims(), &SecretKey::from("s3cr3t"), Algorithm::HS256, None).unwrap();
        let err = decode_token(&token, &SecretKey::from("wrong"), &VerificationOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), "TokenDecodeError");
    }

    #[test_log::test]
    fn test_garbage_rejected() {
        let err = decode_token("not.a.token", &SecretKey::from("s3cr3t"), &VerificationOptions::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "TokenDecodeError");
    }

    #[test_log::test]
    fn test_expiry_checked_only_with_leeway() {
        let secret = SecretKey::from("s3cr3t");
        let expired = sample_claims().with_lifecycle(None, Some(unix_now() - 120));
        let token = encode_token(&expired, &secret, Algorithm::HS256, None).unwrap();

        // Without a leeway, expiry is carried but not enforced.
        assert!(decode_token(&token, &secret, &VerificationOptions::default()).is_ok());

        // A tight leeway rejects it.
        let tight = VerificationOptions {
            exp_leeway: Some(30),
            ..Default::default()
        };
        let err = decode_token(&token, &secret, &tight).unwrap_err();
        assert_eq!(err.error_code(), "TokenDecodeError");

        // A generous leeway admits it.
        let generous = VerificationOptions {
            exp_leeway: Some(600),
            ..Default::default()
        };
        assert!(decode_token(&token, &secret, &generous).is_ok());
    }

    #[test_log::test]
    fn test_token_without_exp_passes_leeway_check() {
        // Lifecycle enforcement only applies to tokens that carry an expiry.
        let secret = SecretKey::from("s3cr3t");
        let token = encode_token(&sample_claims(), &secret, Algorithm::HS256, None).unwrap();
        let options = VerificationOptions {
            exp_leeway: Some(30),
            ..Default::default()
        };
        assert!(decode_token(&token, &secret, &options).is_ok());
    }
}
