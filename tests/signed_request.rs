use {
    bytes::Bytes,
    http::{header::HeaderValue, method::Method, request::Request},
    jwt_signed_request::{
        sign, sign_with_key_service, verify_request, Algorithm, MemoryKeyStore, SecretKey, SignRequest,
        SignatureError, VerificationFailure, VerificationOptions,
    },
    sha2::{Digest, Sha256},
    std::time::{SystemTime, UNIX_EPOCH},
};

const TEST_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

fn tenant_headers() -> http::HeaderMap {
    let mut headers = http::HeaderMap::new();
    headers.insert("x-tenant", HeaderValue::from_static("t1"));
    headers
}

/// Sign the concrete order-creation scenario used throughout these tests.
fn signed_order_token(query_string_hash: bool) -> String {
    let request = SignRequest::builder()
        .method(Method::POST)
        .path("/orders?id=1")
        .body(Bytes::from_static(br#"{"a":1}"#))
        .headers(tenant_headers())
        .additional_headers_to_sign(vec!["X-Tenant".to_string()])
        .secret(SecretKey::from(TEST_SECRET))
        .query_string_hash(query_string_hash)
        .build()
        .unwrap();
    sign(&request).unwrap()
}

fn live_order_request(token: &str, method: &str, uri: &str, tenant: &str, body: &'static [u8]) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", token)
        .header("x-tenant", tenant)
        .body(Bytes::from_static(body))
        .unwrap()
}

async fn verify_order(token: &str, method: &str, uri: &str, tenant: &str, body: &'static [u8]) -> Result<(), SignatureError> {
    let request = live_order_request(token, method, uri, tenant, body);
    verify_request(request, &SecretKey::from(TEST_SECRET), &VerificationOptions::default())
        .await
        .map(|_| ())
}

fn assert_failure(result: Result<(), SignatureError>, expected: fn(&VerificationFailure) -> bool) {
    match result {
        Err(SignatureError::VerificationFailed(ref failure)) if expected(failure) => {}
        other => panic!("Expected VerificationFailed, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn round_trip() {
    let token = signed_order_token(false);
    let request = live_order_request(&token, "POST", "/orders?id=1", "t1", br#"{"a":1}"#);

    let (parts, body, claims) =
        verify_request(request, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.unwrap();

    // The request stays usable downstream.
    assert_eq!(parts.method, Method::POST);
    assert_eq!(body, Bytes::from_static(br#"{"a":1}"#));

    // The claim set is exactly what the scenario calls for.
    assert_eq!(claims.method(), "post");
    assert_eq!(claims.path(), "/orders?id=1");
    assert_eq!(claims.body_sha(), hex::encode(Sha256::digest(br#"{"a":1}"#)));
    assert_eq!(claims.headers_json(), r#"{"X-Tenant":"t1"}"#);
    assert_eq!(claims.query_string_hash(), None);
}

#[test_log::test(tokio::test)]
async fn bearer_scheme_is_accepted() {
    let token = signed_order_token(false);
    let bearer = format!("Bearer {}", token);
    assert!(verify_order(&bearer, "POST", "/orders?id=1", "t1", br#"{"a":1}"#).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn method_tamper_fails() {
    let token = signed_order_token(false);
    assert_failure(
        verify_order(&token, "PUT", "/orders?id=1", "t1", br#"{"a":1}"#).await,
        |f| matches!(f, VerificationFailure::MethodMismatch(_)),
    );
}

#[test_log::test(tokio::test)]
async fn path_tamper_fails() {
    let token = signed_order_token(false);
    assert_failure(
        verify_order(&token, "POST", "/receipts?id=1", "t1", br#"{"a":1}"#).await,
        |f| matches!(f, VerificationFailure::PathMismatch(_)),
    );
}

#[test_log::test(tokio::test)]
async fn query_tamper_fails_in_both_modes() {
    // Mode off: the query string is embedded in the signed path.
    let token = signed_order_token(false);
    assert_failure(
        verify_order(&token, "POST", "/orders?id=2", "t1", br#"{"a":1}"#).await,
        |f| matches!(f, VerificationFailure::PathMismatch(_)),
    );

    // Mode on: the query string is bound through its own digest.
    let token = signed_order_token(true);
    assert!(verify_order(&token, "POST", "/orders?id=1", "t1", br#"{"a":1}"#).await.is_ok());
    assert_failure(
        verify_order(&token, "POST", "/orders?id=2", "t1", br#"{"a":1}"#).await,
        |f| matches!(f, VerificationFailure::PathMismatch(_)),
    );
}

#[test_log::test(tokio::test)]
async fn body_tamper_fails() {
    let token = signed_order_token(false);
    assert_failure(
        verify_order(&token, "POST", "/orders?id=1", "t1", br#"{"a":2}"#).await,
        |f| matches!(f, VerificationFailure::BodyMismatch(_)),
    );
}

#[test_log::test(tokio::test)]
async fn signed_header_tamper_fails() {
    let token = signed_order_token(false);
    assert_failure(
        verify_order(&token, "POST", "/orders?id=1", "t2", br#"{"a":1}"#).await,
        |f| matches!(f, VerificationFailure::HeaderMismatch(_)),
    );
}

#[test_log::test(tokio::test)]
async fn unsigned_header_mutation_is_ignored() {
    let token = signed_order_token(false);
    let request = Request::builder()
        .method("POST")
        .uri("/orders?id=1")
        .header("Authorization", token.as_str())
        .header("x-tenant", "t1")
        .header("x-trace-id", "mutated-after-signing")
        .body(Bytes::from_static(br#"{"a":1}"#))
        .unwrap();

    let result =
        verify_request(request, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn signed_header_case_is_insignificant() {
    // Signed as X-Foo, presented as x-foo.
    let mut headers = http::HeaderMap::new();
    headers.insert("X-Foo", HeaderValue::from_static("bar"));
    let request = SignRequest::builder()
        .method(Method::GET)
        .path("/ping")
        .headers(headers)
        .additional_headers_to_sign(vec!["X-Foo".to_string()])
        .secret(SecretKey::from(TEST_SECRET))
        .build()
        .unwrap();
    let token = sign(&request).unwrap();

    let live = Request::builder()
        .method("GET")
        .uri("/ping")
        .header("Authorization", token.as_str())
        .header("x-foo", "bar")
        .body(())
        .unwrap();
    let result = verify_request(live, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn empty_body_round_trip() {
    let request = SignRequest::builder()
        .method(Method::GET)
        .path("/ping")
        .secret(SecretKey::from(TEST_SECRET))
        .build()
        .unwrap();
    let token = sign(&request).unwrap();

    let live = Request::builder().method("GET").uri("/ping").header("Authorization", token.as_str()).body(()).unwrap();
    assert!(verify_request(live, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.is_ok());

    // The same token must not cover a request that grew a body.
    let live = Request::builder()
        .method("GET")
        .uri("/ping")
        .header("Authorization", token.as_str())
        .body(Bytes::from_static(b"x"))
        .unwrap();
    let err =
        verify_request(live, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.unwrap_err();
    assert!(matches!(err, SignatureError::VerificationFailed(VerificationFailure::BodyMismatch(_))));
}

#[test_log::test(tokio::test)]
async fn missing_authorization_header() {
    let request = Request::builder().method("GET").uri("/ping").body(()).unwrap();
    let err =
        verify_request(request, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.unwrap_err();
    assert_eq!(err.error_code(), "MissingAuthorizationHeader");
    assert_eq!(err.to_string(), "Missing Authorization header in the request");
}

#[test_log::test(tokio::test)]
async fn malformed_token_fails_decode() {
    let request =
        Request::builder().method("GET").uri("/ping").header("Authorization", "not.a.token").body(()).unwrap();
    let err =
        verify_request(request, &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.unwrap_err();
    assert_eq!(err.error_code(), "TokenDecodeError");
}

#[test_log::test(tokio::test)]
async fn wrong_secret_fails_decode() {
    let token = signed_order_token(false);
    let request = live_order_request(&token, "POST", "/orders?id=1", "t1", br#"{"a":1}"#);
    let err = verify_request(request, &SecretKey::from("someone-else"), &VerificationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "TokenDecodeError");
}

#[test_log::test(tokio::test)]
async fn expiry_enforced_only_with_leeway() {
    let expired_at = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() - 120;
    let request = SignRequest::builder()
        .method(Method::GET)
        .path("/ping")
        .secret(SecretKey::from(TEST_SECRET))
        .exp(expired_at)
        .build()
        .unwrap();
    let token = sign(&request).unwrap();

    let live = || Request::builder().method("GET").uri("/ping").header("Authorization", token.as_str()).body(()).unwrap();

    // No leeway configured: expiry is carried but not checked.
    assert!(verify_request(live(), &SecretKey::from(TEST_SECRET), &VerificationOptions::default()).await.is_ok());

    // Tight leeway: rejected as expired.
    let tight = VerificationOptions {
        exp_leeway: Some(30),
        ..Default::default()
    };
    let err = verify_request(live(), &SecretKey::from(TEST_SECRET), &tight).await.unwrap_err();
    assert_eq!(err.error_code(), "TokenDecodeError");

    // Leeway wide enough to cover the skew: accepted.
    let generous = VerificationOptions {
        exp_leeway: Some(600),
        ..Default::default()
    };
    assert!(verify_request(live(), &SecretKey::from(TEST_SECRET), &generous).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn key_store_round_trip() {
    let mut store = MemoryKeyStore::new();
    store.add_signing_key("client-7", TEST_SECRET, Algorithm::HS512);

    let request = SignRequest::builder()
        .method(Method::POST)
        .path("/orders?id=1")
        .body(Bytes::from_static(br#"{"a":1}"#))
        .headers(tenant_headers())
        .additional_headers_to_sign(vec!["X-Tenant".to_string()])
        .key_id("client-7")
        .build()
        .unwrap();
    let token = sign_with_key_service(&request, &mut store).await.unwrap();

    // The advertised key id lets the receiver pick the right key and
    // algorithm before verifying.
    let header = jsonwebtoken::decode_header(&token).unwrap();
    let key_id = header.kid.as_deref().unwrap();
    let resolved = store.get_signing_key(key_id).unwrap();

    let options = VerificationOptions {
        algorithm: resolved.algorithm(),
        ..Default::default()
    };
    let live = live_order_request(&token, "POST", "/orders?id=1", "t1", br#"{"a":1}"#);
    assert!(verify_request(live, resolved.secret(), &options).await.is_ok());
}
