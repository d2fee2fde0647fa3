//! JWT-bound HTTP request signing and verification.
//!
//! A token minted by [`sign`] binds to one specific request: its claims carry
//! the method, the path, a digest of the body, and a canonicalized subset of
//! headers. [`verify_request`] re-derives those claims from the live request
//! and rejects the token if anything diverges, so a captured token cannot be
//! replayed against a different method, path, payload, or signed header.
//!
//! The token primitive itself is `jsonwebtoken`; key resolution is a
//! [`tower::Service`] so key material can live wherever the deployment keeps
//! it. This crate owns only the claim canonicalization and comparison.

mod body;
mod claims;
mod constants;
mod crypto;
mod error;
pub mod headers;
mod key_store;
mod sign;
mod token;
mod verify;

pub use crate::{
    body::IntoRequestBytes,
    claims::Claims,
    error::{SignatureError, VerificationFailure},
    key_store::{
        service_for_signing_key_fn, GetSigningKeyRequest, GetSigningKeyRequestBuilder, GetSigningKeyResponse,
        GetSigningKeyResponseBuilder, MemoryKeyStore, SecretKey,
    },
    sign::{sign, sign_with_key_service, SignRequest, SignRequestBuilder},
    verify::{verify_parts, verify_request, VerificationOptions},
};

// The algorithm names live with the token primitive; re-exported so callers
// don't need a direct jsonwebtoken dependency just to pick one.
pub use jsonwebtoken::Algorithm;
