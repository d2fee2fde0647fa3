use {
    sha2::{Digest, Sha256},
    subtle::ConstantTimeEq,
};

/// Hex-encoded SHA-256 digest of a byte slice.
#[inline(always)]
pub(crate) fn sha256_hex(value: &[u8]) -> String {
    hex::encode(Sha256::digest(value))
}

/// Constant-time equality for hex digest strings. Differing lengths compare
/// unequal without leaking where the strings diverge.
#[inline(always)]
pub(crate) fn digest_eq(computed: &str, claimed: &str) -> bool {
    computed.as_bytes().ct_eq(claimed.as_bytes()).into()
}
