//! Request digest computation
//!
//! A token authorizes exactly one request. The binding is a SHA-256 digest
//! of the request's canonical textual form, embedded in the claims and
//! recomputed by the verifier. Two semantically different requests must not
//! canonicalize to the same text for any request type the protocol is used
//! with.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// A request value with a canonical textual form.
///
/// The default implementation falls back to the `Debug` representation.
/// That fallback is intentionally permissive: it is only sound for request
/// types whose `Debug` output is stable across the two ends of the call
/// (same field order, same formatting). Types with any doubt about that
/// should override [`canonical_text`](Self::canonical_text) explicitly —
/// this is a caller responsibility, not enforced here.
pub trait CanonicalRequest: fmt::Debug {
    /// Stable textual form of this request, identical on both ends of the
    /// call.
    fn canonical_text(&self) -> String {
        format!("{self:?}")
    }
}

impl CanonicalRequest for str {
    fn canonical_text(&self) -> String {
        self.to_string()
    }
}

impl CanonicalRequest for String {
    fn canonical_text(&self) -> String {
        self.clone()
    }
}

/// SHA-256 digest of a request's canonical text.
///
/// 32 bytes, embedded in claims as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDigest([u8; 32]);

impl RequestDigest {
    /// Compute the digest of a request. Pure and infallible.
    pub fn compute<R: CanonicalRequest + ?Sized>(request: &R) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.canonical_text().as_bytes());
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex form as embedded in claims.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RequestDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Constant-time string comparison for digest and other secret-adjacent
/// values. Comparison time must not leak how much of a forged value
/// matched.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
