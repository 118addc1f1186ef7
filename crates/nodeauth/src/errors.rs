//! Error taxonomy for token issuance and validation
//!
//! Every pipeline stage fails with its own kind so callers can log, alert,
//! and retry differently. Kinds are never collapsed into a generic "auth
//! failed" and no stage downgrades an inner error into a success.

use std::fmt;

use thiserror::Error;

/// Sub-reason for a time-claim rejection.
///
/// Both causes are reported under [`AuthError::TokenNotCurrentlyValid`];
/// the cause is carried for observability since the remediation is the same
/// (re-issue a fresh token).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityCause {
    /// `expires_at` is more than the configured leeway in the past.
    Expired,
    /// `issued_at` is more than the configured leeway in the future.
    NotYetValid,
}

impl fmt::Display for ValidityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::NotYetValid => write!(f, "not yet valid"),
        }
    }
}

/// Errors produced by token generation, validation, and the bearer
/// transport boundary.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Generator misconfiguration: no signer capability was supplied.
    /// Not retryable without fixing configuration.
    #[error("no identity signer configured for token generation")]
    NoSignerConfigured,

    /// The underlying signing capability failed. The cause is opaque to
    /// this layer and propagated verbatim.
    #[error("identity signing failed: {reason}")]
    SigningFailed {
        /// Cause reported by the signer capability
        reason: String,
    },

    /// The token string could not be decoded into header, claims, and
    /// signature. Always a reject; likely a bug or an attack.
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// What failed to decode
        reason: String,
    },

    /// The embedded public key is not a valid key of the declared scheme.
    #[error("invalid public key encoding: {reason}")]
    InvalidKeyEncoding {
        /// What failed to decode
        reason: String,
    },

    /// Cryptographic rejection: the signature does not verify against the
    /// embedded public key.
    #[error("token signature verification failed")]
    SignatureInvalid,

    /// The token is outside its validity window even after applying the
    /// configured leeway.
    #[error("token not currently valid: {cause}")]
    TokenNotCurrentlyValid {
        /// Whether the token was expired or future-dated
        cause: ValidityCause,
    },

    /// The recomputed request digest does not match the digest claim.
    /// Either a replayed token or a canonicalization mismatch.
    #[error("request digest mismatch")]
    DigestMismatch,

    /// The trust provider itself errored. An inability to check trust is
    /// never treated as "trusted".
    #[error("trust check failed: {reason}")]
    TrustCheckFailed {
        /// Cause reported by the trust provider
        reason: String,
    },

    /// A cryptographically valid token from a key that is not currently a
    /// trusted member. The expected rejection path for topology changes.
    #[error("identity is not a trusted member: {public_key}")]
    UnauthorizedIdentity {
        /// Hex encoding of the rejected public key
        public_key: String,
    },

    /// No metadata was present on the incoming request at all.
    #[error("request metadata missing")]
    MetadataMissing,

    /// Metadata was present but carried no authorization entry.
    #[error("authorization metadata entry missing")]
    AuthorizationMissing,

    /// The authorization entry did not carry the `Bearer ` prefix.
    #[error("authorization value missing Bearer prefix")]
    InvalidBearerPrefix,
}

impl AuthError {
    /// Whether this rejection merits a distinct audit log line.
    ///
    /// Structural and cryptographic rejections indicate a bug or an attack
    /// rather than benign clock skew or topology churn.
    pub fn is_security_significant(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::InvalidKeyEncoding { .. }
                | Self::SignatureInvalid
                | Self::DigestMismatch
        )
    }

    /// Stable category name for metrics and structured log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoSignerConfigured => "no_signer_configured",
            Self::SigningFailed { .. } => "signing_failed",
            Self::MalformedToken { .. } => "malformed_token",
            Self::InvalidKeyEncoding { .. } => "invalid_key_encoding",
            Self::SignatureInvalid => "signature_invalid",
            Self::TokenNotCurrentlyValid { .. } => "token_not_currently_valid",
            Self::DigestMismatch => "digest_mismatch",
            Self::TrustCheckFailed { .. } => "trust_check_failed",
            Self::UnauthorizedIdentity { .. } => "unauthorized_identity",
            Self::MetadataMissing => "metadata_missing",
            Self::AuthorizationMissing => "authorization_missing",
            Self::InvalidBearerPrefix => "invalid_bearer_prefix",
        }
    }
}
