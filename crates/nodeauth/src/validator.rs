//! Token validation pipeline
//!
//! A strict, ordered pipeline: parse → decode embedded key → verify
//! signature → verify time claims → verify request digest → verify trust.
//! Each stage either advances or fails immediately with its own
//! [`AuthError`] kind; no stage is skipped, retried, or silently
//! downgraded. The pipeline never returns claims unless every stage
//! explicitly passed.
//!
//! The trust check runs last: it is the only stage that may perform I/O
//! and the only one whose answer can change independently of the token
//! (membership can be revoked between issuance and receipt). Callers in a
//! cooperative-scheduling environment should treat that stage as the sole
//! suspension point; everything before it is pure CPU-bound cryptography.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    Result,
    digest::{CanonicalRequest, RequestDigest, constant_time_eq},
    errors::{AuthError, ValidityCause},
    types::{AuthClaims, AuthToken},
};

/// Membership authority capability: "is this public key currently a
/// trusted member?"
///
/// Supplied by the verifying service, typically backed by an on-chain
/// registry or a refreshed cache; retry and caching policy belong to the
/// implementation, not to the validator. The full claims are passed along
/// so providers that key trust on the optional extension identifiers
/// (`peer_id`, `environment`) can consult them.
#[async_trait]
pub trait TrustProvider: Send + Sync + fmt::Debug {
    /// Whether `public_key` (raw scheme encoding, as embedded in the
    /// token) is currently a member in good standing.
    ///
    /// An `Err` means the question could not be answered, which the
    /// pipeline surfaces as
    /// [`AuthError::TrustCheckFailed`] — never as "trusted".
    async fn is_trusted(&self, public_key: &[u8], claims: &AuthClaims) -> anyhow::Result<bool>;
}

/// Verifies request-bound identity tokens.
///
/// Stateless per call; one validator may serve arbitrarily many concurrent
/// authentications without coordination.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    trust: Arc<dyn TrustProvider>,
    leeway: chrono::Duration,
}

impl TokenValidator {
    /// Create a validator with zero leeway (strict clocks).
    pub fn new(trust: Arc<dyn TrustProvider>) -> Self {
        Self {
            trust,
            leeway: chrono::Duration::zero(),
        }
    }

    /// Tolerate up to `leeway` of clock skew, applied symmetrically to
    /// `issued_at` (future-dated tolerance) and `expires_at` (past-dated
    /// tolerance) as an inclusive boundary shift. Last call wins.
    ///
    /// Configurable rather than hardcoded because deployments differ in
    /// clock-sync guarantees; a global constant would be either unsafe for
    /// poorly-synced fleets or needlessly permissive for well-synced ones.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = chrono::Duration::from_std(leeway).unwrap_or(chrono::Duration::MAX);
        self
    }

    /// Authenticate `token` against the request it claims to authorize.
    ///
    /// On success returns the parsed claims for application-level use
    /// (e.g. logging the authenticated identity).
    ///
    /// # Errors
    /// One [`AuthError`] kind per failed stage; see the module docs for
    /// the stage order.
    pub async fn authenticate<R: CanonicalRequest + ?Sized>(
        &self,
        token: &str,
        request: &R,
    ) -> Result<AuthClaims> {
        self.authenticate_at(token, request, Utc::now()).await
    }

    /// Authenticate against an explicit instant instead of the system
    /// clock. Used by tests and tooling; production callers want
    /// [`authenticate`](Self::authenticate).
    pub async fn authenticate_at<R: CanonicalRequest + ?Sized>(
        &self,
        token: &str,
        request: &R,
        now: DateTime<Utc>,
    ) -> Result<AuthClaims> {
        match self.run_pipeline(token, request, now).await {
            Ok(claims) => {
                debug!(identity = %claims.public_key, "authenticated request-bound token");
                Ok(claims)
            }
            Err(err) => {
                if err.is_security_significant() {
                    warn!(category = err.category(), error = %err, "rejected auth token");
                } else {
                    debug!(category = err.category(), error = %err, "rejected auth token");
                }
                Err(err)
            }
        }
    }

    async fn run_pipeline<R: CanonicalRequest + ?Sized>(
        &self,
        token: &str,
        request: &R,
        now: DateTime<Utc>,
    ) -> Result<AuthClaims> {
        // Stage 1: decode without trusting any field.
        let token = AuthToken::parse(token)?;
        let scheme = token.header.alg;

        // Stage 2: the embedded key must be a well-formed key of the
        // declared scheme before anything is verified against it.
        let public_key = scheme.decode_public_key(&token.claims.public_key)?;

        // Stage 3: signature over the exact received bytes, against the
        // embedded key. Claims are untrusted until this passes.
        scheme.verify(&public_key, token.signing_input(), token.signature())?;

        // Stage 4: validity window with symmetric, inclusive leeway.
        self.check_time(&token.claims, now)?;

        // Stage 5: the token must bind to this request, not merely to
        // some validly-signed request.
        let expected = RequestDigest::compute(request).to_hex();
        if !constant_time_eq(&expected, &token.claims.digest) {
            return Err(AuthError::DigestMismatch);
        }

        // Stage 6: membership. Last because it is the only stage with I/O
        // and the only time-varying answer.
        let trusted = self
            .trust
            .is_trusted(&public_key, &token.claims)
            .await
            .map_err(|e| AuthError::TrustCheckFailed {
                reason: format!("{e:#}"),
            })?;
        if !trusted {
            return Err(AuthError::UnauthorizedIdentity {
                public_key: token.claims.public_key.clone(),
            });
        }

        Ok(token.claims)
    }

    fn check_time(&self, claims: &AuthClaims, now: DateTime<Utc>) -> Result<()> {
        // A leeway that shifts a boundary past the representable instant
        // range puts that boundary at infinity: the check passes.
        if let Some(issue_limit) = now.checked_add_signed(self.leeway) {
            if claims.issued_at > issue_limit {
                return Err(AuthError::TokenNotCurrentlyValid {
                    cause: ValidityCause::NotYetValid,
                });
            }
        }
        if let Some(expiry_limit) = now.checked_sub_signed(self.leeway) {
            if claims.expires_at < expiry_limit {
                return Err(AuthError::TokenNotCurrentlyValid {
                    cause: ValidityCause::Expired,
                });
            }
        }
        Ok(())
    }
}
