//! Token generation
//!
//! Builds the claims for one specific outgoing request, signs them through
//! the host-supplied [`IdentitySigner`] capability, and returns the
//! encoded token string. Stateless per call: a generator may be shared
//! freely across tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    DEFAULT_TOKEN_LIFETIME, Result,
    digest::{CanonicalRequest, RequestDigest},
    errors::AuthError,
    signer::IdentitySigner,
    types::{self, AuthClaims, TokenHeader},
};

/// Issues request-bound identity tokens.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    signer: Option<Arc<dyn IdentitySigner>>,
    token_lifetime: chrono::Duration,
    peer_id: Option<String>,
    environment: Option<String>,
}

impl TokenGenerator {
    /// Create a generator issuing tokens signed by `signer`, with the
    /// default lifetime of [`DEFAULT_TOKEN_LIFETIME`].
    pub fn new(signer: Arc<dyn IdentitySigner>) -> Self {
        Self {
            signer: Some(signer),
            token_lifetime: lifetime_from_std(DEFAULT_TOKEN_LIFETIME),
            peer_id: None,
            environment: None,
        }
    }

    /// Create a generator with no signer wired in.
    ///
    /// Hosts that run with outbound auth disabled keep the same call
    /// sites; every [`create_token`](Self::create_token) call then fails
    /// with [`AuthError::NoSignerConfigured`].
    pub fn disabled() -> Self {
        Self {
            signer: None,
            token_lifetime: lifetime_from_std(DEFAULT_TOKEN_LIFETIME),
            peer_id: None,
            environment: None,
        }
    }

    /// Override the token lifetime. Short lifetimes are the point: the
    /// token authorizes one call, not a session. Last call wins.
    #[must_use]
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime_from_std(lifetime);
        self
    }

    /// Include a network peer identifier in every issued token's claims.
    /// Last call wins.
    #[must_use]
    pub fn with_peer_id(mut self, peer_id: impl Into<String>) -> Self {
        self.peer_id = Some(peer_id.into());
        self
    }

    /// Include an environment tag in every issued token's claims. Last
    /// call wins.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Issue a token authorizing exactly `request`, valid from now.
    ///
    /// # Errors
    /// [`AuthError::NoSignerConfigured`] if built via
    /// [`disabled`](Self::disabled); [`AuthError::SigningFailed`] if the
    /// signer capability fails.
    pub async fn create_token<R: CanonicalRequest + ?Sized>(
        &self,
        request: &R,
    ) -> Result<String> {
        self.create_token_at(request, Utc::now()).await
    }

    /// Issue a token with an explicit issuance instant.
    ///
    /// The validity window is `[issued_at, issued_at + lifetime]`. Used by
    /// tests and tooling that need a deterministic clock; production
    /// callers want [`create_token`](Self::create_token).
    pub async fn create_token_at<R: CanonicalRequest + ?Sized>(
        &self,
        request: &R,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let signer = self
            .signer
            .as_deref()
            .ok_or(AuthError::NoSignerConfigured)?;

        let digest = RequestDigest::compute(request);
        let public_key = hex::encode(signer.public_key());

        let claims = AuthClaims {
            issuer: public_key.clone(),
            subject: public_key.clone(),
            public_key,
            digest: digest.to_hex(),
            issued_at,
            // A lifetime past the representable instant range clamps the
            // expiry to the latest expressible timestamp.
            expires_at: issued_at
                .checked_add_signed(self.token_lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            peer_id: self.peer_id.clone(),
            environment: self.environment.clone(),
        };

        let header = TokenHeader::new(signer.scheme());
        let signing_input =
            types::signing_input(&header, &claims).map_err(|e| AuthError::SigningFailed {
                reason: format!("claims serialization failed: {e}"),
            })?;

        let signature = signer
            .sign(signing_input.as_bytes())
            .await
            .map_err(|e| AuthError::SigningFailed {
                reason: format!("{e:#}"),
            })?;

        debug!(
            scheme = %signer.scheme(),
            digest = %digest,
            expires_at = %claims.expires_at,
            "issued request-bound auth token"
        );

        Ok(types::assemble_token(&signing_input, &signature))
    }
}

fn lifetime_from_std(lifetime: Duration) -> chrono::Duration {
    chrono::Duration::from_std(lifetime).unwrap_or(chrono::Duration::MAX)
}
