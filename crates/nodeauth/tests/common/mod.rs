//! Shared fixtures for the integration tests: request types and mock
//! trust providers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use nodeauth::{AuthClaims, CanonicalRequest, TrustProvider};

/// Minimal request type relying on the Debug canonicalization fallback.
#[derive(Debug)]
pub struct Echo {
    pub field: &'static str,
}

impl CanonicalRequest for Echo {}

/// Trust provider over a fixed membership set, recording every query so
/// tests can assert exactly which key was checked.
#[derive(Debug, Default)]
pub struct StaticTrustProvider {
    trusted: HashSet<Vec<u8>>,
    pub queries: Mutex<Vec<Vec<u8>>>,
}

impl StaticTrustProvider {
    pub fn trusting(keys: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            trusted: keys.into_iter().collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_all() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrustProvider for StaticTrustProvider {
    async fn is_trusted(&self, public_key: &[u8], _claims: &AuthClaims) -> anyhow::Result<bool> {
        self.queries
            .lock()
            .expect("queries lock poisoned")
            .push(public_key.to_vec());
        Ok(self.trusted.contains(public_key))
    }
}

/// Trust provider whose backing lookup is down.
#[derive(Debug)]
pub struct UnreachableTrustProvider;

#[async_trait]
impl TrustProvider for UnreachableTrustProvider {
    async fn is_trusted(&self, _public_key: &[u8], _claims: &AuthClaims) -> anyhow::Result<bool> {
        anyhow::bail!("registry lookup timed out")
    }
}
