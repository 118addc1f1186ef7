//! Identity signing capability
//!
//! The generator never touches private key material. It consumes an
//! [`IdentitySigner`]: "sign these bytes with my identity key", plus the
//! declared public key and scheme. The capability is held only by the
//! issuing process and never crosses the validation boundary; a signer
//! backed by a remote service (KMS, threshold signer) implements the same
//! trait.
//!
//! Two local implementations are provided, one per supported scheme, for
//! hosts whose identity key lives in-process.

use std::fmt;

use async_trait::async_trait;
use rand::rngs::OsRng;
use signature::Signer as _;

use crate::types::SignatureScheme;

/// Capability to sign arbitrary bytes with a node's identity key.
///
/// Signing may involve I/O (e.g. a remote signing service); failures are
/// opaque to the token layer and surface as
/// [`AuthError::SigningFailed`](crate::AuthError::SigningFailed) with the
/// cause preserved.
#[async_trait]
pub trait IdentitySigner: Send + Sync + fmt::Debug {
    /// Scheme the produced signatures verify under.
    fn scheme(&self) -> SignatureScheme;

    /// Public half of the identity key, in the scheme's raw encoding
    /// (32 bytes for Ed25519, 33-byte compressed SEC1 for secp256k1).
    fn public_key(&self) -> &[u8];

    /// Sign `message` with the private identity key.
    async fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// In-process Ed25519 identity signer.
pub struct Ed25519Signer {
    signing_key: ed25519_dalek::SigningKey,
    public_key: Vec<u8>,
}

impl Ed25519Signer {
    /// Generate a fresh identity key from the OS RNG.
    pub fn generate() -> Self {
        Self::from_signing_key(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Build a signer from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: ed25519_dalek::SigningKey) -> Self {
        let public_key = signing_key.verifying_key().to_bytes().to_vec();
        Self {
            signing_key,
            public_key,
        }
    }
}

#[async_trait]
impl IdentitySigner for Ed25519Signer {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ed25519
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    async fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>> {
        let sig: ed25519_dalek::Signature = self.signing_key.sign(message);
        Ok(sig.to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private material.
        f.debug_struct("Ed25519Signer")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// In-process secp256k1 ECDSA identity signer.
///
/// Emits 64-byte fixed signatures; the verifier additionally accepts the
/// 65-byte recoverable form produced by on-chain signing stacks.
pub struct Secp256k1Signer {
    signing_key: k256::ecdsa::SigningKey,
    public_key: Vec<u8>,
}

impl Secp256k1Signer {
    /// Generate a fresh identity key from the OS RNG.
    pub fn generate() -> Self {
        Self::from_signing_key(k256::ecdsa::SigningKey::random(&mut OsRng))
    }

    /// Build a signer from a 32-byte secp256k1 scalar.
    ///
    /// # Errors
    /// Fails if the bytes are not a valid non-zero scalar.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let signing_key = k256::ecdsa::SigningKey::from_slice(bytes)
            .map_err(|e| anyhow::anyhow!("invalid secp256k1 private key: {e}"))?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: k256::ecdsa::SigningKey) -> Self {
        let public_key = signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        Self {
            signing_key,
            public_key,
        }
    }
}

#[async_trait]
impl IdentitySigner for Secp256k1Signer {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Secp256k1
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    async fn sign(&self, message: &[u8]) -> anyhow::Result<Vec<u8>> {
        let sig: k256::ecdsa::Signature = self.signing_key.sign(message);
        Ok(sig.to_bytes().to_vec())
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ed25519_signatures_verify_under_declared_scheme() {
        let signer = Ed25519Signer::generate();
        assert_eq!(signer.public_key().len(), 32);

        let sig = signer.sign(b"message").await.unwrap();
        assert_eq!(sig.len(), 64);
        signer
            .scheme()
            .verify(signer.public_key(), b"message", &sig)
            .unwrap();
        assert!(
            signer
                .scheme()
                .verify(signer.public_key(), b"other", &sig)
                .is_err()
        );
    }

    #[tokio::test]
    async fn secp256k1_signatures_verify_under_declared_scheme() {
        let signer = Secp256k1Signer::generate();
        assert_eq!(signer.public_key().len(), 33);

        let sig = signer.sign(b"message").await.unwrap();
        assert_eq!(sig.len(), 64);
        signer
            .scheme()
            .verify(signer.public_key(), b"message", &sig)
            .unwrap();
    }

    #[tokio::test]
    async fn secp256k1_recoverable_form_is_accepted() {
        let signer = Secp256k1Signer::generate();
        let mut sig = signer.sign(b"message").await.unwrap();
        sig.push(1); // recovery id byte
        signer
            .scheme()
            .verify(signer.public_key(), b"message", &sig)
            .unwrap();
    }

    #[test]
    fn seed_construction_is_deterministic() {
        let a = Ed25519Signer::from_seed(&[7u8; 32]);
        let b = Ed25519Signer::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    #[test]
    fn debug_redacts_private_material() {
        let signer = Ed25519Signer::generate();
        let rendered = format!("{signer:?}");
        assert!(rendered.contains(&hex::encode(signer.public_key())));
        assert!(!rendered.contains("signing_key"));
    }
}
