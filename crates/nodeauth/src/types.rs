//! Core token types: signature schemes, header, claims, and the parsed
//! token form
//!
//! The token is a compact JWS-style string, `header.claims.signature`, each
//! part base64url-encoded without padding. The signed message is exactly
//! the ASCII bytes of `header.claims` as issued; [`AuthToken`] keeps that
//! signing input verbatim so verification never re-serializes (a
//! re-serialization could differ in field order and silently break the
//! signature check).

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use k256::ecdsa::VerifyingKey as Secp256k1VerifyingKey;
use serde::{Deserialize, Serialize};
use signature::Verifier as _;

use crate::{Result, TOKEN_TYPE, errors::AuthError};

/// Supported signing schemes, selected by the `alg` tag in the token
/// header.
///
/// Nodes in this ecosystem already hold an identity key for on-chain
/// purposes; the protocol consumes whichever scheme that key uses rather
/// than requiring a protocol-specific key. The validator is generic over
/// any scheme for which a verification rule exists here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureScheme {
    /// Ed25519 (RFC 8032), 32-byte public keys, 64-byte signatures
    #[serde(rename = "EdDSA")]
    Ed25519,

    /// ECDSA over secp256k1, 33-byte compressed SEC1 public keys, 64-byte
    /// fixed signatures (65-byte recoverable form accepted on verify)
    #[serde(rename = "ES256K")]
    Secp256k1,
}

impl SignatureScheme {
    /// Scheme tag as carried in the token header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "EdDSA",
            Self::Secp256k1 => "ES256K",
        }
    }

    /// Expected public key length in bytes.
    pub fn public_key_len(self) -> usize {
        match self {
            Self::Ed25519 => 32,
            Self::Secp256k1 => 33,
        }
    }

    /// Decode a hex-encoded public key and validate it is a well-formed
    /// key of this scheme.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidKeyEncoding`] for bad hex, wrong length,
    /// or bytes that do not decode to a valid curve point.
    pub fn decode_public_key(self, encoded: &str) -> Result<Vec<u8>> {
        let bytes = hex::decode(encoded).map_err(|e| AuthError::InvalidKeyEncoding {
            reason: format!("public key is not valid hex: {e}"),
        })?;

        if bytes.len() != self.public_key_len() {
            return Err(AuthError::InvalidKeyEncoding {
                reason: format!(
                    "{} public key must be {} bytes, got {}",
                    self.as_str(),
                    self.public_key_len(),
                    bytes.len()
                ),
            });
        }

        match self {
            Self::Ed25519 => {
                let raw: [u8; 32] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| AuthError::InvalidKeyEncoding {
                            reason: "Ed25519 public key must be 32 bytes".to_string(),
                        })?;
                Ed25519VerifyingKey::from_bytes(&raw).map_err(|e| {
                    AuthError::InvalidKeyEncoding {
                        reason: format!("invalid Ed25519 public key: {e}"),
                    }
                })?;
            }
            Self::Secp256k1 => {
                Secp256k1VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| {
                    AuthError::InvalidKeyEncoding {
                        reason: format!("invalid secp256k1 public key: {e}"),
                    }
                })?;
            }
        }

        Ok(bytes)
    }

    /// Verify `signature` over `message` against `public_key` using this
    /// scheme's verification rule.
    ///
    /// For secp256k1, a 65-byte recoverable signature (`[R || S || V]`) is
    /// accepted by ignoring the trailing recovery id.
    ///
    /// # Errors
    /// Returns [`AuthError::SignatureInvalid`] if the signature does not
    /// verify, [`AuthError::InvalidKeyEncoding`] if the key bytes are not a
    /// valid key of this scheme.
    pub fn verify(self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            Self::Ed25519 => {
                let raw: [u8; 32] =
                    public_key
                        .try_into()
                        .map_err(|_| AuthError::InvalidKeyEncoding {
                            reason: format!(
                                "Ed25519 public key must be 32 bytes, got {}",
                                public_key.len()
                            ),
                        })?;
                let key = Ed25519VerifyingKey::from_bytes(&raw).map_err(|e| {
                    AuthError::InvalidKeyEncoding {
                        reason: format!("invalid Ed25519 public key: {e}"),
                    }
                })?;
                let sig = ed25519_dalek::Signature::from_slice(signature)
                    .map_err(|_| AuthError::SignatureInvalid)?;
                key.verify(message, &sig)
                    .map_err(|_| AuthError::SignatureInvalid)
            }
            Self::Secp256k1 => {
                let key = Secp256k1VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
                    AuthError::InvalidKeyEncoding {
                        reason: format!("invalid secp256k1 public key: {e}"),
                    }
                })?;
                // Recoverable signatures carry a recovery id byte after R || S.
                let compact = match signature.len() {
                    65 => &signature[..64],
                    _ => signature,
                };
                let sig = k256::ecdsa::Signature::from_slice(compact)
                    .map_err(|_| AuthError::SignatureInvalid)?;
                key.verify(message, &sig)
                    .map_err(|_| AuthError::SignatureInvalid)
            }
        }
    }
}

impl std::fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token header: type tag plus the signing scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Always [`TOKEN_TYPE`]
    pub typ: String,

    /// Scheme the signature must be verified under
    pub alg: SignatureScheme,
}

impl TokenHeader {
    /// Header for a token signed under `scheme`.
    pub fn new(scheme: SignatureScheme) -> Self {
        Self {
            typ: TOKEN_TYPE.to_string(),
            alg: scheme,
        }
    }
}

/// The signed token payload.
///
/// Created fresh for every outgoing call and discarded once the call
/// completes; the digest binding makes reuse a validation failure at the
/// receiver. Validation only inspects claims, never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Canonical identifier of the issuing identity. Tokens are
    /// self-issued, so this is the hex-encoded public key itself.
    #[serde(rename = "iss")]
    pub issuer: String,

    /// Same identifier as [`issuer`](Self::issuer); the token describes
    /// its own subject.
    #[serde(rename = "sub")]
    pub subject: String,

    /// Hex-encoded public key of the signer. The signature is verified
    /// against this embedded key, never a separately-supplied one.
    pub public_key: String,

    /// Hex-encoded SHA-256 digest of the one request this token
    /// authorizes.
    pub digest: String,

    /// Issuance instant, millisecond precision.
    #[serde(rename = "iat", with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiry instant, millisecond precision. Lifetimes are short by
    /// design: the token authorizes one call, not a session.
    #[serde(rename = "exp", with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Optional network peer identifier for deployments whose trust check
    /// needs more than the public key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peer_id: Option<String>,

    /// Optional environment tag, same purpose as
    /// [`peer_id`](Self::peer_id).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub environment: Option<String>,
}

/// A parsed token: decoded header and claims plus the exact bytes the
/// signature covers.
///
/// Parsing trusts nothing; every field is unverified until the validator
/// pipeline has passed it.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Decoded header
    pub header: TokenHeader,

    /// Decoded claims
    pub claims: AuthClaims,

    /// `b64url(header).b64url(claims)` exactly as received
    signing_input: String,

    /// Decoded signature bytes
    signature: Vec<u8>,
}

impl AuthToken {
    /// Decode a token string into header, claims, and signature without
    /// verifying anything.
    ///
    /// # Errors
    /// Every structural failure — wrong part count, bad base64, bad JSON,
    /// wrong `typ` — is [`AuthError::MalformedToken`].
    pub fn parse(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let (encoded_header, encoded_claims, encoded_signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => {
                    return Err(AuthError::MalformedToken {
                        reason: "expected three dot-separated parts".to_string(),
                    });
                }
            };

        let header_json = decode_part(encoded_header, "header")?;
        let header: TokenHeader =
            serde_json::from_slice(&header_json).map_err(|e| AuthError::MalformedToken {
                reason: format!("invalid header: {e}"),
            })?;

        if header.typ != TOKEN_TYPE {
            return Err(AuthError::MalformedToken {
                reason: format!("invalid typ: expected {TOKEN_TYPE:?}, got {:?}", header.typ),
            });
        }

        let claims_json = decode_part(encoded_claims, "claims")?;
        let claims: AuthClaims =
            serde_json::from_slice(&claims_json).map_err(|e| AuthError::MalformedToken {
                reason: format!("invalid claims: {e}"),
            })?;

        let signature = decode_part(encoded_signature, "signature")?;

        Ok(Self {
            header,
            claims,
            signing_input: format!("{encoded_header}.{encoded_claims}"),
            signature,
        })
    }

    /// The exact bytes the signature covers.
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Serialize header and claims into the signing input,
/// `b64url(header).b64url(claims)`.
pub(crate) fn signing_input(
    header: &TokenHeader,
    claims: &AuthClaims,
) -> serde_json::Result<String> {
    let header_json = serde_json::to_string(header)?;
    let claims_json = serde_json::to_string(claims)?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    ))
}

/// Assemble the final token string from a signing input and signature.
pub(crate) fn assemble_token(signing_input: &str, signature: &[u8]) -> String {
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
}

fn decode_part(encoded: &str, part: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| AuthError::MalformedToken {
            reason: format!("invalid base64url in {part}: {e}"),
        })
}
