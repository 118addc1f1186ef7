//! # nodeauth - request-scoped identity tokens for operator-network nodes
//!
//! A node belonging to a decentralized operator network proves its
//! identity and binds that proof to one specific outgoing request, so a
//! receiving service can verify "this exact request was authorized by
//! this exact, currently-trusted identity, recently". Tokens are
//! self-issued, short-lived, and signed with the same asymmetric key the
//! node already uses for its on-chain identity — this is not an
//! OAuth/OIDC stack and not a session system.
//!
//! ## Architecture
//!
//! - `errors` - error taxonomy, one kind per failure cause
//! - `digest` - canonical request text and SHA-256 request binding
//! - `types` - signature schemes, header/claims model, token codec
//! - `signer` - the sign-bytes capability a node supplies, plus local
//!   Ed25519 and secp256k1 implementations
//! - `generator` - claims construction and signing ([`TokenGenerator`])
//! - `validator` - the staged verification pipeline ([`TokenValidator`])
//!   and the [`TrustProvider`] membership capability
//! - `bearer` - `authorization: Bearer ...` metadata carriage helpers
//!
//! ## Usage
//!
//! ```ignore
//! let generator = TokenGenerator::new(Arc::new(Ed25519Signer::generate()));
//! let token = generator.create_token(&request).await?;
//! // ... token travels in request metadata ...
//! let validator = TokenValidator::new(trust_provider)
//!     .with_leeway(Duration::from_secs(30));
//! let claims = validator.authenticate(&token, &request).await?;
//! ```

pub mod bearer;
pub mod digest;
pub mod errors;
pub mod generator;
pub mod signer;
pub mod types;
pub mod validator;

pub use bearer::{
    AUTHORIZATION_METADATA_KEY, BEARER_PREFIX, attach_bearer, extract_bearer, extract_bearer_from,
};
pub use digest::{CanonicalRequest, RequestDigest};
pub use errors::{AuthError, ValidityCause};
pub use generator::TokenGenerator;
pub use signer::{Ed25519Signer, IdentitySigner, Secp256k1Signer};
pub use types::{AuthClaims, AuthToken, SignatureScheme, TokenHeader};
pub use validator::{TokenValidator, TrustProvider};

/// Crate result type
pub type Result<T> = std::result::Result<T, AuthError>;

/// Token type tag carried in every header
pub const TOKEN_TYPE: &str = "nodeauth+jwt";

/// Default token lifetime (5 minutes) - a token authorizes one call, not
/// a session
pub const DEFAULT_TOKEN_LIFETIME: std::time::Duration =
    std::time::Duration::from_secs(5 * 60);
