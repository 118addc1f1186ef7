//! End-to-end issuance and validation across both signing schemes.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use nodeauth::{
    AUTHORIZATION_METADATA_KEY, AuthError, Ed25519Signer, IdentitySigner, Secp256k1Signer,
    TokenGenerator, TokenValidator, attach_bearer, extract_bearer_from,
};
use pretty_assertions::assert_eq;

use common::{Echo, StaticTrustProvider};

fn pipeline_for(signer: Arc<dyn IdentitySigner>) -> (TokenGenerator, TokenValidator) {
    let trust = StaticTrustProvider::trusting([signer.public_key().to_vec()]);
    (
        TokenGenerator::new(signer),
        TokenValidator::new(Arc::new(trust)),
    )
}

#[tokio::test]
async fn round_trip_ed25519() {
    let signer = Arc::new(Ed25519Signer::generate());
    let expected_key = hex::encode(signer.public_key());
    let (generator, validator) = pipeline_for(signer);

    let request = Echo { field: "ping" };
    let token = generator.create_token(&request).await.unwrap();
    let claims = validator.authenticate(&token, &request).await.unwrap();

    assert_eq!(claims.public_key, expected_key);
    assert_eq!(claims.issuer, expected_key);
    assert_eq!(claims.subject, expected_key);
}

#[tokio::test]
async fn round_trip_secp256k1() {
    let signer = Arc::new(Secp256k1Signer::generate());
    let expected_key = hex::encode(signer.public_key());
    let (generator, validator) = pipeline_for(signer);

    let request = Echo { field: "ping" };
    let token = generator.create_token(&request).await.unwrap();
    let claims = validator.authenticate(&token, &request).await.unwrap();

    assert_eq!(claims.public_key, expected_key);
}

/// Signer S issues a token for `{field: "ping"}` at time T with a
/// 5-minute lifetime; a zero-leeway validator trusting S, called at
/// T+30s on the same request, accepts and surfaces hex(PK).
#[tokio::test]
async fn accepts_within_lifetime_at_explicit_instant() {
    let signer = Arc::new(Ed25519Signer::generate());
    let expected_key = hex::encode(signer.public_key());
    let (generator, validator) = pipeline_for(signer);

    let issued_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let request = Echo { field: "ping" };
    let token = generator.create_token_at(&request, issued_at).await.unwrap();

    let claims = validator
        .authenticate_at(&token, &request, issued_at + chrono::Duration::seconds(30))
        .await
        .unwrap();

    assert_eq!(claims.public_key, expected_key);
    assert_eq!(
        claims.expires_at - claims.issued_at,
        chrono::Duration::minutes(5)
    );
}

/// The same token replayed against a different request is rejected by the
/// digest binding.
#[tokio::test]
async fn replay_against_other_request_is_digest_mismatch() {
    let signer = Arc::new(Ed25519Signer::generate());
    let (generator, validator) = pipeline_for(signer);

    let token = generator
        .create_token(&Echo { field: "ping" })
        .await
        .unwrap();
    let err = validator
        .authenticate(&token, &Echo { field: "pong" })
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::DigestMismatch));
}

#[tokio::test]
async fn trust_provider_sees_exactly_the_embedded_key() {
    let signer = Arc::new(Ed25519Signer::generate());
    let raw_key = signer.public_key().to_vec();
    let trust = Arc::new(StaticTrustProvider::trusting([raw_key.clone()]));
    let generator = TokenGenerator::new(signer);
    let validator = TokenValidator::new(trust.clone());

    let request = Echo { field: "ping" };
    let token = generator.create_token(&request).await.unwrap();
    validator.authenticate(&token, &request).await.unwrap();

    let queries = trust.queries.lock().unwrap();
    assert_eq!(queries.as_slice(), &[raw_key]);
}

#[tokio::test]
async fn extension_claims_reach_the_trust_provider() {
    let signer = Arc::new(Ed25519Signer::generate());
    let trust = Arc::new(StaticTrustProvider::trusting([signer
        .public_key()
        .to_vec()]));
    let generator = TokenGenerator::new(signer)
        .with_peer_id("12D3KooWExample")
        .with_environment("testnet");
    let validator = TokenValidator::new(trust);

    let request = Echo { field: "ping" };
    let token = generator.create_token(&request).await.unwrap();
    let claims = validator.authenticate(&token, &request).await.unwrap();

    assert_eq!(claims.peer_id.as_deref(), Some("12D3KooWExample"));
    assert_eq!(claims.environment.as_deref(), Some("testnet"));
}

/// The full carriage contract: token rides the `authorization` metadata
/// entry as a bearer credential and validates on the far side.
#[tokio::test]
async fn bearer_carriage_round_trip() {
    let signer = Arc::new(Ed25519Signer::generate());
    let (generator, validator) = pipeline_for(signer);

    let request = Echo { field: "ping" };
    let token = generator.create_token(&request).await.unwrap();

    let mut metadata = HashMap::new();
    metadata.insert(AUTHORIZATION_METADATA_KEY.to_string(), attach_bearer(&token));

    let received = extract_bearer_from(Some(&metadata)).unwrap();
    validator.authenticate(received, &request).await.unwrap();
}
