//! Bearer carriage over request metadata
//!
//! The token travels as a bearer credential in call metadata, under the
//! `authorization` key with a `Bearer ` prefix. This module is the
//! transport-facing edge of the protocol, not a pipeline stage: missing
//! metadata, a missing entry, and a wrong prefix are distinguishable
//! conditions so the receiving side can log them apart.

use std::collections::HashMap;

use crate::{Result, errors::AuthError};

/// Metadata key the token is carried under.
pub const AUTHORIZATION_METADATA_KEY: &str = "authorization";

/// Required prefix of the authorization value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Format a token string as the outgoing authorization value.
pub fn attach_bearer(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Extract the token string from an authorization value, if one was
/// present.
///
/// # Errors
/// [`AuthError::AuthorizationMissing`] when `value` is `None`,
/// [`AuthError::InvalidBearerPrefix`] when the `Bearer ` prefix is absent.
pub fn extract_bearer(value: Option<&str>) -> Result<&str> {
    let value = value.ok_or(AuthError::AuthorizationMissing)?;
    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidBearerPrefix)
}

/// Extract the token string from a request's metadata map.
///
/// # Errors
/// [`AuthError::MetadataMissing`] when the request carried no metadata at
/// all; otherwise as [`extract_bearer`].
pub fn extract_bearer_from(metadata: Option<&HashMap<String, String>>) -> Result<&str> {
    let metadata = metadata.ok_or(AuthError::MetadataMissing)?;
    extract_bearer(metadata.get(AUTHORIZATION_METADATA_KEY).map(String::as_str))
}
