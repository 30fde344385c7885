use std::collections::BTreeMap;

use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::{alphabet, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::TokenDecodeFailure;
use crate::utils::value::value_to_string;

/// URL-safe alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims carried in the payload segment of a session token.
///
/// The signature is never checked: these values are for display only and
/// the server remains the authority on what the token grants.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub upn: Option<String>,
    pub groups: Option<Vec<String>>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
    /// Any additional claim fields we don't explicitly model.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|iat| DateTime::from_timestamp(iat, 0))
    }

    /// A token without an `exp` claim never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    /// Extra claims flattened to display strings.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.extra
            .iter()
            .map(|(key, value)| (key.clone(), value_to_string(value.clone())))
            .collect()
    }
}

/// Read the claims out of a token without verifying it.
///
/// Fails silently: anything malformed yields `None` and a warning in the logs.
pub fn decode_token(token: &str) -> Option<TokenClaims> {
    match try_decode_token(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            warn!("Error parsing token: {}", e);
            None
        }
    }
}

fn try_decode_token(token: &str) -> Result<TokenClaims, TokenDecodeFailure> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenDecodeFailure::MissingPayload)?;

    // Tolerate the standard alphabet as well.
    let normalized = payload.replace('+', "-").replace('/', "_");
    let bytes = PAYLOAD_ENGINE.decode(normalized)?;
    Ok(serde_json::from_slice(&bytes)?)
}
