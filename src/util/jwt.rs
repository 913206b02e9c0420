//! Unverified JWT payload inspection.
//!
//! The browser never holds the signing key, so claims decoded here are only
//! routing and display hints. The backend stays authoritative. Every helper
//! fails closed: a token that cannot be decoded counts as expired.

#[cfg(test)]
#[path = "jwt_test.rs"]
mod jwt_test;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer};

use crate::net::types::{Role, SessionUser, deserialize_opt_id};

/// Claims carried in the token payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct JwtClaims {
    /// Subject; the backend puts the username here.
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(rename = "userId", default, deserialize_with = "deserialize_opt_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_role")]
    pub role: Option<Role>,
    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_opt_secs")]
    pub iat: Option<i64>,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default, deserialize_with = "deserialize_opt_secs")]
    pub exp: Option<i64>,
}

impl JwtClaims {
    /// Build a session identity from the claims alone.
    pub fn to_user(&self) -> Option<SessionUser> {
        let username = self.sub.clone().filter(|s| !s.is_empty())?;
        Some(SessionUser { id: self.user_id.clone(), username, role: self.role.unwrap_or_default() })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Shape(usize),
    #[error("token payload is not base64url: {0}")]
    Encoding(String),
    #[error("token payload is not a JSON object: {0}")]
    Payload(String),
}

/// Whether `token` looks like a compact JWS (`header.payload.signature`).
pub fn has_valid_shape(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && !parts[1].is_empty()
}

/// Decode the middle segment without verifying the signature.
///
/// # Errors
///
/// Returns [`TokenError`] if the token is not three segments, the payload is
/// not base64url, or the decoded bytes are not a JSON claims object.
pub fn decode_claims(token: &str) -> Result<JwtClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts[1].is_empty() {
        return Err(TokenError::Shape(parts.len()));
    }
    // Accept padded input and the standard alphabet as well.
    let normalized: String = parts[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Whether the token is expired at `now` (seconds). Undecodable tokens and
/// tokens without `exp` are expired.
pub fn is_expired(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(JwtClaims { exp: Some(exp), .. }) => now >= exp,
        Ok(_) => {
            log::warn!("jwt: token has no exp claim");
            true
        }
        Err(e) => {
            log::warn!("jwt: {e}");
            true
        }
    }
}

/// Seconds until expiry, clamped at zero.
pub fn remaining_seconds(token: &str, now: i64) -> i64 {
    decode_claims(token)
        .ok()
        .and_then(|claims| claims.exp)
        .map_or(0, |exp| exp.saturating_sub(now).max(0))
}

/// Human-readable remaining lifetime: `2h 5m`, `12m`, `40s` or `expired`.
pub fn format_remaining(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired".to_owned();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// Snapshot of a token's claims for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDebugInfo {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub remaining_seconds: i64,
    pub expired: bool,
}

pub fn debug_info(token: &str, now: i64) -> Option<TokenDebugInfo> {
    let claims = decode_claims(token).ok()?;
    let remaining = claims.exp.map_or(0, |exp| exp.saturating_sub(now));
    Some(TokenDebugInfo {
        username: claims.sub,
        user_id: claims.user_id,
        role: claims.role,
        issued_at: claims.iat,
        expires_at: claims.exp,
        remaining_seconds: remaining,
        expired: claims.exp.is_none_or(|exp| now >= exp),
    })
}

/// Token prefix that is safe to write to the console.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}

/// Some issuers emit `role` as a list; the first entry wins.
fn deserialize_opt_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(Role::parse(&s)),
        serde_json::Value::Array(items) => items.first().and_then(|v| v.as_str()).map(Role::parse),
        _ => None,
    })
}

fn deserialize_opt_secs<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(Some(int));
            }
            #[allow(clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
            {
                return Ok(Some(float.floor() as i64));
            }
            Err(D::Error::custom("expected integer-compatible number"))
        }
        _ => Err(D::Error::custom("expected number")),
    }
}
