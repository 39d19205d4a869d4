//! ID token signing and verification.
//!
//! Tokens are compact JWS strings (`header.payload.signature`, base64url) with
//! the Firebase ID token claim layout: `sub` is the account uid, `aud` the
//! project id, and `iss` `https://securetoken.google.com/<project id>`.
//! Signatures are HMAC-SHA256 with the deployment's shared secret.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::ServiceError;

/// JWT header (always HS256).
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Allowed clock skew for `iat`, in seconds.
pub const CLOCK_SKEW_SECS: u64 = 300;

/// Default lifetime of tokens issued by [`sign_id_token`] helpers: 1 hour.
pub const TOKEN_EXPIRY_SECS: u64 = 3600;

/// Issuer prefix used by Firebase ID tokens.
pub const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Claims carried by an ID token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Custom claim; `"teacher"` grants teacher rights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl IdTokenClaims {
    /// Claims for `sub` valid for [`TOKEN_EXPIRY_SECS`] from `now_unix`.
    pub fn new(sub: impl Into<String>, project_id: Option<&str>, now_unix: u64) -> Self {
        Self {
            sub: sub.into(),
            iat: now_unix,
            exp: now_unix + TOKEN_EXPIRY_SECS,
            aud: project_id.map(str::to_string),
            iss: project_id.map(|p| format!("{ISSUER_PREFIX}{p}")),
            email: None,
            name: None,
            role: None,
        }
    }
}

/// Sign claims into a compact token.
pub fn sign_id_token(claims: &IdTokenClaims, secret: &str) -> Result<String, ServiceError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());
    let payload = serde_json::to_vec(claims)
        .map_err(|e| ServiceError::Internal(format!("encode claims: {e}")))?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Verify a token and return its claims.
///
/// When `project_id` is set, `aud` and `iss` must match it.
pub fn verify_id_token(
    token: &str,
    secret: &str,
    project_id: Option<&str>,
    now_unix: u64,
) -> Result<IdTokenClaims, ServiceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ServiceError::Unauthorized("invalid token format".into()));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| ServiceError::Unauthorized("invalid token header encoding".into()))?;
    let header: serde_json::Value = serde_json::from_slice(&header_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid token header".into()))?;
    if header["alg"].as_str() != Some("HS256") {
        return Err(ServiceError::Unauthorized("unsupported token algorithm".into()));
    }

    // Verify signature
    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let expected_sig = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let actual_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| ServiceError::Unauthorized("invalid token signature encoding".into()))?;

    if !constant_time_eq(&expected_sig, &actual_sig) {
        return Err(ServiceError::Unauthorized("invalid token signature".into()));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| ServiceError::Unauthorized("invalid token payload encoding".into()))?;
    let claims: IdTokenClaims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid token payload".into()))?;

    if now_unix >= claims.exp {
        return Err(ServiceError::Unauthorized("token expired".into()));
    }
    if claims.iat > now_unix + CLOCK_SKEW_SECS {
        return Err(ServiceError::Unauthorized("token issued in the future".into()));
    }
    if claims.sub.is_empty() || claims.sub.len() > 128 {
        return Err(ServiceError::Unauthorized("invalid token subject".into()));
    }

    if let Some(project) = project_id {
        if claims.aud.as_deref() != Some(project) {
            return Err(ServiceError::Unauthorized("token audience mismatch".into()));
        }
        let expected_iss = format!("{ISSUER_PREFIX}{project}");
        if claims.iss.as_deref() != Some(expected_iss.as_str()) {
            return Err(ServiceError::Unauthorized("token issuer mismatch".into()));
        }
    }

    Ok(claims)
}

// ── Internal ────────────────────────────────────────────────────────────────

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
