use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::MIN_SECRET_LEN;

type HmacSha256 = Hmac<Sha256>;

/// Who a session cookie says the caller is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub person_id: String,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionClaims {
    person_id: String,
    username: String,
    /// Unix seconds.
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionKeyError {
    #[error("session secret must be at least {MIN_SECRET_LEN} bytes")]
    TooShort,
}

/// Signs and verifies session tokens.
///
/// A token is `base64url(claims JSON) . base64url(HMAC-SHA256(claims JSON))`.
/// Both halves use the URL-safe alphabet without padding, so the token can sit
/// in a cookie value unquoted.
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    ttl: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, SessionKeyError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionKeyError::TooShort);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionKeyError::TooShort)?;
        Ok(Self { mac, ttl })
    }

    pub fn encode(&self, identity: &SessionIdentity) -> String {
        self.encode_at(identity, Utc::now())
    }

    pub fn encode_at(&self, identity: &SessionIdentity, issued_at: DateTime<Utc>) -> String {
        let claims = SessionClaims {
            person_id: identity.person_id.clone(),
            username: identity.username.clone(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        // Serializing two strings and an integer cannot fail
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let signature = self.sign(&json);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&json),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// `None` for anything that isn't an unexpired token signed with our key.
    pub fn decode(&self, token: &str) -> Option<SessionIdentity> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionIdentity> {
        let (payload_b64, signature_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = self.mac.clone();
        mac.update(&payload);
        mac.verify_slice(&signature).ok()?;

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if claims.exp <= now.timestamp() {
            return None;
        }

        Some(SessionIdentity {
            person_id: claims.person_id,
            username: claims.username,
        })
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
