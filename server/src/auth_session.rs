//! Signed session tokens, identifying an authenticated user of the managed backend
//!
//! After a successful password sign-in at the backend's auth service, we issue our own
//! [SessionToken] to the client (as cookie for the UI or in the `X-SESSION-TOKEN` header for the
//! API). The token is a base64-encoded JSON payload, signed with HMAC-SHA256 using the application
//! secret. It only carries the user id and the time of issuance; all authorization decisions are
//! made by the data store from the user's profile and event memberships.

use crate::data_store::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    #[serde(rename = "u")]
    user_id: UserId,
    /// Unix timestamp of the session creation (seconds)
    #[serde(rename = "t")]
    created_at: i64,
}

impl SessionToken {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Parse and verify a session token string, created by [Self::as_string] with the same
    /// `secret`.
    ///
    /// Tokens older than `max_age` are rejected with [SessionError::ExpiredToken].
    pub fn from_string(
        data: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload, signature) = data
            .split_once('.')
            .ok_or(SessionError::InvalidTokenStructure)?;
        let signature = BASE64
            .decode(signature)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, payload.as_bytes(), &signature)
            .map_err(|_| SessionError::SignatureVerificationFailed)?;
        let payload = BASE64
            .decode(payload)
            .map_err(|_| SessionError::InvalidTokenStructure)?;
        let token: SessionToken =
            serde_json::from_slice(&payload).map_err(|_| SessionError::InvalidTokenStructure)?;

        let age = chrono::Utc::now().timestamp() - token.created_at;
        if age < 0 || age as u64 > max_age.as_secs() {
            return Err(SessionError::ExpiredToken);
        }
        Ok(token)
    }

    /// Serialize and sign the session token for sending it to the client.
    pub fn as_string(&self, secret: &str) -> String {
        let payload = BASE64.encode(
            serde_json::to_vec(self).expect("Session token should be serializable as JSON"),
        );
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, payload.as_bytes());
        format!("{}.{}", payload, BASE64.encode(signature.as_ref()))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    InvalidTokenStructure,
    SignatureVerificationFailed,
    ExpiredToken,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidTokenStructure => f.write_str("invalid token structure"),
            SessionError::SignatureVerificationFailed => {
                f.write_str("token signature verification failed")
            }
            SessionError::ExpiredToken => f.write_str("session has expired"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::uuid;

    const SECRET: &str = "a-very-secret-string";
    const MAX_AGE: Duration = Duration::from_secs(3600);

    #[test]
    fn test_session_token_roundtrip() {
        let token = SessionToken::new(uuid!("0193a7c4-9d5e-7b1a-8f3c-2d4e6f8a0b1c"));
        let encoded = token.as_string(SECRET);
        let decoded = SessionToken::from_string(&encoded, SECRET, MAX_AGE).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(
            decoded.user_id(),
            uuid!("0193a7c4-9d5e-7b1a-8f3c-2d4e6f8a0b1c")
        );
    }

    #[test]
    fn test_session_token_wrong_secret() {
        let token = SessionToken::new(uuid::Uuid::now_v7());
        let encoded = token.as_string(SECRET);
        assert_eq!(
            SessionToken::from_string(&encoded, "another secret", MAX_AGE),
            Err(SessionError::SignatureVerificationFailed)
        );
    }

    #[test]
    fn test_session_token_tampered_payload() {
        let token = SessionToken::new(uuid::Uuid::now_v7());
        let encoded = token.as_string(SECRET);
        let (_payload, signature) = encoded.split_once('.').unwrap();
        let other_payload = BASE64.encode(
            serde_json::to_vec(&SessionToken::new(uuid::Uuid::now_v7())).unwrap(),
        );
        let forged = format!("{}.{}", other_payload, signature);
        assert_eq!(
            SessionToken::from_string(&forged, SECRET, MAX_AGE),
            Err(SessionError::SignatureVerificationFailed)
        );
        assert_eq!(
            SessionToken::from_string("garbage", SECRET, MAX_AGE),
            Err(SessionError::InvalidTokenStructure)
        );
    }

    #[test]
    fn test_session_token_expired() {
        let token = SessionToken {
            user_id: uuid::Uuid::now_v7(),
            created_at: chrono::Utc::now().timestamp() - 7200,
        };
        let encoded = token.as_string(SECRET);
        assert_eq!(
            SessionToken::from_string(&encoded, SECRET, MAX_AGE),
            Err(SessionError::ExpiredToken)
        );
        assert!(SessionToken::from_string(&encoded, SECRET, Duration::from_secs(86400)).is_ok());
    }
}
