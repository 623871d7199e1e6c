//! OAuth token set and lifecycle states

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth access/refresh token pair with expiry
///
/// Replaced wholesale on refresh; the refresh token is carried forward when
/// the provider omits a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokenSet {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Token lifecycle state for one provider connection
#[derive(Debug, Clone)]
pub enum AuthState {
    /// No token set stored
    Unauthenticated,
    /// A code exchange is in flight (explicit user "connect")
    Authenticating,
    /// Holds a live token set
    Authenticated(OAuthTokenSet),
    /// Token expired with no refresh token; terminal until re-connect
    Expired,
}

impl AuthState {
    /// Stable label for host-visible status reporting
    pub fn label(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticating => "authenticating",
            AuthState::Authenticated(_) => "authenticated",
            AuthState::Expired => "expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_check() {
        let now = Utc::now();
        let tokens = OAuthTokenSet {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: now - Duration::seconds(1),
        };
        assert!(tokens.is_expired_at(now));

        let tokens = OAuthTokenSet {
            expires_at: now + Duration::hours(1),
            ..tokens
        };
        assert!(!tokens.is_expired_at(now));
    }
}
