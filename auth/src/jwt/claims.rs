use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an SSO access token.
///
/// Asserts a user's identity to one application until `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: i64,

    /// User email at issuance time
    pub email: String,

    /// Application the token was issued for
    pub app_id: i32,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims issued at `now` and expiring `ttl` later.
    ///
    /// # Arguments
    /// * `user_id` - Subject user identifier
    /// * `email` - Subject email
    /// * `app_id` - Target application identifier
    /// * `now` - Issuance instant
    /// * `ttl` - Token lifetime
    pub fn new(
        user_id: i64,
        email: impl Into<String>,
        app_id: i32,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id,
            email: email.into(),
            app_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_claims() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = Claims::new(7, "a@x.com", 3, now, Duration::hours(1));

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.app_id, 3);
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let claims = Claims::new(1, "a@x.com", 1, now, Duration::seconds(1000));

        assert!(!claims.is_expired(999));
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }
}
