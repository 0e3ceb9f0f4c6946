use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;

/// Issues signed, app-scoped access tokens.
///
/// Each application signs with its own secret, so the issuer holds only the
/// token lifetime and builds a signing handler per call.
#[derive(Debug, Clone, Copy)]
pub struct TokenIssuer {
    ttl: Duration,
}

impl TokenIssuer {
    /// Create a new token issuer.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime added to the issuance instant to compute `exp`
    ///
    /// # Returns
    /// Configured TokenIssuer instance
    ///
    /// # Errors
    /// * `InvalidTtl` - `ttl` is shorter than one second
    pub fn new(ttl: Duration) -> Result<Self, JwtError> {
        // Claims carry whole seconds, so anything shorter would expire at issuance
        if ttl < Duration::seconds(1) {
            return Err(JwtError::InvalidTtl(ttl.num_seconds()));
        }

        Ok(Self { ttl })
    }

    /// Issue a token for a user and application, valid from now.
    ///
    /// # Arguments
    /// * `user_id` - Subject user identifier
    /// * `email` - Subject email
    /// * `app_id` - Target application identifier
    /// * `secret` - The application's signing secret
    ///
    /// # Returns
    /// Signed JWT token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Secret is empty or signing failed
    /// * `InvalidTtl` - Expiry falls outside the representable date range
    pub fn issue(
        &self,
        user_id: i64,
        email: &str,
        app_id: i32,
        secret: &[u8],
    ) -> Result<String, JwtError> {
        self.issue_at(user_id, email, app_id, secret, Utc::now())
    }

    /// Issue a token with an explicit issuance instant.
    pub fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        app_id: i32,
        secret: &[u8],
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EncodingFailed("empty signing secret".to_string()));
        }

        if now.checked_add_signed(self.ttl).is_none() {
            return Err(JwtError::InvalidTtl(self.ttl.num_seconds()));
        }

        let claims = Claims::new(user_id, email, app_id, now, self.ttl);
        JwtHandler::new(secret).encode(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_decode() {
        let issuer = TokenIssuer::new(Duration::minutes(30)).unwrap();

        let token = issuer
            .issue(1, "a@x.com", 1, b"s1")
            .expect("Failed to issue token");
        assert!(!token.is_empty());

        let claims: Claims = JwtHandler::new(b"s1")
            .decode(&token)
            .expect("Failed to decode token");
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.app_id, 1);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_issue_at_is_deterministic() {
        let issuer = TokenIssuer::new(Duration::hours(1)).unwrap();
        let now = Utc::now();

        let first = issuer.issue_at(5, "b@x.com", 2, b"secret", now).unwrap();
        let second = issuer.issue_at(5, "b@x.com", 2, b"secret", now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_is_scoped_to_app_secret() {
        let issuer = TokenIssuer::new(Duration::hours(1)).unwrap();
        let token = issuer.issue(1, "a@x.com", 1, b"app-one-secret").unwrap();

        let result = JwtHandler::new(b"app-two-secret").decode::<Claims>(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        assert!(matches!(
            TokenIssuer::new(Duration::zero()),
            Err(JwtError::InvalidTtl(0))
        ));
        assert!(matches!(
            TokenIssuer::new(Duration::seconds(-5)),
            Err(JwtError::InvalidTtl(-5))
        ));
    }

    #[test]
    fn test_rejects_sub_second_ttl() {
        assert!(matches!(
            TokenIssuer::new(Duration::milliseconds(500)),
            Err(JwtError::InvalidTtl(0))
        ));

        let issuer = TokenIssuer::new(Duration::seconds(1)).unwrap();
        let token = issuer.issue(1, "a@x.com", 1, b"s1").unwrap();
        let claims: Claims = JwtHandler::new(b"s1")
            .decode(&token)
            .expect("Failed to decode token");
        assert_eq!(claims.exp - claims.iat, 1);
    }

    #[test]
    fn test_overflowing_expiry_is_an_error() {
        let issuer = TokenIssuer::new(Duration::days(365 * 1_000_000)).unwrap();

        let result = issuer.issue(1, "a@x.com", 1, b"s1");
        assert!(matches!(result, Err(JwtError::InvalidTtl(_))));
    }

    #[test]
    fn test_rejects_empty_secret() {
        let issuer = TokenIssuer::new(Duration::hours(1)).unwrap();
        let result = issuer.issue(1, "a@x.com", 1, b"");
        assert!(matches!(result, Err(JwtError::EncodingFailed(_))));
    }
}
