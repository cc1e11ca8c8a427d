//! Token service for activation tickets and session tokens
//!
//! Three independent signing secrets are in play: one for activation
//! tickets, one for access tokens, one for refresh tokens. Compromise of
//! any single secret does not extend to the others. Activation tickets
//! additionally carry a short numeric code delivered out-of-band, so
//! activating an account requires both possession of the ticket and
//! knowledge of the code.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::models::PendingUser;

/// Closed set of token verification failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The activation ticket signature is wrong or the ticket has expired
    #[error("Invalid or expired activation token")]
    InvalidOrExpiredTicket,

    /// The ticket verified but the supplied code did not match
    #[error("Invalid activation code")]
    CodeMismatch,

    /// The token signature or payload is invalid
    #[error("Invalid token")]
    Invalid,

    /// The token was valid once but its expiry has passed
    #[error("Token has expired")]
    Expired,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing activation tickets
    pub activation_secret: String,
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Activation ticket lifetime in seconds (default: 5 minutes)
    pub activation_ttl: u64,
    /// Access token lifetime in seconds (default: 5 minutes)
    pub access_ttl: u64,
    /// Refresh token lifetime in seconds (default: 3 days)
    pub refresh_ttl: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACTIVATION_SECRET`: activation ticket signing secret (required)
    /// - `ACCESS_TOKEN_SECRET`: access token signing secret (required)
    /// - `REFRESH_TOKEN_SECRET`: refresh token signing secret (required)
    /// - `ACTIVATION_TTL`: ticket lifetime in seconds (default: 300; some
    ///   deployments run this as high as 86400)
    /// - `ACCESS_TOKEN_TTL`: access token lifetime in seconds (default: 300)
    /// - `REFRESH_TOKEN_TTL`: refresh token lifetime in seconds (default: 259200)
    pub fn from_env() -> anyhow::Result<Self> {
        let activation_secret = std::env::var("ACTIVATION_SECRET")
            .map_err(|_| anyhow::anyhow!("ACTIVATION_SECRET environment variable not set"))?;
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        let activation_ttl = std::env::var("ACTIVATION_TTL")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let access_ttl = std::env::var("ACCESS_TOKEN_TTL")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let refresh_ttl = std::env::var("REFRESH_TOKEN_TTL")
            .unwrap_or_else(|_| "259200".to_string()) // 3 days
            .parse()
            .unwrap_or(259200);

        Ok(JwtConfig {
            activation_secret,
            access_secret,
            refresh_secret,
            activation_ttl,
            access_ttl,
            refresh_ttl,
        })
    }
}

/// Claims carried by access and refresh tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried by an activation ticket
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivationClaims {
    /// The pending registration, not yet persisted anywhere
    pub user: PendingUser,
    /// Confirmation code the registrant receives by mail
    pub code: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Token service
#[derive(Clone)]
pub struct TokenService {
    activation_encoding: EncodingKey,
    activation_decoding: DecodingKey,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

fn unix_now() -> anyhow::Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

impl TokenService {
    /// Initialize the token service from its configuration
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        TokenService {
            activation_encoding: EncodingKey::from_secret(config.activation_secret.as_bytes()),
            activation_decoding: DecodingKey::from_secret(config.activation_secret.as_bytes()),
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Issue an activation ticket for a pending registration
    ///
    /// Returns the signed ticket and the 4-digit confirmation code. The
    /// code travels to the registrant by mail; the ticket goes back to
    /// the caller.
    pub fn issue_activation_ticket(
        &self,
        pending: &PendingUser,
    ) -> anyhow::Result<(String, String)> {
        let code = rand::thread_rng().gen_range(1000..=9999).to_string();
        let now = unix_now()?;

        let claims = ActivationClaims {
            user: pending.clone(),
            code: code.clone(),
            iat: now,
            exp: now + self.config.activation_ttl,
        };

        let ticket = encode(&Header::default(), &claims, &self.activation_encoding)?;
        Ok((ticket, code))
    }

    /// Verify an activation ticket together with its confirmation code
    ///
    /// Signature and expiry are checked before the code, so an expired
    /// ticket fails the same way regardless of code correctness. Both
    /// failures are terminal.
    pub fn verify_activation_ticket(
        &self,
        ticket: &str,
        supplied_code: &str,
    ) -> Result<PendingUser, TokenError> {
        let data = decode::<ActivationClaims>(ticket, &self.activation_decoding, &self.validation)
            .map_err(|_| TokenError::InvalidOrExpiredTicket)?;

        if data.claims.code != supplied_code {
            return Err(TokenError::CodeMismatch);
        }

        Ok(data.claims.user)
    }

    /// Issue a short-lived access token for a user
    pub fn issue_access_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = unix_now()?;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.config.access_ttl,
            token_type: TokenType::Access,
        };

        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    /// Issue a longer-lived refresh token for a user
    pub fn issue_refresh_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = unix_now()?;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.config.refresh_ttl,
            token_type: TokenType::Refresh,
        };

        Ok(encode(&Header::default(), &claims, &self.refresh_encoding)?)
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, &self.access_decoding, TokenType::Access)
    }

    /// Verify a refresh token and return its claims
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, &self.refresh_decoding, TokenType::Refresh)
    }

    fn verify(
        &self,
        token: &str,
        key: &DecodingKey,
        expected: TokenType,
    ) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.token_type != expected {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }

    /// Access token lifetime in seconds
    pub fn access_ttl(&self) -> u64 {
        self.config.access_ttl
    }

    /// Refresh token lifetime in seconds
    pub fn refresh_ttl(&self) -> u64 {
        self.config.refresh_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            activation_secret: "activation-secret-for-tests".to_string(),
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            activation_ttl: 300,
            access_ttl: 300,
            refresh_ttl: 259200,
        }
    }

    fn pending() -> PendingUser {
        PendingUser {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_activation_round_trip() {
        let service = TokenService::new(test_config());
        let (ticket, code) = service.issue_activation_ticket(&pending()).unwrap();

        assert_eq!(code.len(), 4);
        let n: u32 = code.parse().unwrap();
        assert!((1000..=9999).contains(&n));

        let restored = service.verify_activation_ticket(&ticket, &code).unwrap();
        assert_eq!(restored, pending());
    }

    #[test]
    fn test_activation_wrong_code() {
        let service = TokenService::new(test_config());
        let (ticket, code) = service.issue_activation_ticket(&pending()).unwrap();

        let wrong = if code == "1000" { "1001" } else { "1000" };
        let err = service.verify_activation_ticket(&ticket, wrong).unwrap_err();
        assert_eq!(err, TokenError::CodeMismatch);
    }

    #[test]
    fn test_activation_tampered_ticket() {
        let service = TokenService::new(test_config());
        let (ticket, code) = service.issue_activation_ticket(&pending()).unwrap();

        let mut tampered = ticket.clone();
        tampered.push('x');
        let err = service
            .verify_activation_ticket(&tampered, &code)
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidOrExpiredTicket);
    }

    #[test]
    fn test_activation_expired_ticket_beats_correct_code() {
        let service = TokenService::new(test_config());
        let now = unix_now().unwrap();

        // Craft a ticket whose expiry is well past the validation leeway.
        let claims = ActivationClaims {
            user: pending(),
            code: "1234".to_string(),
            iat: now - 600,
            exp: now - 300,
        };
        let ticket = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(test_config().activation_secret.as_bytes()),
        )
        .unwrap();

        let err = service
            .verify_activation_ticket(&ticket, "1234")
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidOrExpiredTicket);
    }

    #[test]
    fn test_activation_rejects_ticket_signed_with_other_secret() {
        let service = TokenService::new(test_config());
        let mut other = test_config();
        other.activation_secret = "a-different-secret".to_string();
        let other_service = TokenService::new(other);

        let (ticket, code) = other_service.issue_activation_ticket(&pending()).unwrap();
        let err = service.verify_activation_ticket(&ticket, &code).unwrap_err();
        assert_eq!(err, TokenError::InvalidOrExpiredTicket);
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = TokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue_access_token(user_id).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let service = TokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue_refresh_token(user_id).unwrap();
        let claims = service.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        // Refresh tokens are signed with their own secret, so the access
        // verifier rejects them on signature before the type tag matters.
        let service = TokenService::new(test_config());
        let token = service.issue_refresh_token(Uuid::new_v4()).unwrap();
        let err = service.verify_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn test_type_tag_checked_when_secrets_match() {
        let mut config = test_config();
        config.refresh_secret = config.access_secret.clone();
        let service = TokenService::new(config);

        let token = service.issue_refresh_token(Uuid::new_v4()).unwrap();
        let err = service.verify_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
    }

    #[test]
    fn test_expired_access_token() {
        let service = TokenService::new(test_config());
        let now = unix_now().unwrap();

        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 600,
            exp: now - 300,
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(test_config().access_secret.as_bytes()),
        )
        .unwrap();

        let err = service.verify_access_token(&token).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }
}
