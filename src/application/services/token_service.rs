//! Session token issuance/validation and credential hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::Config;
use crate::domain::entities::{Claims, TokenKind};

/// Why a token was refused. Callers branch on this; it is never a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToken {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is not a {expected} token")]
    WrongKind { expected: TokenKind },
}

/// Failures producing tokens or hashes. These are internal faults.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("failed to hash credential: {0}")]
    Hashing(String),
    #[error("token lifetime is out of range")]
    Lifetime,
}

/// Issues and validates signed, expiring session tokens.
///
/// Tokens are JWTs signed with a single process-wide HMAC secret.
/// Expiry is checked with millisecond precision and no leeway: a token
/// issued at `t` with lifetime `ttl` is valid strictly before `t + ttl`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Creates a token service.
    ///
    /// # Arguments
    ///
    /// - `secret` - HMAC signing secret
    /// - `algorithm` - one of the HS* algorithms
    /// - `access_ttl` / `refresh_ttl` - lifetimes used by [`Self::issue_kind`]
    pub fn new(secret: &str, algorithm: Algorithm, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Builds the service from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured algorithm is not an HMAC
    /// algorithm or a lifetime is out of range.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            &config.secret_key,
            config.signing_algorithm()?,
            config.access_token_ttl()?,
            config.refresh_token_ttl()?,
        ))
    }

    /// Configured lifetime for tokens of `kind`.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issues a token of `kind` with its configured lifetime.
    pub fn issue_kind(&self, subject: &str, kind: TokenKind) -> Result<String, TokenError> {
        self.issue(subject, kind, self.ttl(kind))
    }

    /// Issues a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, kind, ttl, Utc::now().timestamp_millis())
    }

    /// Issues a token as if the current Unix time in milliseconds were
    /// `now_ms`.
    pub fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
        now_ms: i64,
    ) -> Result<String, TokenError> {
        let exp_ms = now_ms
            .checked_add(ttl.num_milliseconds())
            .ok_or(TokenError::Lifetime)?;

        let claims = Claims {
            sub: subject.to_owned(),
            kind,
            iat: now_ms.div_euclid(1000),
            exp: exp_ms.div_euclid(1000) + i64::from(exp_ms.rem_euclid(1000) != 0),
            exp_ms,
            jti: hex::encode(rand::random::<[u8; 16]>()),
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verifies signature and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.validate_at(token, Utc::now().timestamp_millis())
    }

    /// Verifies signature and expiry against the Unix time `now_ms`, in
    /// milliseconds.
    pub fn validate_at(&self, token: &str, now_ms: i64) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below with a strict comparison and no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| {
                use jsonwebtoken::errors::ErrorKind;
                match err.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        InvalidToken::BadSignature
                    }
                    _ => InvalidToken::Malformed,
                }
            })?
            .claims;

        if claims.exp_ms <= now_ms {
            return Err(InvalidToken::Expired);
        }

        Ok(claims)
    }

    /// Validates `token` and additionally requires it to be of `kind`.
    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, InvalidToken> {
        let claims = self.validate(token)?;
        if claims.kind != kind {
            return Err(InvalidToken::WrongKind { expected: kind });
        }
        Ok(claims)
    }

    /// Produces a fresh Argon2id hash in PHC format with a random salt.
    pub fn hash_credential(secret: &str) -> Result<String, TokenError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| TokenError::Hashing(e.to_string()))
    }

    /// Checks `secret` against a stored PHC hash. A malformed hash never
    /// verifies.
    pub fn verify_credential(secret: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("stored credential hash is not a valid PHC string");
            return false;
        };

        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-signing-secret",
            Algorithm::HS256,
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    #[test]
    fn test_issue_then_validate() {
        let svc = service();
        let token = svc.issue("alice", TokenKind::Access, Duration::minutes(5)).unwrap();

        let claims = svc.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp * 1000 >= claims.exp_ms);
        assert!((300..=301).contains(&(claims.exp - claims.iat)));
    }

    #[test]
    fn test_expiry_boundary() {
        let svc = service();
        let now = 1_700_000_000_000;
        let token = svc
            .issue_at("alice", TokenKind::Access, Duration::seconds(60), now)
            .unwrap();

        assert!(svc.validate_at(&token, now).is_ok());
        assert!(svc.validate_at(&token, now + 59_999).is_ok());
        assert_eq!(
            svc.validate_at(&token, now + 60_000),
            Err(InvalidToken::Expired)
        );
        assert_eq!(
            svc.validate_at(&token, now + 3_600_000),
            Err(InvalidToken::Expired)
        );
    }

    #[test]
    fn test_expiry_boundary_mid_second() {
        let svc = service();
        let now = 1_700_000_000_700;
        let token = svc
            .issue_at("alice", TokenKind::Access, Duration::milliseconds(1_500), now)
            .unwrap();

        assert!(svc.validate_at(&token, now + 1_499).is_ok());
        assert_eq!(
            svc.validate_at(&token, now + 1_500),
            Err(InvalidToken::Expired)
        );

        let claims = svc.validate_at(&token, now).unwrap();
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp_ms, 1_700_000_002_200);
        // Registered claim rounds up so it never ends before `exp_ms`.
        assert_eq!(claims.exp, 1_700_000_003);
    }

    #[test]
    fn test_sub_second_lifetime_on_real_clock() {
        let svc = service();
        let token = svc
            .issue("alice", TokenKind::Access, Duration::milliseconds(900))
            .unwrap();

        assert!(svc.validate(&token).is_ok());

        std::thread::sleep(std::time::Duration::from_millis(950));
        assert_eq!(svc.validate(&token), Err(InvalidToken::Expired));
    }

    #[test]
    fn test_from_config_rejects_out_of_range_lifetime() {
        let config = Config {
            refresh_token_expire_days: 200_000_000_000_000,
            ..Config::default()
        };
        assert!(TokenService::from_config(&config).is_err());
        assert!(TokenService::from_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_lifetime_overflow_is_an_error() {
        let svc = service();
        let result = svc.issue_at("alice", TokenKind::Access, Duration::milliseconds(i64::MAX), 1_000);
        assert!(matches!(result, Err(TokenError::Lifetime)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service()
            .issue("alice", TokenKind::Access, Duration::minutes(5))
            .unwrap();
        let other = TokenService::new(
            "another-secret",
            Algorithm::HS256,
            Duration::minutes(30),
            Duration::days(7),
        );

        assert_eq!(other.validate(&token), Err(InvalidToken::BadSignature));
    }

    #[test]
    fn test_wrong_algorithm_is_invalid() {
        let token = service()
            .issue("alice", TokenKind::Access, Duration::minutes(5))
            .unwrap();
        let other = TokenService::new(
            "test-signing-secret",
            Algorithm::HS512,
            Duration::minutes(30),
            Duration::days(7),
        );

        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        let svc = service();
        for garbage in ["", "abc", "a.b.c", "Bearer x", "🦀.🦀.🦀"] {
            assert!(svc.validate(garbage).is_err(), "accepted {garbage:?}");
        }
    }

    #[test]
    fn test_validate_kind() {
        let svc = service();
        let refresh = svc.issue_kind("alice", TokenKind::Refresh).unwrap();

        assert!(svc.validate_kind(&refresh, TokenKind::Refresh).is_ok());
        assert_eq!(
            svc.validate_kind(&refresh, TokenKind::Access),
            Err(InvalidToken::WrongKind {
                expected: TokenKind::Access
            })
        );
    }

    #[test]
    fn test_tokens_in_same_second_differ() {
        let svc = service();
        let a = svc.issue_at("alice", TokenKind::Refresh, Duration::days(1), 1_000).unwrap();
        let b = svc.issue_at("alice", TokenKind::Refresh, Duration::days(1), 1_000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let hash1 = TokenService::hash_credential("admin123").unwrap();
        let hash2 = TokenService::hash_credential("admin123").unwrap();

        assert!(hash1.starts_with("$argon2"));
        assert_ne!(hash1, hash2);
        assert!(TokenService::verify_credential("admin123", &hash1));
        assert!(TokenService::verify_credential("admin123", &hash2));
        assert!(!TokenService::verify_credential("admin124", &hash1));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!TokenService::verify_credential("password", "not-a-valid-hash"));
        assert!(!TokenService::verify_credential("", ""));
    }
}
