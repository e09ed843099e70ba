use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppResult, AuthError},
};

/// Claims carried by an access token. Times are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Issues and validates stateless bearer tokens signed with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self::from_secret(
            config.secret_key.as_bytes(),
            config.algorithm,
            Duration::minutes(config.access_token_expire_minutes),
        )
    }

    pub fn from_secret(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_aud = false;

        // Claims are read as plain JSON so that only signature and encoding
        // failures surface here; a signed payload of the wrong shape is malformed.
        let raw = decode::<Value>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidSignature)?
            .claims;

        let claim = |name: &str| raw.get(name).and_then(Value::as_i64);
        let (Some(user_id), Some(exp)) = (claim("userId"), claim("exp")) else {
            return Err(AuthError::MalformedToken);
        };

        if now.timestamp() > exp {
            return Err(AuthError::Expired);
        }

        Ok(Claims {
            user_id,
            iat: claim("iat").unwrap_or_default(),
            exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const SECRET: &[u8] = b"23449a762a0d35dfa45d4cb2e208c7aa09a2e839617d732d79bcef1f0d77c6a7";

    fn service() -> TokenService {
        TokenService::from_secret(SECRET, Algorithm::HS256, Duration::minutes(60))
    }

    #[test]
    fn issued_token_round_trips_before_expiry() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(42, now).unwrap();

        let claims = tokens
            .validate_at(&token, now + Duration::minutes(59))
            .unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp, (now + Duration::minutes(60)).timestamp());
        assert_eq!(claims.iat, now.timestamp());
    }

    #[test]
    fn token_is_still_valid_at_the_expiry_instant() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(7, now).unwrap();

        assert!(tokens.validate_at(&token, now + tokens.ttl()).is_ok());
    }

    #[test]
    fn token_expires_after_ttl() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(7, now).unwrap();

        let err = tokens
            .validate_at(&token, now + Duration::minutes(61))
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn tampering_any_byte_breaks_the_signature() {
        let tokens = service();
        let now = Utc::now();
        let token = tokens.issue_at(1, now).unwrap();

        for index in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                tokens.validate_at(&tampered, now),
                Err(AuthError::InvalidSignature),
                "byte {index} was altered"
            );
        }
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = TokenService::from_secret(b"another-secret", Algorithm::HS256, Duration::minutes(60));
        let token = other.issue(1).unwrap();

        assert_eq!(service().validate(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(service().validate("not.a.jwt"), Err(AuthError::InvalidSignature));
        assert_eq!(service().validate(""), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn signed_token_without_user_id_is_malformed() {
        let exp = (Utc::now() + Duration::minutes(5)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "exp": exp }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().validate(&token), Err(AuthError::MalformedToken));
    }

    #[rstest]
    #[case(json!({ "userId": "10", "exp": 4_102_444_800_i64 }))]
    #[case(json!({ "userId": 10, "exp": "2099-12-06 06:35:57.829530" }))]
    #[case(json!({ "userId": null, "exp": 4_102_444_800_i64 }))]
    #[case(json!({ "userId": 1.5, "exp": 4_102_444_800_i64 }))]
    fn signed_token_with_mistyped_claims_is_malformed(#[case] claims: serde_json::Value) {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().validate(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn signed_token_without_expiry_is_malformed() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "userId": 3 }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().validate(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn expires_at_reflects_the_exp_claim() {
        let tokens = service();
        let now = Utc::now();
        let claims = tokens
            .validate_at(&tokens.issue_at(9, now).unwrap(), now)
            .unwrap();

        assert_eq!(
            claims.expires_at().unwrap().timestamp(),
            (now + Duration::minutes(60)).timestamp()
        );
    }
}
