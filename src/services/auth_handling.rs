use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::services::db_models::User;
use crate::services::db_utils::AppState;
use crate::services::messages::{AddToken, FetchUser};
use crate::types::{ApiError, AppConfig, Role};

pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub fn hash_password(config: &AppConfig, raw: &str) -> Result<String, ApiError> {
    bcrypt::hash(raw, config.bcrypt_cost).map_err(|err| ApiError::Internal(err.to_string()))
}

pub fn verify_password(raw: &str, hash: &str) -> bool {
    bcrypt::verify(raw, hash).unwrap_or(false)
}

fn sign(user_id: i64, secret: &str, lifetime: Duration) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        id: user_id,
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(err.to_string()))
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_owned()))
}

pub fn sign_access_token(config: &AppConfig, user_id: i64) -> Result<String, ApiError> {
    sign(
        user_id,
        &config.jwt_secret,
        Duration::seconds(config.jwt_expires_in_s),
    )
}

pub fn sign_refresh_token(config: &AppConfig, user_id: i64) -> Result<String, ApiError> {
    sign(
        user_id,
        &config.jwt_refresh_secret,
        Duration::days(config.refresh_expires_in_days),
    )
}

pub fn decode_access_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    decode_claims(token, &config.jwt_secret)
}

pub fn decode_refresh_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    decode_claims(token, &config.jwt_refresh_secret)
}

/// Signs a fresh access/refresh pair and persists the refresh half with its
/// expiry, so rotation and logout can find it later.
pub async fn issue_token_pair(state: &AppState, user_id: i64) -> Result<TokenPair, ApiError> {
    let access_token = sign_access_token(&state.config, user_id)?;
    let refresh_token = sign_refresh_token(&state.config, user_id)?;

    let expires_at =
        (Utc::now() + Duration::days(state.config.refresh_expires_in_days)).naive_utc();

    match state
        .pg_db
        .send(AddToken {
            user_id,
            refresh_token: refresh_token.clone(),
            expires_at,
        })
        .await
    {
        Ok(Ok(_)) => Ok(TokenPair { access_token, refresh_token }),
        Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

pub fn refresh_cookie<'a>(config: &AppConfig, token: &'a str) -> Cookie<'a> {
    Cookie::build(REFRESH_COOKIE, token)
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(CookieDuration::days(config.refresh_expires_in_days))
        .finish()
}

pub fn clear_refresh_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the bearer token on the request to a user row.
pub async fn authenticate(state: &AppState, req: &HttpRequest) -> Result<User, ApiError> {
    let token = bearer_token(req)
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_owned()))?;

    let claims = decode_access_token(&state.config, token)?;

    match state.pg_db.send(FetchUser(claims.id)).await {
        Ok(Ok(user)) => Ok(user),
        Ok(Err(_)) => Err(ApiError::Unauthorized("Unknown user".to_owned())),
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}

pub async fn require_role(
    state: &AppState,
    req: &HttpRequest,
    allowed: &[Role],
) -> Result<User, ApiError> {
    let user = authenticate(state, req).await?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| ApiError::Forbidden(format!("Unknown role: {}", user.role)))?;

    if allowed.contains(&role) {
        return Ok(user);
    }

    let wanted = allowed
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Err(ApiError::Forbidden(format!(
        "Insufficient rights. Required: {wanted}. Your role: {}",
        user.role
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_database_url: String::new(),
            redis_database_uri: String::new(),
            jwt_secret: "access-secret".into(),
            jwt_refresh_secret: "refresh-secret".into(),
            jwt_expires_in_s: 900,
            refresh_expires_in_days: 7,
            bcrypt_cost: 4,
            registration_secret: "let-me-in".into(),
            cors_origins: String::new(),
            fcm_endpoint: String::new(),
            fcm_server_key: String::new(),
        }
    }

    #[test]
    fn access_token_carries_the_user_id() {
        let config = test_config();

        let token = sign_access_token(&config, 42).unwrap();
        let claims = decode_access_token(&config, &token).unwrap();

        assert_eq!(claims.id, 42);
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.exp - claims.iat, config.jwt_expires_in_s);
    }

    #[test]
    fn refresh_token_lives_seven_days() {
        let config = test_config();

        let token = sign_refresh_token(&config, 7).unwrap();
        let claims = decode_refresh_token(&config, &token).unwrap();

        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn tokens_do_not_verify_under_the_other_secret() {
        let config = test_config();

        let access = sign_access_token(&config, 1).unwrap();
        let refresh = sign_refresh_token(&config, 1).unwrap();

        assert!(decode_refresh_token(&config, &access).is_err());
        assert!(decode_access_token(&config, &refresh).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        config.jwt_expires_in_s = -120;

        let token = sign_access_token(&config, 1).unwrap();

        assert!(decode_access_token(&config, &token).is_err());
    }

    #[test]
    fn password_verification_accepts_only_the_original() {
        let config = test_config();

        let hash = hash_password(&config, "strongPassword123").unwrap();

        assert!(verify_password("strongPassword123", &hash));
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("strongPassword123", "not-a-bcrypt-hash"));
    }

    #[test]
    fn refresh_cookie_is_http_only() {
        let config = test_config();

        let cookie = refresh_cookie(&config, "some-token");

        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
