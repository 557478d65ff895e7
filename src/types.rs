use std::fmt::{Debug, Display, Formatter};

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug)]
pub struct PoolInitializationError(pub String);

impl Display for PoolInitializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Process configuration, read from the environment once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    pub pg_database_url: String,
    pub redis_database_uri: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    #[serde(default = "default_jwt_expires_in_s")]
    pub jwt_expires_in_s: i64,
    #[serde(default = "default_refresh_expires_in_days")]
    pub refresh_expires_in_days: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    pub registration_secret: String,
    #[serde(default)]
    pub cors_origins: String,
    #[serde(default = "default_fcm_endpoint")]
    pub fcm_endpoint: String,
    #[serde(default)]
    pub fcm_server_key: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_owned()
}

fn default_jwt_expires_in_s() -> i64 {
    900
}

fn default_refresh_expires_in_days() -> i64 {
    7
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_fcm_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".to_owned()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "message": self.to_string() }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Admin,
    Waiter,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Waiter => "WAITER",
            Role::User => "USER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "WAITER" => Some(Role::Waiter),
            "USER" => Some(Role::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    Pending,
    Preparing,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "PREPARING" => Some(OrderStatus::Preparing),
            "DELIVERING" => Some(OrderStatus::Delivering),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Appetizer,
    Main,
    Garnish,
    Cold,
    Salads,
    Drinks,
    Alcohol,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Appetizer => "APPETIZER",
            Category::Main => "MAIN",
            Category::Garnish => "GARNISH",
            Category::Cold => "COLD",
            Category::Salads => "SALADS",
            Category::Drinks => "DRINKS",
            Category::Alcohol => "ALCOHOL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPETIZER" => Some(Category::Appetizer),
            "MAIN" => Some(Category::Main),
            "GARNISH" => Some(Category::Garnish),
            "COLD" => Some(Category::Cold),
            "SALADS" => Some(Category::Salads),
            "DRINKS" => Some(Category::Drinks),
            "ALCOHOL" => Some(Category::Alcohol),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_accepts_canonical_names_only() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("WAITER"), Some(Role::Waiter));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("MANAGER"), None);
    }

    #[test]
    fn order_status_round_trips_through_as_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Delivering,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(Category::parse("SOUPS"), None);
        assert_eq!(Category::parse(""), None);
    }
}
