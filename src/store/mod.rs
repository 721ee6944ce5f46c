/// Persistence store contracts
///
/// The session core only talks to these traits. `PgStore` is the production
/// backend; `InMemoryStore` backs tests and local experiments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A registered account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, name: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            name,
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }
}

/// The only user shape that leaves the server
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The active refresh token of a user, stored as a SHA-256 digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Fails with a conflict if the username or email is already taken.
    async fn insert(&self, user: &User) -> Result<(), AppError>;
}

/// Single-row-per-user refresh token table
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Replaces any existing record for `record.user_id` atomically.
    async fn upsert(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Returns the number of deleted records (0 or 1).
    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_view_omits_password_hash() {
        let user = User::new(
            "alice".to_string(),
            "a@x.com".to_string(),
            "Alice".to_string(),
            "$2b$04$somethingsecret".to_string(),
        );

        let json = serde_json::to_value(user.view()).expect("Failed to serialize view");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["id"], user.id.to_string());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("somethingsecret"));
    }
}
