use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, User, UserStore};
use crate::error::AppError;

/// Process-local store with the same contracts as `PgStore`
///
/// Each operation holds one mutex for its whole duration, which gives the
/// same atomic replace semantics as the Postgres upsert.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    refresh_tokens: Mutex<HashMap<Uuid, RefreshTokenRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_token_count(&self) -> Result<usize, AppError> {
        Ok(lock(&self.refresh_tokens)?.len())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(lock(&self.users)?.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(lock(&self.users)?.values().any(|u| u.email == email))
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = lock(&self.users)?;

        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(
                "Username is already registered, use another username!".to_string(),
            ));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "Email is already registered, use another email!".to_string(),
            ));
        }

        users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn upsert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        lock(&self.refresh_tokens)?.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(lock(&self.refresh_tokens)?.get(&user_id).cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<u64, AppError> {
        let mut records = lock(&self.refresh_tokens)?;
        let before = records.len();
        records.retain(|_, record| record.token_hash != token_hash);
        Ok((before - records.len()) as u64)
    }
}
