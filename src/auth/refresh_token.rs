/// Refresh Token Storage Helpers
///
/// Refresh tokens are persisted as SHA-256 digests, never in plaintext. A
/// leaked `refresh_tokens` table therefore cannot be replayed.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::RefreshTokenRecord;

/// Hash a refresh token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the record that replaces `user_id`'s current refresh token
pub fn record_for(user_id: Uuid, token: &str) -> RefreshTokenRecord {
    RefreshTokenRecord {
        user_id,
        token_hash: hash_token(token),
        created_at: Utc::now(),
    }
}

/// True if `token` is the one `record` was built from
pub fn matches(record: &RefreshTokenRecord, token: &str) -> bool {
    record.token_hash == hash_token(token)
}
