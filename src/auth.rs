//! Accounts and bearer sessions.
//!
//! Passwords are stored as bcrypt hashes. A successful login issues an opaque
//! random token that is stored in `sessions` together with its expiry; every
//! authenticated request resolves the token back to its user.

use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::TIMESTAMP_FORMAT;
use crate::error::{AppError, AppResult};
use crate::types::UserId;

/// The user behind a valid session token.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: String,
    pub token: Uuid,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub expires_at: String,
}

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt hash failed: {}", e)))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))?;
    Ok(ok)
}

pub async fn issue_session(db: &SqlitePool, user_id: UserId, ttl_minutes: i64) -> AppResult<Session> {
    let token = Uuid::new_v4();
    let expires_at = (Utc::now() + Duration::minutes(ttl_minutes)).format(TIMESTAMP_FORMAT).to_string();
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)")
        .bind(token.to_string())
        .bind(user_id)
        .bind(&expires_at)
        .execute(db)
        .await?;
    Ok(Session { token, expires_at })
}

/// Looks up a live session. Unknown and expired tokens are both `Unauthorized`.
pub async fn resolve_session(db: &SqlitePool, token: Uuid) -> AppResult<CurrentUser> {
    let row = sqlx::query(
        r#"SELECT u.id, u.username, u.role
           FROM sessions s JOIN users u ON u.id = s.user_id
           WHERE s.token = ?1 AND s.expires_at > strftime('%Y-%m-%dT%H:%M:%SZ','now')"#,
    )
    .bind(token.to_string())
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(CurrentUser {
        id: row.get::<i64, _>("id"),
        username: row.get::<String, _>("username"),
        role: row.get::<String, _>("role"),
        token,
    })
}

pub async fn revoke_session(db: &SqlitePool, token: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?1").bind(token.to_string()).execute(db).await?;
    Ok(())
}

/// Deletes expired sessions, returning how many were removed.
pub async fn purge_expired_sessions(db: &SqlitePool) -> AppResult<u64> {
    let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= strftime('%Y-%m-%dT%H:%M:%SZ','now')")
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter2hunter2".to_string(), 4).await.unwrap();
        assert_ne!(hash, "hunter2hunter2");
        assert!(verify_password("hunter2hunter2".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong password".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_is_mismatch() {
        assert!(!verify_password("anything".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}
