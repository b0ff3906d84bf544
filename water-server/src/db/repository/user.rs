//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserUpdate};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, phone, nickname, avatar_url, phone_verified, is_active, created_at, updated_at FROM users";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE phone = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(phone)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Find the user owning `phone` or create one; either way the phone ends up verified
pub async fn upsert_verified(pool: &SqlitePool, phone: &str) -> RepoResult<User> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO users (phone, phone_verified, is_active, created_at, updated_at) VALUES (?1, 1, 1, ?2, ?2) \
         ON CONFLICT(phone) DO UPDATE SET phone_verified = 1, updated_at = ?2",
    )
    .bind(phone)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_phone(pool, phone)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to upsert user".into()))
}

/// Partial profile update; a changed phone number must be verified again
pub async fn update_profile(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET \
         nickname = COALESCE(?1, nickname), \
         avatar_url = COALESCE(?2, avatar_url), \
         phone_verified = CASE WHEN ?3 IS NOT NULL AND ?3 IS NOT phone THEN 0 ELSE phone_verified END, \
         phone = COALESCE(?3, phone), \
         updated_at = ?4 \
         WHERE id = ?5",
    )
    .bind(&data.nickname)
    .bind(&data.avatar_url)
    .bind(&data.phone)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}
