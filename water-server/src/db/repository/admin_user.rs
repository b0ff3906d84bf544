//! Admin User Repository

use super::{RepoError, RepoResult};
use shared::models::AdminUser;
use sqlx::SqlitePool;

const ADMIN_SELECT: &str =
    "SELECT id, username, password_hash, created_at, updated_at FROM admin_users";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<AdminUser>> {
    let sql = format!("{ADMIN_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, AdminUser>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<AdminUser>> {
    let sql = format!("{ADMIN_SELECT} WHERE username = ?");
    let row = sqlx::query_as::<_, AdminUser>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn create(pool: &SqlitePool, username: &str, password_hash: &str) -> RepoResult<AdminUser> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO admin_users (username, password_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create admin user".into()))
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE admin_users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Admin user {id} not found")));
    }
    Ok(())
}
