//! Address Repository
//!
//! 默认地址：写入时在同一事务内先清除该用户其他默认地址再设置，
//! 数据库的部分唯一索引 `uq_addresses_one_default` 兜底。

use super::{RepoError, RepoResult};
use shared::models::{Address, AddressCreate, AddressUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const ADDRESS_SELECT: &str = "SELECT id, user_id, name, phone, province, city, district, detail, is_default, created_at, updated_at FROM addresses";

/// 用户地址列表 (默认地址在前)
pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Address>> {
    let sql = format!("{ADDRESS_SELECT} WHERE user_id = ? ORDER BY is_default DESC, id DESC");
    let rows = sqlx::query_as::<_, Address>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// 仅返回属于该用户的地址
pub async fn find_owned(pool: &SqlitePool, id: i64, user_id: i64) -> RepoResult<Option<Address>> {
    let mut conn = pool.acquire().await?;
    find_owned_in(&mut conn, id, user_id).await
}

pub async fn find_owned_in(
    conn: &mut SqliteConnection,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<Address>> {
    let sql = format!("{ADDRESS_SELECT} WHERE id = ? AND user_id = ?");
    let row = sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

async fn clear_default(conn: &mut SqliteConnection, user_id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE addresses SET is_default = 0, updated_at = ? WHERE user_id = ? AND is_default = 1")
        .bind(now)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn create(pool: &SqlitePool, user_id: i64, data: AddressCreate) -> RepoResult<Address> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    if data.is_default {
        clear_default(&mut tx, user_id, now).await?;
    }

    let id = sqlx::query(
        "INSERT INTO addresses (user_id, name, phone, province, city, district, detail, is_default, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
    )
    .bind(user_id)
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.province)
    .bind(&data.city)
    .bind(&data.district)
    .bind(&data.detail)
    .bind(data.is_default)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let address = find_owned_in(&mut tx, id, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create address".into()))?;
    tx.commit().await?;
    Ok(address)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    data: AddressUpdate,
) -> RepoResult<Address> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    if find_owned_in(&mut tx, id, user_id).await?.is_none() {
        return Err(RepoError::NotFound(format!("Address {id} not found")));
    }
    if data.is_default == Some(true) {
        clear_default(&mut tx, user_id, now).await?;
    }

    sqlx::query(
        "UPDATE addresses SET name = COALESCE(?1, name), phone = COALESCE(?2, phone), province = COALESCE(?3, province), city = COALESCE(?4, city), district = COALESCE(?5, district), detail = COALESCE(?6, detail), is_default = COALESCE(?7, is_default), updated_at = ?8 WHERE id = ?9 AND user_id = ?10",
    )
    .bind(&data.name)
    .bind(&data.phone)
    .bind(&data.province)
    .bind(&data.city)
    .bind(&data.district)
    .bind(&data.detail)
    .bind(data.is_default)
    .bind(now)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let address = find_owned_in(&mut tx, id, user_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Address {id} not found")))?;
    tx.commit().await?;
    Ok(address)
}

/// 删除地址；历史订单保留地址快照，`address_id` 置空
pub async fn delete(pool: &SqlitePool, id: i64, user_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM addresses WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{test_support, user};

    fn home(is_default: bool) -> AddressCreate {
        AddressCreate {
            name: "张三".into(),
            phone: "13800138000".into(),
            province: Some("浙江省".into()),
            city: Some("杭州市".into()),
            district: None,
            detail: "文一西路 1 号".into(),
            is_default,
        }
    }

    #[tokio::test]
    async fn test_single_default_on_create() {
        let pool = test_support::pool().await;
        let u = user::upsert_verified(&pool, "13800138000").await.unwrap();

        let first = create(&pool, u.id, home(true)).await.unwrap();
        let second = create(&pool, u.id, home(true)).await.unwrap();
        create(&pool, u.id, home(false)).await.unwrap();

        let list = list_by_user(&pool, u.id).await.unwrap();
        let defaults: Vec<_> = list.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert_eq!(list[0].id, second.id);
        assert!(list.iter().any(|a| a.id == first.id && !a.is_default));
    }

    #[tokio::test]
    async fn test_single_default_on_update() {
        let pool = test_support::pool().await;
        let u = user::upsert_verified(&pool, "13800138000").await.unwrap();

        let first = create(&pool, u.id, home(true)).await.unwrap();
        let second = create(&pool, u.id, home(false)).await.unwrap();

        let updated = update(
            &pool,
            second.id,
            u.id,
            AddressUpdate {
                is_default: Some(true),
                detail: Some("文二路 2 号".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.is_default);
        assert_eq!(updated.detail, "文二路 2 号");
        assert_eq!(updated.name, "张三");

        let first = find_owned(&pool, first.id, u.id).await.unwrap().unwrap();
        assert!(!first.is_default);
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let pool = test_support::pool().await;
        let owner = user::upsert_verified(&pool, "13800138000").await.unwrap();
        let other = user::upsert_verified(&pool, "13900139000").await.unwrap();
        let addr = create(&pool, owner.id, home(false)).await.unwrap();

        assert!(find_owned(&pool, addr.id, other.id).await.unwrap().is_none());
        assert!(matches!(
            update(&pool, addr.id, other.id, AddressUpdate::default()).await,
            Err(RepoError::NotFound(_))
        ));
        assert!(!delete(&pool, addr.id, other.id).await.unwrap());
        assert!(delete(&pool, addr.id, owner.id).await.unwrap());
    }
}
