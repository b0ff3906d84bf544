//! Product Repository

use super::{Page, RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT id, name, description, price_cents, image_url, stock, is_active, created_at, updated_at FROM products";

/// 上架商品列表
pub async fn find_active(pool: &SqlitePool, page: Page) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE is_active = 1 ORDER BY id LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// 全部商品 (含下架)
pub async fn find_all(pool: &SqlitePool, page: Page) -> RepoResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY id LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same as [`find_by_id`] inside a caller's transaction
pub async fn find_by_id_in(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id = sqlx::query(
        "INSERT INTO products (name, description, price_cents, image_url, stock, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.stock)
    .bind(data.is_active)
    .bind(now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET name = COALESCE(?1, name), description = COALESCE(?2, description), price_cents = COALESCE(?3, price_cents), image_url = COALESCE(?4, image_url), stock = COALESCE(?5, stock), is_active = COALESCE(?6, is_active), updated_at = ?7 WHERE id = ?8",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.stock)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// 切换上架状态
pub async fn toggle_active(pool: &SqlitePool, id: i64) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET is_active = CASE WHEN is_active = 1 THEN 0 ELSE 1 END, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

pub async fn set_stock(pool: &SqlitePool, id: i64, stock: i64) -> RepoResult<Product> {
    update(
        pool,
        id,
        ProductUpdate {
            stock: Some(stock),
            ..Default::default()
        },
    )
    .await
}

/// 商品是否被订单引用
pub async fn is_referenced(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = ?)",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// 条件扣减库存：仅当商品上架且库存充足时生效
///
/// Returns `false` when no row matched (inactive, missing or short on stock).
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE products SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 取消订单时归还库存
pub async fn restore_stock(conn: &mut SqliteConnection, id: i64, quantity: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;
    use shared::Money;

    fn water(stock: i64) -> ProductCreate {
        ProductCreate {
            name: "桶装水".into(),
            description: Some("18.9L".into()),
            price: Money::from_cents(1800),
            image_url: None,
            stock,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let pool = test_support::pool().await;
        let p = create(&pool, water(10)).await.unwrap();
        assert_eq!(p.price, Money::from_cents(1800));

        let mut hidden = water(1);
        hidden.is_active = false;
        create(&pool, hidden).await.unwrap();

        assert_eq!(find_active(&pool, Page::default()).await.unwrap().len(), 1);
        assert_eq!(find_all(&pool, Page::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_toggle() {
        let pool = test_support::pool().await;
        let p = create(&pool, water(10)).await.unwrap();

        let updated = update(
            &pool,
            p.id,
            ProductUpdate {
                price: Some(Money::from_cents(2000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, Money::from_cents(2000));
        assert_eq!(updated.name, "桶装水");

        let toggled = toggle_active(&pool, p.id).await.unwrap();
        assert!(!toggled.is_active);
        let toggled = toggle_active(&pool, p.id).await.unwrap();
        assert!(toggled.is_active);

        assert!(matches!(
            toggle_active(&pool, 999).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let pool = test_support::pool().await;
        let p = create(&pool, water(10)).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(decrement_stock(&mut conn, p.id, 10).await.unwrap());
        assert!(!decrement_stock(&mut conn, p.id, 1).await.unwrap());
        restore_stock(&mut conn, p.id, 3).await.unwrap();
        drop(conn);

        assert_eq!(find_by_id(&pool, p.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_decrement_refuses_inactive() {
        let pool = test_support::pool().await;
        let p = create(&pool, water(10)).await.unwrap();
        toggle_active(&pool, p.id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(!decrement_stock(&mut conn, p.id, 1).await.unwrap());
    }
}
