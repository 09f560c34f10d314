use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::{LineItemListRow, NewLineItem, UpdateLineItem};
use crate::pagination::{self, Page, DEFAULT_PAGE_SIZE};

// ============================================================================
// Line Item Repository
// ============================================================================
//
// CRUD over order_details with its composite key (order_id, product_id).
// Updates use the same optimistic row_version scheme as orders.
//
// ============================================================================

pub struct LineItemRepository {
    pool: PgPool,
}

impl LineItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paged listing joined with the parent order's date and product name,
    /// ordered by the composite key.
    pub async fn list(&self, page: i64) -> Result<Page<LineItemListRow>, AppError> {
        let page = pagination::normalize_page(page);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_details")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, LineItemListRow>(
            "SELECT d.*, p.product_name, o.order_date
               FROM order_details d
               JOIN orders o ON o.order_id = d.order_id
               JOIN products p ON p.product_id = d.product_id
              ORDER BY d.order_id, d.product_id
              LIMIT $1 OFFSET $2",
        )
        .bind(DEFAULT_PAGE_SIZE)
        .bind(pagination::offset(page, DEFAULT_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, page, DEFAULT_PAGE_SIZE, total))
    }

    pub async fn find(&self, order_id: i32, product_id: i32) -> Result<LineItemListRow, AppError> {
        sqlx::query_as::<_, LineItemListRow>(
            "SELECT d.*, p.product_name, o.order_date
               FROM order_details d
               JOIN orders o ON o.order_id = d.order_id
               JOIN products p ON p.product_id = d.product_id
              WHERE d.order_id = $1 AND d.product_id = $2",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("line item"))
    }

    /// Insert a line item. The parent order must already exist; a duplicate
    /// (order_id, product_id) pair is a validation failure, not a crash.
    pub async fn create(&self, item: &NewLineItem) -> Result<(), AppError> {
        let parent: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_id = $1")
            .bind(item.order_id)
            .fetch_optional(&self.pool)
            .await?;
        if parent.is_none() {
            return Err(AppError::Validation(vec![format!(
                "order {} does not exist",
                item.order_id
            )]));
        }

        let inserted = sqlx::query(
            "INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.discount)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                tracing::info!(
                    order_id = item.order_id,
                    product_id = item.product_id,
                    "line item created"
                );
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(vec![format!(
                "order {} already has a line item for product {}",
                item.order_id, item.product_id
            )])),
            Err(e) => Err(e.into()),
        }
    }

    /// Optimistic update on the composite key; resolves a stale version to
    /// NotFound when the row is gone, ConcurrencyConflict when it moved.
    pub async fn update(
        &self,
        order_id: i32,
        product_id: i32,
        update: &UpdateLineItem,
    ) -> Result<(), AppError> {
        let affected = sqlx::query(
            "UPDATE order_details
                SET unit_price = $1, quantity = $2, discount = $3,
                    row_version = row_version + 1
              WHERE order_id = $4 AND product_id = $5 AND row_version = $6",
        )
        .bind(update.unit_price)
        .bind(update.quantity)
        .bind(update.discount)
        .bind(order_id)
        .bind(product_id)
        .bind(update.row_version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            if self.exists(order_id, product_id).await? {
                tracing::warn!(order_id, product_id, "line item edit lost the race");
                return Err(AppError::ConcurrencyConflict);
            }
            return Err(AppError::NotFound("line item"));
        }
        Ok(())
    }

    pub async fn delete(&self, order_id: i32, product_id: i32) -> Result<(), AppError> {
        let affected =
            sqlx::query("DELETE FROM order_details WHERE order_id = $1 AND product_id = $2")
                .bind(order_id)
                .bind(product_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("line item"));
        }
        tracing::info!(order_id, product_id, "line item deleted");
        Ok(())
    }

    pub async fn exists(&self, order_id: i32, product_id: i32) -> Result<bool, AppError> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM order_details WHERE order_id = $1 AND product_id = $2",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_closed_is_not_a_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }

    // ------------------------------------------------------------------
    // Database-bound tests. Run them against a migrated Postgres with:
    //   DATABASE_URL=postgres://... cargo test -- --ignored
    // ------------------------------------------------------------------

    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a migrated database");
        PgPool::connect(&url).await.expect("failed to connect")
    }

    /// A bare parent order plus a product; every column the workflow does not
    /// touch stays NULL.
    async fn seed_order_and_product(pool: &PgPool) -> (i32, i32) {
        let order_id: i32 =
            sqlx::query_scalar("INSERT INTO orders DEFAULT VALUES RETURNING order_id")
                .fetch_one(pool)
                .await
                .unwrap();
        let product_id: i32 = sqlx::query_scalar(
            "INSERT INTO products (product_name) VALUES ('Tofu') RETURNING product_id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        (order_id, product_id)
    }

    fn line_item(order_id: i32, product_id: i32) -> NewLineItem {
        NewLineItem {
            order_id,
            product_id,
            unit_price: Decimal::from_str("23.25").unwrap(),
            quantity: 9,
            discount: 0.0,
        }
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a migrated Postgres"]
    async fn stale_version_edit_conflicts_while_the_line_item_survives() {
        let pool = test_pool().await;
        let repo = LineItemRepository::new(pool.clone());

        let (order_id, product_id) = seed_order_and_product(&pool).await;
        repo.create(&line_item(order_id, product_id)).await.unwrap();

        let stale = UpdateLineItem {
            unit_price: Decimal::from_str("25.00").unwrap(),
            quantity: 4,
            discount: 0.1,
            row_version: 1,
        };
        repo.update(order_id, product_id, &stale).await.unwrap();

        // The first edit bumped the version, so replaying it is a conflict.
        match repo.update(order_id, product_id, &stale).await {
            Err(AppError::ConcurrencyConflict) => {}
            other => panic!("stale edit should conflict, got {other:?}"),
        }

        // Once the row is gone the same stale edit resolves to NotFound.
        repo.delete(order_id, product_id).await.unwrap();
        match repo.update(order_id, product_id, &stale).await {
            Err(AppError::NotFound(_)) => {}
            other => panic!("edit of a deleted line item should be NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a migrated Postgres"]
    async fn duplicate_composite_key_is_a_validation_failure() {
        let pool = test_pool().await;
        let repo = LineItemRepository::new(pool.clone());

        let (order_id, product_id) = seed_order_and_product(&pool).await;
        repo.create(&line_item(order_id, product_id)).await.unwrap();

        match repo.create(&line_item(order_id, product_id)).await {
            Err(AppError::Validation(messages)) => {
                assert!(messages[0].contains("already has a line item"));
            }
            other => panic!("duplicate insert should fail validation, got {other:?}"),
        }
    }
}
