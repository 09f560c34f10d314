use futures_util::TryStreamExt;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::{self, NewOrder, OrderDetails, OrderSummary, OrderWithNames, LineItemRow, UpdateOrder};
use crate::pagination::{self, Page, DEFAULT_PAGE_SIZE};

// ============================================================================
// Order Repository
// ============================================================================
//
// Owns the order summary aggregation and the order lifecycle:
//
// 1. list_summaries: join orders/customers/employees/order_details, group by
//    order identity, SUM(unit_price * quantity) per group, optional
//    OR-substring filter, then paginate
// 2. find: header row plus line items for the details (and delete-confirm) view
// 3. create: order + first line item in one transaction
// 4. update: optimistic, keyed on row_version
// 5. delete: child line items then the order, atomically
//
// ============================================================================

const SUMMARY_SELECT: &str = "\
SELECT o.order_id,
       c.company_name AS customer_name,
       o.order_date,
       SUM(d.unit_price * d.quantity) AS total_cost,
       e.first_name AS assigned_to,
       o.ship_address,
       o.ship_city,
       o.ship_country
  FROM orders o
  JOIN customers c ON c.customer_id = o.customer_id
  JOIN employees e ON e.employee_id = o.employee_id
  JOIN order_details d ON d.order_id = o.order_id";

// Case-sensitive substring match, OR across the four searchable fields.
const SUMMARY_FILTER: &str = "
 WHERE c.company_name LIKE $1
    OR e.first_name LIKE $1
    OR o.ship_country LIKE $1
    OR o.ship_city LIKE $1";

const SUMMARY_GROUP: &str = "
 GROUP BY o.order_id, c.company_name, o.order_date, e.first_name,
          o.ship_address, o.ship_city, o.ship_country";

fn summary_query(filtered: bool) -> String {
    if filtered {
        // A filtered search sorts by customer name and keeps every match on
        // one page (page_size = match count), as the original listing did.
        format!("{SUMMARY_SELECT}{SUMMARY_FILTER}{SUMMARY_GROUP} ORDER BY customer_name ASC LIMIT $2 OFFSET $3")
    } else {
        format!("{SUMMARY_SELECT}{SUMMARY_GROUP} ORDER BY o.order_date DESC LIMIT $1 OFFSET $2")
    }
}

fn summary_count_query(filtered: bool) -> String {
    let filter = if filtered { SUMMARY_FILTER } else { "" };
    format!("SELECT COUNT(*) FROM ({SUMMARY_SELECT}{filter}{SUMMARY_GROUP}) AS g")
}

fn like_pattern(filter: &str) -> String {
    format!("%{filter}%")
}

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paged order summaries. `filter` empty or absent takes the date-sorted
    /// path with a fixed page size; otherwise everything matching lands on
    /// page 1, sorted by customer name.
    pub async fn list_summaries(
        &self,
        filter: Option<&str>,
        page: i64,
    ) -> Result<Page<OrderSummary>, AppError> {
        let page = pagination::normalize_page(page);

        match filter {
            Some(f) if !f.is_empty() => {
                let pattern = like_pattern(f);
                let count_sql = summary_count_query(true);
                let total: i64 = sqlx::query_scalar(&count_sql)
                    .bind(&pattern)
                    .fetch_one(&self.pool)
                    .await?;
                let page_size = total.max(1);
                let sql = summary_query(true);
                let mut rows = sqlx::query_as::<_, OrderSummary>(&sql)
                    .bind(&pattern)
                    .bind(page_size)
                    .bind(pagination::offset(page, page_size))
                    .fetch(&self.pool);

                let mut items = Vec::new();
                while let Some(summary) = rows.try_next().await? {
                    items.push(summary);
                }
                tracing::debug!(filter = f, total, "filtered order summary listing");
                Ok(Page::new(items, page, page_size, total))
            }
            _ => {
                let count_sql = summary_count_query(false);
                let total: i64 = sqlx::query_scalar(&count_sql)
                    .fetch_one(&self.pool)
                    .await?;
                let sql = summary_query(false);
                let mut rows = sqlx::query_as::<_, OrderSummary>(&sql)
                    .bind(DEFAULT_PAGE_SIZE)
                    .bind(pagination::offset(page, DEFAULT_PAGE_SIZE))
                    .fetch(&self.pool);

                let mut items = Vec::new();
                while let Some(summary) = rows.try_next().await? {
                    items.push(summary);
                }
                Ok(Page::new(items, page, DEFAULT_PAGE_SIZE, total))
            }
        }
    }

    /// Full details for one order: header with related display names, line
    /// items with product names, and the recomputed total.
    pub async fn find(&self, order_id: i32) -> Result<OrderDetails, AppError> {
        let header = sqlx::query_as::<_, OrderWithNames>(
            "SELECT o.*,
                    c.company_name AS customer_name,
                    e.first_name AS employee_name,
                    s.company_name AS shipper_name
               FROM orders o
               LEFT JOIN customers c ON c.customer_id = o.customer_id
               LEFT JOIN employees e ON e.employee_id = o.employee_id
               LEFT JOIN shippers s ON s.shipper_id = o.ship_via
              WHERE o.order_id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("order"))?;

        let line_items = sqlx::query_as::<_, LineItemRow>(
            "SELECT d.*, p.product_name
               FROM order_details d
               JOIN products p ON p.product_id = d.product_id
              WHERE d.order_id = $1
              ORDER BY d.product_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let total_cost = models::total_cost(line_items.iter().map(|row| &row.item));
        Ok(OrderDetails {
            header,
            line_items,
            total_cost,
        })
    }

    /// Insert the order and its first line item as one transaction; both rows
    /// land or neither does. Returns the generated order id.
    pub async fn create(&self, order: &NewOrder) -> Result<i32, AppError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            "INSERT INTO orders (customer_id, employee_id, order_date, required_date,
                                 shipped_date, ship_via, freight, ship_name, ship_address,
                                 ship_city, ship_region, ship_postal_code, ship_country)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING order_id",
        )
        .bind(&order.customer_id)
        .bind(order.employee_id)
        .bind(order.order_date)
        .bind(order.required_date)
        .bind(order.shipped_date)
        .bind(order.ship_via)
        .bind(order.freight)
        .bind(&order.ship_name)
        .bind(&order.ship_address)
        .bind(&order.ship_city)
        .bind(&order.ship_region)
        .bind(&order.ship_postal_code)
        .bind(&order.ship_country)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(order.product_id)
        .bind(order.unit_price)
        .bind(order.quantity)
        .bind(order.discount)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id, product_id = order.product_id, "order created with first line item");
        Ok(order_id)
    }

    /// Optimistic update. Zero rows affected means the version moved under
    /// us: NotFound if the order vanished, ConcurrencyConflict otherwise.
    pub async fn update(&self, order_id: i32, update: &UpdateOrder) -> Result<(), AppError> {
        let affected = sqlx::query(
            "UPDATE orders
                SET customer_id = $1, employee_id = $2, order_date = $3, required_date = $4,
                    shipped_date = $5, ship_via = $6, freight = $7, ship_name = $8,
                    ship_address = $9, ship_city = $10, ship_region = $11,
                    ship_postal_code = $12, ship_country = $13,
                    row_version = row_version + 1
              WHERE order_id = $14 AND row_version = $15",
        )
        .bind(&update.customer_id)
        .bind(update.employee_id)
        .bind(update.order_date)
        .bind(update.required_date)
        .bind(update.shipped_date)
        .bind(update.ship_via)
        .bind(update.freight)
        .bind(&update.ship_name)
        .bind(&update.ship_address)
        .bind(&update.ship_city)
        .bind(&update.ship_region)
        .bind(&update.ship_postal_code)
        .bind(&update.ship_country)
        .bind(order_id)
        .bind(update.row_version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            if self.exists(order_id).await? {
                tracing::warn!(order_id, stale_version = update.row_version, "order edit lost the race");
                return Err(AppError::ConcurrencyConflict);
            }
            return Err(AppError::NotFound("order"));
        }
        Ok(())
    }

    /// Delete the order and every line item referencing it, atomically.
    /// A concurrent second delete finds no order row and gets NotFound.
    /// Returns how many line items went with the order.
    pub async fn delete(&self, order_id: i32) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let line_items_removed = sqlx::query("DELETE FROM order_details WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let orders_removed = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if orders_removed == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("order"));
        }

        tx.commit().await?;
        tracing::info!(order_id, line_items_removed, "order deleted");
        Ok(line_items_removed)
    }

    pub async fn exists(&self, order_id: i32) -> Result<bool, AppError> {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}
