use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::{CustomerRef, EmployeeRef, ProductRef, ShipperRef};

/// Read-only id/display-name lists backing client-side select controls.
pub struct LookupRepository {
    pool: PgPool,
}

impl LookupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn customers(&self) -> Result<Vec<CustomerRef>, AppError> {
        Ok(sqlx::query_as(
            "SELECT customer_id, company_name FROM customers ORDER BY company_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn employees(&self) -> Result<Vec<EmployeeRef>, AppError> {
        Ok(sqlx::query_as(
            "SELECT employee_id, first_name FROM employees ORDER BY first_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn products(&self) -> Result<Vec<ProductRef>, AppError> {
        Ok(sqlx::query_as(
            "SELECT product_id, product_name FROM products ORDER BY product_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn shippers(&self) -> Result<Vec<ShipperRef>, AppError> {
        Ok(sqlx::query_as(
            "SELECT shipper_id, company_name FROM shippers ORDER BY company_name",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
