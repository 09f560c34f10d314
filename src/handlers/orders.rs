use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::errors::AppError;
use crate::models::{NewOrder, UpdateOrder};

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(alias = "searchString")]
    pub search: Option<String>,
}

fn first_page() -> i64 {
    1
}

/// GET /orders?page=&search=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = state
        .orders
        .list_summaries(query.search.as_deref(), query.page)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /orders/{order_id} — also the read behind delete confirmation.
pub async fn details(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let details = state.orders.find(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// POST /orders — order plus first line item, one transaction.
pub async fn create(
    state: web::Data<AppState>,
    payload: web::Json<NewOrder>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let correlation_id = Uuid::new_v4();
    let order_id = state.orders.create(&payload).await?;
    state.metrics.record_order_created();
    tracing::info!(%correlation_id, order_id, "order create accepted");

    Ok(HttpResponse::Created().json(serde_json::json!({ "order_id": order_id })))
}

/// PUT /orders/{order_id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<UpdateOrder>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let order_id = path.into_inner();
    let correlation_id = Uuid::new_v4();
    match state.orders.update(order_id, &payload).await {
        Ok(()) => {
            tracing::info!(%correlation_id, order_id, "order updated");
            Ok(HttpResponse::NoContent().finish())
        }
        Err(AppError::ConcurrencyConflict) => {
            state.metrics.record_conflict("order");
            Err(AppError::ConcurrencyConflict)
        }
        Err(e) => Err(e),
    }
}

/// DELETE /orders/{order_id} — removes the order and its line items.
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let correlation_id = Uuid::new_v4();
    let line_items_removed = state.orders.delete(order_id).await?;
    state.metrics.record_order_deleted(line_items_removed);
    tracing::info!(%correlation_id, order_id, line_items_removed, "order delete executed");
    Ok(HttpResponse::NoContent().finish())
}
