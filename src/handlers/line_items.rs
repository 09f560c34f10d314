use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::errors::AppError;
use crate::models::{NewLineItem, UpdateLineItem};

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

/// GET /line-items?page=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = state.line_items.list(query.page).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /line-items/{order_id}/{product_id}
pub async fn details(
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (order_id, product_id) = path.into_inner();
    let row = state.line_items.find(order_id, product_id).await?;
    Ok(HttpResponse::Ok().json(row))
}

/// POST /line-items
pub async fn create(
    state: web::Data<AppState>,
    payload: web::Json<NewLineItem>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    state.line_items.create(&payload).await?;
    Ok(HttpResponse::Created().finish())
}

/// PUT /line-items/{order_id}/{product_id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
    payload: web::Json<UpdateLineItem>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let (order_id, product_id) = path.into_inner();
    match state.line_items.update(order_id, product_id, &payload).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(AppError::ConcurrencyConflict) => {
            state.metrics.record_conflict("line_item");
            Err(AppError::ConcurrencyConflict)
        }
        Err(e) => Err(e),
    }
}

/// DELETE /line-items/{order_id}/{product_id}
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, AppError> {
    let (order_id, product_id) = path.into_inner();
    state.line_items.delete(order_id, product_id).await?;
    state.metrics.record_line_item_deleted();
    Ok(HttpResponse::NoContent().finish())
}
