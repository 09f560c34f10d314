use std::sync::Arc;
use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::web;

use crate::metrics::Metrics;
use crate::repository::{LineItemRepository, LookupRepository, OrderRepository};

mod line_items;
mod lookups;
mod observability;
mod orders;

// ============================================================================
// HTTP Layer
// ============================================================================
//
// Thin handlers over the repositories: deserialize, validate, delegate,
// serialize. The error taxonomy maps to status codes in errors.rs.
//
// ============================================================================

pub struct AppState {
    pub orders: OrderRepository,
    pub line_items: LineItemRepository,
    pub lookups: LookupRepository,
    pub metrics: Arc<Metrics>,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(orders::list))
            .route("", web::post().to(orders::create))
            .route("/{order_id}", web::get().to(orders::details))
            .route("/{order_id}", web::put().to(orders::update))
            .route("/{order_id}", web::delete().to(orders::delete)),
    )
    .service(
        web::scope("/line-items")
            .route("", web::get().to(line_items::list))
            .route("", web::post().to(line_items::create))
            .route("/{order_id}/{product_id}", web::get().to(line_items::details))
            .route("/{order_id}/{product_id}", web::put().to(line_items::update))
            .route("/{order_id}/{product_id}", web::delete().to(line_items::delete)),
    )
    .route("/customers", web::get().to(lookups::customers))
    .route("/employees", web::get().to(lookups::employees))
    .route("/products", web::get().to(lookups::products))
    .route("/shippers", web::get().to(lookups::shippers))
    .route("/health", web::get().to(observability::health))
    .route("/metrics", web::get().to(observability::metrics));
}

/// Records request count and latency per matched route pattern.
pub async fn track_http(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let started = Instant::now();
    let endpoint = req
        .match_pattern()
        .unwrap_or_else(|| req.path().to_string());
    let metrics = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.metrics.clone());

    let res = next.call(req).await?;

    if let Some(metrics) = metrics {
        metrics.record_http_request(
            &endpoint,
            res.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }
    Ok(res)
}
