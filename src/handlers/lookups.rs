use actix_web::{web, HttpResponse};

use super::AppState;
use crate::errors::AppError;

pub async fn customers(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.lookups.customers().await?))
}

pub async fn employees(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.lookups.employees().await?))
}

pub async fn products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.lookups.products().await?))
}

pub async fn shippers(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(state.lookups.shippers().await?))
}
