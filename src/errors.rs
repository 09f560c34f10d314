use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

// ============================================================================
// Application Error Taxonomy
// ============================================================================
//
// Three caller-visible outcomes plus the storage failure bucket:
// - NotFound: a referenced entity is absent (returned, never panicked)
// - Validation: input failed required-field or range constraints
// - ConcurrencyConflict: optimistic row_version mismatch on update
// - Database: anything sqlx reports; details are logged, not leaked
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed")]
    Validation(Vec<String>),

    #[error("row was modified or removed by another request")]
    ConcurrencyConflict,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ConcurrencyConflict => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NotFound(entity) => serde_json::json!({
                "error": "not_found",
                "entity": entity,
            }),
            AppError::Validation(messages) => serde_json::json!({
                "error": "validation_failed",
                "messages": messages,
            }),
            AppError::ConcurrencyConflict => serde_json::json!({
                "error": "concurrency_conflict",
            }),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                serde_json::json!({ "error": "internal" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(AppError::NotFound("order").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation(vec!["bad".into()]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::ConcurrencyConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Database(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(AppError::NotFound("line item").to_string(), "line item not found");
    }
}
