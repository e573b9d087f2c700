use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use super::response::{ApiResponse, ResponseBuilder};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    BusinessError(#[from] BusinessError),
    #[error(transparent)]
    DbError(#[from] DbError),
    #[error(transparent)]
    AuthError(#[from] AuthError),
    #[error(transparent)]
    InternalError(#[from] InternalError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BusinessError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Auth(#[from] AuthFlowError),
    #[error("Validation failed")]
    Validation(Vec<ValidationField>),
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,
}

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Failures of the bearer-token guard. Expired, forged and missing tokens are
/// all reported as `Unauthenticated`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database query failed")]
    QueryFailed,
}

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("Token signing failed")]
    TokenSigning,
    #[error("Password hashing failed")]
    PasswordHash,
    #[error("Unknown error")]
    Unknown,
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error");
        AppError::DbError(DbError::QueryFailed)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ValidationField {
    pub field: String,
    pub message: String,
}

impl AppError {
    pub fn unauthenticated() -> Self {
        AppError::AuthError(AuthError::Unauthenticated)
    }

    pub fn forbidden() -> Self {
        AppError::AuthError(AuthError::Forbidden)
    }

    /// Stable business code carried in the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            AppError::BusinessError(be) => match be {
                BusinessError::Validation(_) => 4001,
                BusinessError::Auth(AuthFlowError::InvalidCredentials) => 4011,
                BusinessError::User(UserError::UserNotFound) => 4041,
            },
            AppError::AuthError(AuthError::Unauthenticated) => 4010,
            AppError::AuthError(AuthError::Forbidden) => 4030,
            AppError::DbError(_) | AppError::InternalError(_) | AppError::IoError(_) => 5000,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BusinessError(BusinessError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::BusinessError(BusinessError::Auth(_)) => StatusCode::UNAUTHORIZED,
            AppError::BusinessError(BusinessError::User(_)) => StatusCode::NOT_FOUND,
            AppError::AuthError(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::AuthError(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::InternalError(_) | AppError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let trace_id = ResponseBuilder::current_trace_id();
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::BusinessError(BusinessError::Validation(fields)) => {
                let mut body: ApiResponse<Vec<ValidationField>> =
                    ApiResponse::error_with_trace(self.code(), self.to_string(), trace_id);
                body.data = Some(fields.clone());
                builder.json(body)
            }
            AppError::DbError(_) | AppError::InternalError(_) | AppError::IoError(_) => {
                tracing::error!(error = %self, "request failed");
                builder.json(ApiResponse::<serde_json::Value>::error_with_trace(
                    self.code(),
                    "Internal server error",
                    trace_id,
                ))
            }
            _ => builder.json(ApiResponse::<serde_json::Value>::error_with_trace(
                self.code(),
                self.to_string(),
                trace_id,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.error_response();
        let status = response.status();
        let body = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[actix_rt::test]
    async fn unauthenticated_has_stable_code() {
        let (status, json) = body_json(AppError::unauthenticated()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], 4010);
        assert_eq!(json["message"], "Unauthenticated");
        assert!(json["data"].is_null());
        assert!(json["traceId"].is_string());
        assert!(json["timestamp"].is_number());
    }

    #[actix_rt::test]
    async fn invalid_credentials_differs_from_unauthenticated() {
        let error = AppError::from(BusinessError::from(AuthFlowError::InvalidCredentials));
        let (status, json) = body_json(error).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], 4011);
        assert_eq!(json["message"], "Invalid credentials");
    }

    #[actix_rt::test]
    async fn forbidden_maps_to_403() {
        let (status, json) = body_json(AppError::forbidden()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], 4030);
    }

    #[actix_rt::test]
    async fn validation_error_returns_fields() {
        let fields = vec![ValidationField {
            field: "email".into(),
            message: "invalid email".into(),
        }];
        let (status, json) = body_json(AppError::from(BusinessError::Validation(fields))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], 4001);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data[0]["field"], "email");
        assert_eq!(data[0]["message"], "invalid email");
    }

    #[actix_rt::test]
    async fn internal_errors_hide_details() {
        let (status, json) = body_json(AppError::from(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], 5000);
        assert_eq!(json["message"], "Internal server error");
    }
}
