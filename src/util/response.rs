//! JSON envelope shared by every `/api/v1` response.
//!
//! Successful calls answer `{code: 2000, message: "OK", data, traceId, timestamp}`;
//! failures reuse the same shape with their business code and `data: null`
//! (or the offending fields for validation errors). `traceId` equals the
//! `X-Request-Id` echoed by [`crate::middleware::RequestId`].

use actix_web::HttpResponse;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::query::PageWindow;

pub const SUCCESS_CODE: i32 = 2000;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
    #[serde(rename = "traceId")]
    pub trace_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success_with_trace(data: T, trace_id: String) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "OK".to_string(),
            data: Some(data),
            trace_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn error_with_trace(code: i32, message: impl Into<String>, trace_id: String) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            trace_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn ok<T>(data: T) -> Result<HttpResponse, crate::util::AppError>
    where
        T: Serialize,
    {
        let body = ApiResponse::success_with_trace(data, Self::current_trace_id());
        Ok(HttpResponse::Ok().json(body))
    }

    /// The id scoped by the request-id middleware. Outside that scope (unit
    /// tests, handlers mounted without the middleware) a fresh UUID is used.
    pub(crate) fn current_trace_id() -> String {
        REQUEST_ID
            .try_with(|id| id.clone())
            .unwrap_or_else(|_| Uuid::new_v4().to_string())
    }
}

/// Page coordinates returned with a listing; `page_size` is the effective
/// limit after clamping, not the raw `limit` the client sent.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct PagedData<T>
where
    T: Serialize,
{
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PagedData<T>
where
    T: Serialize,
{
    pub fn new(items: Vec<T>, window: &PageWindow, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination {
                page: window.page,
                page_size: window.limit,
                total,
            },
        }
    }
}

tokio::task_local! {
    /// Request id of the request being served, set by `RequestId`.
    pub static REQUEST_ID: String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[tokio::test]
    async fn success_envelope_uses_scoped_request_id() {
        let resp = REQUEST_ID
            .scope("req-777".to_string(), async { ResponseBuilder::ok("pong").unwrap() })
            .await;
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], SUCCESS_CODE);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"], "pong");
        assert_eq!(json["traceId"], "req-777");
    }

    #[test]
    fn unscoped_trace_id_is_a_uuid() {
        let id = ResponseBuilder::current_trace_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn paged_data_reports_effective_window() {
        let window = PageWindow {
            page: 3,
            limit: 25,
            skip: 50,
        };
        let paged = PagedData::new(vec!["Debora"], &window, 51);
        let json = serde_json::to_value(&paged).unwrap();
        assert_eq!(json["pagination"]["page"], 3);
        assert_eq!(json["pagination"]["page_size"], 25);
        assert_eq!(json["pagination"]["total"], 51);
        assert_eq!(json["items"][0], "Debora");
    }
}
