use std::future::{Ready, ready};
use std::pin::Pin;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::Error;
use uuid::Uuid;

use crate::util::response::REQUEST_ID;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Gives every request an `X-Request-Id`: the incoming value when present,
/// otherwise a fresh UUID v4. The id is set as the `REQUEST_ID` task-local
/// for both the synchronous part of the inner `call` and the returned future,
/// so envelopes rendered by inner middleware carry the echoed id.
pub struct RequestId;

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestIdMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware { service }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + 'static>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header_name = HeaderName::from_static(REQUEST_ID_HEADER);
        let request_id = req
            .headers()
            .get(&header_name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let fut = REQUEST_ID.sync_scope(request_id.clone(), || self.service.call(req));
        let fut = REQUEST_ID.scope(request_id.clone(), fut);

        Box::pin(async move {
            let mut res = fut.await?;
            if let Ok(val) = HeaderValue::from_str(&request_id) {
                res.headers_mut().insert(header_name, val);
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ResponseBuilder;
    use actix_web::{App, test, web};

    async fn echo_trace() -> Result<actix_web::HttpResponse, crate::util::AppError> {
        ResponseBuilder::ok("pong")
    }

    #[actix_rt::test]
    async fn incoming_request_id_is_reused() {
        let app = test::init_service(
            App::new()
                .wrap(RequestId)
                .route("/ping", web::get().to(echo_trace)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header(("X-Request-Id", "req-123"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-123");
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["traceId"], "req-123");
    }

    #[actix_rt::test]
    async fn guard_rejection_carries_the_echoed_request_id() {
        use crate::middleware::AuthGuard;
        use crate::util::token::{DEFAULT_VALIDITY_SECS, TokenConfig};
        use std::sync::Arc;

        let config = Arc::new(TokenConfig::hs256(b"request-id-guard-secret", DEFAULT_VALIDITY_SECS));
        let app = test::init_service(
            App::new()
                .wrap(AuthGuard::new(config))
                .wrap(RequestId)
                .route("/ping", web::get().to(echo_trace)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header(("X-Request-Id", "req-123"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-123");
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 4010);
        assert_eq!(body["traceId"], "req-123");
    }

    #[actix_rt::test]
    async fn missing_request_id_is_generated() {
        let app = test::init_service(
            App::new()
                .wrap(RequestId)
                .route("/ping", web::get().to(echo_trace)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        let generated = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();
        assert!(Uuid::parse_str(&generated).is_ok());
    }
}
