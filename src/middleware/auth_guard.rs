use std::cell::RefCell;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};

use crate::domain::Role;
use crate::util::AppError;
use crate::util::token::{self, Claims, SessionIdentity, TokenConfig};

/// Authentication middleware that verifies Bearer session tokens and injects
/// the caller's identity into the request extensions.
#[derive(Clone)]
pub struct AuthGuard {
    token_config: Arc<TokenConfig>,
}

impl AuthGuard {
    pub fn new(token_config: Arc<TokenConfig>) -> Self {
        Self { token_config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardMiddleware {
            service: Rc::new(RefCell::new(service)),
            token_config: self.token_config.clone(),
        }))
    }
}

pub struct AuthGuardMiddleware<S> {
    service: Rc<RefCell<S>>,
    token_config: Arc<TokenConfig>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.borrow_mut().poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate_request(req.request(), &self.token_config) {
            Some(user) => {
                tracing::debug!(user_id = user.user_id, role = %user.role, "request authenticated");
                req.extensions_mut().insert(user);
            }
            None => {
                return Box::pin(async move {
                    Ok(req
                        .error_response(AppError::unauthenticated())
                        .map_into_right_body())
                });
            }
        }

        let fut = self.service.borrow_mut().call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

fn authenticate_request(req: &HttpRequest, config: &TokenConfig) -> Option<AuthenticatedUser> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let bearer = token::extract_bearer_token(header_value)?;
    let claims: Claims<SessionIdentity> = token::verify_token(config, bearer)?;
    let user_id = match claims.payload.sub.parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            tracing::debug!(sub = %claims.payload.sub, "token subject is not a user id");
            return None;
        }
    };

    Some(AuthenticatedUser {
        user_id,
        email: claims.payload.email.clone(),
        username: claims.payload.username.clone(),
        role: claims.payload.role,
        claims,
    })
}

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub claims: Claims<SessionIdentity>,
}

impl AuthenticatedUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::info!(user_id = self.user_id, role = %self.role, "role not permitted");
            Err(AppError::forbidden())
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(Error::from(AppError::unauthenticated()))),
        }
    }
}
