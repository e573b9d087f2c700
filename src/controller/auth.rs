use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::dto::auth::LoginRequest;
use crate::middleware::{AuthGuard, AuthenticatedUser};
use crate::repository::user::UserRepository;
use crate::service::auth::AuthService;
use crate::util::{AppError, ResponseBuilder};

pub struct AuthController<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    service: Arc<AuthService<R>>,
}

impl<R> Clone for AuthController<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<R> AuthController<R>
where
    R: UserRepository + Send + Sync + 'static,
{
    pub fn new(service: AuthService<R>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn configure(cfg: &mut web::ServiceConfig, controller: AuthController<R>) {
        let guard = AuthGuard::new(controller.service.token_config());
        cfg.app_data(web::Data::new(controller))
            .route("/auth/login", web::post().to(Self::login))
            .service(
                web::resource("/auth/profile")
                    .wrap(guard)
                    .route(web::get().to(Self::profile)),
            );
    }

    async fn login(
        controller: web::Data<AuthController<R>>,
        payload: web::Json<LoginRequest>,
    ) -> Result<HttpResponse, AppError> {
        let response = controller.service.login(payload.into_inner()).await?;
        ResponseBuilder::ok(response)
    }

    async fn profile(
        controller: web::Data<AuthController<R>>,
        user: AuthenticatedUser,
    ) -> Result<HttpResponse, AppError> {
        let profile = controller.service.profile(user.user_id).await?;
        ResponseBuilder::ok(profile)
    }
}
