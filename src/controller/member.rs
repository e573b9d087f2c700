use actix_web::{HttpResponse, web};
use std::sync::Arc;

use crate::domain::Role;
use crate::middleware::{AuthGuard, AuthenticatedUser};
use crate::repository::member::MemberRepository;
use crate::service::member::MemberService;
use crate::util::query::RawListQuery;
use crate::util::token::TokenConfig;
use crate::util::{AppError, ResponseBuilder};

/// Roles allowed to browse the member directory.
pub const MEMBER_READERS: &[Role] = &[Role::Admin, Role::Clergy, Role::Elder, Role::Staff];

pub struct MemberController<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    service: Arc<MemberService<M>>,
}

impl<M> Clone for MemberController<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<M> MemberController<M>
where
    M: MemberRepository + Send + Sync + 'static,
{
    pub fn new(service: MemberService<M>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn configure(
        cfg: &mut web::ServiceConfig,
        controller: MemberController<M>,
        token_config: Arc<TokenConfig>,
    ) {
        cfg.app_data(web::Data::new(controller)).service(
            web::resource("/members")
                .wrap(AuthGuard::new(token_config))
                .route(web::get().to(Self::list)),
        );
    }

    async fn list(
        controller: web::Data<MemberController<M>>,
        user: AuthenticatedUser,
        query: RawListQuery,
    ) -> Result<HttpResponse, AppError> {
        user.require_role(MEMBER_READERS)?;
        let page = controller.service.list(&query).await?;
        ResponseBuilder::ok(page)
    }
}
