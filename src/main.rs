use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use congregation_backend::config::Settings;
use congregation_backend::controller::{AuthController, MemberController};
use congregation_backend::middleware::RequestId;
use congregation_backend::repository::{PgMemberRepository, PgUserRepository};
use congregation_backend::service::{AuthService, MemberService};
use congregation_backend::util::{AppError, ResponseBuilder, TokenConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("congregation_backend={0},actix_web={0}", settings.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let token_config = Arc::new(
        TokenConfig::from_settings(&settings.jwt).context("invalid jwt configuration")?,
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.connection_string())
        .await
        .context("failed to connect to database")?;

    let auth_controller = AuthController::new(AuthService::new(
        PgUserRepository::new(pool.clone()),
        token_config.clone(),
    ));
    let member_controller =
        MemberController::new(MemberService::new(PgMemberRepository::new(pool.clone())));

    tracing::info!(
        host = %settings.application.host,
        port = settings.application.port,
        "starting congregation backend"
    );

    let allowed_origins = settings.application.allowed_origins.clone();
    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        let auth_controller = auth_controller.clone();
        let member_controller = member_controller.clone();
        let token_config = token_config.clone();

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health_check))
                    .configure(|cfg| AuthController::configure(cfg, auth_controller))
                    .configure(|cfg| MemberController::configure(cfg, member_controller, token_config)),
            )
    })
    .bind((settings.application.host.as_str(), settings.application.port))?
    .run()
    .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn health_check() -> Result<actix_web::HttpResponse, AppError> {
    #[derive(serde::Serialize)]
    struct HealthStatus {
        status: &'static str,
        service: &'static str,
        version: &'static str,
    }

    ResponseBuilder::ok(HealthStatus {
        status: "healthy",
        service: "congregation-backend",
        version: env!("CARGO_PKG_VERSION"),
    })
}
