use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::blog_service::BlogService;
use data::post_repository::DynPostRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use data::user_repository::DynUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level, &settings.environment)?;

    let pool = create_pool(&settings.database_url, settings.database_max_connections).await?;
    run_migrations(&pool).await?;

    let jwt = JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds)
        .context("failed to configure token signing")?;

    let user_repo: DynUserRepository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo: DynPostRepository = Arc::new(PostgresPostRepository::new(pool));

    let state = AppState::new(
        Arc::new(AuthService::new(user_repo, jwt.clone())),
        Arc::new(BlogService::new(post_repo)),
        Arc::new(jwt),
        &settings.environment,
    );

    info!(environment = %settings.environment, "starting blog server");
    server::run_http(&settings, state).await
}
