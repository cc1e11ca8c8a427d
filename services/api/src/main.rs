use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod course_cache;
mod error;
mod extract;
mod images;
mod jwt;
mod mailer;
mod middleware;
mod models;
mod repositories;
mod routes;
mod session;
mod state;
mod validation;

use common::cache::{RedisConfig, RedisPool};
use common::database::{self, DatabaseConfig};

use crate::course_cache::CourseCache;
use crate::jwt::{JwtConfig, TokenService};
use crate::repositories::{CourseRepository, UserRepository};
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting course platform service");

    // Connect to PostgreSQL, waiting for it to come up if needed
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::connect_with_retry(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize the Redis client
    let redis_config = RedisConfig::from_env()?;
    let cache = RedisPool::new(&redis_config).await?;

    // Initialize the token service
    let jwt_config = JwtConfig::from_env()?;
    let tokens = TokenService::new(jwt_config);

    // Sessions live exactly as long as the refresh token that minted them
    let sessions = SessionStore::new(cache.clone(), tokens.refresh_ttl());

    let users = UserRepository::new(pool.clone());
    let courses = CourseRepository::new(pool.clone());
    let course_cache = CourseCache::new(cache.clone(), courses.clone());

    let mailer = mailer::from_env();
    let images = images::from_env();

    let cookie_secure = std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let app_state = AppState {
        db_pool: pool,
        cache,
        tokens,
        sessions,
        users,
        courses,
        course_cache,
        mailer,
        images,
        cookie_secure,
    };

    let app = routes::create_router(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Course platform service listening on 0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
