//! Application state shared across handlers

use std::sync::Arc;

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::course_cache::CourseCache;
use crate::images::ImageStore;
use crate::jwt::TokenService;
use crate::mailer::Mailer;
use crate::repositories::{CourseRepository, UserRepository};
use crate::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub cache: RedisPool,
    pub tokens: TokenService,
    pub sessions: SessionStore,
    pub users: UserRepository,
    pub courses: CourseRepository,
    pub course_cache: CourseCache,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageStore>,
    /// Mark auth cookies `Secure`; enabled in production deployments
    pub cookie_secure: bool,
}
