//! HTTP surface of the course platform

use axum::{
    Json, Router, middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, auth_middleware, require_admin};
use crate::state::AppState;

pub mod course;
pub mod user;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/registration", post(user::register))
        .route("/activate-user", post(user::activate))
        .route("/login", post(user::login))
        .route("/social-auth", post(user::social_auth))
        .route("/refresh", get(user::refresh))
        .route("/get-course/:id", get(course::get_single_course))
        .route("/get-courses", get(course::get_all_courses));

    let authenticated = Router::new()
        .route("/logout", get(user::logout))
        .route("/me", get(user::me))
        .route("/update-user-info", put(user::update_info))
        .route("/update-user-password", put(user::update_password))
        .route("/update-user-avatar", put(user::update_avatar))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/create-course", post(course::create_course))
        .route("/edit-course/:id", put(course::edit_course))
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "course-platform",
    }))
}

/// Build the auth cookie pair for a freshly minted token pair
///
/// Both cookies are httpOnly and SameSite=Lax; `Secure` follows the
/// deployment configuration.
pub(crate) fn auth_cookies(
    state: &AppState,
    access_token: String,
    refresh_token: String,
) -> (Cookie<'static>, Cookie<'static>) {
    let access = base_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token,
        state.cookie_secure,
        time::Duration::seconds(state.tokens.access_ttl() as i64),
    );

    let refresh = base_cookie(
        REFRESH_TOKEN_COOKIE,
        refresh_token,
        state.cookie_secure,
        time::Duration::seconds(state.tokens.refresh_ttl() as i64),
    );

    (access, refresh)
}

/// Build the expired cookie pair that ends a login in the browser
pub(crate) fn expired_cookies(state: &AppState) -> (Cookie<'static>, Cookie<'static>) {
    let access = base_cookie(
        ACCESS_TOKEN_COOKIE,
        String::new(),
        state.cookie_secure,
        time::Duration::ZERO,
    );

    let refresh = base_cookie(
        REFRESH_TOKEN_COOKIE,
        String::new(),
        state.cookie_secure,
        time::Duration::ZERO,
    );

    (access, refresh)
}

fn base_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    max_age: time::Duration,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_max_age(max_age);
    cookie
}
