//! Registration, activation, login, session, and profile handlers

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::middleware::REFRESH_TOKEN_COOKIE;
use crate::models::{Avatar, NewUser, PendingUser, User};
use crate::routes::{auth_cookies, expired_cookies};
use crate::state::AppState;
use crate::validation::{validate_email, validate_name, validate_password};

/// Request body for user registration
#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// Request body for account activation
#[derive(Deserialize)]
pub struct ActivationRequest {
    pub activation_token: Option<String>,
    pub activation_code: Option<String>,
}

/// Request body for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for social login
#[derive(Deserialize)]
pub struct SocialAuthRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
}

/// Request body for profile updates
#[derive(Deserialize)]
pub struct UpdateInfoRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Request body for password changes
#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Request body for avatar replacement
#[derive(Deserialize)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

/// Mint a token pair for a user, mirror the session, and set cookies
///
/// The shared tail of login, social auth, and refresh.
async fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> ApiResult<(CookieJar, String)> {
    let access_token = state.tokens.issue_access_token(user.id)?;
    let refresh_token = state.tokens.issue_refresh_token(user.id)?;

    state.sessions.save(user).await?;

    let (access_cookie, refresh_cookie) = auth_cookies(state, access_token.clone(), refresh_token);
    Ok((jar.add(access_cookie).add(refresh_cookie), access_token))
}

/// `POST /registration`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegistrationRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_name(&body.name).map_err(ApiError::Validation)?;
    validate_email(&body.email).map_err(ApiError::Validation)?;
    validate_password(&body.password).map_err(ApiError::Validation)?;

    // Known leak of account existence, kept intentionally: login errors
    // stay generic but registration names the clash.
    if state.users.email_exists(&body.email).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let pending = PendingUser {
        name: body.name,
        email: body.email,
        password: body.password,
        avatar: body.avatar,
    };

    let (ticket, code) = state.tokens.issue_activation_ticket(&pending)?;

    let mail_data = json!({
        "user": { "name": pending.name },
        "activation_code": code,
    });

    if let Err(e) = state
        .mailer
        .send(&pending.email, "Account Activation", "activation-mail", mail_data)
        .await
    {
        // The ticket stays valid; only the delivery failed.
        error!("Failed to send activation mail to {}: {}", pending.email, e);
        return Err(ApiError::Internal(e));
    }

    info!("Issued activation ticket for {}", pending.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!(
                "Please check your email: {} to activate your account",
                pending.email
            ),
            "activation_token": ticket,
        })),
    ))
}

/// `POST /activate-user`
pub async fn activate(
    State(state): State<AppState>,
    Json(body): Json<ActivationRequest>,
) -> ApiResult<impl IntoResponse> {
    let (ticket, code) = match (body.activation_token, body.activation_code) {
        (Some(t), Some(c)) => (t, c),
        _ => {
            return Err(ApiError::Validation(
                "Activation token and code are required".to_string(),
            ));
        }
    };

    let pending = state.tokens.verify_activation_ticket(&ticket, &code)?;

    if state.users.email_exists(&pending.email).await? {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let user = state
        .users
        .create(&NewUser {
            name: pending.name,
            email: pending.email,
            password: Some(pending.password),
            avatar: pending.avatar,
            is_verified: true,
        })
        .await?;

    info!("Activated account for {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account activated successfully",
            "user": user,
        })),
    ))
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Please enter email and password".to_string(),
        ));
    }

    // Generic on both unknown email and wrong password, so a caller
    // cannot tell which one failed.
    let user = state
        .users
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid email or password".to_string()))?;

    // Social accounts have no hash to verify against; keep the response
    // indistinguishable from a wrong password.
    if !user.has_usable_password() || !state.users.verify_password(&user, &body.password)? {
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    }

    let (jar, access_token) = issue_session(&state, jar, &user).await?;

    info!("Login for user {}", user.id);

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": user,
            "access_token": access_token,
        })),
    ))
}

/// `POST /social-auth`
pub async fn social_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SocialAuthRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_email(&body.email).map_err(ApiError::Validation)?;
    validate_name(&body.name).map_err(ApiError::Validation)?;

    let user = match state.users.find_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            // The provider already verified the address; the account
            // has no usable password.
            state
                .users
                .create(&NewUser {
                    name: body.name,
                    email: body.email,
                    password: None,
                    avatar: body.avatar,
                    is_verified: true,
                })
                .await?
        }
    };

    let (jar, access_token) = issue_session(&state, jar, &user).await?;

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": user,
            "access_token": access_token,
        })),
    ))
}

/// `GET /logout` (authenticated)
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    state.sessions.delete(user.id).await?;

    let (access_cookie, refresh_cookie) = expired_cookies(&state);

    Ok((
        jar.add(access_cookie).add(refresh_cookie),
        Json(json!({
            "success": true,
            "message": "Logged out successfully",
        })),
    ))
}

/// `GET /refresh`
///
/// Not behind the auth gate: its credential is the refresh cookie. A
/// valid refresh token without a live session cannot re-mint anything.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Auth("Could not refresh access token".to_string()))?;

    let claims = state
        .tokens
        .verify_refresh_token(&token)
        .map_err(|_| ApiError::Auth("Could not refresh access token".to_string()))?;

    let user = state
        .sessions
        .get(claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("Could not refresh access token".to_string()))?;

    let (jar, access_token) = issue_session(&state, jar, &user).await?;

    Ok((
        jar,
        Json(json!({
            "success": true,
            "access_token": access_token,
        })),
    ))
}

/// `GET /me` (authenticated)
///
/// Serves the identity the gate pulled from the session mirror; no
/// canonical-store read happens here.
pub async fn me(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "user": user,
    }))
}

/// `PUT /update-user-info` (authenticated)
pub async fn update_info(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<UpdateInfoRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(name) = &body.name {
        validate_name(name).map_err(ApiError::Validation)?;
    }

    if let Some(email) = &body.email {
        validate_email(email).map_err(ApiError::Validation)?;
        if email != &user.email && state.users.email_exists(email).await? {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
    }

    let updated = state
        .users
        .update_info(user.id, body.name.as_deref(), body.email.as_deref())
        .await?;

    state.sessions.save(&updated).await?;

    Ok(Json(json!({
        "success": true,
        "user": updated,
    })))
}

/// `PUT /update-user-password` (authenticated)
pub async fn update_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<UpdatePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.old_password.is_empty() || body.new_password.is_empty() {
        return Err(ApiError::Validation(
            "Please enter old and new password".to_string(),
        ));
    }
    validate_password(&body.new_password).map_err(ApiError::Validation)?;

    // The session snapshot never carries the hash; read it canonically.
    let canonical = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !canonical.has_usable_password() {
        return Err(ApiError::Validation("Invalid user".to_string()));
    }

    if !state.users.verify_password(&canonical, &body.old_password)? {
        return Err(ApiError::Auth("Invalid old password".to_string()));
    }

    let updated = state
        .users
        .update_password(user.id, &body.new_password)
        .await?;

    state.sessions.save(&updated).await?;

    Ok(Json(json!({
        "success": true,
        "user": updated,
    })))
}

/// `PUT /update-user-avatar` (authenticated)
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<UpdateAvatarRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.avatar.is_empty() {
        return Err(ApiError::Validation("Please provide an avatar".to_string()));
    }

    if let Some(old) = &user.avatar {
        state.images.destroy(&old.public_id).await?;
    }

    let uploaded = state.images.upload(&body.avatar, "avatars").await?;

    let updated = state
        .users
        .update_avatar(
            user.id,
            &Some(Avatar {
                public_id: uploaded.public_id,
                url: uploaded.secure_url,
            }),
        )
        .await?;

    state.sessions.save(&updated).await?;

    Ok(Json(json!({
        "success": true,
        "user": updated,
    })))
}
