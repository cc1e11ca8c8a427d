//! Course creation, editing, and cached read handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::models::{Avatar, NewCourse};
use crate::state::AppState;

/// Resolve the raw thumbnail payload into an image-store reference
async fn resolve_thumbnail(
    state: &AppState,
    course: &NewCourse,
) -> ApiResult<Option<Avatar>> {
    let Some(data) = &course.thumbnail else {
        return Ok(None);
    };

    let uploaded = state.images.upload(data, "courses").await?;
    Ok(Some(Avatar {
        public_id: uploaded.public_id,
        url: uploaded.secure_url,
    }))
}

/// `POST /create-course` (admin)
pub async fn create_course(
    State(state): State<AppState>,
    Json(body): Json<NewCourse>,
) -> ApiResult<impl IntoResponse> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("Please enter a course name".to_string()));
    }

    let thumbnail = resolve_thumbnail(&state, &body).await?;
    let course = state.courses.create(&body, thumbnail).await?;

    // A fresh course only stales the listing entry.
    state.course_cache.invalidate_listing().await?;

    info!("Created course {}", course.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "course": course,
        })),
    ))
}

/// `PUT /edit-course/:id` (admin)
///
/// The canonical store is updated first, then both affected cache keys
/// are dropped. A reader racing the edit may still see the pre-edit
/// projection until the delete lands.
pub async fn edit_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewCourse>,
) -> ApiResult<impl IntoResponse> {
    let thumbnail = resolve_thumbnail(&state, &body).await?;

    let course = state
        .courses
        .update(id, &body, thumbnail)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    state.course_cache.invalidate(id).await?;

    info!("Edited course {}", course.id);

    Ok(Json(json!({
        "success": true,
        "course": course,
    })))
}

/// `GET /get-course/:id`
pub async fn get_single_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let course = state
        .course_cache
        .get_single(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "course": course,
    })))
}

/// `GET /get-courses`
pub async fn get_all_courses(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let courses = state.course_cache.get_all().await?;

    Ok(Json(json!({
        "success": true,
        "courses": courses,
    })))
}
