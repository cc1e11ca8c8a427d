//! Course repository for canonical-store operations
//!
//! The document-shaped parts of a course (sections, bullets, reviews,
//! thumbnail) live in JSONB columns; scalars get their own columns.

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::course::{Bullet, Review};
use crate::models::{Avatar, Course, CourseSection, NewCourse};

const COURSE_COLUMNS: &str = "id, name, description, price, estimated_price, thumbnail, tags, \
     level, demo_url, benefits, prerequisites, reviews, sections, ratings, purchased, \
     created_at, updated_at";

fn from_json<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Internal(e.into()))
}

fn to_json<T: serde::Serialize>(value: &T) -> ApiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.into()))
}

fn map_course(row: PgRow) -> ApiResult<Course> {
    let thumbnail: Option<serde_json::Value> =
        row.try_get("thumbnail").map_err(anyhow::Error::from)?;
    let thumbnail = match thumbnail {
        Some(value) if !value.is_null() => Some(from_json::<Avatar>(value)?),
        _ => None,
    };

    Ok(Course {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        estimated_price: row.get("estimated_price"),
        thumbnail,
        tags: row.get("tags"),
        level: row.get("level"),
        demo_url: row.get("demo_url"),
        benefits: from_json::<Vec<Bullet>>(row.get("benefits"))?,
        prerequisites: from_json::<Vec<Bullet>>(row.get("prerequisites"))?,
        reviews: from_json::<Vec<Review>>(row.get("reviews"))?,
        sections: from_json::<Vec<CourseSection>>(row.get("sections"))?,
        ratings: row.get("ratings"),
        purchased: row.get("purchased"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Course repository
#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    /// Create a new course repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new course
    ///
    /// The thumbnail reference comes resolved from the image store; the
    /// raw upload data in the payload is not persisted.
    pub async fn create(
        &self,
        course: &NewCourse,
        thumbnail: Option<Avatar>,
    ) -> ApiResult<Course> {
        info!("Creating course: {}", course.name);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO courses
                (name, description, price, estimated_price, thumbnail, tags, level,
                 demo_url, benefits, prerequisites, sections)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.price)
        .bind(course.estimated_price)
        .bind(to_json(&thumbnail)?)
        .bind(&course.tags)
        .bind(&course.level)
        .bind(&course.demo_url)
        .bind(to_json(&course.benefits)?)
        .bind(to_json(&course.prerequisites)?)
        .bind(to_json(&course.sections)?)
        .fetch_one(&self.pool)
        .await?;

        map_course(row)
    }

    /// Replace a course's editable fields
    ///
    /// A missing thumbnail keeps the stored one; supplying a new
    /// reference replaces it.
    pub async fn update(
        &self,
        id: Uuid,
        course: &NewCourse,
        thumbnail: Option<Avatar>,
    ) -> ApiResult<Option<Course>> {
        info!("Updating course: {}", id);

        let row = sqlx::query(&format!(
            r#"
            UPDATE courses
            SET name = $2, description = $3, price = $4, estimated_price = $5,
                thumbnail = COALESCE($6, thumbnail), tags = $7, level = $8,
                demo_url = $9, benefits = $10, prerequisites = $11, sections = $12,
                updated_at = now()
            WHERE id = $1
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.price)
        .bind(course.estimated_price)
        .bind(thumbnail.as_ref().map(to_json).transpose()?)
        .bind(&course.tags)
        .bind(&course.level)
        .bind(&course.demo_url)
        .bind(to_json(&course.benefits)?)
        .bind(to_json(&course.prerequisites)?)
        .bind(to_json(&course.sections)?)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_course).transpose()
    }

    /// Find a course by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Course>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_course).transpose()
    }

    /// List all courses, newest first
    pub async fn find_all(&self) -> ApiResult<Vec<Course>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COURSE_COLUMNS}
            FROM courses
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_course).collect()
    }
}
