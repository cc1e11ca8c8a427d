//! Cache-aside read path for courses
//!
//! Reads check Redis first and fall back to PostgreSQL on a miss,
//! writing the projected view back so the next reader hits. Only the
//! restricted projection (`CourseView`) ever enters the cache, so a
//! cache hit cannot leak paid material. Mutations invalidate the
//! affected keys synchronously; a concurrent reader may still observe
//! the pre-edit value until the delete lands, which is tolerated.

use common::cache::RedisPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::CourseView;
use crate::repositories::CourseRepository;

/// Key namespace for single-course entries
fn course_key(id: Uuid) -> String {
    format!("course:{}", id)
}

/// Sentinel key for the all-courses listing
const ALL_COURSES_KEY: &str = "courses:all";

/// Course read cache over the shared Redis primitive
#[derive(Clone)]
pub struct CourseCache {
    cache: RedisPool,
    courses: CourseRepository,
}

impl CourseCache {
    /// Create a new course cache
    pub fn new(cache: RedisPool, courses: CourseRepository) -> Self {
        Self { cache, courses }
    }

    /// Read a single course through the cache
    pub async fn get_single(&self, id: Uuid) -> ApiResult<Option<CourseView>> {
        let key = course_key(id);

        if let Some(cached) = self.cache.get(&key).await? {
            match serde_json::from_str(&cached) {
                Ok(view) => {
                    debug!("Course cache hit: {}", id);
                    return Ok(Some(view));
                }
                Err(e) => {
                    warn!("Discarding malformed cached course {}: {}", id, e);
                    self.cache.delete(&key).await?;
                }
            }
        }

        let Some(course) = self.courses.find_by_id(id).await? else {
            return Ok(None);
        };

        let view = course.to_view();
        let serialized = serde_json::to_string(&view).map_err(anyhow::Error::from)?;
        self.cache.set(&key, &serialized, None).await?;

        Ok(Some(view))
    }

    /// Read the full course listing through the cache
    pub async fn get_all(&self) -> ApiResult<Vec<CourseView>> {
        if let Some(cached) = self.cache.get(ALL_COURSES_KEY).await? {
            match serde_json::from_str(&cached) {
                Ok(views) => {
                    debug!("Course cache hit: all courses");
                    return Ok(views);
                }
                Err(e) => {
                    warn!("Discarding malformed cached course listing: {}", e);
                    self.cache.delete(ALL_COURSES_KEY).await?;
                }
            }
        }

        let views: Vec<CourseView> = self
            .courses
            .find_all()
            .await?
            .iter()
            .map(|c| c.to_view())
            .collect();

        let serialized = serde_json::to_string(&views).map_err(anyhow::Error::from)?;
        self.cache.set(ALL_COURSES_KEY, &serialized, None).await?;

        Ok(views)
    }

    /// Drop the cached entries a mutation of this course made stale
    pub async fn invalidate(&self, id: Uuid) -> ApiResult<()> {
        self.cache.delete(&course_key(id)).await?;
        self.cache.delete(ALL_COURSES_KEY).await?;
        Ok(())
    }

    /// Drop only the listing entry (a newly created course cannot have a
    /// stale single-course entry yet)
    pub async fn invalidate_listing(&self) -> ApiResult<()> {
        self.cache.delete(ALL_COURSES_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces_are_disjoint() {
        let id = Uuid::new_v4();
        let key = course_key(id);
        assert!(key.starts_with("course:"));
        assert!(!key.starts_with("courses:"));
        assert!(!ALL_COURSES_KEY.starts_with("course:"));
        assert!(!key.starts_with("session:"));
    }
}
