//! Course model and the restricted projection served from the read cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Avatar;

/// External resource link attached to a course section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// Discussion entry attached to a course section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub user: serde_json::Value,
    pub comment: String,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

/// Course review left by a purchaser
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub user: serde_json::Value,
    pub rating: f64,
    pub comment: String,
}

/// A titled bullet point (benefit or prerequisite)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bullet {
    pub title: String,
}

/// One section of course content, including the paid material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseSection {
    pub title: String,
    pub description: String,
    pub video_url: String,
    #[serde(default)]
    pub video_thumbnail: Option<serde_json::Value>,
    pub video_length: f64,
    pub video_section: String,
    pub video_player: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub suggestions: String,
    #[serde(default)]
    pub questions: Vec<Comment>,
}

/// Course entity as stored canonically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<Avatar>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<Bullet>,
    #[serde(default)]
    pub prerequisites: Vec<Bullet>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub sections: Vec<CourseSection>,
    pub ratings: f64,
    pub purchased: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course creation/edit payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub estimated_price: Option<f64>,
    /// Raw image data for the thumbnail; replaced by an image-store
    /// reference before the course is persisted
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    #[serde(default)]
    pub benefits: Vec<Bullet>,
    #[serde(default)]
    pub prerequisites: Vec<Bullet>,
    #[serde(default)]
    pub sections: Vec<CourseSection>,
}

/// Section projection for viewers who have not purchased the course
///
/// The restricted fields (video URL, resource links, suggestions,
/// questions) do not exist on this type, so they cannot leak through
/// serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseSectionView {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub video_thumbnail: Option<serde_json::Value>,
    pub video_length: f64,
    pub video_section: String,
    pub video_player: String,
}

/// Public projection of a course, the only form the read cache holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub estimated_price: Option<f64>,
    pub thumbnail: Option<Avatar>,
    pub tags: String,
    pub level: String,
    pub demo_url: String,
    pub benefits: Vec<Bullet>,
    pub prerequisites: Vec<Bullet>,
    pub reviews: Vec<Review>,
    pub sections: Vec<CourseSectionView>,
    pub ratings: f64,
    pub purchased: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Project out the paid material for the public read path
    pub fn to_view(&self) -> CourseView {
        CourseView {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            estimated_price: self.estimated_price,
            thumbnail: self.thumbnail.clone(),
            tags: self.tags.clone(),
            level: self.level.clone(),
            demo_url: self.demo_url.clone(),
            benefits: self.benefits.clone(),
            prerequisites: self.prerequisites.clone(),
            reviews: self.reviews.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| CourseSectionView {
                    title: s.title.clone(),
                    description: s.description.clone(),
                    video_thumbnail: s.video_thumbnail.clone(),
                    video_length: s.video_length,
                    video_section: s.video_section.clone(),
                    video_player: s.video_player.clone(),
                })
                .collect(),
            ratings: self.ratings,
            purchased: self.purchased,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> Course {
        Course {
            id: Uuid::new_v4(),
            name: "Rust for Backends".to_string(),
            description: "From zero to production".to_string(),
            price: 49.0,
            estimated_price: Some(99.0),
            thumbnail: None,
            tags: "rust,backend".to_string(),
            level: "intermediate".to_string(),
            demo_url: "https://videos.example/demo".to_string(),
            benefits: vec![Bullet {
                title: "Ship a real service".to_string(),
            }],
            prerequisites: vec![],
            reviews: vec![],
            sections: vec![CourseSection {
                title: "Ownership".to_string(),
                description: "Moves and borrows".to_string(),
                video_url: "https://videos.example/private/1".to_string(),
                video_thumbnail: None,
                video_length: 12.5,
                video_section: "Basics".to_string(),
                video_player: "hls".to_string(),
                links: vec![Link {
                    title: "The Book".to_string(),
                    url: "https://doc.rust-lang.org/book".to_string(),
                }],
                suggestions: "Read chapter 4 first".to_string(),
                questions: vec![Comment {
                    user: serde_json::json!({"name": "student"}),
                    comment: "Why does this move?".to_string(),
                    replies: vec![],
                }],
            }],
            ratings: 4.5,
            purchased: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_keeps_public_fields() {
        let course = sample_course();
        let view = course.to_view();
        assert_eq!(view.name, course.name);
        assert_eq!(view.sections.len(), 1);
        assert_eq!(view.sections[0].title, "Ownership");
        assert_eq!(view.sections[0].video_length, 12.5);
    }

    #[test]
    fn test_view_serialization_strips_restricted_fields() {
        let view = sample_course().to_view();
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("video_url"));
        assert!(!json.contains("suggestions"));
        assert!(!json.contains("questions"));
        assert!(!json.contains("\"links\""));
        assert!(!json.contains("videos.example/private"));
    }

    #[test]
    fn test_view_round_trips_through_cache_form() {
        let view = sample_course().to_view();
        let cached = serde_json::to_string(&view).unwrap();
        let restored: CourseView = serde_json::from_str(&cached).unwrap();
        assert_eq!(restored.id, view.id);
        assert_eq!(restored.sections, view.sections);
        // Byte-identical re-serialization is what makes repeated cache
        // hits indistinguishable from each other.
        assert_eq!(serde_json::to_string(&restored).unwrap(), cached);
    }
}
