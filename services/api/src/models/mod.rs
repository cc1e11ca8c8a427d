//! Domain models for the course platform

pub mod course;
pub mod user;

// Re-export for convenience
pub use course::{Course, CourseSection, CourseView, NewCourse};
pub use user::{Avatar, NewUser, PendingUser, Role, User};
