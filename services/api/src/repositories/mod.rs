//! Repositories for canonical-store operations

pub mod course;
pub mod user;

pub use course::CourseRepository;
pub use user::UserRepository;
