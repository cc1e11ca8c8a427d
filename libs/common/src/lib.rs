//! Shared infrastructure for the OpenCourse backend
//!
//! This crate provides the pieces the service crates lean on: the
//! PostgreSQL connection pool, the Redis key-value cache used for both
//! session mirroring and course read caching, and the infrastructure
//! error types.

pub mod cache;
pub mod database;
pub mod error;
