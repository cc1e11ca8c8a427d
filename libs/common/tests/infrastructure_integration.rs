//! Live-infrastructure checks for the shared database and cache layers
//!
//! The cache tests exercise the two behaviors the platform leans on:
//! namespaced keys (`session:{user_id}` and `course:{id}` share one Redis
//! instance and must not collide) and TTL eviction (an expired session
//! entry reads as logged out). They require local instances and are
//! ignored by default.

use std::time::Duration;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, connect_with_retry, health_check},
};

async fn local_cache() -> RedisPool {
    let config = RedisConfig {
        url: "redis://localhost:6379".to_string(),
    };
    RedisPool::new(&config).await.unwrap()
}

#[tokio::test]
#[ignore = "requires local PostgreSQL and Redis"]
async fn test_database_and_cache_reachable() -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = connect_with_retry(&config).await?;
    assert!(health_check(&pool).await?, "database did not answer SELECT 1");

    let cache = local_cache().await;
    assert!(cache.health_check().await?, "cache did not answer PING");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Redis server"]
async fn test_namespaced_keys_do_not_collide() -> Result<(), Box<dyn std::error::Error>> {
    let cache = local_cache().await;
    let session_key = "session:itest-namespaces";
    let course_key = "course:itest-namespaces";

    cache.set(session_key, "user snapshot", Some(30)).await?;
    cache.set(course_key, "course view", None).await?;

    assert_eq!(
        cache.get(session_key).await?,
        Some("user snapshot".to_string())
    );
    assert_eq!(cache.get(course_key).await?, Some("course view".to_string()));

    // Dropping the session must leave the course entry untouched.
    cache.delete(session_key).await?;
    assert_eq!(cache.get(session_key).await?, None);
    assert_eq!(cache.get(course_key).await?, Some("course view".to_string()));

    cache.delete(course_key).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a local Redis server"]
async fn test_ttl_evicts_session_entries() -> Result<(), Box<dyn std::error::Error>> {
    let cache = local_cache().await;
    let session_key = "session:itest-ttl";
    let course_key = "course:itest-ttl";

    cache.set(session_key, "user snapshot", Some(1)).await?;
    cache.set(course_key, "course view", None).await?;

    tokio::time::sleep(Duration::from_millis(1500)).await;

    // The session aged out on its own; the unbounded course entry did not.
    assert_eq!(cache.get(session_key).await?, None);
    assert_eq!(cache.get(course_key).await?, Some("course view".to_string()));

    cache.delete(course_key).await?;
    Ok(())
}
