//! Image storage collaborator
//!
//! Avatars and course thumbnails are handed to an external image host
//! as raw data and come back as a (public_id, secure_url) pair. Replace
//! semantics are destroy-then-upload, driven by the handlers.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Reference returned by the image host
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
}

/// Narrow interface to the image host
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload image data (a data URI or base64 payload) into a folder
    async fn upload(&self, data: &str, folder: &str) -> anyhow::Result<UploadedImage>;

    /// Remove a previously uploaded image
    async fn destroy(&self, public_id: &str) -> anyhow::Result<()>;
}

/// Cloudinary-backed image store
///
/// Uploads go through an unsigned upload preset; deletes go through the
/// admin API with basic auth, so no request signing is needed.
pub struct CloudinaryStore {
    cloud_name: String,
    upload_preset: String,
    api_key: String,
    api_secret: String,
    client: reqwest::Client,
}

impl CloudinaryStore {
    pub fn new(
        cloud_name: String,
        upload_preset: String,
        api_key: String,
        api_secret: String,
    ) -> Self {
        Self {
            cloud_name,
            upload_preset,
            api_key,
            api_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, data: &str, folder: &str) -> anyhow::Result<UploadedImage> {
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("file", data),
                ("upload_preset", &self.upload_preset),
                ("folder", folder),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Image upload failed with {}", response.status());
        }

        let uploaded: UploadedImage = response.json().await?;
        info!("Uploaded image {} to folder {}", uploaded.public_id, folder);
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/resources/image/upload",
            self.cloud_name
        );

        let response = self
            .client
            .delete(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&[("public_ids[]", public_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Image delete failed with {}", response.status());
        }

        info!("Destroyed image {}", public_id);
        Ok(())
    }
}

/// Image store used when no host is configured; every call fails with a
/// clear message instead of silently dropping uploads
pub struct UnconfiguredImageStore;

#[async_trait]
impl ImageStore for UnconfiguredImageStore {
    async fn upload(&self, _data: &str, _folder: &str) -> anyhow::Result<UploadedImage> {
        anyhow::bail!("Image store is not configured")
    }

    async fn destroy(&self, _public_id: &str) -> anyhow::Result<()> {
        anyhow::bail!("Image store is not configured")
    }
}

/// Pick an image store from the environment
///
/// # Environment Variables
/// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_UPLOAD_PRESET`,
///   `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`: all four must be set
///   to enable uploads
pub fn from_env() -> Arc<dyn ImageStore> {
    let vars = (
        std::env::var("CLOUDINARY_CLOUD_NAME"),
        std::env::var("CLOUDINARY_UPLOAD_PRESET"),
        std::env::var("CLOUDINARY_API_KEY"),
        std::env::var("CLOUDINARY_API_SECRET"),
    );

    match vars {
        (Ok(cloud_name), Ok(upload_preset), Ok(api_key), Ok(api_secret)) => {
            Arc::new(CloudinaryStore::new(cloud_name, upload_preset, api_key, api_secret))
        }
        _ => {
            warn!("Cloudinary credentials not set, image uploads are disabled");
            Arc::new(UnconfiguredImageStore)
        }
    }
}
