use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::ImageFormat;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::domain::outcome::Outcome;
use crate::infra::storage::ImageStore;

/// An image as received from the upload form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct MediaService {
    images: Arc<dyn ImageStore>,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(images: Arc<dyn ImageStore>, config: &UploadConfig) -> Self {
        Self {
            images,
            max_bytes: config.max_bytes,
        }
    }

    /// Sniffs the format, enforces the size limit and writes the image.
    /// Returns the reference to store on the report.
    pub async fn store(&self, upload: ImageUpload) -> Result<Outcome<String>> {
        if upload.data.is_empty() {
            return Ok(Outcome::Invalid("uploaded file is empty"));
        }
        if upload.data.len() > self.max_bytes {
            return Ok(Outcome::Invalid("image exceeds the upload limit"));
        }

        let format = match image::guess_format(&upload.data) {
            Ok(format) => format,
            Err(_) => return Ok(Outcome::Invalid("unsupported image format")),
        };
        let (ext, content_type) = match extension_for(format) {
            Ok(pair) => pair,
            Err(_) => return Ok(Outcome::Invalid("unsupported image format")),
        };

        let key = format!("reports/{}.{}", Uuid::new_v4(), ext);
        let image_ref = self.images.put(&key, content_type, upload.data).await?;
        tracing::debug!(key = %key, file_name = %upload.file_name, "stored report image");
        Ok(Outcome::Done(image_ref))
    }

    /// Best-effort removal; failures are logged, never returned.
    pub async fn discard(&self, image_ref: &str) {
        if let Err(err) = self.images.remove(image_ref).await {
            tracing::warn!(error = ?err, image_ref = %image_ref, "failed to remove report image");
        }
    }
}

fn extension_for(format: ImageFormat) -> Result<(&'static str, &'static str)> {
    match format {
        ImageFormat::Jpeg => Ok(("jpg", "image/jpeg")),
        ImageFormat::Png => Ok(("png", "image/png")),
        ImageFormat::WebP => Ok(("webp", "image/webp")),
        _ => Err(anyhow!("unsupported image format")),
    }
}
