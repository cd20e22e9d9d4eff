use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::config::S3Config;

/// Where uploaded report images live.
///
/// `put` returns the reference stored on the report (a URL path or an
/// absolute URL); `remove` accepts the same reference back.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<String>;

    async fn remove(&self, image_ref: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    pub async fn new(dir: PathBuf, url_prefix: String) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, url_prefix })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(anyhow!("invalid image key: {}", key));
        }
        Ok(self.dir.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn remove(&self, image_ref: &str) -> Result<()> {
        let key = image_ref
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| anyhow!("image not managed by this store: {}", image_ref))?;
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base: Url,
}

impl ObjectStorage {
    pub async fn new(config: &S3Config) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(config.endpoint.clone())
            .force_path_style(true);
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let s3_config = s3_builder.build();

        let client = Client::from_conf(s3_config);

        let public_endpoint = config
            .public_endpoint
            .as_deref()
            .unwrap_or(&config.endpoint);
        let public_base = Url::parse(&format!(
            "{}/{}/",
            public_endpoint.trim_end_matches('/'),
            config.bucket
        ))?;

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_base,
        })
    }

    fn key_from_ref(&self, image_ref: &str) -> Result<String> {
        let base = self.public_base.as_str();
        image_ref
            .strip_prefix(base)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("image not managed by this bucket: {}", image_ref))
    }
}

#[async_trait]
impl ImageStore for ObjectStorage {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await?;

        let url = self.public_base.join(key)?;
        Ok(url.to_string())
    }

    async fn remove(&self, image_ref: &str) -> Result<()> {
        let key = self.key_from_ref(image_ref)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }
}
