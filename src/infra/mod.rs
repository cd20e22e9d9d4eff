pub mod db;
pub mod memory;
pub mod storage;
pub mod store;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{StoreConfig, UploadBackend, UploadConfig};
use crate::infra::db::Db;
use crate::infra::memory::MemoryStore;
use crate::infra::storage::{ImageStore, LocalImageStore, ObjectStorage};
use crate::infra::store::ReportStore;

pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn ReportStore>> {
    match config {
        StoreConfig::Postgres(pg) => {
            let db = Db::connect(pg).await?;
            db.migrate().await?;
            Ok(Arc::new(db))
        }
        StoreConfig::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub async fn connect_images(config: &UploadConfig) -> Result<Arc<dyn ImageStore>> {
    match &config.backend {
        UploadBackend::Local { dir, url_prefix } => Ok(Arc::new(
            LocalImageStore::new(dir.clone(), url_prefix.clone()).await?,
        )),
        UploadBackend::S3(s3) => Ok(Arc::new(ObjectStorage::new(s3).await?)),
    }
}
