pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use anyhow::Result;
use std::sync::Arc;

use crate::app::auth::AuthService;
use crate::app::identity::{AccountProvider, ClaimProvider};
use crate::config::{AppConfig, SessionConfig, UploadConfig};
use crate::infra::storage::ImageStore;
use crate::infra::store::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub images: Arc<dyn ImageStore>,
    pub auth: AuthService,
    pub upload: UploadConfig,
}

impl AppState {
    /// Wires the default identity providers: name claims for users and
    /// stored accounts for administrators.
    pub fn new(
        store: Arc<dyn ReportStore>,
        images: Arc<dyn ImageStore>,
        upload: UploadConfig,
        session: &SessionConfig,
    ) -> Result<Self> {
        let auth = AuthService::new(
            Arc::new(ClaimProvider),
            Arc::new(AccountProvider::new(store.clone())),
            session,
        )?;
        Ok(Self {
            store,
            images,
            auth,
            upload,
        })
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = infra::connect_store(&config.store).await?;
        let images = infra::connect_images(&config.upload).await?;
        Self::new(store, images, config.upload.clone(), &config.session)
    }
}
