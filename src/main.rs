use anyhow::{anyhow, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reportes::app::accounts::AccountService;
use reportes::config::AppConfig;
use reportes::{http, infra, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    match config.app_mode.as_str() {
        "api" => {
            let state = AppState::from_config(&config).await?;
            let app: Router = http::router(state).layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "create-admin" => {
            let (username, password) = admin_credentials(&config)?;
            let store = infra::connect_store(&config.store).await?;
            match AccountService::new(store).create_admin(username, password).await? {
                Some(account) => tracing::info!(username = %account.username, "administrator created"),
                None => tracing::warn!(username = %username, "account already exists; nothing changed"),
            }
        }
        "set-password" => {
            let (username, password) = admin_credentials(&config)?;
            let store = infra::connect_store(&config.store).await?;
            if !AccountService::new(store).set_password(username, password).await? {
                return Err(anyhow!("no account named {}", username));
            }
            tracing::info!(username = %username, "password updated");
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

fn admin_credentials(config: &AppConfig) -> Result<(&str, &str)> {
    let username = config
        .admin_username
        .as_deref()
        .ok_or_else(|| anyhow!("missing required env var: ADMIN_USERNAME"))?;
    let password = config
        .admin_password
        .as_deref()
        .ok_or_else(|| anyhow!("missing required env var: ADMIN_PASSWORD"))?;
    Ok((username, password))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
