use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use cleanit_auth::Authenticator;
use cleanit_config::AppConfig;
use cleanit_database::{initialize_database, SqlitePool};
use cleanit_gateway::{create_router, GatewayState};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// How often expired sessions are swept from the database.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct BackendServices {
    pub config: AppConfig,
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), &config.auth);

        info!(
            database = %config.database.url,
            require_photos = config.jobs.require_photos_for_completion,
            "backend services ready"
        );

        Ok(Self {
            config: config.clone(),
            db_pool,
            authenticator,
        })
    }

    pub fn gateway_state(&self) -> GatewayState {
        GatewayState::new(self.db_pool.clone(), &self.config)
    }

    pub fn router(&self) -> Router {
        create_router(self.gateway_state(), &self.config.http.cors_origins)
    }

    /// Periodically delete sessions past their expiry. Expired tokens are
    /// already refused on use; this only keeps the table small.
    pub fn spawn_session_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let authenticator = self.authenticator.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match authenticator.purge_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "expired sessions purged"),
                    Err(error) => warn!(%error, "failed to purge expired sessions"),
                }
            }
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
