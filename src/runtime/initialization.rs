//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, AWS and Kubernetes client setup.

use crate::config::{ControllerConfig, LogFormat};
use crate::controller::reconciler::{KubeApiStore, KubeStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::provider::aws::AwsSecretsManager;
use crate::provider::SecretVault;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - AWS Secrets Manager client creation and connectivity check
/// - Kubernetes client creation
/// - Reconciler setup
pub async fn initialize(config: &ControllerConfig) -> Result<InitializationResult> {
    // Must run before any TLS connection is made
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    init_tracing(config);
    if !provider_installed {
        warn!("rustls crypto provider was already installed");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting secret sync controller"
    );
    info!(
        region = config.aws_region.as_deref().unwrap_or("<sdk default>"),
        endpoint = config.aws_endpoint_url.as_deref().unwrap_or("<default>"),
        remove_remote_keys = config.remove_remote_keys,
        metrics_port = config.metrics_port,
        "Controller configuration loaded"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let aws = AwsSecretsManager::new(config)
        .await
        .context("Failed to create AWS Secrets Manager client")?;
    if config.skip_connectivity_check {
        info!("Skipping AWS Secrets Manager connectivity check");
    } else {
        aws.check_connectivity().await?;
    }

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let vault: Arc<dyn SecretVault> = Arc::new(aws);
    let store: Arc<dyn KubeStore> = Arc::new(KubeApiStore::new(client.clone()));
    let reconciler = Arc::new(Reconciler::new(vault, store, config));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
    })
}

/// Install the global subscriber; `RUST_LOG` wins over `LOG_LEVEL`
fn init_tracing(config: &ControllerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "secret_sync_controller={}",
            config.log_level.to_lowercase()
        ))
    });

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if let Err(e) = result {
        warn!("Tracing subscriber init returned error (may already be initialized): {}", e);
    }
}
