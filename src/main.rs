//! # Secret Sync Controller
//!
//! A Kubernetes controller that keeps `ASecret` resources, their Kubernetes
//! Secrets and AWS Secrets Manager secrets in sync.
//!
//! ## Overview
//!
//! For every `ASecret` the controller:
//!
//! 1. **Reads both stores** - the AWS secret at `awsSecretPath` and the target Kubernetes Secret
//! 2. **Merges** - cluster values, overlaid by AWS values, with missing declared keys
//!    filled from literals or `AGenerator` rules
//! 3. **Writes** - the Kubernetes Secret always, the AWS secret when its key set changed
//! 4. **Requeues** - after `refreshInterval` (default 1h)
//!
//! Configuration comes from environment variables, overridden by command-line flags.

use anyhow::Result;
use clap::Parser;
use secret_sync_controller::config::{CliArgs, ControllerConfig};
use secret_sync_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ControllerConfig::from_env().with_cli(&args);

    let init = initialize(&config).await?;

    run_watch_loop(
        init.client,
        init.reconciler,
        init.server_state,
        config.watch_restart_delay_duration(),
    )
    .await
}
