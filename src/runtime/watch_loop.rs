//! # Watch Loop
//!
//! Runs the ASecret and AGenerator controllers until a shutdown signal.
//!
//! The ASecret controller also watches the Secrets it owns, so an edit or
//! deletion of a managed Secret triggers a sync of its ASecret. A deleted
//! ASecret surfaces as `ObjectNotFound` on its next scheduled run, which drops
//! the Secret version recorded for it.

use crate::controller::reconciler::{
    reconcile, reconcile_generator, Reconciler, SecretVersions,
};
use crate::controller::server::ServerState;
use crate::crd::{AGenerator, ASecret};
use crate::runtime::error_policy::{
    handle_generator_error, handle_reconciliation_error, handle_watch_stream_error,
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DynamicObject};
use kube::Client;
use kube_runtime::controller::Error as ControllerError;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// Run both controllers until shutdown
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    watch_restart_delay: Duration,
) -> Result<(), anyhow::Error> {
    let asecrets: Api<ASecret> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client.clone());
    let generators: Api<AGenerator> = Api::all(client);

    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop"
    );

    info!("Starting controller watch loop...");
    server_state.set_ready(true);

    // Stop advertising readiness as soon as shutdown starts
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, waiting for in-flight reconciliations to complete...");
            shutdown_state.set_ready(false);
        }
    });

    let stream_ctx = reconciler.clone();
    let asecret_controller = Controller::new(asecrets, watcher::Config::default().any_semantic())
        .owns(secrets, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, reconciler.clone())
        .for_each(move |result| {
            let ctx = stream_ctx.clone();
            async move {
                match result {
                    Ok((obj, _action)) => debug!(resource = %obj, "watch.event.reconciled"),
                    Err(ControllerError::ObjectNotFound(obj)) => {
                        forget_deleted(&ctx.secret_versions, &obj);
                    }
                    Err(e) => {
                        handle_watch_stream_error(&format!("{e:?}"), watch_restart_delay).await;
                    }
                }
            }
        });

    let generator_controller =
        Controller::new(generators, watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile_generator, handle_generator_error, reconciler)
            .for_each(move |result| async move {
                match result {
                    Ok((obj, _action)) => debug!(resource = %obj, "watch.event.reconciled"),
                    Err(e) => {
                        handle_watch_stream_error(&format!("{e:?}"), watch_restart_delay).await;
                    }
                }
            });

    async {
        futures::join!(asecret_controller, generator_controller);
    }
    .instrument(watch_span)
    .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

/// Drop the recorded Secret version of an ASecret that is no longer cached
fn forget_deleted(versions: &SecretVersions, obj: &ObjectRef<DynamicObject>) {
    let key = SecretVersions::key(obj.namespace.as_deref().unwrap_or_default(), &obj.name);
    versions.forget(&key);
    debug!(asecret = %key, "ASecret gone, forgetting its Secret version");
}
