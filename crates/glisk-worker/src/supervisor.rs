// Copyright (c) Glisk Labs
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::image_worker::ImageGenerationWorker;
use crate::reveal_worker::RevealWorker;
use crate::upload_worker::ContentUploadWorker;

const RESPAWN_DELAY: Duration = Duration::from_secs(1);

/// Hosts the three stage workers as auto-restarting tasks (§4.8). A
/// worker that returns (panics aside) is always a bug — `run` loops
/// internally until cancelled — so any return is logged and respawned
/// after a fixed delay, same as an unexpected panic.
pub struct Supervisor {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    pub async fn spawn(
        image_worker: Arc<ImageGenerationWorker>,
        upload_worker: Arc<ContentUploadWorker>,
        reveal_worker: Arc<RevealWorker>,
    ) -> Self {
        let cancel = CancellationToken::new();

        if let Err(e) = image_worker.reset_orphans().await {
            error!(error = %e, "supervisor.orphan_reset_failed");
        }
        reveal_worker.reconcile_orphans().await;

        let mut handles = Vec::new();
        handles.push(supervise(
            "image_generation_worker",
            cancel.clone(),
            move |cancel| {
                let worker = Arc::clone(&image_worker);
                async move { worker.run(cancel).await }
            },
        ));
        handles.push(supervise(
            "content_upload_worker",
            cancel.clone(),
            move |cancel| {
                let worker = Arc::clone(&upload_worker);
                async move { worker.run(cancel).await }
            },
        ));
        handles.push(supervise(
            "reveal_worker",
            cancel.clone(),
            move |cancel| {
                let worker = Arc::clone(&reveal_worker);
                async move { worker.run(cancel).await }
            },
        ));

        Self { cancel, handles }
    }

    /// Signals all workers to stop at their next suspension point and
    /// waits for them to return.
    pub async fn shutdown(self) {
        info!("supervisor.shutdown_requested");
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("supervisor.shutdown_complete");
    }
}

fn supervise<F, Fut>(name: &'static str, cancel: CancellationToken, mut make_run: F) -> JoinHandle<()>
where
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            if cancel.is_cancelled() {
                info!(worker = name, "supervisor.worker_exiting_on_shutdown");
                return;
            }
            let task = tokio::spawn(make_run(cancel.clone()));
            match task.await {
                Ok(()) => {
                    if cancel.is_cancelled() {
                        info!(worker = name, "supervisor.worker_exiting_on_shutdown");
                        return;
                    }
                    error!(worker = name, "supervisor.worker_exited_unexpectedly");
                }
                Err(e) if e.is_cancelled() => {
                    info!(worker = name, "supervisor.worker_cancelled");
                    return;
                }
                Err(e) => {
                    error!(worker = name, error = %e, "supervisor.worker_panicked");
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(RESPAWN_DELAY) => {}
                _ = cancel.cancelled() => return,
            }
            info!(worker = name, "supervisor.respawning_worker");
        }
    })
}
