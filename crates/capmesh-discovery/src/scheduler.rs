// crates/capmesh-discovery/src/scheduler.rs
// ============================================================================
// Module: scheduler
// Description: Interval driver for the registration manager.
// Purpose: Tick the manager on a fixed cadence and deregister cleanly when
//          asked to stop.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//!
//! [`RegistrationScheduler`] spawns one tokio task that calls
//! [`RegistrationManager::register`] every interval. Shutdown is signalled
//! over a watch channel; the task deregisters before exiting so the router
//! retires the entry instead of waiting for it to go missing in action.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::manager::RegistrationManager;

/// Handle to the background registration task.
pub struct RegistrationScheduler {
    /// Shutdown signal; flipping to true stops the loop.
    shutdown: watch::Sender<bool>,
    /// The spawned driver task.
    task: JoinHandle<()>,
}

impl RegistrationScheduler {
    /// Spawns the driver task, ticking `manager` every `interval`.
    ///
    /// The first tick fires immediately so a freshly started service does
    /// not wait a full interval before registering.
    #[must_use]
    pub fn spawn(manager: Arc<RegistrationManager>, interval: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.register().await;
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            manager.deregister().await;
        });
        Self { shutdown, task }
    }

    /// Stops the loop, deregisters, and waits for the task to finish.
    pub async fn stop(self) {
        // Send only fails when the task already exited, which is fine.
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
