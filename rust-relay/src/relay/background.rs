//! Detached work that outlives the request which scheduled it.
//!
//! Handlers hand deliveries to [`BackgroundTasks`] and return immediately.
//! The process keeps running until the tracker has drained or the shutdown
//! grace period expires. Deliveries still in flight after that are lost; the
//! upstream platform's redelivery is the only recovery.

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Handle used to keep the process alive for scheduled deliveries.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after the current request, without awaiting it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Close the tracker and wait for running tasks.
    ///
    /// Returns `true` if everything finished within `grace`.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tracker.close();

        let pending = self.len();
        info!(pending = pending, grace_ms = grace.as_millis() as u64, "background_drain_start");

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("background_drain_complete");
                true
            }
            Err(_) => {
                warn!(abandoned = self.len(), "background_drain_timeout");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(tasks.drain(Duration::from_secs(5)).await);
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(!tasks.drain(Duration::from_millis(20)).await);
        assert_eq!(tasks.len(), 1);
    }
}
