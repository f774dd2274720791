//! Detached-but-tracked background work.
//!
//! Request handlers spawn side effects here and return without awaiting
//! them; shutdown waits for the set to drain.

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

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

    /// Close the set and wait for every task to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// [`drain`](Self::drain) bounded by `limit`. Returns `false` on timeout.
    pub async fn drain_timeout(&self, limit: Duration) -> bool {
        let pending = self.len();
        if pending > 0 {
            tracing::info!(pending, "waiting for background tasks");
        }
        tokio::time::timeout(limit, self.drain()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn drain_waits_for_spawned_work() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_timeout_gives_up() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        assert!(!tasks.drain_timeout(Duration::from_secs(1)).await);
        assert_eq!(tasks.len(), 1);
    }
}
