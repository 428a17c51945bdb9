//! Bounded pool for download tasks.
//!
//! Submission never blocks: callers get a join handle back immediately and
//! the permit is taken inside the spawned task, so at most `max` downloads
//! run at once while the dispatch path stays free.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Bounded executor for long-running download jobs.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool running at most `max` jobs concurrently.
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max)),
        }
    }

    /// Spawn `fut` behind the pool's concurrency bound.
    pub fn spawn<F, T>(&self, fut: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = permits
                .acquire_owned()
                .await
                .expect("pool semaphore closed");
            fut.await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_returns_task_result() {
        let pool = WorkerPool::new(2);
        let handle = pool.spawn(async { 41 + 1 });
        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_bound_holds_back_second_task() {
        let pool = WorkerPool::new(1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();

        let first = pool.spawn(async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
        });
        started_rx.await.unwrap();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let second = pool.spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });

        // The only permit is held by the first task until it is released.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!ran.load(Ordering::SeqCst));

        release_tx.send(()).unwrap();
        first.await.unwrap();
        second.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
