//! Bulkhead: bounds concurrent executions via a semaphore, with a second
//! counting gate modeling a bounded wait queue. Rejects immediately once
//! both the active slots and the queue are full.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use crate::error::ResilienceError;

#[derive(Debug, Clone, Copy)]
pub struct BulkheadConfig {
    pub max_concurrent: usize,
    pub max_queue: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_queue: 20,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BulkheadMetrics {
    pub active: usize,
    pub queued: usize,
}

pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    config: BulkheadConfig,
    queued: AtomicUsize,
}

impl Bulkhead {
    #[must_use]
    pub fn new(config: BulkheadConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
            queued: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> BulkheadMetrics {
        BulkheadMetrics {
            active: self.config.max_concurrent - self.semaphore.available_permits(),
            queued: self.queued.load(Ordering::SeqCst),
        }
    }

    /// Run `operation` once a slot is available. Rejects with
    /// [`ResilienceError::BulkheadFull`] if acquiring a slot would push the
    /// wait queue past `max_queue`.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.semaphore.available_permits() == 0 {
            let queued = self.queued.fetch_add(1, Ordering::SeqCst) + 1;
            if queued > self.config.max_queue {
                self.queued.fetch_sub(1, Ordering::SeqCst);
                return Err(ResilienceError::BulkheadFull);
            }
            let permit = self.semaphore.acquire().await;
            self.queued.fetch_sub(1, Ordering::SeqCst);
            let _permit = permit.expect("semaphore never closed");
            return operation().await.map_err(ResilienceError::Operation);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore never closed");
        operation().await.map_err(ResilienceError::Operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn allows_calls_within_capacity() {
        let bulkhead = Bulkhead::new(BulkheadConfig {
            max_concurrent: 2,
            max_queue: 0,
        });
        let result = bulkhead.call(|| async { Ok::<_, &str>(1) }).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_beyond_capacity_and_queue() {
        let bulkhead = Arc::new(Bulkhead::new(BulkheadConfig {
            max_concurrent: 1,
            max_queue: 0,
        }));

        let holder = Arc::clone(&bulkhead);
        let handle = tokio::spawn(async move {
            holder
                .call(|| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, &str>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        let rejected = bulkhead.call(|| async { Ok::<_, &str>(()) }).await;
        assert!(matches!(rejected, Err(ResilienceError::BulkheadFull)));

        handle.await.unwrap().unwrap();
    }
}
