//! Serialized nonce allocation
//!
//! The trading account's sequence number is shared by every submitter, so
//! allocation goes through a single mutex-guarded monotonic counter. The
//! first allocation seeds from the chain-reported count.

use super::ChainError;
use std::future::Future;
use tokio::sync::Mutex;

/// Mutex-guarded monotonic nonce source for one account
pub struct NonceAllocator {
    next: Mutex<Option<u64>>,
}

impl NonceAllocator {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(None),
        }
    }

    /// Allocate the next nonce. `fetch` supplies the chain-reported count and
    /// is only awaited on the first allocation (or after a reset). The lock
    /// is held across the fetch so concurrent callers cannot double-allocate.
    pub async fn allocate<F, Fut>(&self, fetch: F) -> Result<u64, ChainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, ChainError>>,
    {
        let mut guard = self.next.lock().await;
        let nonce = match *guard {
            Some(n) => n,
            None => fetch().await?,
        };
        *guard = Some(nonce + 1);
        Ok(nonce)
    }

    /// Drop the cached sequence so the next allocation re-reads the chain.
    /// Called after a rejected submission leaves an allocated nonce unused.
    pub async fn reset(&self) {
        *self.next.lock().await = None;
    }
}

impl Default for NonceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seeds_from_chain_then_counts() {
        let allocator = NonceAllocator::new();
        let fetches = AtomicU32::new(0);

        for expected in 7u64..10 {
            let nonce = allocator
                .allocate(|| {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    async { Ok(7) }
                })
                .await
                .unwrap();
            assert_eq!(nonce, expected);
        }
        // Only the first allocation touched the chain
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_reseeds() {
        let allocator = NonceAllocator::new();
        let first = allocator.allocate(|| async { Ok(3) }).await.unwrap();
        assert_eq!(first, 3);

        allocator.reset().await;
        let reseeded = allocator.allocate(|| async { Ok(11) }).await.unwrap();
        assert_eq!(reseeded, 11);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_without_advancing() {
        let allocator = NonceAllocator::new();
        let err = allocator
            .allocate(|| async { Err(ChainError::Transport("node down".to_string())) })
            .await;
        assert!(err.is_err());

        let nonce = allocator.allocate(|| async { Ok(5) }).await.unwrap();
        assert_eq!(nonce, 5);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_unique() {
        let allocator = Arc::new(NonceAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let allocator = Arc::clone(&allocator);
            handles.push(tokio::spawn(async move {
                allocator.allocate(|| async { Ok(0) }).await.unwrap()
            }));
        }

        let mut nonces = Vec::new();
        for handle in handles {
            nonces.push(handle.await.unwrap());
        }
        nonces.sort_unstable();
        let expected: Vec<u64> = (0..16).collect();
        assert_eq!(nonces, expected);
    }
}
