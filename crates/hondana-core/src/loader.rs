use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{abortable, AbortHandle};

/// Result of a load run through a [`ScreenLoader`].
#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Completed(T),
    Cancelled,
}

#[derive(Debug)]
struct LoadState {
    id: usize,
    handle: AbortHandle,
}

impl LoadState {
    fn new(handle: AbortHandle) -> Self {
        static ID: AtomicUsize = AtomicUsize::new(0);
        let id = ID.fetch_add(1, Ordering::SeqCst);

        Self { id, handle }
    }
}

/// Runs one fetch sequence at a time for a screen.
///
/// Starting a new load aborts the previous one. Clones share the same slot,
/// so a clone held elsewhere can [`unmount`](Self::unmount) the screen while
/// its load is in flight.
#[derive(Debug, Clone, Default)]
pub struct ScreenLoader {
    current: Arc<Mutex<Option<LoadState>>>,
}

impl ScreenLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F>(&self, fut: F) -> LoadOutcome<F::Output>
    where
        F: Future,
    {
        let (fut, handle) = abortable(fut);
        let state = LoadState::new(handle);
        let id = state.id;
        self.replace(Some(state));

        let result = fut.await;

        let mut current = self.lock();
        if current.as_ref().is_some_and(|s| s.id == id) {
            *current = None;
        }
        drop(current);

        match result {
            Ok(value) => LoadOutcome::Completed(value),
            Err(_) => {
                tracing::debug!("screen load cancelled");
                LoadOutcome::Cancelled
            }
        }
    }

    /// Abort whatever load is in flight.
    pub fn unmount(&self) {
        self.replace(None);
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_some()
    }

    fn replace(&self, value: Option<LoadState>) {
        let mut current = self.lock();
        if let Some(state) = current.take() {
            state.handle.abort();
        }
        *current = value;
    }

    fn lock(&self) -> MutexGuard<'_, Option<LoadState>> {
        // Poisoning is ignored: the slot is always left valid.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed() {
        let loader = ScreenLoader::new();
        assert_eq!(loader.run(async { 7 }).await, LoadOutcome::Completed(7));
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_unmount_cancels() {
        let loader = ScreenLoader::new();
        let handle = loader.clone();

        let (outcome, ()) = tokio::join!(
            loader.run(std::future::pending::<u32>()),
            async move {
                tokio::task::yield_now().await;
                assert!(handle.is_loading());
                handle.unmount();
            }
        );
        assert_eq!(outcome, LoadOutcome::Cancelled);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_new_load_aborts_previous() {
        let loader = ScreenLoader::new();
        let (first, second) = tokio::join!(
            loader.run(std::future::pending::<&str>()),
            async {
                tokio::task::yield_now().await;
                loader.run(async { "second" }).await
            }
        );
        assert_eq!(first, LoadOutcome::Cancelled);
        assert_eq!(second, LoadOutcome::Completed("second"));
    }
}
