//! Internal disposal bag for release hooks.

use crate::registration::BoxFuture;

/// Release hooks with LIFO execution order.
///
/// Async hooks run first (in reverse order), followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFuture<()> + Send>>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    pub(crate) fn push_async(&mut self, f: Box<dyn FnOnce() -> BoxFuture<()> + Send>) {
        self.asyncs.push(f);
    }

    /// Execute all sync hooks in reverse order (LIFO).
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            (f)();
        }
    }

    /// Execute all async hooks in reverse order (LIFO).
    pub(crate) async fn run_all_async_reverse(&mut self) {
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
        }
    }

    /// Drops async hooks without running them, returning how many there were.
    pub(crate) fn discard_async(&mut self) -> usize {
        let count = self.asyncs.len();
        self.asyncs.clear();
        count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }
}
