//! Scope tree: child creation and teardown.

use std::sync::Arc;

use crate::container::{Container, Tables};
use crate::internal::DisposeBag;

impl Container {
    /// Creates a scope under this container.
    ///
    /// The scope sees every binding of its ancestors, keeps its own store for
    /// scoped instances, and may add or shadow bindings without affecting the
    /// parent. Disposing the parent disposes the scope first.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_container::{Container, Key, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(u32);
    ///
    /// let root = Container::new();
    /// let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
    /// let next = counter.clone();
    /// root.scoped(Key::of::<RequestId>(), move |_| {
    ///     Ok(RequestId(next.fetch_add(1, std::sync::atomic::Ordering::SeqCst)))
    /// });
    ///
    /// let a = root.create_scope();
    /// let b = root.create_scope();
    /// let a1 = a.get_type::<RequestId>().unwrap();
    /// let a2 = a.get_type::<RequestId>().unwrap();
    /// let b1 = b.get_type::<RequestId>().unwrap();
    /// assert!(Arc::ptr_eq(&a1, &a2));
    /// assert_ne!(a1.0, b1.0);
    /// ```
    pub fn create_scope(&self) -> Container {
        self.spawn_child()
    }

    /// Creates a child container for layering extra bindings over this one.
    ///
    /// Behaves exactly like [`create_scope`](Self::create_scope); the two names
    /// only document intent.
    pub fn create_child(&self) -> Container {
        self.spawn_child()
    }

    fn spawn_child(&self) -> Container {
        let child = Container::from_parts(Some(self.clone()), self.inner.config.clone());
        let mut children = self.inner.children.lock();
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Arc::downgrade(&child.inner));
        tracing::debug!(level = child.inner.level, "scope created");
        child
    }

    /// Live scopes created directly under this container.
    pub fn children(&self) -> Vec<Container> {
        self.inner
            .children
            .lock()
            .iter()
            .filter_map(|weak| weak.upgrade().map(|inner| Container { inner }))
            .collect()
    }

    /// Tears this container down.
    ///
    /// Child scopes are disposed first (depth first), then this container's
    /// synchronous release hooks run in reverse registration order, then all
    /// tables and cached instances are cleared. The container stays usable:
    /// afterwards it behaves like a freshly created one. Calling it again is a
    /// no-op.
    ///
    /// Async release hooks cannot run here; they are dropped with a warning.
    /// Use [`dispose_async`](Self::dispose_async) when any were registered.
    pub fn dispose(&self) {
        for node in self.drain_subtree() {
            let mut bag = node.take_disposers();
            let dropped = bag.discard_async();
            if dropped > 0 {
                tracing::warn!(
                    dropped,
                    level = node.inner.level,
                    "async release hooks skipped by dispose(); use dispose_async()"
                );
            }
            bag.run_all_sync_reverse();
            node.reset();
        }
    }

    /// Async counterpart of [`dispose`](Self::dispose): per container, async
    /// release hooks are awaited in reverse order before the sync hooks run.
    pub async fn dispose_async(&self) {
        for node in self.drain_subtree() {
            let mut bag = node.take_disposers();
            bag.run_all_async_reverse().await;
            bag.run_all_sync_reverse();
            node.reset();
        }
    }

    /// This container and all live descendants, deepest first.
    fn drain_subtree(&self) -> Vec<Container> {
        let mut nodes = Vec::new();
        self.collect_post_order(&mut nodes);
        nodes
    }

    fn collect_post_order(&self, out: &mut Vec<Container>) {
        let children: Vec<Container> = std::mem::take(&mut *self.inner.children.lock())
            .into_iter()
            .filter_map(|weak| weak.upgrade().map(|inner| Container { inner }))
            .collect();
        for child in children {
            child.collect_post_order(out);
        }
        out.push(self.clone());
    }

    fn take_disposers(&self) -> DisposeBag {
        std::mem::take(&mut *self.inner.disposers.lock())
    }

    fn reset(&self) {
        let scoped = std::mem::take(&mut *self.inner.scoped.lock());
        let tables = std::mem::take(&mut *self.inner.tables.write());
        drop((scoped, tables));

        if let Some(parent) = self.parent() {
            parent
                .inner
                .children
                .lock()
                .retain(|weak| !std::ptr::eq(weak.as_ptr(), Arc::as_ptr(&self.inner)));
        }
        tracing::debug!(level = self.inner.level, "container disposed");
    }
}

impl Tables {
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.bindings.len() == 0 && self.aliases.len() == 0 && self.tags.len() == 0 && self.contextual.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::traits::Resolver;

    #[test]
    fn dispose_clears_tables_and_detaches_from_parent() {
        let root = Container::new();
        let scope = root.create_scope();
        scope.instance(Key::name("n"), 1u8);
        scope.alias(Key::name("m"), Key::name("n"));
        assert_eq!(root.children().len(), 1);

        scope.dispose();
        assert!(scope.inner.tables.read().is_empty());
        assert!(root.children().is_empty());
        assert!(scope.get::<u8>(&Key::name("n")).is_err());
    }

    #[test]
    fn dropped_scopes_are_pruned() {
        let root = Container::new();
        drop(root.create_scope());
        let _live = root.create_scope();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.inner.children.lock().len(), 1);
    }
}
