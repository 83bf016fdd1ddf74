//! Release hooks for cached instances.

/// Synchronous release hook.
///
/// Factories register an instance's hook with
/// [`Resolver::register_disposer`](crate::Resolver::register_disposer); the
/// hook runs once when the owning container is disposed. Hooks run in LIFO
/// order.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, Dispose, Key, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static FLUSHED: AtomicUsize = AtomicUsize::new(0);
///
/// struct Cache;
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         FLUSHED.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let container = Container::new();
/// container.singleton_arc(Key::of::<Cache>(), |r| {
///     let cache = Arc::new(Cache);
///     r.register_disposer(cache.clone());
///     Ok(cache)
/// });
///
/// container.get_type::<Cache>().unwrap();
/// container.dispose();
/// assert_eq!(FLUSHED.load(Ordering::SeqCst), 1);
/// ```
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

/// Asynchronous release hook, run by
/// [`Container::dispose_async`](crate::Container::dispose_async) before the
/// synchronous hooks.
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    async fn dispose(&self);
}
