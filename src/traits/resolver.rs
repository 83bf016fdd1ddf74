//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::registration::{AnyArc, BoxFuture};
use crate::traits::{AsyncDispose, Dispose};

/// Object-safe resolution core.
///
/// Implemented by [`Container`](crate::Container) (each call starts a fresh
/// construction chain) and by [`ResolverContext`](crate::ResolverContext)
/// (calls continue the chain of the resolution in progress, so cycles are
/// detected).
pub trait ResolverCore {
    /// Resolves `key` to a ready value.
    ///
    /// An async-declared binding yields [`DiError::PendingValue`] here; use the
    /// async entry points for those.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves `key` on behalf of `consumer`, so contextual overrides apply.
    fn resolve_any_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc>;

    /// Registers a synchronous release hook with the owning container.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous release hook with the owning container.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFuture<()> + Send>);
}

/// Typed resolution helpers on top of [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, Key, Resolver};
///
/// struct Config { name: &'static str }
///
/// let container = Container::new();
/// container.instance(Key::of::<Config>(), Config { name: "app" });
/// container.instance(Key::name("port"), 8080u16);
///
/// assert_eq!(container.get_type::<Config>().unwrap().name, "app");
/// assert_eq!(*container.get::<u16>(&Key::name("port")).unwrap(), 8080);
/// assert!(container.try_get::<u16>(&Key::name("missing")).unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `key` and downcasts it to `T`.
    fn get<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast(key, self.resolve_any(key)?)
    }

    /// Resolves the binding keyed by the type `T` itself.
    fn get_type<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get::<T>(&key_of_type::<T>())
    }

    /// Resolves `key` for `consumer` and downcasts it to `T`.
    fn get_for<T: Send + Sync + 'static>(&self, key: &Key, consumer: &Key) -> DiResult<Arc<T>> {
        downcast(key, self.resolve_any_for(key, consumer)?)
    }

    /// Like [`get`](Self::get) but maps [`DiError::Unresolved`] for `key` itself to `None`.
    ///
    /// A missing transitive dependency is still an error.
    fn try_get<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Option<Arc<T>>> {
        match self.get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(DiError::Unresolved(missing)) if &missing == key => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolves `key`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be resolved or has another type.
    fn get_required<T: Send + Sync + 'static>(&self, key: &Key) -> Arc<T> {
        self.get::<T>(key)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", key, e))
    }

    /// Registers `service` for synchronous disposal.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers `service` for asynchronous disposal.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move { service.dispose().await })
        }));
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

pub(crate) fn downcast<T: Send + Sync + 'static>(key: &Key, value: AnyArc) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        key: key.clone(),
        expected: std::any::type_name::<T>(),
    })
}
