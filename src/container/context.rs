//! Handles passed to factories, and the result of a synchronous resolve.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::internal::ConstructionStack;
use crate::key::{key_of_type, Key};
use crate::registration::{AnyArc, BoxFuture};
use crate::traits::resolver::downcast;
use crate::traits::ResolverCore;

/// Outcome of a synchronous [`Container::resolve`].
pub enum Resolved {
    /// The value is available now.
    Ready(AnyArc),
    /// The binding was declared async; await the handle to get the value.
    Pending(PendingValue),
}

impl Resolved {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolved::Pending(_))
    }

    /// The value if it is ready.
    pub fn ready(self) -> Option<AnyArc> {
        match self {
            Resolved::Ready(value) => Some(value),
            Resolved::Pending(_) => None,
        }
    }

    /// Waits for the value, whichever shape it came in.
    pub async fn into_value(self) -> DiResult<AnyArc> {
        match self {
            Resolved::Ready(value) => Ok(value),
            Resolved::Pending(pending) => pending.await,
        }
    }

    pub(crate) fn ready_or(self, key: &Key) -> DiResult<AnyArc> {
        match self {
            Resolved::Ready(value) => Ok(value),
            Resolved::Pending(_) => Err(DiError::PendingValue(key.clone())),
        }
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::Ready(_) => f.write_str("Resolved::Ready(..)"),
            Resolved::Pending(p) => write!(f, "Resolved::Pending({})", p.key),
        }
    }
}

/// A value still being produced by an async-declared factory.
///
/// Once it completes, a shared lifetime has been cached, so later resolutions
/// are ready immediately.
#[must_use = "a pending value does nothing unless awaited"]
pub struct PendingValue {
    key: Key,
    future: BoxFuture<DiResult<AnyArc>>,
}

impl PendingValue {
    pub(crate) fn new(key: Key, future: impl Future<Output = DiResult<AnyArc>> + Send + 'static) -> Self {
        Self {
            key,
            future: Box::pin(future),
        }
    }

    /// The key this value is being built for.
    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl Future for PendingValue {
    type Output = DiResult<AnyArc>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

/// Handle passed to synchronous factories.
///
/// Resolutions made through it continue the current construction chain, so a
/// factory that (transitively) asks for its own key fails with
/// [`DiError::Circular`] instead of recursing.
pub struct ResolverContext<'a> {
    container: &'a Container,
    stack: &'a ConstructionStack,
    building: Option<Key>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(container: &'a Container, stack: &'a ConstructionStack, building: Option<Key>) -> Self {
        Self {
            container,
            stack,
            building,
        }
    }

    /// The container the value is being built in.
    ///
    /// For singletons this is the container that owns the binding, not the
    /// scope that asked for it.
    pub fn container(&self) -> &Container {
        self.container
    }

    /// Key of the value being built, if any.
    pub fn building(&self) -> Option<&Key> {
        self.building.as_ref()
    }

    pub fn resolve(&self, key: &Key) -> DiResult<Resolved> {
        self.container.resolve_with(key, None, self.stack)
    }

    pub fn resolve_for(&self, key: &Key, consumer: &Key) -> DiResult<Resolved> {
        self.container.resolve_with(key, Some(consumer), self.stack)
    }

    /// Resolves `key` as a dependency of the value being built, so contextual
    /// overrides declared for it apply.
    pub fn dependency<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        let value = match &self.building {
            Some(consumer) => self.resolve_any_for(key, consumer)?,
            None => self.resolve_any(key)?,
        };
        downcast(key, value)
    }

    /// Resolves every member of `tag`, continuing the current chain.
    pub fn tagged(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        self.container
            .tag_members(tag)?
            .iter()
            .map(|member| self.resolve_ready(member))
            .collect()
    }

    pub(crate) fn resolve_ready(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve(key)?.ready_or(key)
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_ready(key)
    }

    fn resolve_any_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc> {
        self.resolve_for(key, consumer)?.ready_or(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.container.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFuture<()> + Send>) {
        self.container.push_async_disposer(f);
    }
}

/// Owned handle passed to async factories.
///
/// It carries the construction chain by value, so cycle detection keeps
/// working across `.await` points.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, Key};
/// use std::sync::Arc;
///
/// struct Pool { size: usize }
/// struct Repo { pool: Arc<Pool> }
///
/// # #[tokio::main]
/// # async fn main() {
/// let container = Container::new();
/// container.singleton_async(Key::of::<Pool>(), |_| async { Ok(Pool { size: 4 }) });
/// container.transient_async(Key::of::<Repo>(), |r| async move {
///     Ok(Repo { pool: r.get_type::<Pool>().await? })
/// });
///
/// let repo = container.get_async::<Repo>(&Key::of::<Repo>()).await.unwrap();
/// assert_eq!(repo.pool.size, 4);
/// # }
/// ```
#[derive(Clone)]
pub struct AsyncResolver {
    container: Container,
    chain: Arc<[Key]>,
    building: Key,
}

impl AsyncResolver {
    pub(crate) fn new(container: Container, chain: Vec<Key>, building: Key) -> Self {
        Self {
            container,
            chain: chain.into(),
            building,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn building(&self) -> &Key {
        &self.building
    }

    pub async fn resolve_async(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_inner(key, None).await
    }

    pub async fn resolve_async_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc> {
        self.resolve_inner(key, Some(consumer)).await
    }

    pub async fn get<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast(key, self.resolve_inner(key, None).await?)
    }

    pub async fn get_type<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.get::<T>(&key_of_type::<T>()).await
    }

    /// Resolves `key` as a dependency of the value being built.
    pub async fn dependency<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast(key, self.resolve_inner(key, Some(&self.building)).await?)
    }

    async fn resolve_inner(&self, key: &Key, consumer: Option<&Key>) -> DiResult<AnyArc> {
        let resolved = {
            let stack = ConstructionStack::seeded(&self.chain);
            self.container.resolve_with(key, consumer, &stack)?
        };
        resolved.into_value().await
    }
}

impl ResolverCore for AsyncResolver {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let stack = ConstructionStack::seeded(&self.chain);
        self.container.resolve_with(key, None, &stack)?.ready_or(key)
    }

    fn resolve_any_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc> {
        let stack = ConstructionStack::seeded(&self.chain);
        self.container.resolve_with(key, Some(consumer), &stack)?.ready_or(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.container.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFuture<()> + Send>) {
        self.container.push_async_disposer(f);
    }
}
