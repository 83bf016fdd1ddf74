//! The container: registration surface and resolution entry points.
//!
//! A [`Container`] is one node in a scope tree. It owns its binding, alias,
//! tag and contextual tables, a store for scoped instances and a bag of
//! release hooks. A lookup miss is delegated up the parent chain.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::config::ContainerConfig;
use crate::contextual::{ContextualBindingBuilder, ContextualTable, Giver};
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::{ConstructionStack, DisposeBag};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::middleware::Middleware;
use crate::observer::{DiObserver, Observers};
use crate::registration::{
    AliasTable, AnyArc, AsyncCtor, Binding, BoxFuture, BindingTable, Ctor, Extension, SyncCtor, TagTable,
};
use crate::schema::Schema;
use crate::traits::resolver::downcast;
use crate::traits::ResolverCore;

pub mod context;
mod resolve;
mod scope;

pub use context::{AsyncResolver, PendingValue, Resolved, ResolverContext};

/// Dependency injection container.
///
/// Cloning is cheap and yields another handle to the same node. Registration
/// methods take `&self`, so a container can be shared while it is being
/// configured.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, Key, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container.instance(Key::of::<Database>(), Database { url: "postgres://localhost".into() });
/// container.transient(Key::of::<UserService>(), |r| {
///     Ok(UserService { db: r.get_type::<Database>()? })
/// });
///
/// let users = container.get_type::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) parent: Option<Container>,
    pub(crate) config: ContainerConfig,
    pub(crate) tables: RwLock<Tables>,
    /// Scoped instances built on behalf of this node
    pub(crate) scoped: Mutex<HashMap<Key, ScopedEntry>>,
    pub(crate) children: Mutex<Vec<Weak<ContainerInner>>>,
    pub(crate) disposers: Mutex<DisposeBag>,
    pub(crate) middleware: RwLock<Vec<Arc<dyn Middleware>>>,
    pub(crate) observers: RwLock<Observers>,
    pub(crate) level: usize,
}

/// A scoped instance and the binding that built it. Scopes created before a
/// rebind still hold entries of the old binding; lookups ignore those.
pub(crate) struct ScopedEntry {
    pub(crate) binding: Arc<Binding>,
    pub(crate) value: AnyArc,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub(crate) bindings: BindingTable,
    pub(crate) aliases: AliasTable,
    pub(crate) tags: TagTable,
    pub(crate) contextual: ContextualTable,
}

impl Container {
    /// Creates an empty root container with default settings.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty root container.
    pub fn with_config(config: ContainerConfig) -> Self {
        Self::from_parts(None, config)
    }

    pub(crate) fn from_parts(parent: Option<Container>, config: ContainerConfig) -> Self {
        let level = parent.as_ref().map_or(0, |p| p.inner.level + 1);
        Self {
            inner: Arc::new(ContainerInner {
                parent,
                config,
                tables: RwLock::new(Tables::default()),
                scoped: Mutex::new(HashMap::new()),
                children: Mutex::new(Vec::new()),
                disposers: Mutex::new(DisposeBag::default()),
                middleware: RwLock::new(Vec::new()),
                observers: RwLock::new(Observers::default()),
                level,
            }),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// The parent node, `None` for a root.
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// True if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ----- Bindings -----

    /// Registers `factory` under `key` with the given lifetime.
    ///
    /// A later registration for the same key replaces this one.
    pub fn bind<T, F>(&self, key: impl Into<Key>, lifetime: Lifetime, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)?) as AnyArc));
        let binding = Binding::new(lifetime, Ctor::Sync(ctor)).with_impl_name(std::any::type_name::<T>());
        self.insert_binding(key.into(), binding);
        self
    }

    /// Like [`bind`](Self::bind) for factories that already hand out an `Arc`,
    /// typically because they keep a clone for a release hook.
    pub fn bind_arc<T, F>(&self, key: impl Into<Key>, lifetime: Lifetime, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let ctor: SyncCtor = Arc::new(move |ctx| Ok(factory(ctx)? as AnyArc));
        let binding = Binding::new(lifetime, Ctor::Sync(ctor)).with_impl_name(std::any::type_name::<T>());
        self.insert_binding(key.into(), binding);
        self
    }

    /// Registers a factory that produces type-erased values.
    pub fn bind_erased<F>(&self, key: impl Into<Key>, lifetime: Lifetime, factory: F) -> &Self
    where
        F: Fn(&ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.insert_binding(key.into(), Binding::new(lifetime, Ctor::Sync(Arc::new(factory))));
        self
    }

    pub fn singleton<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(key, Lifetime::Singleton, factory)
    }

    pub fn scoped<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(key, Lifetime::Scoped, factory)
    }

    pub fn transient<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.bind(key, Lifetime::Transient, factory)
    }

    pub fn singleton_arc<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_arc(key, Lifetime::Singleton, factory)
    }

    pub fn scoped_arc<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_arc(key, Lifetime::Scoped, factory)
    }

    pub fn transient_arc<T, F>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_arc(key, Lifetime::Transient, factory)
    }

    /// Registers a factory whose output must pass `schema`.
    ///
    /// With `eager_schema_validation` enabled, the factory is trial-built right
    /// away and a non-conforming value fails this call with
    /// [`DiError::InvalidSchema`]; the binding is then not registered. Trial
    /// builds that fail for other reasons, such as dependencies that are not
    /// registered yet, are skipped.
    pub fn bind_with_schema<T, F, S>(
        &self,
        key: impl Into<Key>,
        lifetime: Lifetime,
        factory: F,
        schema: S,
    ) -> DiResult<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
        S: Schema + 'static,
    {
        let key = key.into();
        let ctor: SyncCtor = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)?) as AnyArc));
        let binding = Binding::new(lifetime, Ctor::Sync(ctor))
            .with_schema(Some(Arc::new(schema)))
            .with_impl_name(std::any::type_name::<T>());

        if self.inner.config.eager_schema_validation {
            self.trial_build(&key, &binding)?;
        }
        self.insert_binding(key, binding);
        Ok(self)
    }

    /// Registers an async-declared factory.
    ///
    /// Synchronous [`resolve`](Self::resolve) hands back the pending value
    /// itself; [`resolve_async`](Self::resolve_async) awaits it.
    pub fn bind_async<T, F, Fut>(&self, key: impl Into<Key>, lifetime: Lifetime, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        let ctor: AsyncCtor = Arc::new(move |resolver| {
            let future = factory(resolver);
            Box::pin(async move { Ok(Arc::new(future.await?) as AnyArc) })
        });
        let binding = Binding::new(lifetime, Ctor::Async(ctor)).with_impl_name(std::any::type_name::<T>());
        self.insert_binding(key.into(), binding);
        self
    }

    pub fn singleton_async<T, F, Fut>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.bind_async(key, Lifetime::Singleton, factory)
    }

    pub fn scoped_async<T, F, Fut>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.bind_async(key, Lifetime::Scoped, factory)
    }

    pub fn transient_async<T, F, Fut>(&self, key: impl Into<Key>, factory: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(AsyncResolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.bind_async(key, Lifetime::Transient, factory)
    }

    /// Registers a pre-built shared instance. It is final: resolution returns
    /// it without running middleware or schema checks.
    pub fn instance<T: Send + Sync + 'static>(&self, key: impl Into<Key>, value: T) -> &Self {
        self.instance_arc(key, Arc::new(value))
    }

    pub fn instance_arc<T: Send + Sync + 'static>(&self, key: impl Into<Key>, value: Arc<T>) -> &Self {
        let binding = Binding::instance(value, Some(std::any::type_name::<T>()));
        self.insert_binding(key.into(), binding);
        self
    }

    /// Layers a post-build transform onto the existing binding for `key`.
    ///
    /// Fails with [`DiError::InvalidExtension`] when this container has no
    /// binding for `key`. If the binding already holds a shared instance, the
    /// transform is applied to it immediately.
    pub fn extend<T, F>(&self, key: impl Into<Key>, transform: F) -> DiResult<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let key = self.dealias_local(&key.into())?;
        let existing = self
            .inner
            .tables
            .read()
            .bindings
            .get(&key)
            .ok_or_else(|| DiError::InvalidExtension(key.clone()))?;

        let extension_key = key.clone();
        let extension: Extension = Arc::new(move |value, ctx| {
            let typed = downcast::<T>(&extension_key, value)?;
            Ok(transform(typed, ctx)? as AnyArc)
        });

        let cached = match existing.cached() {
            Some(value) => {
                let stack = ConstructionStack::new();
                let ctx = ResolverContext::new(self, &stack, Some(key.clone()));
                Some(extension(value, &ctx)?)
            }
            None => None,
        };

        let binding = existing.extended(extension, cached);
        tracing::debug!(key = %key, "binding extended");
        self.inner.tables.write().bindings.insert(key, binding);
        Ok(self)
    }

    pub(crate) fn insert_binding(&self, key: Key, binding: Binding) {
        tracing::debug!(
            key = %key,
            lifetime = ?binding.lifetime,
            is_async = binding.is_async(),
            level = self.inner.level,
            "binding registered"
        );
        let previous = self.inner.tables.write().bindings.insert(key.clone(), binding);
        if previous.is_some() {
            tracing::trace!(key = %key, "previous binding replaced");
        }
        self.inner.scoped.lock().remove(&key);
    }

    fn trial_build(&self, key: &Key, binding: &Binding) -> DiResult<()> {
        let Ctor::Sync(ctor) = &binding.ctor else {
            return Ok(());
        };
        let stack = ConstructionStack::new();
        let _frame = stack.enter(key, self.inner.config.max_depth)?;
        let ctx = ResolverContext::new(self, &stack, Some(key.clone()));
        match ctor(&ctx) {
            Ok(value) => binding.finish(key, value, &ctx).map(drop),
            Err(error) => {
                tracing::debug!(key = %key, %error, "schema trial build skipped");
                Ok(())
            }
        }
    }

    // ----- Aliases, tags, contextual bindings -----

    /// Declares `alias` as another name for `target`.
    ///
    /// Only text names and symbols can be aliases; a type key is ignored with
    /// a warning.
    pub fn alias(&self, alias: impl Into<Key>, target: impl Into<Key>) -> &Self {
        let alias = alias.into();
        let target = target.into();
        if !alias.is_aliasable() {
            tracing::warn!(alias = %alias, "type keys cannot be aliases; ignoring");
            return self;
        }
        tracing::debug!(alias = %alias, target = %target, "alias registered");
        self.inner.tables.write().aliases.insert(alias, target);
        self
    }

    /// The key `alias` points at, searching up the scope chain.
    pub fn alias_target(&self, alias: &Key) -> DiResult<Key> {
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(target) = current.inner.tables.read().aliases.get(alias) {
                return Ok(target.clone());
            }
            node = current.parent();
        }
        Err(DiError::InvalidAlias(alias.display_name()))
    }

    /// Appends `keys` to the member list of `tag`.
    pub fn tag<I, K>(&self, keys: I, tag: &str) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        tracing::debug!(tag, members = keys.len(), "keys tagged");
        self.inner.tables.write().tags.append(tag, keys);
        self
    }

    /// Starts a contextual binding: `when(consumer).needs(dependency).give(value)`.
    pub fn when(&self, consumer: impl Into<Key>) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, consumer.into())
    }

    pub(crate) fn add_contextual(&self, consumer: Key, dependency: Key, giver: Giver, fallback: Option<Binding>) {
        let needs_fallback = fallback.is_some() && !self.has(&dependency);
        tracing::debug!(consumer = %consumer, dependency = %dependency, "contextual binding registered");
        self.inner
            .tables
            .write()
            .contextual
            .insert(consumer, dependency.clone(), giver);
        if let (true, Some(binding)) = (needs_fallback, fallback) {
            self.insert_binding(dependency, binding);
        }
    }

    // ----- Middleware, observers, modules -----

    /// Appends a middleware; earlier registrations wrap later ones, and a
    /// parent's middleware wraps its scopes' middleware.
    pub fn use_middleware<M: Middleware + 'static>(&self, middleware: M) -> &Self {
        self.inner.middleware.write().push(Arc::new(middleware));
        self
    }

    /// Adds an observer; scopes report to their ancestors' observers too.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.inner.observers.write().add(observer);
        self
    }

    // ----- Introspection -----

    /// True if `key` has a binding here or in an ancestor.
    pub fn has(&self, key: &Key) -> bool {
        matches!(self.lookup(key), Ok(Some(_)))
    }

    /// True if `key` has a binding in this node itself.
    pub fn bound(&self, key: &Key) -> bool {
        self.dealias_local(key)
            .map(|target| self.inner.tables.read().bindings.contains_key(&target))
            .unwrap_or(false)
    }

    /// Descriptors of this node's own bindings, in registration order.
    pub fn descriptors(&self) -> Vec<BindingDescriptor> {
        self.inner
            .tables
            .read()
            .bindings
            .iter()
            .map(|(key, binding)| BindingDescriptor::from_binding(key, binding))
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let tables = self.inner.tables.read();
        let mut s = String::new();
        s.push_str(&format!("=== Container Debug (level {}) ===\n", self.inner.level));
        s.push_str("Bindings:\n");
        for (key, binding) in tables.bindings.iter() {
            s.push_str(&format!("  {:?}: {:?}\n", key, binding.lifetime));
        }
        s.push_str(&format!(
            "Aliases: {}, Tags: {}, Contextual: {}\n",
            tables.aliases.len(),
            tables.tags.len(),
            tables.contextual.len()
        ));
        s
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("level", &self.inner.level)
            .field("bindings", &self.inner.tables.read().bindings.len())
            .finish()
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if self.config.warn_on_undisposed && !self.disposers.get_mut().is_empty() {
            tracing::warn!(
                level = self.level,
                "container dropped with undisposed resources; call dispose() or dispose_async().await first"
            );
        }
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve(key)?.ready_or(key)
    }

    fn resolve_any_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc> {
        self.resolve_for(key, consumer)?.ready_or(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.disposers.lock().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFuture<()> + Send>) {
        self.inner.disposers.lock().push_async(f);
    }
}
