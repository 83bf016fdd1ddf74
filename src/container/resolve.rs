//! Resolution engine.
//!
//! Order of checks for one key:
//!
//! 1. walk the scope chain, dealiasing with each node's own alias table, and
//!    take the first node that binds the key;
//! 2. if a consumer was named and some node declares an override for
//!    `(consumer, key)`, the override stands in for the factory: it still runs
//!    through middleware, schema and extensions, but is never cached;
//! 3. a built shared instance (singleton cache, or this scope's store for
//!    scoped bindings, if built by the binding currently in force) is returned
//!    as is;
//! 4. otherwise the factory runs inside the middleware chain, followed by the
//!    schema check and extensions, and the result is cached per lifetime.
//!
//! Singletons are built in the container that owns the binding, so they only
//! see that container's bindings and release hooks. Scoped and transient
//! values are built in the container that asked.

use std::sync::Arc;
use std::time::Instant;

use crate::container::{AsyncResolver, Container, PendingValue, Resolved, ResolverContext, ScopedEntry};
use crate::contextual::Giver;
use crate::error::{DiError, DiResult};
use crate::internal::ConstructionStack;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::middleware::{run_chain, Middleware};
use crate::observer::Observers;
use crate::registration::{AnyArc, AsyncCtor, Binding, Ctor, SyncCtor};
use crate::traits::resolver::downcast;

/// Binding located for a key, with the node that owns it.
#[derive(Clone)]
pub(crate) struct Found {
    owner: Container,
    key: Key,
    binding: Arc<Binding>,
}

impl Container {
    /// Resolves `key` with a fresh construction chain.
    ///
    /// Async-declared bindings come back as [`Resolved::Pending`].
    pub fn resolve(&self, key: &Key) -> DiResult<Resolved> {
        let stack = ConstructionStack::new();
        self.resolve_with(key, None, &stack)
    }

    /// Resolves `key` on behalf of `consumer`, applying contextual overrides.
    pub fn resolve_for(&self, key: &Key, consumer: &Key) -> DiResult<Resolved> {
        let stack = ConstructionStack::new();
        self.resolve_with(key, Some(consumer), &stack)
    }

    /// Resolves `key`, awaiting async-declared factories.
    pub async fn resolve_async(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve(key)?.into_value().await
    }

    pub async fn resolve_async_for(&self, key: &Key, consumer: &Key) -> DiResult<AnyArc> {
        self.resolve_for(key, consumer)?.into_value().await
    }

    /// Typed [`resolve_async`](Self::resolve_async).
    pub async fn get_async<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        downcast(key, self.resolve_async(key).await?)
    }

    /// Resolves every member of `tag`, in tagging order.
    ///
    /// The member list comes from the nearest container in the scope chain
    /// that tagged anything under `tag`; an unknown tag is
    /// [`DiError::InvalidTag`].
    pub fn tagged(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        let stack = ConstructionStack::new();
        self.tag_members(tag)?
            .iter()
            .map(|member| self.resolve_with(member, None, &stack)?.ready_or(member))
            .collect()
    }

    pub async fn tagged_async(&self, tag: &str) -> DiResult<Vec<AnyArc>> {
        let members = self.tag_members(tag)?;
        let mut values = Vec::with_capacity(members.len());
        for member in &members {
            values.push(self.resolve_async(member).await?);
        }
        Ok(values)
    }

    pub(crate) fn tag_members(&self, tag: &str) -> DiResult<Vec<Key>> {
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(members) = current.inner.tables.read().tags.members(tag) {
                return Ok(members.to_vec());
            }
            node = current.parent();
        }
        Err(DiError::InvalidTag(tag.to_string()))
    }

    pub(crate) fn dealias_local(&self, key: &Key) -> DiResult<Key> {
        if !key.is_aliasable() {
            return Ok(key.clone());
        }
        self.inner
            .tables
            .read()
            .aliases
            .dealias(key, self.inner.config.chained_aliases)
    }

    pub(crate) fn lookup(&self, key: &Key) -> DiResult<Option<Found>> {
        let mut node = Some(self);
        while let Some(current) = node {
            let target = current.dealias_local(key)?;
            if let Some(binding) = current.inner.tables.read().bindings.get(&target) {
                return Ok(Some(Found {
                    owner: current.clone(),
                    key: target,
                    binding,
                }));
            }
            node = current.parent();
        }
        Ok(None)
    }

    fn contextual_giver(&self, consumer: &Key, dependency: &Key) -> Option<Giver> {
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(giver) = current.inner.tables.read().contextual.get(consumer, dependency) {
                return Some(giver);
            }
            node = current.parent();
        }
        None
    }

    /// Middleware of the whole chain, root first.
    fn middleware_chain(&self) -> Vec<Arc<dyn Middleware>> {
        let mut chain = match self.parent() {
            Some(parent) => parent.middleware_chain(),
            None => Vec::new(),
        };
        chain.extend(self.inner.middleware.read().iter().cloned());
        chain
    }

    fn observers(&self) -> Observers {
        let mut observers = self.inner.observers.read().clone();
        let mut node = self.parent();
        while let Some(current) = node {
            observers.extend_from(&current.inner.observers.read());
            node = current.parent();
        }
        observers
    }

    pub(crate) fn resolve_with(
        &self,
        key: &Key,
        consumer: Option<&Key>,
        stack: &ConstructionStack,
    ) -> DiResult<Resolved> {
        let found = self.lookup(key)?;
        let target = match &found {
            Some(found) => found.key.clone(),
            None => self.dealias_local(key)?,
        };

        if let Some(consumer) = consumer {
            if let Some(giver) = self.contextual_giver(consumer, &target) {
                return self.give(giver, consumer, &target, found.as_ref(), stack);
            }
        }

        let Some(found) = found else {
            tracing::trace!(key = %target, "no binding in scope chain");
            return Err(DiError::Unresolved(target));
        };

        if let Some(shared) = found.binding.cached() {
            return Ok(Resolved::Ready(shared));
        }
        if found.binding.lifetime == Lifetime::Scoped {
            if let Some(shared) = self.scoped_instance(&found) {
                return Ok(Resolved::Ready(shared));
            }
        }

        let _frame = stack.enter(&target, self.inner.config.max_depth)?;
        let builder = match found.binding.lifetime {
            Lifetime::Singleton => found.owner.clone(),
            Lifetime::Scoped | Lifetime::Transient => self.clone(),
        };

        match found.binding.ctor.clone() {
            Ctor::Sync(ctor) => {
                let value = builder.build(&target, &found.binding, &ctor, stack)?;
                Ok(Resolved::Ready(self.store(&found, value)))
            }
            Ctor::Async(ctor) => {
                let pending = self.defer(found, builder, ctor, stack.snapshot());
                Ok(Resolved::Pending(pending))
            }
        }
    }

    /// Hands out an override in place of the binding's factory. The value still
    /// goes through the middleware chain and the binding's schema and
    /// extensions, but is never cached.
    fn give(
        &self,
        giver: Giver,
        consumer: &Key,
        target: &Key,
        found: Option<&Found>,
        stack: &ConstructionStack,
    ) -> DiResult<Resolved> {
        let _frame = stack.enter(target, self.inner.config.max_depth)?;
        tracing::trace!(consumer = %consumer, key = %target, "contextual override");

        let redirected = match &giver {
            Giver::Key(other) => match self.resolve_with(other, None, stack)? {
                Resolved::Ready(value) => Some(value),
                Resolved::Pending(pending) => {
                    return Ok(Resolved::Pending(self.finish_redirect(pending, target, found, stack)));
                }
            },
            Giver::Value(_) | Giver::Factory(_) => None,
        };

        let empty = || DiError::InvalidContextualBinding {
            consumer: consumer.clone(),
            dependency: target.clone(),
        };
        let ctx = ResolverContext::new(self, stack, Some(target.clone()));
        let middleware = self.middleware_chain();
        let value = run_chain(&middleware, target, || {
            let raw = match &giver {
                Giver::Value(value) => value.clone().ok_or_else(empty)?,
                Giver::Factory(factory) => factory(&ctx)?,
                Giver::Key(_) => redirected.ok_or_else(empty)?,
            };
            match found {
                Some(found) => found.binding.finish(target, raw, &ctx),
                None => Ok(raw),
            }
        })?;
        Ok(Resolved::Ready(value))
    }

    /// An override redirected to an async binding finishes once the redirect settles.
    fn finish_redirect(
        &self,
        pending: PendingValue,
        target: &Key,
        found: Option<&Found>,
        stack: &ConstructionStack,
    ) -> PendingValue {
        let Some(found) = found.cloned() else {
            return pending;
        };
        let builder = self.clone();
        let chain = stack.snapshot();
        PendingValue::new(target.clone(), async move {
            let value = pending.await?;
            builder.finish_deferred(&found, value, &chain)
        })
    }

    /// Runs a synchronous factory and the post-build pipeline.
    fn build(&self, key: &Key, binding: &Binding, ctor: &SyncCtor, stack: &ConstructionStack) -> DiResult<AnyArc> {
        let observers = self.observers();
        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });
        tracing::trace!(key = %key, lifetime = ?binding.lifetime, level = self.inner.level, "building");

        let ctx = ResolverContext::new(self, stack, Some(key.clone()));
        let middleware = self.middleware_chain();
        let result = run_chain(&middleware, key, || {
            let value = ctor(&ctx)?;
            binding.finish(key, value, &ctx)
        });

        report(&observers, started, key, &result);
        result
    }

    /// Wraps an async factory; the pending value finishes the pipeline and
    /// caches the result once awaited.
    fn defer(&self, found: Found, builder: Container, ctor: AsyncCtor, chain: Vec<Key>) -> PendingValue {
        let origin = self.clone();
        let key = found.key.clone();
        let future = ctor(AsyncResolver::new(builder.clone(), chain.clone(), key.clone()));

        PendingValue::new(key.clone(), async move {
            let observers = builder.observers();
            let started = observers.has_observers().then(|| {
                observers.resolving(&key);
                Instant::now()
            });
            tracing::trace!(key = %key, "awaiting async factory");

            let result = match future.await {
                Ok(value) => builder.finish_deferred(&found, value, &chain),
                Err(error) => Err(error),
            };

            report(&observers, started, &key, &result);
            Ok(origin.store(&found, result?))
        })
    }

    fn finish_deferred(&self, found: &Found, value: AnyArc, chain: &[Key]) -> DiResult<AnyArc> {
        let stack = ConstructionStack::seeded(chain);
        let ctx = ResolverContext::new(self, &stack, Some(found.key.clone()));
        let middleware = self.middleware_chain();
        run_chain(&middleware, &found.key, || found.binding.finish(&found.key, value, &ctx))
    }

    fn store(&self, found: &Found, value: AnyArc) -> AnyArc {
        match found.binding.lifetime {
            Lifetime::Singleton => found.binding.store(value),
            Lifetime::Scoped => {
                let mut scoped = self.inner.scoped.lock();
                match scoped.get(&found.key) {
                    Some(entry) if Arc::ptr_eq(&entry.binding, &found.binding) => entry.value.clone(),
                    _ => {
                        scoped.insert(
                            found.key.clone(),
                            ScopedEntry {
                                binding: found.binding.clone(),
                                value: value.clone(),
                            },
                        );
                        value
                    }
                }
            }
            Lifetime::Transient => value,
        }
    }

    /// This scope's instance for `found`, unless it was built by a binding
    /// that has since been replaced.
    fn scoped_instance(&self, found: &Found) -> Option<AnyArc> {
        let scoped = self.inner.scoped.lock();
        let entry = scoped.get(&found.key)?;
        Arc::ptr_eq(&entry.binding, &found.binding).then(|| entry.value.clone())
    }
}

fn report(observers: &Observers, started: Option<Instant>, key: &Key, result: &DiResult<AnyArc>) {
    let Some(started) = started else {
        return;
    };
    match result {
        Ok(_) => observers.resolved(key, started.elapsed()),
        Err(error) => observers.failed(key, error),
    }
}
