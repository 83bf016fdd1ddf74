//! Binding records and the per-container lookup tables.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::{AsyncResolver, ResolverContext};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::schema::Schema;

/// Type-erased shared value as stored and handed out by the container.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub(crate) type SyncCtor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;
pub(crate) type AsyncCtor = Arc<dyn Fn(AsyncResolver) -> BoxFuture<DiResult<AnyArc>> + Send + Sync>;
pub(crate) type Extension =
    Arc<dyn for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Factory shape, tagged so the engine never has to guess whether a value is deferred.
#[derive(Clone)]
pub(crate) enum Ctor {
    Sync(SyncCtor),
    Async(AsyncCtor),
}

/// Registered factory with its lifetime, optional schema and extensions.
pub(crate) struct Binding {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    pub(crate) schema: Option<Arc<dyn Schema>>,
    pub(crate) extensions: Vec<Extension>,
    /// Singleton cache, written once by the first successful build
    cached: Mutex<Option<AnyArc>>,
    pub(crate) impl_name: Option<&'static str>,
}

impl Binding {
    pub(crate) fn new(lifetime: Lifetime, ctor: Ctor) -> Self {
        Self {
            lifetime,
            ctor,
            schema: None,
            extensions: Vec::new(),
            cached: Mutex::new(None),
            impl_name: None,
        }
    }

    /// Binding that already holds its shared instance.
    pub(crate) fn instance(value: AnyArc, impl_name: Option<&'static str>) -> Self {
        let held = value.clone();
        let ctor: SyncCtor = Arc::new(move |_| Ok(held.clone()));
        let mut binding = Self::new(Lifetime::Singleton, Ctor::Sync(ctor));
        binding.cached = Mutex::new(Some(value));
        binding.impl_name = impl_name;
        binding
    }

    pub(crate) fn with_schema(mut self, schema: Option<Arc<dyn Schema>>) -> Self {
        self.schema = schema;
        self
    }

    pub(crate) fn with_impl_name(mut self, name: &'static str) -> Self {
        self.impl_name = Some(name);
        self
    }

    /// Copy of this binding with one more extension, carrying over the cache.
    pub(crate) fn extended(&self, extension: Extension, cached: Option<AnyArc>) -> Self {
        let mut extensions = self.extensions.clone();
        extensions.push(extension);
        Self {
            lifetime: self.lifetime,
            ctor: self.ctor.clone(),
            schema: self.schema.clone(),
            extensions,
            cached: Mutex::new(cached),
            impl_name: self.impl_name,
        }
    }

    pub(crate) fn is_async(&self) -> bool {
        matches!(self.ctor, Ctor::Async(_))
    }

    pub(crate) fn cached(&self) -> Option<AnyArc> {
        if self.lifetime != Lifetime::Singleton {
            return None;
        }
        self.cached.lock().clone()
    }

    /// Stores the first built singleton; a racing second build gets the stored one.
    pub(crate) fn store(&self, value: AnyArc) -> AnyArc {
        self.cached.lock().get_or_insert(value).clone()
    }

    /// Post-build pipeline: schema first, then extensions in declaration order.
    pub(crate) fn finish(&self, key: &Key, value: AnyArc, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        let mut value = match &self.schema {
            Some(schema) => schema.validate(value).map_err(|issues| DiError::InvalidSchema {
                key: key.clone(),
                issues,
            })?,
            None => value,
        };
        for extension in &self.extensions {
            value = extension(value, ctx)?;
        }
        Ok(value)
    }
}

/// Key to binding map. Last write wins, insertion order kept for introspection.
#[derive(Default)]
pub(crate) struct BindingTable {
    entries: HashMap<Key, Arc<Binding>>,
    order: Vec<Key>,
}

impl BindingTable {
    pub(crate) fn insert(&mut self, key: Key, binding: Binding) -> Option<Arc<Binding>> {
        let previous = self.entries.insert(key.clone(), Arc::new(binding));
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<Arc<Binding>> {
        self.entries.get(key).cloned()
    }

    #[inline]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Arc<Binding>)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|binding| (key, binding)))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Alternate name to canonical key.
#[derive(Default)]
pub(crate) struct AliasTable {
    entries: HashMap<Key, Key>,
}

impl AliasTable {
    pub(crate) fn insert(&mut self, alias: Key, target: Key) {
        self.entries.insert(alias, target);
    }

    pub(crate) fn get(&self, alias: &Key) -> Option<&Key> {
        self.entries.get(alias)
    }

    /// One hop, or repeated hops to a fixed point when `chained` is set.
    pub(crate) fn dealias(&self, key: &Key, chained: bool) -> DiResult<Key> {
        let Some(first) = self.entries.get(key) else {
            return Ok(key.clone());
        };
        if !chained {
            return Ok(first.clone());
        }

        let mut current = first;
        let mut hops = 1;
        while let Some(next) = self.entries.get(current) {
            hops += 1;
            if hops > self.entries.len() {
                return Err(DiError::InvalidAlias(format!(
                    "alias loop starting at {}",
                    key.display_name()
                )));
            }
            current = next;
        }
        Ok(current.clone())
    }

    #[cfg(any(test, feature = "diagnostics"))]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Tag name to ordered member list (duplicates allowed).
#[derive(Default)]
pub(crate) struct TagTable {
    entries: HashMap<String, Vec<Key>>,
}

impl TagTable {
    pub(crate) fn append(&mut self, tag: &str, keys: impl IntoIterator<Item = Key>) {
        self.entries.entry(tag.to_string()).or_default().extend(keys);
    }

    pub(crate) fn members(&self, tag: &str) -> Option<&[Key]> {
        self.entries
            .get(tag)
            .map(Vec::as_slice)
            .filter(|members| !members.is_empty())
    }

    #[cfg(any(test, feature = "diagnostics"))]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
