//! Contextual bindings: per-consumer overrides of a dependency.
//!
//! An override is keyed by `(consumer, dependency)` and is only consulted when
//! the container is told which consumer is asking, either through
//! [`Container::resolve_for`] or through constructor injection declared with
//! [`Container::construct`]. Plain resolution never sees it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::container::{Container, ResolverContext};
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Binding, Ctor, SyncCtor};

/// What an override hands out. `None` values are "empty" overrides.
#[derive(Clone)]
pub(crate) enum Giver {
    Value(Option<AnyArc>),
    Factory(SyncCtor),
    Key(Key),
}

#[derive(Default)]
pub(crate) struct ContextualTable {
    entries: HashMap<Key, HashMap<Key, Giver>>,
}

impl ContextualTable {
    pub(crate) fn insert(&mut self, consumer: Key, dependency: Key, giver: Giver) {
        self.entries.entry(consumer).or_default().insert(dependency, giver);
    }

    pub(crate) fn get(&self, consumer: &Key, dependency: &Key) -> Option<Giver> {
        self.entries.get(consumer)?.get(dependency).cloned()
    }

    #[cfg(any(test, feature = "diagnostics"))]
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}

/// First step of `when(consumer).needs(dependency).give(..)`.
#[must_use = "a contextual binding does nothing until `needs(..).give(..)` is called"]
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    consumer: Key,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c Container, consumer: Key) -> Self {
        Self { container, consumer }
    }

    /// Names the dependency to override for this consumer.
    pub fn needs(self, dependency: impl Into<Key>) -> ContextualNeeds<'c> {
        ContextualNeeds {
            container: self.container,
            consumer: self.consumer,
            dependency: dependency.into(),
        }
    }
}

/// Second step; exactly one `give*` call completes the declaration.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Key, Resolver};
///
/// struct Mailer;
/// struct SignupHandler;
///
/// let container = Container::new();
/// container.singleton(Key::name("smtp.host"), |_| Ok("mail.internal".to_string()));
/// container
///     .when(Key::of::<SignupHandler>())
///     .needs(Key::name("smtp.host"))
///     .give("mail.signup.example".to_string());
///
/// let for_signup = container
///     .get_for::<String>(&Key::name("smtp.host"), &Key::of::<SignupHandler>())
///     .unwrap();
/// let default = container.get::<String>(&Key::name("smtp.host")).unwrap();
/// assert_eq!(*for_signup, "mail.signup.example");
/// assert_eq!(*default, "mail.internal");
/// # let _ = Mailer;
/// ```
#[must_use = "call `give`, `give_with`, `give_optional` or `give_key` to register the override"]
pub struct ContextualNeeds<'c> {
    container: &'c Container,
    consumer: Key,
    dependency: Key,
}

impl ContextualNeeds<'_> {
    /// Gives a literal value.
    pub fn give<T: Send + Sync + 'static>(self, value: T) {
        let value: AnyArc = Arc::new(value);
        self.register(Giver::Value(Some(value)));
    }

    /// Gives a literal that may be empty; an empty override fails when a
    /// consumer resolves it.
    pub fn give_optional<T: Send + Sync + 'static>(self, value: Option<T>) {
        let value = value.map(|v| Arc::new(v) as AnyArc);
        self.register(Giver::Value(value));
    }

    /// Gives the result of a factory, built on every contextual resolution.
    pub fn give_with<T, F>(self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let giver: SyncCtor = Arc::new(move |ctx| Ok(Arc::new(factory(ctx)?) as AnyArc));
        self.register(Giver::Factory(giver));
    }

    /// Gives whatever another key resolves to.
    pub fn give_key(self, key: impl Into<Key>) {
        self.register(Giver::Key(key.into()));
    }

    fn register(self, giver: Giver) {
        let fallback = fallback_binding(&giver);
        self.container
            .add_contextual(self.consumer, self.dependency, giver, fallback);
    }
}

/// Plain binding registered alongside an override when the dependency has none.
fn fallback_binding(giver: &Giver) -> Option<Binding> {
    match giver {
        Giver::Value(Some(value)) => Some(Binding::instance(value.clone(), None)),
        Giver::Value(None) => None,
        Giver::Factory(factory) => Some(Binding::new(Lifetime::Transient, Ctor::Sync(factory.clone()))),
        Giver::Key(key) => {
            let key = key.clone();
            let ctor: SyncCtor = Arc::new(move |ctx| ctx.resolve_ready(&key));
            Some(Binding::new(Lifetime::Transient, Ctor::Sync(ctor)))
        }
    }
}
