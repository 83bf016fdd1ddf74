//! Constructor injection.
//!
//! [`Container::construct`] registers a type together with the ordered list of
//! keys its constructor takes. Each dependency is resolved on behalf of the
//! constructed type, so `when(T).needs(dep).give(..)` overrides apply.

use std::sync::Arc;

use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::key::{key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;
use crate::traits::resolver::downcast;
use crate::traits::ResolverCore;

/// Resolved constructor arguments, in declaration order.
pub struct Arguments {
    consumer: Key,
    values: Vec<(Key, AnyArc)>,
}

impl Arguments {
    /// Typed access to the argument at `index`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (key, value) = self.values.get(index).ok_or_else(|| DiError::MissingArgument {
            consumer: self.consumer.clone(),
            index,
        })?;
        downcast(key, value.clone())
    }

    pub fn raw(&self, index: usize) -> Option<&AnyArc> {
        self.values.get(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type being constructed.
    pub fn consumer(&self) -> &Key {
        &self.consumer
    }
}

impl Container {
    /// Registers `T` under its type key, built by `ctor` from the resolved
    /// `dependencies`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_container::{Container, Key, Lifetime, Resolver};
    ///
    /// struct Logger { prefix: String }
    /// struct Reporter { logger: std::sync::Arc<Logger> }
    ///
    /// let container = Container::new();
    /// container.instance(Key::name("logger"), Logger { prefix: "app".into() });
    /// container.construct::<Reporter, _>(Lifetime::Transient, [Key::name("logger")], |args| {
    ///     Ok(Reporter { logger: args.get::<Logger>(0)? })
    /// });
    /// container
    ///     .when(Key::of::<Reporter>())
    ///     .needs(Key::name("logger"))
    ///     .give(Logger { prefix: "reports".into() });
    ///
    /// let reporter = container.get_type::<Reporter>().unwrap();
    /// assert_eq!(reporter.logger.prefix, "reports");
    /// ```
    pub fn construct<T, F>(
        &self,
        lifetime: Lifetime,
        dependencies: impl IntoIterator<Item = Key>,
        ctor: F,
    ) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arguments) -> DiResult<T> + Send + Sync + 'static,
    {
        let dependencies: Vec<Key> = dependencies.into_iter().collect();
        let consumer = key_of_type::<T>();
        let own_key = consumer.clone();
        self.bind(own_key, lifetime, move |ctx| {
            let values = dependencies
                .iter()
                .map(|dep| Ok((dep.clone(), ctx.resolve_any_for(dep, &consumer)?)))
                .collect::<DiResult<Vec<_>>>()?;
            ctor(Arguments {
                consumer: consumer.clone(),
                values,
            })
        })
    }
}
