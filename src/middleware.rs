//! Resolution middleware.
//!
//! Middleware wraps the value-producing step of a resolution. Each one gets
//! the key being resolved and a [`Next`] continuation; it may call `next.run()`
//! once to continue, skip it to short-circuit with its own value, or transform
//! what comes back. Calling the continuation a second time fails with
//! [`DiError::NextCalledMultipleTimes`] instead of building twice.
//!
//! Shared instances that are already built bypass the chain entirely.

use std::cell::Cell;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

/// An interceptor around the build step of a resolution.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Key, Next, Resolver};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let log = seen.clone();
///
/// let container = Container::new();
/// container.use_middleware(move |key: &Key, next: &Next<'_>| {
///     log.lock().unwrap().push(key.display_name());
///     next.run()
/// });
/// container.transient(Key::name("answer"), |_| Ok(42u32));
///
/// assert_eq!(*container.get::<u32>(&Key::name("answer")).unwrap(), 42);
/// assert_eq!(*seen.lock().unwrap(), vec!["answer".to_string()]);
/// ```
pub trait Middleware: Send + Sync {
    fn handle(&self, key: &Key, next: &Next<'_>) -> DiResult<AnyArc>;
}

impl<F> Middleware for F
where
    F: Fn(&Key, &Next<'_>) -> DiResult<AnyArc> + Send + Sync,
{
    fn handle(&self, key: &Key, next: &Next<'_>) -> DiResult<AnyArc> {
        self(key, next)
    }
}

type Terminal<'a> = Box<dyn FnOnce() -> DiResult<AnyArc> + 'a>;

/// Continuation handed to a middleware.
pub struct Next<'a> {
    key: &'a Key,
    rest: &'a [Arc<dyn Middleware>],
    terminal: Cell<Option<Terminal<'a>>>,
}

impl<'a> Next<'a> {
    /// Runs the remaining middleware and then the build step.
    pub fn run(&self) -> DiResult<AnyArc> {
        let terminal = self
            .terminal
            .take()
            .ok_or_else(|| DiError::NextCalledMultipleTimes(self.key.clone()))?;

        match self.rest.split_first() {
            Some((middleware, rest)) => {
                let next = Next {
                    key: self.key,
                    rest,
                    terminal: Cell::new(Some(terminal)),
                };
                middleware.handle(self.key, &next)
            }
            None => terminal(),
        }
    }

    /// The key being resolved.
    pub fn key(&self) -> &Key {
        self.key
    }
}

/// Runs `terminal` wrapped in `chain`, first middleware outermost.
pub(crate) fn run_chain<'a>(
    chain: &'a [Arc<dyn Middleware>],
    key: &'a Key,
    terminal: impl FnOnce() -> DiResult<AnyArc> + 'a,
) -> DiResult<AnyArc> {
    if chain.is_empty() {
        return terminal();
    }
    Next {
        key,
        rest: chain,
        terminal: Cell::new(Some(Box::new(terminal))),
    }
    .run()
}
