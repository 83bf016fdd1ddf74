//! # ferrous-container
//!
//! A dependency injection container with scopes, contextual overrides and
//! async factories.
//!
//! ## Features
//!
//! - **Lifetimes**: Singleton, Scoped and Transient bindings
//! - **Flexible keys**: text names, opaque symbols, or Rust types
//! - **Circular dependency detection**: per-resolution chains with the full path in the error
//! - **Scope tree**: child scopes shadow and extend their parents, and dispose depth first
//! - **Contextual overrides**: `when(consumer).needs(dependency).give(value)`
//! - **Aliases and tags**: alternate names and ordered groups of keys
//! - **Pipeline hooks**: schema validation, post-build extensions, and middleware
//! - **Async factories**: awaited through `resolve_async`, with cycle detection across `.await`
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_container::{Container, Key, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container.instance(Key::of::<Database>(), Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! container.transient(Key::of::<UserService>(), |r| {
//!     Ok(UserService { db: r.get_type::<Database>()? })
//! });
//!
//! let users = container.get_type::<UserService>().unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: built once in the container that owns the binding
//! - **Scoped**: built once per scope that asks for it
//! - **Transient**: built on every resolution
//!
//! ## Named keys and aliases
//!
//! ```rust
//! use ferrous_container::{Container, Key, Resolver};
//!
//! let container = Container::new();
//! container.singleton(Key::name("ConsoleLogger"), |_| Ok("console".to_string()));
//! container.alias(Key::name("logger"), Key::name("ConsoleLogger"));
//!
//! let logger = container.get::<String>(&Key::name("logger")).unwrap();
//! assert_eq!(*logger, "console");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use ferrous_container::{Container, Key, Resolver};
//! use std::sync::{Arc, Mutex};
//!
//! struct RequestId(String);
//!
//! let container = Container::new();
//! let counter = Arc::new(Mutex::new(0));
//! let counter_clone = counter.clone();
//!
//! container.scoped(Key::of::<RequestId>(), move |_| {
//!     let mut c = counter_clone.lock().unwrap();
//!     *c += 1;
//!     Ok(RequestId(format!("req-{}", *c)))
//! });
//!
//! let scope1 = container.create_scope();
//! let scope2 = container.create_scope();
//!
//! let req1 = scope1.get_type::<RequestId>().unwrap();
//! let req2 = scope2.get_type::<RequestId>().unwrap();
//! assert_ne!(req1.0, req2.0);
//!
//! container.dispose();
//! ```

// Module declarations
pub mod config;
pub mod container;
pub mod contextual;
pub mod descriptors;
pub mod error;
pub mod injection;
pub mod key;
pub mod lifetime;
pub mod middleware;
pub mod module;
pub mod observer;
pub mod schema;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use config::{ContainerConfig, DEFAULT_MAX_DEPTH};
pub use container::{AsyncResolver, Container, PendingValue, Resolved, ResolverContext};
pub use contextual::{ContextualBindingBuilder, ContextualNeeds};
pub use descriptors::BindingDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use injection::Arguments;
pub use key::{key_of_type, Key, Symbol};
pub use lifetime::Lifetime;
pub use middleware::{Middleware, Next};
pub use module::ContainerModule;
pub use observer::{DiObserver, LoggingObserver};
pub use registration::{AnyArc, BoxFuture};
pub use schema::{Schema, SchemaIssue, TypedSchema};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_singleton_resolution() {
        let container = Container::new();
        container.singleton(Key::name("answer"), |_| Ok(42usize));

        let a = container.get::<usize>(&Key::name("answer")).unwrap();
        let b = container.get::<usize>(&Key::name("answer")).unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        let container = Container::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        container.transient(Key::of::<String>(), move |_| {
            let mut c = counter_clone.lock().unwrap();
            *c += 1;
            Ok(format!("instance-{}", *c))
        });

        let a = container.get_type::<String>().unwrap();
        let b = container.get_type::<String>().unwrap();

        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_singleton_built_in_owner_is_shared_by_scopes() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let root = Container::new();
        root.singleton(Key::name("db"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("db".to_string())
        });

        let a = root.create_scope().get::<String>(&Key::name("db")).unwrap();
        let b = root.create_scope().get::<String>(&Key::name("db")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let container = Container::new();
        container.instance(Key::name("port"), 8080u16);
        match container.get::<String>(&Key::name("port")) {
            Err(DiError::TypeMismatch { key, .. }) => assert_eq!(key, Key::name("port")),
            other => panic!("expected type mismatch, got {:?}", other.map(|_| ())),
        }
    }
}
