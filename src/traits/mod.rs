//! Core traits for the dependency injection container.

mod dispose;
pub(crate) mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
