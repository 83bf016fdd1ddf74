//! Error types for the dependency injection container.

use thiserror::Error;

use crate::key::Key;
use crate::schema::SchemaIssue;

/// Boxed error produced by a fallible user factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Dependency injection errors
///
/// Every failure the container reports is a distinct, named variant. The
/// container never catches its own errors; an "optional dependency" is the
/// caller matching on [`DiError::Unresolved`] and substituting a default.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, DiError, Key};
///
/// let container = Container::new();
/// match container.resolve(&Key::name("mailer")) {
///     Err(DiError::Unresolved(key)) => assert_eq!(key.display_name(), "mailer"),
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_container::{DiError, Key};
///
/// let circular = DiError::Circular(vec![Key::name("A"), Key::name("B"), Key::name("A")]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// No binding anywhere in the scope chain
    #[error("Unresolved dependency: {0}")]
    Unresolved(Key),
    /// Key reappeared in the active-construction chain (full chain, discovery order)
    #[error("Circular dependency: {}", join_chain(.0))]
    Circular(Vec<Key>),
    /// Built value failed structural validation
    #[error("Invalid schema for {key}: {}", join_issues(.issues))]
    InvalidSchema { key: Key, issues: Vec<SchemaIssue> },
    /// Contextual override produced no value for a consumer that requires one
    #[error("Invalid contextual binding: {consumer} needs {dependency} but the override gave nothing")]
    InvalidContextualBinding { consumer: Key, dependency: Key },
    /// Alias has no target
    #[error("Invalid alias: {0}")]
    InvalidAlias(String),
    /// Tag has no members
    #[error("Invalid tag: {0} has no members")]
    InvalidTag(String),
    /// Post-build transform declared for a key with no binding
    #[error("Invalid extension: {0} has no binding to extend")]
    InvalidExtension(Key),
    /// Downcast to the requested type failed
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: Key, expected: &'static str },
    /// Maximum nesting depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A middleware invoked its continuation more than once
    #[error("next called multiple times while resolving {0}")]
    NextCalledMultipleTimes(Key),
    /// Synchronous typed access to an async-declared binding
    #[error("{0} is bound to an async factory; use resolve_async")]
    PendingValue(Key),
    /// Constructor injection asked for a parameter that was not declared
    #[error("{consumer} has no constructor argument at index {index}")]
    MissingArgument { consumer: Key, index: usize },
    /// Error returned by a user factory
    #[error("Factory for {key} failed: {source}")]
    Factory {
        key: Key,
        #[source]
        source: BoxError,
    },
}

impl DiError {
    /// Wraps a user factory error.
    pub fn factory(key: &Key, source: impl Into<BoxError>) -> Self {
        DiError::Factory {
            key: key.clone(),
            source: source.into(),
        }
    }

    /// The key this error is about, when there is a single one.
    pub fn key(&self) -> Option<&Key> {
        match self {
            DiError::Unresolved(key)
            | DiError::InvalidExtension(key)
            | DiError::NextCalledMultipleTimes(key)
            | DiError::PendingValue(key) => Some(key),
            DiError::InvalidSchema { key, .. }
            | DiError::TypeMismatch { key, .. }
            | DiError::Factory { key, .. } => Some(key),
            DiError::InvalidContextualBinding { dependency, .. } => Some(dependency),
            DiError::MissingArgument { consumer, .. } => Some(consumer),
            DiError::Circular(chain) => chain.last(),
            DiError::InvalidAlias(_)
            | DiError::InvalidTag(_)
            | DiError::DepthExceeded(_) => None,
        }
    }
}

fn join_chain(chain: &[Key]) -> String {
    chain
        .iter()
        .map(Key::display_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
