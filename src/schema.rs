//! Structural validation of built values.
//!
//! The container does not depend on any particular validation library. A
//! binding may carry a [`Schema`]; after the factory runs, the container hands
//! the value to the schema, which either accepts it (possibly returning a
//! coerced replacement) or reports a list of path-qualified issues.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::registration::AnyArc;

/// One structural problem found by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaIssue {
    /// Dotted path to the offending field, empty for the value itself
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Validation capability attached to a binding.
///
/// Implementations receive the type-erased built value and return either the
/// value to hand out (the same one, or a coerced replacement) or the issues
/// found.
pub trait Schema: Send + Sync {
    fn validate(&self, value: AnyArc) -> Result<AnyArc, Vec<SchemaIssue>>;
}

impl<F> Schema for F
where
    F: Fn(AnyArc) -> Result<AnyArc, Vec<SchemaIssue>> + Send + Sync,
{
    fn validate(&self, value: AnyArc) -> Result<AnyArc, Vec<SchemaIssue>> {
        self(value)
    }
}

type Check<T> = Box<dyn Fn(&T) -> Option<SchemaIssue> + Send + Sync>;
type Coercion<T> = Box<dyn Fn(&T) -> T + Send + Sync>;

/// Typed, rule-based schema.
///
/// Every rule runs, so one failed validation reports all issues at once.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, DiError, Key, Lifetime, Resolver, TypedSchema};
///
/// struct Settings { port: u16, host: String }
///
/// let schema = TypedSchema::<Settings>::new()
///     .rule("port", |s| s.port != 0, "must be non-zero")
///     .rule("host", |s| !s.host.is_empty(), "must not be empty");
///
/// let container = Container::new();
/// container
///     .bind_with_schema(
///         Key::name("settings"),
///         Lifetime::Singleton,
///         |_| Ok(Settings { port: 0, host: String::new() }),
///         schema,
///     )
///     .unwrap();
///
/// match container.get::<Settings>(&Key::name("settings")) {
///     Err(DiError::InvalidSchema { issues, .. }) => assert_eq!(issues.len(), 2),
///     _ => unreachable!(),
/// }
/// ```
pub struct TypedSchema<T> {
    checks: Vec<Check<T>>,
    coerce: Option<Coercion<T>>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Send + Sync + 'static> TypedSchema<T> {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            coerce: None,
            _marker: PhantomData,
        }
    }

    /// Adds a predicate; when it returns false, an issue at `path` is reported.
    pub fn rule<P>(mut self, path: impl Into<String>, predicate: P, message: impl Into<String>) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let path = path.into();
        let message = message.into();
        self.checks.push(Box::new(move |value| {
            if predicate(value) {
                None
            } else {
                Some(SchemaIssue::new(path.clone(), message.clone()))
            }
        }));
        self
    }

    /// Adds a free-form check that may report any issue.
    pub fn check<C>(mut self, check: C) -> Self
    where
        C: Fn(&T) -> Option<SchemaIssue> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Replaces a valid value with a normalized copy.
    pub fn coerce<C>(mut self, coerce: C) -> Self
    where
        C: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.coerce = Some(Box::new(coerce));
        self
    }
}

impl<T: Send + Sync + 'static> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Schema for TypedSchema<T> {
    fn validate(&self, value: AnyArc) -> Result<AnyArc, Vec<SchemaIssue>> {
        let typed = value.downcast::<T>().map_err(|_| {
            vec![SchemaIssue::new(
                "",
                format!("expected a value of type {}", std::any::type_name::<T>()),
            )]
        })?;

        let issues: Vec<SchemaIssue> = self.checks.iter().filter_map(|check| check(&typed)).collect();
        if !issues.is_empty() {
            return Err(issues);
        }

        match &self.coerce {
            Some(coerce) => Ok(Arc::new(coerce(&typed))),
            None => Ok(typed),
        }
    }
}
