//! Binding lifetime definitions.

/// Binding lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Key, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
///
/// let root = Container::new();
/// root.singleton::<Database, _>(Key::of::<Database>(), |_| Ok(Database {
///     url: "postgres://localhost".to_string(),
/// }));
/// root.scoped::<Repository, _>(Key::of::<Repository>(), |r| {
///     let db = r.get_type::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// });
///
/// let scope1 = root.create_scope();
/// let scope2 = root.create_scope();
///
/// // Singleton: same instance across scopes
/// let db1 = scope1.get_type::<Database>().unwrap();
/// let db2 = scope2.get_type::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let repo1a = scope1.get_type::<Repository>().unwrap();
/// let repo1b = scope1.get_type::<Repository>().unwrap();
/// let repo2 = scope2.get_type::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
/// # let _ = Lifetime::Transient;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Single instance per owning container, cached on the binding
    ///
    /// Built on first request and shared with every scope below the
    /// container that holds the binding.
    Singleton,
    /// Single instance per scope, cached in the requesting scope
    ///
    /// A scope that inherits the binding from its parent still gets its own
    /// instance.
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Returns `true` if this lifetime caches instances.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }
}
