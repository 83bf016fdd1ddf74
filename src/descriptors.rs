//! Binding descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Binding;

/// Snapshot of one binding, as returned by [`Container::descriptors`](crate::Container::descriptors).
///
/// # Use Cases
///
/// - **Debugging**: inspect what is registered and with which lifetime
/// - **Health checks**: verify at startup that required keys are bound
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Container, Key, Lifetime, Resolver};
///
/// struct Database { url: String }
///
/// let container = Container::new();
/// container.singleton(Key::of::<Database>(), |_| Ok(Database { url: "postgres://localhost".into() }));
/// container.transient(Key::name("request_id"), |_| Ok(7u64));
///
/// let descriptors = container.descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let db = descriptors.iter().find(|d| d.display_name().contains("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(!db.is_built);
/// assert!(!db.is_named());
///
/// container.get_type::<Database>().unwrap();
/// let db = container.descriptors().into_iter().find(|d| !d.is_named()).unwrap();
/// assert!(db.is_built);
///
/// let id = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(id.impl_type_name, Some("u64"));
/// ```
#[derive(Debug, Clone)]
pub struct BindingDescriptor {
    pub key: Key,
    pub lifetime: Lifetime,
    /// Type produced by the factory, when known
    pub impl_type_name: Option<&'static str>,
    pub is_async: bool,
    pub has_schema: bool,
    /// Number of post-build transforms layered on the binding
    pub extensions: usize,
    /// Singleton already holds its shared instance
    pub is_built: bool,
}

impl BindingDescriptor {
    pub(crate) fn from_binding(key: &Key, binding: &Binding) -> Self {
        Self {
            key: key.clone(),
            lifetime: binding.lifetime,
            impl_type_name: binding.impl_name,
            is_async: binding.is_async(),
            has_schema: binding.schema.is_some(),
            extensions: binding.extensions.len(),
            is_built: binding.cached().is_some(),
        }
    }

    pub fn display_name(&self) -> String {
        self.key.display_name()
    }

    /// True for text-name keys.
    pub fn is_named(&self) -> bool {
        matches!(self.key, Key::Name(_))
    }
}
