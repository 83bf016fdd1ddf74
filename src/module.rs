//! Modular registration.
//!
//! Groups of related bindings can be packaged as a [`ContainerModule`] and
//! applied in one call.

use crate::container::Container;
use crate::error::DiResult;

/// A unit of registrations applied to a container.
///
/// Closures taking `&Container` are modules too.
///
/// # Example
///
/// ```rust
/// use ferrous_container::{Container, ContainerModule, DiResult, Key, Resolver};
///
/// #[derive(Default)]
/// struct UserConfig;
/// struct UserService;
///
/// struct UserModule;
///
/// impl ContainerModule for UserModule {
///     fn register(self, container: &Container) -> DiResult<()> {
///         container.instance(Key::of::<UserConfig>(), UserConfig::default());
///         container.scoped(Key::of::<UserService>(), |r| {
///             r.get_type::<UserConfig>()?;
///             Ok(UserService)
///         });
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let container = Container::new();
/// container
///     .register_module(UserModule)?
///     .register_module(|c: &Container| -> DiResult<()> {
///         c.alias(Key::name("users"), Key::of::<UserService>());
///         Ok(())
///     })?;
/// assert!(container.has(&Key::name("users")));
/// # Ok(())
/// # }
/// ```
pub trait ContainerModule {
    fn register(self, container: &Container) -> DiResult<()>;
}

impl<F> ContainerModule for F
where
    F: FnOnce(&Container) -> DiResult<()>,
{
    fn register(self, container: &Container) -> DiResult<()> {
        self(container)
    }
}

impl Container {
    /// Applies `module` to this container.
    pub fn register_module<M: ContainerModule>(&self, module: M) -> DiResult<&Self> {
        module.register(self)?;
        Ok(self)
    }
}
