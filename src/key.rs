//! Identifier types for the dependency injection container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Opaque, unique token usable as a binding key.
///
/// Two symbols are equal only when one is a clone of the other. The
/// description is purely for diagnostics and never takes part in equality,
/// so two symbols created with the same description stay distinct.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::Symbol;
///
/// let a = Symbol::new("Logger");
/// let b = Symbol::new("Logger");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Creates a fresh symbol with a diagnostic description.
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Some(description.into()),
        }
    }

    /// Creates a fresh symbol without a description.
    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "Symbol({desc}#{})", self.id),
            None => write!(f, "Symbol(#{})", self.id),
        }
    }
}

/// Key for binding storage and lookup.
///
/// Keys identify bindings in the container. Three kinds exist:
///
/// - **Name**: a text name, equal by content
/// - **Symbol**: an opaque token, equal only to itself
/// - **Type**: a constructible Rust type, equal only by `TypeId`
///
/// Keys are never mutated; they are created by the caller and only ever used
/// for lookup.
///
/// # Examples
///
/// ```rust
/// use ferrous_container::{Key, key_of_type};
///
/// struct Database;
/// struct Cache;
///
/// assert_eq!(Key::name("db"), Key::name("db"));
/// assert_ne!(key_of_type::<Database>(), key_of_type::<Cache>());
/// assert_eq!(Key::name("db").display_name(), "db");
/// ```
#[derive(Clone)]
pub enum Key {
    /// Text name
    Name(Arc<str>),
    /// Opaque symbol
    Symbol(Symbol),
    /// Constructible type with its name for diagnostics
    Type(TypeId, &'static str),
}

impl Key {
    /// Creates a name key.
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Key::Name(name.into())
    }

    /// Creates a key around a fresh symbol.
    pub fn symbol(description: impl Into<Arc<str>>) -> Self {
        Key::Symbol(Symbol::new(description))
    }

    /// Creates the key of a constructible type.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        key_of_type::<T>()
    }

    /// Human-readable name used in errors and logs.
    pub fn display_name(&self) -> String {
        match self {
            Key::Name(name) => name.to_string(),
            Key::Symbol(sym) => match sym.description() {
                Some(desc) => format!("Symbol({desc})"),
                None => format!("Symbol(#{})", sym.id),
            },
            Key::Type(_, name) => (*name).to_string(),
        }
    }

    /// True for text names and symbols, the kinds an alias can be declared for.
    pub fn is_aliasable(&self) -> bool {
        !matches!(self, Key::Type(..))
    }
}

impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId only; the name is diagnostic
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Name(a), Key::Name(b)) => a == b,
            (Key::Symbol(a), Key::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Key::Symbol(sym) => {
                2u8.hash(state);
                sym.hash(state);
            }
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "Name({name:?})"),
            Key::Symbol(sym) => write!(f, "{sym:?}"),
            Key::Type(_, name) => write!(f, "Type({name})"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::name(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::name(name)
    }
}

impl From<Symbol> for Key {
    fn from(sym: Symbol) -> Self {
        Key::Symbol(sym)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Creates the key of a constructible type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}
