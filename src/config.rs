//! Container configuration.
//!
//! A root container takes a [`ContainerConfig`]; scopes created from it
//! inherit the same settings. Values come from `Default`, from the process
//! environment, or (with the `config` feature) from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable prefix read by [`ContainerConfig::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_CONTAINER_";

/// Default nesting limit. Every nested build costs several stack frames, so
/// this stays well below what a 2 MiB thread stack can hold.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables for resolution behavior.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, ContainerConfig};
///
/// let config = ContainerConfig {
///     chained_aliases: true,
///     ..ContainerConfig::default()
/// };
/// let container = Container::with_config(config);
/// assert!(container.config().chained_aliases);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Maximum nesting of dependencies built within one resolution.
    ///
    /// Resolution recurses once per nested build, so raising this well past
    /// [`DEFAULT_MAX_DEPTH`] needs a correspondingly larger thread stack.
    pub max_depth: usize,
    /// Follow aliases to a fixed point instead of a single hop
    pub chained_aliases: bool,
    /// Trial-build schema-checked bindings when they are registered
    pub eager_schema_validation: bool,
    /// Log a warning when a container is dropped with release hooks pending
    pub warn_on_undisposed: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            chained_aliases: false,
            eager_schema_validation: false,
            warn_on_undisposed: true,
        }
    }
}

impl ContainerConfig {
    /// Reads overrides from `FERROUS_CONTAINER_*` variables on top of the defaults.
    ///
    /// Recognized: `MAX_DEPTH`, `CHAINED_ALIASES`, `EAGER_SCHEMA`,
    /// `WARN_UNDISPOSED`. Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(depth) = read_env("MAX_DEPTH", |raw| raw.parse::<usize>().ok().filter(|d| *d > 0)) {
            config.max_depth = depth;
        }
        if let Some(flag) = read_env("CHAINED_ALIASES", parse_bool) {
            config.chained_aliases = flag;
        }
        if let Some(flag) = read_env("EAGER_SCHEMA", parse_bool) {
            config.eager_schema_validation = flag;
        }
        if let Some(flag) = read_env("WARN_UNDISPOSED", parse_bool) {
            config.warn_on_undisposed = flag;
        }
        config
    }

    /// Parses a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn read_env<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let var = format!("{ENV_PREFIX}{name}");
    let raw = env::var(&var).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!(variable = %var, value = %raw, "ignoring unparsable container setting");
    }
    parsed
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
