//! Diagnostic observers for resolution events.
//!
//! Observers see every resolution that actually runs a factory: shared
//! instances served from a cache are not reported. The container itself logs
//! through `tracing`; observers are for callers who want the events as data.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for resolution events.
///
/// Calls are made synchronously on the resolving thread, so keep
/// implementations cheap.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, DiError, DiObserver, Key, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.0.lock().unwrap().push(format!("start {key}"));
///     }
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.0.lock().unwrap().push(format!("done {key}"));
///     }
///     fn failed(&self, key: &Key, error: &DiError) {
///         self.0.lock().unwrap().push(format!("fail {key}: {error}"));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let container = Container::new();
/// container.add_observer(recorder.clone());
/// container.transient(Key::name("n"), |_| Ok(1u8));
/// container.get::<u8>(&Key::name("n")).unwrap();
///
/// assert_eq!(*recorder.0.lock().unwrap(), vec!["start n", "done n"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before the factory for `key` runs.
    fn resolving(&self, key: &Key);

    /// Called after the factory and post-build pipeline succeeded.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when building `key` failed. The error still propagates.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Registered observers of one container.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn extend_from(&mut self, other: &Observers) {
        self.observers.extend(other.observers.iter().cloned());
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Resolutions are logged at `debug`, failures at `warn`, under the
/// `ferrous_container` target.
///
/// # Examples
///
/// ```
/// use ferrous_container::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::new()));
/// ```
#[derive(Debug, Default, Clone)]
pub struct LoggingObserver {
    label: Option<String>,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer whose events carry a `container` field, handy with several roots.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
        }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("-")
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!(target: "ferrous_container", container = self.label(), key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(
            target: "ferrous_container",
            container = self.label(),
            key = %key,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(target: "ferrous_container", container = self.label(), key = %key, %error, "resolution failed");
    }
}
