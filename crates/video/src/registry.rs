//! Contains [BackendRegistry], the table of every frame backend the app can
//! construct.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::path::Path;

use thiserror::Error;

use crate::backend::{BackendError, FrameBackend};
use crate::backends;

/// Constructs a backend bound to a source path and a frame rate.
pub type BackendFactory =
    Box<dyn Fn(&Path, f64) -> Result<Box<dyn FrameBackend>, BackendError> + Send + Sync>;

/// Maps backend names to the [BackendFactory]s that construct them.
///
/// A registry is built once when the app starts (every backend registers
/// itself, see [Self::with_builtin_backends]) and is then shared by reference.
/// Names are unique ignoring ASCII case and are listed in sorted order.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// A registry with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every backend compiled into this crate registered.
    pub fn with_builtin_backends() -> Self {
        let mut registry = Self::new();
        backends::register_all(&mut registry);
        registry
    }

    /// Register `factory` under `name`. An error is returned (and nothing is
    /// registered) if a backend with the same name, ignoring case, already
    /// exists.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), RegistryError>
    where
        F: Fn(&Path, f64) -> Result<Box<dyn FrameBackend>, BackendError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        log::debug!("Registered frame backend `{name}`.");
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// The names of every registered backend, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Find the factory registered under `name` (ignoring ASCII case).
    pub fn resolve(&self, name: &str) -> Option<&BackendFactory> {
        self.factories
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(name))
            .map(|(_, factory)| factory)
    }

    /// Whether a backend is registered under `name` (ignoring ASCII case).
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// The number of registered backends.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no backends are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Debug for BackendRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Indicates that a backend couldn't be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A frame backend named `{0}` is already registered.")]
    DuplicateName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_factory(_: &Path, _: f64) -> Result<Box<dyn FrameBackend>, BackendError> {
        Err("nope".into())
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = BackendRegistry::new();
        registry.register("zeta", failing_factory).unwrap();
        registry.register("Alpha", failing_factory).unwrap();
        registry.register("mu", failing_factory).unwrap();

        assert_eq!(registry.names(), vec!["Alpha", "mu", "zeta"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn resolve_ignores_case() {
        let mut registry = BackendRegistry::new();
        registry.register("FFmpeg", failing_factory).unwrap();

        assert!(registry.resolve("ffmpeg").is_some());
        assert!(registry.resolve("FFMPEG").is_some());
        assert!(registry.resolve("ffms").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register("dummy", failing_factory).unwrap();

        assert_eq!(
            registry.register("DUMMY", failing_factory),
            Err(RegistryError::DuplicateName("DUMMY".to_string()))
        );
        assert_eq!(registry.names(), vec!["dummy"]);
    }

    #[test]
    fn builtin_backends_register_themselves() {
        let registry = BackendRegistry::with_builtin_backends();

        assert!(registry.contains("dummy"));
        assert!(registry.contains("image"));
        assert_eq!(registry.contains("ffmpeg"), cfg!(feature = "ffmpeg"));
    }
}
