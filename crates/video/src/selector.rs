//! Contains [BackendSelector], which picks the first backend that can open a
//! source.
//!
//! Which backends work depends heavily on the environment (missing codecs,
//! corrupt files, unsupported containers), so every registered backend is
//! tried in preference order and every failure is kept. If nothing works, the
//! app can show *why* each option failed rather than only the first.

use std::fmt::{self, Debug, Display, Formatter};
use std::path::Path;

use thiserror::Error;

use crate::backend::FrameBackend;
use crate::cache::FrameCache;
use crate::registry::BackendRegistry;
use crate::settings::{BackendPreference, ProviderSettings};

/// Chooses a backend from a [BackendRegistry] for each source that's opened.
#[derive(Debug, Clone, Copy)]
pub struct BackendSelector<'a> {
    registry: &'a BackendRegistry,
}

impl<'a> BackendSelector<'a> {
    /// A selector that picks from the backends in `registry`.
    pub const fn new(registry: &'a BackendRegistry) -> Self {
        Self { registry }
    }

    /// The order backends will be tried in: registry order, except that the
    /// preferred backend (if it's registered) goes first.
    pub fn attempt_order<P: BackendPreference + ?Sized>(&self, preference: &P) -> Vec<String> {
        let mut names = self.registry.names();

        let preferred_position = preference.preferred_backend().and_then(|preferred| {
            names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(preferred))
        });

        if let Some(position) = preferred_position {
            let preferred = names.remove(position);
            names.insert(0, preferred);
        }

        names
    }

    /// Construct a backend bound to `source` and `frame_rate`, trying each
    /// registered backend in [order](Self::attempt_order) until one succeeds.
    ///
    /// The first backend to succeed is returned and no further backends are
    /// tried. If none succeed, the returned error holds the failure of every
    /// backend that was tried.
    pub fn acquire<S, P>(
        &self,
        source: S,
        frame_rate: f64,
        preference: &P,
    ) -> Result<AcquiredBackend, AcquireError>
    where
        S: AsRef<Path>,
        P: BackendPreference + ?Sized,
    {
        self.acquire_impl(source.as_ref(), frame_rate, &self.attempt_order(preference))
    }

    fn acquire_impl(
        &self,
        source: &Path,
        frame_rate: f64,
        order: &[String],
    ) -> Result<AcquiredBackend, AcquireError> {
        if order.is_empty() {
            log::error!("Can't open `{}`, no frame backends are registered.", source.display());
            return Err(AcquireError::NoBackends);
        }

        let mut failures = Vec::with_capacity(order.len());

        for name in order {
            let Some(factory) = self.registry.resolve(name) else {
                continue;
            };

            match factory(source, frame_rate) {
                Ok(backend) => {
                    log::info!("Opened `{}` with the `{name}` backend.", source.display());
                    return Ok(AcquiredBackend {
                        name: name.clone(),
                        backend,
                    });
                }

                Err(e) => {
                    log::warn!("The `{name}` backend couldn't open `{}`: {e}", source.display());
                    failures.push(BackendFailure {
                        name: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(AcquireError::AllFailed(failures))
    }
}

/// Open `source` with the best available backend from `registry` and wrap it
/// in a [FrameCache] sized according to `settings`.
pub fn open_cached<S: AsRef<Path>>(
    registry: &BackendRegistry,
    source: S,
    frame_rate: f64,
    settings: &ProviderSettings,
) -> Result<FrameCache<Box<dyn FrameBackend>>, AcquireError> {
    BackendSelector::new(registry)
        .acquire(source, frame_rate, settings)
        .map(|acquired| acquired.into_cache(settings.cache_capacity))
}

/// A backend constructed by [BackendSelector::acquire], along with the name
/// it's registered under.
pub struct AcquiredBackend {
    pub name: String,
    pub backend: Box<dyn FrameBackend>,
}

impl AcquiredBackend {
    /// Wrap the backend in a [FrameCache] that holds at most `capacity` frames.
    pub fn into_cache(self, capacity: usize) -> FrameCache<Box<dyn FrameBackend>> {
        FrameCache::new(self.backend, capacity)
    }
}

impl Debug for AcquiredBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquiredBackend")
            .field("name", &self.name)
            .field("backend", &"[omitted]")
            .finish()
    }
}

/// Why one backend couldn't open a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub name: String,
    pub message: String,
}

/// Displayed as `<name> factory: <message>`.
impl Display for BackendFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} factory: {}", self.name, self.message)
    }
}

/// Indicates that no backend could open a source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("No video providers are available.")]
    NoBackends,
    #[error("{}", join_lines(.0))]
    AllFailed(Vec<BackendFailure>),
}

fn join_lines(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
