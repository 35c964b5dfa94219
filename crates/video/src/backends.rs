//! All of the built-in [FrameBackend](crate::backend::FrameBackend)s, along
//! with [register_all] which adds each of them to a
//! [BackendRegistry](crate::registry::BackendRegistry).

mod dummy;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod still_image;

use std::fmt::Display;
use std::path::Path;

use crate::backend::BackendError;
use crate::registry::BackendRegistry;

pub use dummy::*;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::*;
pub use still_image::*;

/// Every backend registers itself through one of these. Each is called exactly
/// once, when the registry is built.
const REGISTRATIONS: &[fn(&mut BackendRegistry)] = &[
    DummyBackend::register,
    StillImage::register,
    #[cfg(feature = "ffmpeg")]
    FfmpegBackend::register,
];

/// Register every built-in backend with `registry`.
pub fn register_all(registry: &mut BackendRegistry) {
    for register in REGISTRATIONS {
        register(registry);
    }
}

/// Shorthand for a [BackendError::Open] for `path`.
pub(crate) fn open_error(path: &Path, reason: impl Display) -> BackendError {
    BackendError::Open {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
