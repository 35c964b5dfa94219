//! Defines [StillImage], a backend that serves a single image file (e.g. a PNG
//! screenshot) as a one-frame video.

use std::path::Path;

use image::ImageFormat;

use super::open_error;
use crate::backend::{BackendError, BackendStats, DecodeError, FrameBackend};
use crate::frame::{Dimensions, Frame};
use crate::registry::BackendRegistry;

/// A backend holding one decoded image.
#[derive(Debug, Clone)]
pub struct StillImage {
    frame: Frame,
    stats: BackendStats,
}

impl StillImage {
    /// The name this backend is registered under.
    pub const NAME: &'static str = "image";

    /// Load the image at `path`. Paths without a recognised image file
    /// extension are an [BackendError::UnsupportedSource].
    pub fn open<P: AsRef<Path>>(path: P, frame_rate: f64) -> Result<Self, BackendError> {
        Self::open_impl(path.as_ref(), frame_rate)
    }

    fn open_impl(path: &Path, frame_rate: f64) -> Result<Self, BackendError> {
        if ImageFormat::from_path(path).is_err() {
            return Err(BackendError::UnsupportedSource(
                path.to_string_lossy().into_owned(),
            ));
        }

        let image = image::open(path).map_err(|e| open_error(path, e))?.into_rgba8();

        let dimensions = Dimensions::new(image.width() as usize, image.height() as usize)
            .ok_or_else(|| open_error(path, "the image has no area or is too large"))?;
        let frame = Frame::from_rgba_bytes(image.as_raw(), dimensions)
            .map_err(|e| open_error(path, e))?;

        Ok(Self::from_frame(frame, frame_rate))
    }

    /// Serve an already decoded `frame`. Empty frames are given 1x1
    /// dimensions.
    pub fn from_frame(frame: Frame, frame_rate: f64) -> Self {
        let dimensions = frame
            .dimensions()
            .or(Dimensions::new(1, 1))
            .expect("1x1 dimensions are valid.");
        let frame = if frame.is_empty() {
            Frame::new(dimensions)
        } else {
            frame
        };

        Self {
            frame,
            stats: BackendStats {
                fps: frame_rate,
                frame_count: 1,
                dimensions,
            },
        }
    }

    /// Register this backend under [Self::NAME].
    pub fn register(registry: &mut BackendRegistry) {
        let result = registry.register(Self::NAME, |path: &Path, frame_rate: f64| {
            Self::open(path, frame_rate).map(|backend| Box::new(backend) as Box<dyn FrameBackend>)
        });

        if let Err(e) = result {
            log::error!("{e}");
        }
    }
}

impl FrameBackend for StillImage {
    fn stats(&self) -> BackendStats {
        self.stats
    }

    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        if n != 0 {
            return Err(DecodeError::OutOfRange {
                index: n,
                frame_count: 1,
            });
        }

        Ok(self.frame.clone())
    }
}
