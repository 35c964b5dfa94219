//! Declares [FrameBackend], the trait every frame decoding backend implements,
//! along with the errors backends report.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::frame::{Dimensions, Frame};

/// A decode capability bound to one source (file or stream), producing
/// [Frame]s by index.
///
/// Backends are constructed by the factories stored in a
/// [BackendRegistry](crate::registry::BackendRegistry). Once constructed, a
/// backend is driven from a single thread; calls block until a frame (or an
/// error) is available.
#[cfg_attr(test, mockall::automock)]
pub trait FrameBackend: Send {
    /// A collection of a few stats about the source.
    ///
    /// # Contract
    ///
    /// Calling this function multiple times should never result in a different
    /// value being returned than what was returned from the first call.
    fn stats(&self) -> BackendStats;

    /// Decode frame `n` (counting from `0`).
    ///
    /// Indices past [BackendStats::frame_count] should result in
    /// [DecodeError::OutOfRange]. Backends are free to decode frames in any
    /// order, so callers may seek backwards or skip ahead.
    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError>;
}

impl<B: FrameBackend + ?Sized> FrameBackend for Box<B> {
    fn stats(&self) -> BackendStats {
        (**self).stats()
    }

    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        (**self).decode_frame(n)
    }
}

/// Stats about a [FrameBackend]'s source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendStats {
    /// The intended number of frames per second for default-speed playback.
    pub fps: f64,

    /// The number of frames the source holds.
    pub frame_count: usize,

    /// The dimensions of the frames the source produces.
    pub dimensions: Dimensions,
}

impl BackendStats {
    /// How long the source plays for at [Self::fps] frames per second. [None]
    /// is returned if [Self::fps] is not normal and positive non-zero.
    pub fn duration(&self) -> Option<Duration> {
        if !self.fps.is_normal() || self.fps <= 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(self.frame_count as f64 / self.fps))
        }
    }
}

/// Indicates that a [FrameBackend] couldn't produce a frame.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Frame {index} is out of range (the source has {frame_count} frames).")]
    OutOfRange { index: usize, frame_count: usize },
    #[error("{0}")]
    Failed(Box<dyn Error + Send + Sync>),
}

/// Indicates that a backend factory couldn't open a source.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unsupported source `{0}`.")]
    UnsupportedSource(String),
    #[error("Failed to open `{}`: {reason}", path.display())]
    Open { path: PathBuf, reason: String },
    #[error("{0}")]
    Other(Box<dyn Error + Send + Sync>),
}

/// Implementing this trait allows an error type to be converted to a
/// [DecodeError::Failed] variant automatically (using the `?` operator).
pub(crate) trait IntoDecodeError: Error + Send + Sync {}

impl<E: IntoDecodeError + 'static> From<E> for DecodeError {
    fn from(err: E) -> Self {
        DecodeError::Failed(Box::from(err))
    }
}

/// Implementing this trait allows an error type to be converted to a
/// [BackendError::Other] variant automatically (using the `?` operator).
pub(crate) trait IntoBackendError: Error + Send + Sync {}

impl<E: IntoBackendError + 'static> From<E> for BackendError {
    fn from(err: E) -> Self {
        BackendError::Other(Box::from(err))
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0}")]
struct StaticStrError(&'static str);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
struct OwnedStringError(String);

impl From<&'static str> for DecodeError {
    fn from(str: &'static str) -> Self {
        DecodeError::Failed(Box::from(StaticStrError(str)))
    }
}

impl From<String> for DecodeError {
    fn from(str: String) -> Self {
        DecodeError::Failed(Box::from(OwnedStringError(str)))
    }
}

impl From<&'static str> for BackendError {
    fn from(str: &'static str) -> Self {
        BackendError::Other(Box::from(StaticStrError(str)))
    }
}

impl From<String> for BackendError {
    fn from(str: String) -> Self {
        BackendError::Other(Box::from(OwnedStringError(str)))
    }
}

impl IntoBackendError for std::io::Error {}

impl IntoBackendError for image::ImageError {}
