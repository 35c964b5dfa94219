//! Defines [DummyBackend], a backend that needs no file at all. It produces
//! solid-colour frames, which is handy for working on subtitles before the
//! real video is available (and for testing).

use std::path::Path;

use super::open_error;
use crate::backend::{BackendError, BackendStats, DecodeError, FrameBackend};
use crate::frame::{Dimensions, Frame, Pixel};
use crate::registry::BackendRegistry;

/// A backend producing solid-colour frames, opened from sources like
/// `?dummy:<frame count>:<W>x<H>:#RRGGBB`.
///
/// # Example
///
/// ```
/// use video::backend::FrameBackend;
/// use video::backends::DummyBackend;
/// use video::frame::Pixel;
///
/// let mut backend = DummyBackend::open("?dummy:100:64x36:#FF0000", 24.0).unwrap();
/// assert_eq!(backend.stats().frame_count, 100);
///
/// let frame = backend.decode_frame(99).unwrap();
/// assert_eq!(frame.pixels()[0], Pixel::from_rgb(0xFF, 0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct DummyBackend {
    frame: Frame,
    stats: BackendStats,
}

impl DummyBackend {
    /// The name this backend is registered under.
    pub const NAME: &'static str = "dummy";

    /// The prefix every dummy source starts with.
    pub const SOURCE_PREFIX: &'static str = "?dummy:";

    /// Open a dummy source. Anything that doesn't start with
    /// [Self::SOURCE_PREFIX] is an [BackendError::UnsupportedSource].
    pub fn open<P: AsRef<Path>>(source: P, frame_rate: f64) -> Result<Self, BackendError> {
        Self::open_impl(source.as_ref(), frame_rate)
    }

    fn open_impl(source: &Path, frame_rate: f64) -> Result<Self, BackendError> {
        let source_str = source.to_string_lossy();
        let Some(params) = source_str.strip_prefix(Self::SOURCE_PREFIX) else {
            return Err(BackendError::UnsupportedSource(source_str.into_owned()));
        };

        let mut params = params.split(':');
        let (Some(frame_count), Some(dimensions), Some(colour), None) =
            (params.next(), params.next(), params.next(), params.next())
        else {
            return Err(open_error(
                source,
                "expected `?dummy:<frame count>:<W>x<H>:#RRGGBB`",
            ));
        };

        let frame_count = frame_count
            .parse::<usize>()
            .map_err(|e| open_error(source, format!("bad frame count `{frame_count}` ({e})")))?;
        let dimensions = dimensions
            .parse::<Dimensions>()
            .map_err(|e| open_error(source, e))?;
        let colour = Pixel::from_hex_str(colour)
            .ok_or_else(|| open_error(source, format!("bad colour `{colour}`")))?;

        let frame = Frame::try_from_fill(dimensions, colour)
            .map_err(|e| open_error(source, format!("{dimensions} is too large ({e})")))?;

        Ok(Self {
            frame,
            stats: BackendStats {
                fps: frame_rate,
                frame_count,
                dimensions,
            },
        })
    }

    /// Register this backend under [Self::NAME].
    pub fn register(registry: &mut BackendRegistry) {
        let result = registry.register(Self::NAME, |source: &Path, frame_rate: f64| {
            Self::open(source, frame_rate).map(|backend| Box::new(backend) as Box<dyn FrameBackend>)
        });

        if let Err(e) = result {
            log::error!("{e}");
        }
    }
}

impl FrameBackend for DummyBackend {
    fn stats(&self) -> BackendStats {
        self.stats
    }

    fn decode_frame(&mut self, n: usize) -> Result<Frame, DecodeError> {
        if n >= self.stats.frame_count {
            return Err(DecodeError::OutOfRange {
                index: n,
                frame_count: self.stats.frame_count,
            });
        }

        Ok(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_sources_are_unsupported() {
        assert!(matches!(
            DummyBackend::open("movie.mkv", 24.0),
            Err(BackendError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn malformed_sources_fail_to_open() {
        for source in [
            "?dummy:",
            "?dummy:10:64x36",
            "?dummy:ten:64x36:#000000",
            "?dummy:10:64x0:#000000",
            "?dummy:10:64x36:black",
            "?dummy:10:64x36:#000000:extra",
        ] {
            assert!(
                matches!(DummyBackend::open(source, 24.0), Err(BackendError::Open { .. })),
                "`{source}` should be rejected"
            );
        }
    }

    #[test]
    fn oversized_frames_fail_to_open() {
        for source in [
            "?dummy:1:18446744073709551615x2:#000000",
            "?dummy:1:1073741824x1073741824:#000000",
        ] {
            assert!(
                matches!(DummyBackend::open(source, 24.0), Err(BackendError::Open { .. })),
                "`{source}` should be rejected"
            );
        }
    }

    #[test]
    fn frames_past_the_end_are_out_of_range() {
        let mut backend = DummyBackend::open("?dummy:3:2x2:#FFFFFF", 30.0).unwrap();

        assert!(backend.decode_frame(2).is_ok());
        assert!(matches!(
            backend.decode_frame(3),
            Err(DecodeError::OutOfRange {
                index: 3,
                frame_count: 3
            })
        ));
    }

    #[test]
    fn stats_use_the_requested_frame_rate() {
        let backend = DummyBackend::open("?dummy:48:8x6:#102030", 23.976).unwrap();
        let stats = backend.stats();

        assert_eq!(stats.fps, 23.976);
        assert_eq!(stats.dimensions, Dimensions::new(8, 6).unwrap());
    }
}
