//! Declares the [Dimensions] type, a type that [super::Frame] depends on.

use std::fmt::{self, Display, Formatter};
use std::num::NonZeroUsize;
use std::str::FromStr;

use thiserror::Error;

/// A width and a height, both guaranteed to be non-zero. The RGBA buffer for
/// a frame of these dimensions is also guaranteed to be addressable (its size
/// in bytes fits in an [isize]), so [Self::area] never overflows.
///
/// # Example
///
/// ```
/// use video::frame::Dimensions;
///
/// let d: Dimensions = "640x480".parse().unwrap();
/// assert_eq!(d.width(), 640);
/// assert_eq!(d.height(), 480);
/// assert_eq!(d.to_string(), "640x480");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: NonZeroUsize,
    height: NonZeroUsize,
}

impl Dimensions {
    /// Construct from a width and a height, returning [None] if either is 0
    /// or if a frame this size couldn't fit in memory.
    pub const fn new(width: usize, height: usize) -> Option<Self> {
        let Some(width) = NonZeroUsize::new(width) else {
            return None;
        };
        let Some(height) = NonZeroUsize::new(height) else {
            return None;
        };

        let Some(area) = width.get().checked_mul(height.get()) else {
            return None;
        };
        match area.checked_mul(4) {
            Some(bytes) if bytes <= isize::MAX as usize => Some(Self { width, height }),
            _ => None,
        }
    }

    /// The dimensions' width. This will never be `0`.
    pub const fn width(&self) -> usize {
        self.width.get()
    }

    /// The dimensions' height. This will never be `0`.
    pub const fn height(&self) -> usize {
        self.height.get()
    }

    /// The number of pixels a frame with these dimensions holds.
    pub const fn area(&self) -> usize {
        self.width.get() * self.height.get()
    }
}

/// When displayed, [Dimensions] will look like `WxH` (e.g. `1920x1080`).
impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses the `WxH` format [Display] produces.
impl FromStr for Dimensions {
    type Err = ParseDimensionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ParseDimensionsError(s.to_owned()))?;

        let width = width.trim().parse::<usize>();
        let height = height.trim().parse::<usize>();

        match (width, height) {
            (Ok(width), Ok(height)) => {
                Self::new(width, height).ok_or_else(|| ParseDimensionsError(s.to_owned()))
            }
            _ => Err(ParseDimensionsError(s.to_owned())),
        }
    }
}

/// Indicates that a string couldn't be parsed as [Dimensions].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid dimensions `{0}` (expected something like `1920x1080`).")]
pub struct ParseDimensionsError(pub String);
