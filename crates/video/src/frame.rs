//! This module declares [Frame], the owned image that backends decode into and
//! that the [FrameCache](crate::cache::FrameCache) keeps copies of.

mod dimensions;
mod pixel;

use std::collections::TryReserveError;
use std::ops::Index;
use std::slice::Chunks;

use thiserror::Error;

pub use dimensions::*;
pub use pixel::*;

/// One decoded image. A [Frame] owns its pixel storage outright, so copies
/// never alias each other.
///
/// A frame is either *filled* (it has [Dimensions] and exactly
/// `dimensions.area()` pixels) or *empty* (it has no dimensions and no pixel
/// storage, see [Self::clear]).
///
/// Equality is based purely on content: two frames are equal when their
/// dimensions and pixels are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    pixels: Vec<Pixel>,
    dimensions: Option<Dimensions>,
}

impl Frame {
    /// Creates a new frame with all pixels set to `fill_pixel`.
    pub fn from_fill(dimensions: Dimensions, fill_pixel: Pixel) -> Self {
        Self {
            pixels: vec![fill_pixel; dimensions.area()],
            dimensions: Some(dimensions),
        }
    }

    /// Like [Self::from_fill], but an error is returned instead of aborting
    /// when the pixel buffer can't be allocated.
    pub fn try_from_fill(
        dimensions: Dimensions,
        fill_pixel: Pixel,
    ) -> Result<Self, TryReserveError> {
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(dimensions.area())?;
        pixels.resize(dimensions.area(), fill_pixel);

        Ok(Self {
            pixels,
            dimensions: Some(dimensions),
        })
    }

    /// Creates a new frame with all pixels set to [Pixel::BLACK].
    pub fn new(dimensions: Dimensions) -> Self {
        Self::from_fill(dimensions, Pixel::BLACK)
    }

    /// An empty frame (no dimensions, no storage).
    pub const fn empty() -> Self {
        Self {
            pixels: Vec::new(),
            dimensions: None,
        }
    }

    /// Tries to create a new frame, returning an error if
    /// `pixels.len() != dimensions.area()`.
    pub fn from_pixels(pixels: Vec<Pixel>, dimensions: Dimensions) -> Result<Self, FrameSizeError> {
        if pixels.len() != dimensions.area() {
            return Err(FrameSizeError {
                dimensions,
                expected: dimensions.area(),
                actual: pixels.len(),
            });
        }

        Ok(Self {
            pixels,
            dimensions: Some(dimensions),
        })
    }

    /// Tries to create a frame from tightly packed RGBA bytes, returning an
    /// error if `data.len() != dimensions.area() * 4`.
    pub fn from_rgba_bytes(data: &[u8], dimensions: Dimensions) -> Result<Self, FrameSizeError> {
        if data.len() != dimensions.area() * size_of::<Pixel>() {
            return Err(FrameSizeError {
                dimensions,
                expected: dimensions.area(),
                actual: data.len() / size_of::<Pixel>(),
            });
        }

        let pixels = data
            .chunks_exact(size_of::<Pixel>())
            .map(|chunk| Pixel::from_rgba(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        Ok(Self {
            pixels,
            dimensions: Some(dimensions),
        })
    }

    /// The dimensions of this frame, or [None] if it's [empty](Self::is_empty).
    pub const fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Whether this frame has no pixel storage.
    pub const fn is_empty(&self) -> bool {
        self.dimensions.is_none()
    }

    /// A reference to the underlying pixels (in row-major order).
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// An iterator over rows of pixels in the frame. Empty frames have no rows.
    pub fn pixel_rows(&self) -> Chunks<'_, Pixel> {
        let width = self.dimensions.map_or(1, |d| d.width());
        self.pixels.chunks(width)
    }

    /// Sets all pixels in the frame to be `fill_pixel`.
    pub fn fill(&mut self, fill_pixel: Pixel) {
        self.pixels.fill(fill_pixel);
    }

    /// Makes `self` a deep copy of `src_frame`.
    ///
    /// The existing pixel allocation is reused whenever it's large enough, so
    /// copying between same-sized frames never allocates.
    pub fn copy_from(&mut self, src_frame: &Frame) {
        self.pixels.clear();
        self.pixels.extend_from_slice(&src_frame.pixels);
        self.dimensions = src_frame.dimensions;
    }

    /// Releases this frame's pixel storage, leaving it [empty](Self::is_empty).
    pub fn clear(&mut self) {
        self.pixels = Vec::new();
        self.dimensions = None;
    }
}

/// Use the `[]` operator to get a reference to a row from the frame.
impl Index<usize> for Frame {
    type Output = [Pixel];

    fn index(&self, index: usize) -> &Self::Output {
        self.pixel_rows()
            .nth(index)
            .expect("Index shouldn't be out of bounds.")
    }
}

/// Indicates that a pixel buffer was the wrong length for its dimensions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("A {dimensions} frame needs {expected} pixels but {actual} were provided.")]
pub struct FrameSizeError {
    pub dimensions: Dimensions,
    pub expected: usize,
    pub actual: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: usize, height: usize) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    #[test]
    fn copy_from_is_a_deep_copy() {
        let src = Frame::from_fill(dims(2, 2), Pixel::WHITE);
        let mut dest = Frame::new(dims(2, 2));

        dest.copy_from(&src);
        assert_eq!(dest, src);

        dest.fill(Pixel::BLACK);
        assert_eq!(src.pixels(), &[Pixel::WHITE; 4]);
    }

    #[test]
    fn copy_from_adopts_new_dimensions() {
        let src = Frame::from_fill(dims(3, 1), Pixel::WHITE);
        let mut dest = Frame::new(dims(1, 1));

        dest.copy_from(&src);
        assert_eq!(dest.dimensions(), Some(dims(3, 1)));
        assert_eq!(dest.pixels().len(), 3);
    }

    #[test]
    fn clear_releases_storage() {
        let mut frame = Frame::new(dims(8, 8));
        frame.clear();

        assert!(frame.is_empty());
        assert!(frame.pixels().is_empty());
        assert_eq!(frame, Frame::empty());
        assert_eq!(frame.pixel_rows().count(), 0);

        // Clearing twice is fine.
        frame.clear();
        assert!(frame.is_empty());
    }

    #[test]
    fn fallible_fill_matches_fill() {
        assert_eq!(
            Frame::try_from_fill(dims(3, 2), Pixel::WHITE).unwrap(),
            Frame::from_fill(dims(3, 2), Pixel::WHITE)
        );
    }

    #[test]
    fn oversized_fills_fail_instead_of_aborting() {
        assert!(Frame::try_from_fill(dims(1 << 30, 1 << 30), Pixel::BLACK).is_err());
    }

    #[test]
    fn buffers_must_match_dimensions() {
        assert!(Frame::from_pixels(vec![Pixel::BLACK; 5], dims(2, 2)).is_err());
        assert!(Frame::from_rgba_bytes(&[0; 15], dims(2, 2)).is_err());

        let frame = Frame::from_rgba_bytes(&[1, 2, 3, 4, 5, 6, 7, 8], dims(2, 1)).unwrap();
        assert_eq!(frame[0][1], Pixel::from_rgba(5, 6, 7, 8));
    }
}
