//! Pixel-space geometry for detected faces and estimated garment regions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Face bounding box in frame pixel coordinates.
///
/// The origin is never negative: detectors may report boxes that start
/// outside the frame, and those are clamped at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FaceBox {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Box width
    pub width: u32,
    /// Box height
    pub height: u32,
}

impl FaceBox {
    /// Create a new face box.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from raw detector output.
    ///
    /// Negative origins are clamped to zero while the extent is kept as
    /// reported, so a box hanging off the left edge shifts right rather than
    /// shrinking. Negative extents collapse to zero.
    pub fn from_raw(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x: x.max(0) as u32,
            y: y.max(0) as u32,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// The part of this box that lies inside a `frame_width` x `frame_height` frame.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Region {
        Region::new(self.x, self.y, self.x2(), self.y2()).clip(frame_width, frame_height)
    }
}

/// Axis-aligned region given by its corners, `x1..x2` by `y1..y2` (exclusive ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    /// Create a new region.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Region width; zero when the corners are inverted.
    #[inline]
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Region height; zero when the corners are inverted.
    #[inline]
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Region area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the region covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Clamp every corner into `[0, frame_width] x [0, frame_height]`.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Region {
        Region {
            x1: self.x1.min(frame_width),
            y1: self.y1.min(frame_height),
            x2: self.x2.min(frame_width),
            y2: self.y2.min(frame_height),
        }
    }
}

/// Garment regions estimated below a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GarmentRegions {
    /// Torso area, from the chin line down
    pub shirt: Region,
    /// Leg area below the torso; present only when a pant colour was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pants: Option<Region>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_clamps_origin_only() {
        let face = FaceBox::from_raw(-12, -3, 40, 50);
        assert_eq!(face, FaceBox::new(0, 0, 40, 50));
    }

    #[test]
    fn test_from_raw_collapses_negative_extent() {
        let face = FaceBox::from_raw(10, 10, -5, 20);
        assert_eq!(face.width, 0);
        assert_eq!(face.height, 20);
    }

    #[test]
    fn test_clip_keeps_inside_part() {
        let face = FaceBox::new(90, 40, 30, 30);
        let clipped = face.clip(100, 60);
        assert_eq!(clipped, Region::new(90, 40, 100, 60));
        assert_eq!(clipped.width(), 10);
        assert_eq!(clipped.height(), 20);
    }

    #[test]
    fn test_clip_outside_frame_is_empty() {
        let face = FaceBox::new(120, 10, 30, 30);
        assert!(face.clip(100, 100).is_empty());
    }

    #[test]
    fn test_inverted_region_is_empty() {
        let region = Region::new(50, 80, 40, 90);
        assert_eq!(region.width(), 0);
        assert!(region.is_empty());
        assert_eq!(region.area(), 0);
    }
}
