//! Projected coordinate types for the world grid.
//!
//! All geometry in this crate lives in Web Mercator (EPSG:3857) meters.
//! The world is the square `[-WORLD_EXTENT_M, WORLD_EXTENT_M]` on both
//! axes; imagery beyond [`POLAR_LIMIT_M`] on the vertical axis is treated
//! as unavailable and excluded from tiling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-extent of the EPSG:3857 world square, in meters.
pub const WORLD_EXTENT_M: f64 = 20_037_508.34;

/// Vertical cutoff beyond which tiles are not emitted, in meters.
///
/// Roughly 85 degrees of latitude. Source imagery above this band is
/// sparse or absent, so the partitioner skips it entirely.
pub const POLAR_LIMIT_M: f64 = 15_000_000.0;

/// An axis-aligned rectangle in EPSG:3857 meters.
///
/// Invariant: `west < east` and `south < north`. Construct via
/// [`Rect::new`] to have the invariant checked; the partitioner builds
/// clamped rectangles internally and upholds it by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Rect {
    /// Create a rectangle, validating that both spans are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError`] if `west >= east` or `south >= north`.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self, CoordError> {
        if west >= east {
            return Err(CoordError::EmptyHorizontalSpan { west, east });
        }
        if south >= north {
            return Err(CoordError::EmptyVerticalSpan { south, north });
        }
        Ok(Self {
            west,
            east,
            south,
            north,
        })
    }

    /// The full EPSG:3857 world square.
    pub fn world() -> Self {
        Self {
            west: -WORLD_EXTENT_M,
            east: WORLD_EXTENT_M,
            south: -WORLD_EXTENT_M,
            north: WORLD_EXTENT_M,
        }
    }

    /// Horizontal span in meters.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Vertical span in meters.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Vertical midpoint, used for the polar-exclusion test.
    pub fn center_y(&self) -> f64 {
        (self.south + self.north) / 2.0
    }

    /// Whether `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.west >= self.west
            && other.east <= self.east
            && other.south >= self.south
            && other.north <= self.north
    }
}

/// Errors raised when constructing coordinate types from invalid spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordError {
    /// `west >= east`.
    EmptyHorizontalSpan { west: f64, east: f64 },
    /// `south >= north`.
    EmptyVerticalSpan { south: f64, north: f64 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::EmptyHorizontalSpan { west, east } => {
                write!(f, "Empty horizontal span: west {} >= east {}", west, east)
            }
            CoordError::EmptyVerticalSpan { south, north } => {
                write!(f, "Empty vertical span: south {} >= north {}", south, north)
            }
        }
    }
}

impl std::error::Error for CoordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_valid_spans() {
        let rect = Rect::new(-10.0, 10.0, -5.0, 5.0).unwrap();
        assert_eq!(rect.width(), 20.0);
        assert_eq!(rect.height(), 10.0);
    }

    #[test]
    fn test_new_rejects_empty_horizontal_span() {
        let result = Rect::new(10.0, 10.0, -5.0, 5.0);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::EmptyHorizontalSpan { .. }
        ));
    }

    #[test]
    fn test_new_rejects_inverted_vertical_span() {
        let result = Rect::new(-10.0, 10.0, 5.0, -5.0);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::EmptyVerticalSpan { .. }
        ));
    }

    #[test]
    fn test_world_square_is_symmetric() {
        let world = Rect::world();
        assert_eq!(world.west, -world.east);
        assert_eq!(world.south, -world.north);
        assert_eq!(world.width(), 2.0 * WORLD_EXTENT_M);
    }

    #[test]
    fn test_center_y() {
        let rect = Rect::new(0.0, 1.0, -4.0, 10.0).unwrap();
        assert_eq!(rect.center_y(), 3.0);
    }

    #[test]
    fn test_contains() {
        let outer = Rect::new(-10.0, 10.0, -10.0, 10.0).unwrap();
        let inner = Rect::new(-5.0, 5.0, -5.0, 5.0).unwrap();
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));
    }

    #[test]
    fn test_polar_limit_within_world() {
        assert!(POLAR_LIMIT_M < WORLD_EXTENT_M);
    }

    #[test]
    fn test_serializes_with_named_edges() {
        let rect = Rect::new(-1.5, 2.5, -3.5, 4.5).unwrap();
        let json = serde_json::to_value(&rect).unwrap();
        assert_eq!(json["west"], -1.5);
        assert_eq!(json["east"], 2.5);
        assert_eq!(json["south"], -3.5);
        assert_eq!(json["north"], 4.5);
    }
}
