//! World tiling.
//!
//! Partitions a bounded EPSG:3857 rectangle into an ordered set of
//! non-overlapping tiles. The sweep walks the horizontal axis in
//! fixed-size steps, and for each column walks the vertical axis the same
//! way. Candidate tiles whose vertical center falls beyond the polar
//! limit are skipped without emitting anything, but the cursor still
//! advances, so the tile count for a given world/span is deterministic.
//!
//! Edge tiles are clamped to the world boundary, so the last tile of each
//! sweep direction may be narrower or shorter than the requested span.

use crate::coord::Rect;

/// One rectangular sub-region of the world, processed independently.
///
/// Tiles are immutable once created; ids are assigned sequentially in
/// emission order (outer loop west→east, inner loop south→north).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    id: u64,
    bounds: Rect,
}

impl Tile {
    /// Create a tile. Used by [`partition`]; exposed for test doubles.
    pub fn new(id: u64, bounds: Rect) -> Self {
        Self { id, bounds }
    }

    /// Sequential id in emission order, starting at 0.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The tile's bounds in EPSG:3857 meters.
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }
}

/// Partition `world` into tiles of at most `tile_span` meters per side.
///
/// Tiles whose vertical center exceeds `polar_limit` in absolute value
/// are not emitted; the vertical cursor still advances past them. Pass
/// `f64::INFINITY` to disable polar exclusion.
///
/// The union of the emitted tiles, together with the excluded polar
/// bands, covers `world` exactly once; tiles never overlap and never
/// extend past the world boundary.
///
/// # Panics
///
/// Panics if `tile_span` is not strictly positive.
pub fn partition(world: &Rect, tile_span: f64, polar_limit: f64) -> Vec<Tile> {
    assert!(tile_span > 0.0, "tile_span must be strictly positive");

    let mut tiles = Vec::new();
    let mut id = 0u64;

    let mut x = world.west;
    while x < world.east {
        let east = (x + tile_span).min(world.east);

        let mut y = world.south;
        while y < world.north {
            let north = (y + tile_span).min(world.north);
            let center_y = (y + north) / 2.0;
            if center_y.abs() > polar_limit {
                y += tile_span;
                continue;
            }

            tiles.push(Tile::new(
                id,
                Rect {
                    west: x,
                    east,
                    south: y,
                    north,
                },
            ));
            id += 1;
            y += tile_span;
        }
        x += tile_span;
    }

    tiles
}
