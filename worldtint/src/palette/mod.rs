//! Image-to-color-grid reduction.
//!
//! Reduces one tile's rendered image to a small square grid of averaged
//! colors. The image is first resized to a fixed intermediate resolution
//! ([`CELL_SAMPLE_EDGE`] pixels per grid cell) so per-cell pixel counts
//! and runtime stay bounded regardless of the source dimensions, then
//! each cell's channels are averaged and normalized to the unit range.

use image::{imageops::FilterType, DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Default number of cells per grid side.
pub const DEFAULT_GRID_SIZE: u32 = 4;

/// Pixels per grid cell after the intermediate resize.
pub const CELL_SAMPLE_EDGE: u32 = 16;

/// Maximum representable value of one 8-bit channel.
const CHANNEL_MAX: f64 = 255.0;

/// One averaged color: red, green and blue intensity in `[0, 1]`,
/// rounded to three decimal places. Serializes as a 3-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub f64, pub f64, pub f64);

/// A square, row-major grid of averaged colors produced from one image.
///
/// Serializes as nested arrays: `grid[row][col] == [r, g, b]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGrid(Vec<Vec<Color>>);

impl ColorGrid {
    /// Number of cells per side.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Cell at `(row, col)`, row-major from the image's top-left.
    pub fn get(&self, row: usize, col: usize) -> Option<&Color> {
        self.0.get(row).and_then(|r| r.get(col))
    }

    /// Iterate over rows of cells.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.0.iter().map(Vec::as_slice)
    }
}

/// Reduce an image to a `grid_size` x `grid_size` grid of averaged
/// colors, or propagate absence when no image was available.
///
/// The image is converted to RGB, resized to `grid_size *
/// CELL_SAMPLE_EDGE` pixels per side with Lanczos resampling, and split
/// into equal cells by integer division; any trailing remainder pixels
/// are dropped from the last row and column of cells rather than
/// redistributed. Each cell's channels are arithmetically averaged,
/// divided by 255, and rounded to three decimals.
///
/// # Panics
///
/// Panics if `grid_size` is zero.
pub fn reduce(image: Option<&DynamicImage>, grid_size: u32) -> Option<ColorGrid> {
    assert!(grid_size > 0, "grid_size must be strictly positive");

    let image = image?;
    let edge = grid_size * CELL_SAMPLE_EDGE;
    let resized = image
        .resize_exact(edge, edge, FilterType::Lanczos3)
        .to_rgb8();

    Some(cell_means(&resized, grid_size))
}

/// Average an RGB image into a square grid of unit-range colors.
///
/// Cell dimensions come from integer division, so images whose sides do
/// not divide evenly by `grid_size` lose their trailing pixels.
fn cell_means(image: &RgbImage, grid_size: u32) -> ColorGrid {
    let cell_height = image.height() / grid_size;
    let cell_width = image.width() / grid_size;

    let mut rows = Vec::with_capacity(grid_size as usize);
    for row in 0..grid_size {
        let mut cells = Vec::with_capacity(grid_size as usize);
        for col in 0..grid_size {
            let y_start = row * cell_height;
            let x_start = col * cell_width;

            let mut sums = [0u64; 3];
            for y in y_start..y_start + cell_height {
                for x in x_start..x_start + cell_width {
                    let pixel = image.get_pixel(x, y).0;
                    sums[0] += u64::from(pixel[0]);
                    sums[1] += u64::from(pixel[1]);
                    sums[2] += u64::from(pixel[2]);
                }
            }

            let count = f64::from(cell_height) * f64::from(cell_width);
            cells.push(Color(
                round3(sums[0] as f64 / count / CHANNEL_MAX),
                round3(sums[1] as f64 / count / CHANNEL_MAX),
                round3(sums[2] as f64 / count / CHANNEL_MAX),
            ));
        }
        rows.push(cells);
    }

    ColorGrid(rows)
}

/// Round to three decimal places.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn uniform_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn test_absent_image_reduces_to_absent() {
        assert_eq!(reduce(None, DEFAULT_GRID_SIZE), None);
        assert_eq!(reduce(None, 8), None);
    }

    #[test]
    fn test_uniform_image_yields_uniform_grid() {
        let image = uniform_image(512, 512, [51, 102, 204]);

        for grid_size in [1, 2, 4, 7] {
            let grid = reduce(Some(&image), grid_size).unwrap();
            assert_eq!(grid.size(), grid_size as usize);
            for row in grid.rows() {
                assert_eq!(row.len(), grid_size as usize);
                for color in row {
                    assert_eq!(*color, Color(0.2, 0.4, 0.8));
                }
            }
        }
    }

    #[test]
    fn test_channels_stay_in_unit_range_and_three_decimals() {
        // A gradient exercises averaging across many distinct values.
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        }));

        let grid = reduce(Some(&image), DEFAULT_GRID_SIZE).unwrap();
        for row in grid.rows() {
            for color in row {
                for channel in [color.0, color.1, color.2] {
                    assert!((0.0..=1.0).contains(&channel), "channel {} out of range", channel);
                    let scaled = channel * 1000.0;
                    assert!(
                        (scaled - scaled.round()).abs() < 1e-9,
                        "channel {} not rounded to 3 decimals",
                        channel
                    );
                }
            }
        }
    }

    #[test]
    fn test_black_and_white_extremes() {
        let black = uniform_image(32, 32, [0, 0, 0]);
        let white = uniform_image(32, 32, [255, 255, 255]);

        let grid = reduce(Some(&black), 2).unwrap();
        assert_eq!(*grid.get(0, 0).unwrap(), Color(0.0, 0.0, 0.0));

        let grid = reduce(Some(&white), 2).unwrap();
        assert_eq!(*grid.get(1, 1).unwrap(), Color(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_grid_is_row_major_from_top_left() {
        // Top half red, bottom-left green, bottom-right blue. Averaged
        // directly, without the resize, so cell boundaries are crisp.
        let image = RgbImage::from_fn(32, 32, |x, y| {
            if y < 16 {
                Rgb([255, 0, 0])
            } else if x < 16 {
                Rgb([0, 255, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });

        let grid = cell_means(&image, 2);
        assert_eq!(*grid.get(0, 0).unwrap(), Color(1.0, 0.0, 0.0));
        assert_eq!(*grid.get(0, 1).unwrap(), Color(1.0, 0.0, 0.0));
        assert_eq!(*grid.get(1, 0).unwrap(), Color(0.0, 1.0, 0.0));
        assert_eq!(*grid.get(1, 1).unwrap(), Color(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_non_rgb_input_is_converted() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(64, 64, image::Luma([128])));
        let grid = reduce(Some(&gray), 2).unwrap();
        let Color(r, g, b) = *grid.get(0, 0).unwrap();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!((r - 0.502).abs() < 1e-9);
    }

    #[test]
    fn test_cell_means_drops_remainder_pixels() {
        // 10x10 image, grid 3: cells are 3x3 and the last pixel row and
        // column never contribute. Paint them an extreme color and check
        // it does not bleed into any cell average.
        let image = RgbImage::from_fn(10, 10, |x, y| {
            if x == 9 || y == 9 {
                Rgb([255, 255, 255])
            } else {
                Rgb([100, 100, 100])
            }
        });

        let grid = cell_means(&image, 3);
        for row in grid.rows() {
            for color in row {
                assert_eq!(*color, Color(0.392, 0.392, 0.392));
            }
        }
    }

    #[test]
    fn test_color_serializes_as_array() {
        let json = serde_json::to_string(&Color(0.1, 0.2, 0.3)).unwrap();
        assert_eq!(json, "[0.1,0.2,0.3]");
    }

    #[test]
    fn test_grid_serializes_as_nested_arrays() {
        let image = uniform_image(16, 16, [255, 0, 0]);
        let grid = reduce(Some(&image), 2).unwrap();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json[0][0][0], 1.0);
        assert_eq!(json[1][1][2], 0.0);
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[test]
    #[should_panic(expected = "grid_size must be strictly positive")]
    fn test_zero_grid_size_panics() {
        let image = uniform_image(16, 16, [0, 0, 0]);
        reduce(Some(&image), 0);
    }
}
