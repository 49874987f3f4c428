//! Dataset accumulation and persistence.
//!
//! The run produces one [`WorldDataset`]: metadata plus one
//! [`TileResult`] per generated tile, in tile id order. The dataset is
//! serialized pretty-printed, both to the periodic checkpoint file and
//! to the final output. The checkpoint lives beside the output file
//! under a `temp_` prefix and is overwritten whole each time, so an
//! aborted run loses at most one checkpoint interval of work.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::Rect;
use crate::palette::ColorGrid;
use crate::tile::Tile;

/// Filename prefix for the checkpoint written during a run.
pub const CHECKPOINT_PREFIX: &str = "temp_";

/// Result type for dataset persistence operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors that can occur while persisting the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Failed to create or write a dataset file.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the dataset to JSON.
    #[error("Failed to serialize {path}: {source}")]
    SerializeFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to remove the checkpoint file.
    #[error("Failed to remove {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of processing one tile. Immutable once created.
///
/// `has_data` is true exactly when `colors` is present; tiles whose
/// imagery never arrived are still recorded, with `colors` null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileResult {
    pub id: u64,
    pub bounds: Rect,
    pub colors: Option<ColorGrid>,
    pub has_data: bool,
}

impl TileResult {
    /// Build the result for `tile`, deriving `has_data` from the
    /// presence of `colors`.
    pub fn new(tile: &Tile, colors: Option<ColorGrid>) -> Self {
        let has_data = colors.is_some();
        Self {
            id: tile.id(),
            bounds: *tile.bounds(),
            colors,
            has_data,
        }
    }
}

/// Dataset header describing how the tiles were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Generation timestamp, RFC 3339.
    pub generated: String,
    /// Tile edge length in kilometers.
    pub resolution_km: u32,
    /// Output format tag: unit-range RGB triples.
    pub format: String,
    /// Coordinate reference of the tile bounds.
    pub coordinate_system: String,
    pub description: String,
}

impl DatasetMetadata {
    /// Metadata stamped with the current time.
    pub fn new(resolution_km: u32) -> Self {
        Self {
            generated: Utc::now().to_rfc3339(),
            resolution_km,
            format: "color3".to_string(),
            coordinate_system: "EPSG:3857".to_string(),
            description: "World satellite imagery colors from Sentinel-2 cloudless".to_string(),
        }
    }
}

/// The accumulated run output: metadata plus per-tile results.
///
/// `tiles` is append-only: results arrive in tile id order and are
/// never reordered or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldDataset {
    pub metadata: DatasetMetadata,
    tiles: Vec<TileResult>,
}

impl WorldDataset {
    /// Empty dataset with the given metadata.
    pub fn new(metadata: DatasetMetadata) -> Self {
        Self {
            metadata,
            tiles: Vec::new(),
        }
    }

    /// Append one tile's result.
    pub fn push(&mut self, result: TileResult) {
        self.tiles.push(result);
    }

    /// The accumulated results, in append order.
    pub fn tiles(&self) -> &[TileResult] {
        &self.tiles
    }

    /// Number of accumulated results.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether any results have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Serialize the whole dataset to `path` as pretty-printed JSON,
    /// replacing any existing file.
    pub fn write_to(&self, path: &Path) -> DatasetResult<()> {
        let file = File::create(path).map_err(|e| DatasetError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| {
            DatasetError::SerializeFailed {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        writer.flush().map_err(|e| DatasetError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Path of the checkpoint written alongside `output_path`: the same
/// directory, with the file name prefixed by [`CHECKPOINT_PREFIX`].
pub fn checkpoint_path(output_path: &Path) -> PathBuf {
    let file_name = output_path
        .file_name()
        .map(|name| {
            let mut prefixed = std::ffi::OsString::from(CHECKPOINT_PREFIX);
            prefixed.push(name);
            prefixed
        })
        .unwrap_or_else(|| std::ffi::OsString::from(CHECKPOINT_PREFIX));

    output_path.with_file_name(file_name)
}

/// Remove the checkpoint belonging to `output_path`, if present.
///
/// Returns whether a file was removed.
pub fn remove_checkpoint(output_path: &Path) -> DatasetResult<bool> {
    let path = checkpoint_path(output_path);
    if !path.exists() {
        return Ok(false);
    }

    fs::remove_file(&path).map_err(|e| DatasetError::RemoveFailed { path, source: e })?;
    Ok(true)
}
