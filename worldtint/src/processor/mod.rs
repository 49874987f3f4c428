//! World processing orchestration.
//!
//! Drives the whole batch: authenticate once (fatal on failure),
//! partition the world, then fetch, decode, reduce and append every
//! tile strictly in id order, checkpointing the accumulated dataset
//! every [`DEFAULT_CHECKPOINT_INTERVAL`] results and pacing requests
//! with a fixed inter-tile delay. Tiles are never processed in
//! parallel; the pacing and retry policy assume serialized requests
//! against the provider's rate limit.
//!
//! A tile that yields no image is recorded with `has_data = false` and
//! the run continues; only authentication or a persistence failure
//! aborts the batch.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::coord::{Rect, POLAR_LIMIT_M};
use crate::dataset::{
    checkpoint_path, remove_checkpoint, DatasetError, DatasetMetadata, TileResult, WorldDataset,
};
use crate::fetch::{Sleeper, TileFetcher};
use crate::palette::{reduce, DEFAULT_GRID_SIZE};
use crate::provider::{Authenticator, ProviderError, RenderProvider};
use crate::tile::partition;

/// Default tile edge length in kilometers.
pub const DEFAULT_RESOLUTION_KM: u32 = 1000;

/// Results between checkpoint writes.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Pause after each tile, successful or not.
pub const DEFAULT_TILE_DELAY: Duration = Duration::from_secs(1);

/// Errors that abort a processing run.
///
/// Per-tile fetch and decode failures are not here on purpose: they are
/// absorbed into the tile's result record.
#[derive(Debug)]
pub enum ProcessError {
    /// The credential exchange failed; no tiles were processed.
    Authentication(ProviderError),

    /// A checkpoint or final write failed.
    Persistence(DatasetError),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Authentication(e) => write!(f, "Authentication failed: {}", e),
            ProcessError::Persistence(e) => write!(f, "Failed to persist dataset: {}", e),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Authentication(e) => Some(e),
            ProcessError::Persistence(e) => Some(e),
        }
    }
}

impl From<DatasetError> for ProcessError {
    fn from(e: DatasetError) -> Self {
        ProcessError::Persistence(e)
    }
}

/// Run configuration.
///
/// Every constant that shapes a run is explicit here so tests can use
/// small synthetic worlds and zero delays.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Extent of the coordinate space to partition.
    pub world_bounds: Rect,
    /// Tile edge length in meters.
    pub tile_span_m: f64,
    /// Tile edge length in kilometers, recorded in the metadata.
    pub resolution_km: u32,
    /// Cells per side of each tile's color grid.
    pub grid_size: u32,
    /// Results between checkpoint writes.
    pub checkpoint_interval: usize,
    /// Pause after each tile.
    pub tile_delay: Duration,
    /// Polar exclusion threshold in meters.
    pub polar_limit_m: f64,
}

impl ProcessorConfig {
    /// Configuration for the full world at the given resolution.
    pub fn new(resolution_km: u32) -> Self {
        Self {
            world_bounds: Rect::world(),
            tile_span_m: f64::from(resolution_km) * 1000.0,
            resolution_km,
            grid_size: DEFAULT_GRID_SIZE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            tile_delay: DEFAULT_TILE_DELAY,
            polar_limit_m: POLAR_LIMIT_M,
        }
    }

    /// Set the world bounds.
    pub fn with_world_bounds(mut self, bounds: Rect) -> Self {
        self.world_bounds = bounds;
        self
    }

    /// Set the tile span in meters, decoupled from `resolution_km`.
    pub fn with_tile_span(mut self, span_m: f64) -> Self {
        self.tile_span_m = span_m;
        self
    }

    /// Set the color grid size.
    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the checkpoint interval.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        assert!(interval > 0, "checkpoint interval must be strictly positive");
        self.checkpoint_interval = interval;
        self
    }

    /// Set the inter-tile delay.
    pub fn with_tile_delay(mut self, delay: Duration) -> Self {
        self.tile_delay = delay;
        self
    }

    /// Set the polar exclusion threshold.
    pub fn with_polar_limit(mut self, limit_m: f64) -> Self {
        self.polar_limit_m = limit_m;
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_KM)
    }
}

/// Orchestrates one batch run over the whole world.
pub struct WorldProcessor<A: Authenticator, P: RenderProvider, S: Sleeper> {
    authenticator: A,
    fetcher: TileFetcher<P, S>,
    sleeper: S,
    config: ProcessorConfig,
}

impl<A: Authenticator, P: RenderProvider, S: Sleeper> WorldProcessor<A, P, S> {
    /// Assemble a processor from its collaborators.
    pub fn new(
        authenticator: A,
        fetcher: TileFetcher<P, S>,
        sleeper: S,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            authenticator,
            fetcher,
            sleeper,
            config,
        }
    }

    /// Process every tile and write the dataset to `output_path`.
    ///
    /// A checkpoint with the same schema is maintained beside the output
    /// file during the run and removed after the final write. The
    /// returned dataset has exactly one entry per generated tile,
    /// whatever each tile's fate.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Authentication`] before any tile is
    /// touched when the credential exchange fails, and
    /// [`ProcessError::Persistence`] when a checkpoint or the final
    /// output cannot be written.
    pub fn run(&self, output_path: &Path) -> Result<WorldDataset, ProcessError> {
        let token = self
            .authenticator
            .access_token()
            .map_err(ProcessError::Authentication)?;

        let tiles = partition(
            &self.config.world_bounds,
            self.config.tile_span_m,
            self.config.polar_limit_m,
        );
        info!(tiles = tiles.len(), "starting world processing");

        let mut dataset = WorldDataset::new(DatasetMetadata::new(self.config.resolution_km));
        let checkpoint = checkpoint_path(output_path);
        let total = tiles.len();

        for (index, tile) in tiles.iter().enumerate() {
            info!(tile = tile.id(), position = index + 1, total, "processing tile");

            let image = self
                .fetcher
                .fetch(tile.bounds(), &token)
                .and_then(|bytes| match image::load_from_memory(&bytes) {
                    Ok(image) => Some(image),
                    Err(err) => {
                        warn!(tile = tile.id(), error = %err, "discarding undecodable image");
                        None
                    }
                });

            let colors = reduce(image.as_ref(), self.config.grid_size);
            dataset.push(TileResult::new(tile, colors));

            if dataset.len() % self.config.checkpoint_interval == 0 {
                dataset.write_to(&checkpoint)?;
                info!(completed = dataset.len(), total, "checkpoint saved");
            }

            self.sleeper.sleep(self.config.tile_delay);
        }

        dataset.write_to(output_path)?;
        if remove_checkpoint(output_path)? {
            debug!("checkpoint removed");
        }
        info!(total, path = %output_path.display(), "world color dataset saved");

        Ok(dataset)
    }
}
