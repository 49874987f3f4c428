//! Worldtint - global satellite imagery reduced to tiled average colors.
//!
//! This library converts world-spanning satellite imagery into a coarse,
//! tiled grid of averaged colors, serialized incrementally to a JSON
//! dataset for downstream consumers that want low-fidelity world color
//! data (map backgrounds, stylized rendering).
//!
//! # Pipeline
//!
//! ```text
//! tile::partition ──► fetch::TileFetcher ──► palette::reduce ──► dataset::WorldDataset
//!      (bounds)          (PNG bytes)           (color grid)        (checkpointed JSON)
//! ```
//!
//! [`processor::WorldProcessor`] drives the pipeline strictly
//! sequentially over every tile; the external collaborators
//! (authentication and rendering) live behind the traits in
//! [`provider`], so tests replace the network with scripted doubles.

pub mod coord;
pub mod dataset;
pub mod fetch;
pub mod palette;
pub mod processor;
pub mod provider;
pub mod telemetry;
pub mod tile;
