//! varnam-assets: packages compiled keyboard schemes for the app bundle
//!
//! The scheme build produces, per scheme identifier, a tree of:
//! - `<schemeID>.vst` symbol tables
//! - `*.vlf` pack files
//! - `pack.json` pack descriptions
//!
//! This crate copies the binary artifacts into one flat assets directory and
//! aggregates the pack descriptions into a `packs.json` index.

pub mod collector;
pub mod config;
pub mod error;
pub mod index;
pub mod inventory;
pub mod rules;

pub use collector::{AssetCollector, PlannedAction, RunReport, SchemeCollection, SchemeReport};
pub use config::{CollectorConfig, IndexMode};
pub use error::CollectError;
pub use index::PacksIndex;
