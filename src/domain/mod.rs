//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`ModelSpec`, `HaloKind`, `GalaxySource`)
//! - normalized rotation-curve observations (`RotationPoint`, `GalaxyData`)
//! - fit outputs (`FitResult`, `RotationModel`, etc.)

pub mod types;

pub use types::*;
