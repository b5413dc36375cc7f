//! Data sources: the deterministic synthetic demo galaxy.
//!
//! Real galaxies come from `io::ingest`; this module exists so the TUI and
//! the CLI can run without any data files on disk.

pub mod sample;

pub use sample::*;
