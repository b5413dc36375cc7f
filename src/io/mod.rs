//! File input/output: rotation-curve ingest, SPARC archive fetch, and exports.

pub mod curve;
pub mod export;
pub mod fetch;
pub mod ingest;
