//! Conversion module.
//!
//! This module turns geographic coordinate tables into projected ones:
//! - Projector: CRS to CRS point transformation
//! - Pipeline: parse, validate, project orchestration

pub mod pipeline;
pub mod projector;

pub use pipeline::*;
pub use projector::{Projector, EASTING_FIELD, NORTHING_FIELD};
