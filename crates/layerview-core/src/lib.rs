//! # LayerView Core
//!
//! Core types for LayerView.
//! Provides the print data model the preview consumes, shared geometry
//! primitives, constants and the data-validation error type.

pub mod constants;
pub mod data;
pub mod error;
pub mod geometry;

pub use data::{
    ExtrusionCollection, ExtrusionEntity, ExtrusionLoop, ExtrusionPath, ExtrusionRole, Layer,
    LayerRegion, Print, PrintObject, PrintStep, SupportLayer, Toolpath,
};

pub use error::{CoreError, Result};

pub use geometry::{polyline_length, BoundingBox3, Line2, Point2};
