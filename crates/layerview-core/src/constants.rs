//! Shared numeric constants.

/// Segments shorter than this (mm) are considered degenerate.
pub const EPSILON: f32 = 1e-4;

/// Tolerance used when comparing a toolpath Z against a clip height (mm).
pub const CLIP_EPSILON: f32 = 1e-4;

/// Default bed edge length used when a print carries no bed outline (mm).
pub const DEFAULT_BED_SIZE_MM: f32 = 200.0;

/// Default extrusion width (mm).
pub const DEFAULT_EXTRUSION_WIDTH_MM: f32 = 0.45;

/// Default layer height (mm).
pub const DEFAULT_LAYER_HEIGHT_MM: f32 = 0.2;
