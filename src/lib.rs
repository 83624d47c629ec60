//! # LayerView
//!
//! Toolpath preview for 3D printers with support for:
//! - Stadium-profile tube meshes built from sliced extrusion paths
//! - Compact per-segment instancing for very large prints
//! - Layer-range clipping, selection and hover picking
//!
//! ## Architecture
//!
//! LayerView is organized as a workspace with two crates:
//!
//! 1. **layerview-core** - Print data model, geometry primitives, errors
//! 2. **layerview-visualizer** - Tube builder, instancing, GPU wrappers, scene, preview
//!
//! This crate re-exports both and owns the logging setup.

pub use layerview_core::{data, geometry};
pub use layerview_visualizer::visualizer;

pub use layerview_core::{
    BoundingBox3, CoreError, ExtrusionCollection, ExtrusionEntity, ExtrusionLoop, ExtrusionPath,
    ExtrusionRole, Layer, LayerRegion, Line2, Point2, Print, PrintObject, PrintStep, SupportLayer,
    Toolpath,
};

pub use layerview_visualizer::{
    Camera, ExtrusionGeometry, GeometryStats, GlDevice, InstanceArray, LoadStats, PreviewConfig,
    PreviewScene, RenderDevice, RenderError, RenderMode, Scene, SceneConfig, TubeMesh, Vertex,
    Volume,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting, or JSON lines when
///   `LAYERVIEW_LOG_FORMAT=json`
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let json = std::env::var("LAYERVIEW_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .json();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_level(true)
            .with_line_number(true)
            .pretty();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
