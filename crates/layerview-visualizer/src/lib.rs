//! # LayerView Visualizer
//!
//! Toolpath preview for LayerView.
//! Turns extruded polylines into stadium-profile tube meshes or per-segment
//! instance records, and draws them layer-clipped with an orbit camera.

pub mod error;
pub mod geometry;
pub mod gpu;
pub mod visualizer;

pub use error::{RenderError, Result};

pub use geometry::{
    stadium_area, stadium_width, tube_template, BedColors, BedGeometry, ColoredMesh,
    ExtrusionGeometry, GeometryBuffer, GeometryStats, InstanceArray, InstanceRecord,
    StadiumProfile, TriangleMesh, TubeMesh, Vertex,
};

pub use visualizer::{
    Camera, FrameState, GlDevice, LoadStats, MouseButton, MouseEvent, NoHooks, Palette,
    PreviewConfig, PreviewScene, Ray, RenderDevice, RenderHooks, RenderMode, RoleGroup, Scene,
    SceneConfig, SceneState, StaticPass, StaticSlot, Theme, UploadState, ViewPreset, Volume,
    VolumeDraw,
};
