//! 3D preview module (OpenGL via `glow`)
//!
//! This module provides:
//! - Orbit camera with orthographic projection (camera)
//! - The GPU seam and its `glow` implementation (device)
//! - Colour-grouped render units with upload tracking (volume)
//! - Frame orchestration, input and picking (scene)
//! - Layer-clipped toolpath preview (preview)
//! - Scene and preview settings (config)

pub mod camera;
pub mod config;
pub mod device;
pub mod picking;
pub mod preview;
pub mod scene;
pub mod volume;

pub use camera::{Camera, Ray, ViewPreset};
pub use config::{Palette, PreviewConfig, RenderMode, Rgba, SceneConfig, Theme};
pub use device::{GlDevice, GlVolumeBuffers, RenderDevice, StaticPass, StaticSlot, VolumeDraw};
pub use picking::{decode_pick_color, encode_pick_color, MAX_PICK_INDEX};
pub use preview::{LoadStats, PreviewScene, RoleGroup};
pub use scene::{
    FrameState, MouseButton, MouseEvent, NoHooks, RenderHooks, Scene, SceneState, NO_CLIP,
};
pub use volume::{UploadState, Volume};
