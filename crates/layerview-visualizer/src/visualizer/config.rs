//! Scene and preview settings.
//!
//! Plain `serde` structs; every field has a default so partial JSON
//! documents load. Nothing here is persisted by the renderer itself.

use crate::error::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type Rgba = [f32; 4];

/// Colours of the scene chrome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background_top: Rgba,
    pub background_bottom: Rgba,
    /// Solid clear colour only, no gradient pass.
    pub flat_background: bool,
    pub ground: Rgba,
    pub grid: Rgba,
    pub bed_outline: Rgba,
    pub selection: Rgba,
    pub hover: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_top: [0.22, 0.24, 0.28, 1.0],
            background_bottom: [0.07, 0.08, 0.10, 1.0],
            flat_background: false,
            ground: [0.5, 0.5, 0.5, 0.4],
            grid: [0.8, 0.8, 0.8, 0.5],
            bed_outline: [0.9, 0.9, 0.9, 1.0],
            selection: [1.0, 0.6, 0.0, 1.0],
            hover: [0.4, 0.9, 0.1, 1.0],
        }
    }
}

/// Settings of the base scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub theme: Theme,
    /// Grid spacing on the bed (mm).
    pub grid_spacing: f32,
    /// Length of the world axes (mm).
    pub axes_length: f32,
    /// Degrees of rotation per dragged pixel.
    pub rotate_sensitivity: f32,
    /// Run the colour-picking pass on hover.
    pub picking: bool,
    pub light_direction: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            grid_spacing: 10.0,
            axes_length: 20.0,
            rotate_sensitivity: 0.25,
            picking: false,
            light_direction: Vec3::new(-0.3, -0.5, -1.0),
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Toolpath colours per role group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub perimeter: Rgba,
    pub infill: Rgba,
    pub support: Rgba,
    pub default: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            perimeter: [1.0, 1.0, 0.0, 1.0],
            infill: [1.0, 0.5, 0.5, 1.0],
            support: [0.5, 1.0, 0.5, 1.0],
            default: [0.5, 0.5, 1.0, 1.0],
        }
    }
}

/// How toolpaths reach the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Full tube meshes with per-fragment clipping.
    #[default]
    Geometry,
    /// One record per segment drawn over a shared template.
    Instanced,
}

/// Settings of the toolpath preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub scene: SceneConfig,
    pub palette: Palette,
    /// Profile flatness for infill tubes, 0 to 1.
    pub infill_flatness: f32,
    pub render_mode: RenderMode,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scene: SceneConfig::default(),
            palette: Palette::default(),
            infill_flatness: 0.5,
            render_mode: RenderMode::Geometry,
        }
    }
}

impl PreviewConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
