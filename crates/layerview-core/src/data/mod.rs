//! Print data model handed to the renderer
//!
//! This module provides:
//! - Extrusion entities (paths, loops, nested collections)
//! - Layers and support layers with their per-region collections
//! - Print objects with shifted copies
//! - The print itself with its bed outline and processing-step state
//!
//! The renderer never produces these; the slicer does. They are plain data.

pub mod extrusion;

pub use extrusion::{
    ExtrusionCollection, ExtrusionEntity, ExtrusionLoop, ExtrusionPath, ExtrusionRole, Toolpath,
};

use crate::constants::DEFAULT_BED_SIZE_MM;
use crate::geometry::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-region extrusions of one layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerRegion {
    pub perimeters: ExtrusionCollection,
    pub fills: ExtrusionCollection,
}

/// One sliced layer of an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layer {
    /// Z of the top of this layer (mm).
    pub print_z: f32,
    pub height: f32,
    pub regions: Vec<LayerRegion>,
}

impl Layer {
    pub fn new(print_z: f32, height: f32) -> Self {
        Self {
            print_z,
            height,
            regions: Vec::new(),
        }
    }
}

/// One layer of generated support.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SupportLayer {
    pub print_z: f32,
    pub height: f32,
    pub support_fills: ExtrusionCollection,
}

/// A sliced object and the offsets of each of its copies on the bed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintObject {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub support_layers: Vec<SupportLayer>,
    pub copies: Vec<Point2>,
}

impl Default for PrintObject {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            support_layers: Vec::new(),
            copies: vec![Point2::default()],
        }
    }
}

/// Processing steps whose completion the preview cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintStep {
    Slice,
    SupportMaterial,
}

/// The whole print: objects, bed outline and which steps are done.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Print {
    pub objects: Vec<PrintObject>,
    pub bed_shape: Vec<Point2>,
    #[serde(default)]
    steps_done: HashSet<PrintStep>,
}

impl Print {
    pub fn new(objects: Vec<PrintObject>, bed_shape: Vec<Point2>) -> Self {
        Self {
            objects,
            bed_shape,
            steps_done: HashSet::new(),
        }
    }

    pub fn is_step_done(&self, step: PrintStep) -> bool {
        self.steps_done.contains(&step)
    }

    pub fn set_step_done(&mut self, step: PrintStep) {
        self.steps_done.insert(step);
    }

    pub fn invalidate_step(&mut self, step: PrintStep) {
        if self.steps_done.remove(&step) {
            tracing::debug!(?step, "print step invalidated");
        }
    }

    /// Bed outline, or a default square when none was configured.
    pub fn bed_outline(&self) -> Vec<Point2> {
        if self.bed_shape.len() >= 3 {
            return self.bed_shape.clone();
        }
        let s = DEFAULT_BED_SIZE_MM;
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(s, 0.0),
            Point2::new(s, s),
            Point2::new(0.0, s),
        ]
    }
}
