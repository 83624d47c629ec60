//! Extrusion entities produced by the slicer.
//!
//! An extrusion entity is either an open path, a closed loop, or a nested
//! collection of further entities. [`ExtrusionEntity::visit`] flattens the
//! tree into [`Toolpath`]s: the segment lists the tube builder consumes.

use crate::constants::EPSILON;
use crate::error::{CoreError, Result};
use crate::geometry::{Line2, Point2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an extrusion is for. Drives colouring in the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtrusionRole {
    Perimeter,
    ExternalPerimeter,
    OverhangPerimeter,
    InternalInfill,
    SolidInfill,
    TopSolidInfill,
    BridgeInfill,
    GapFill,
    Skirt,
    SupportMaterial,
    SupportMaterialInterface,
    WipeTower,
    Mixed,
}

impl ExtrusionRole {
    pub fn is_perimeter(self) -> bool {
        matches!(
            self,
            Self::Perimeter | Self::ExternalPerimeter | Self::OverhangPerimeter
        )
    }

    pub fn is_infill(self) -> bool {
        matches!(
            self,
            Self::InternalInfill
                | Self::SolidInfill
                | Self::TopSolidInfill
                | Self::BridgeInfill
                | Self::GapFill
        )
    }

    pub fn is_support(self) -> bool {
        matches!(
            self,
            Self::SupportMaterial | Self::SupportMaterialInterface
        )
    }
}

impl fmt::Display for ExtrusionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Perimeter => "Perimeter",
            Self::ExternalPerimeter => "External perimeter",
            Self::OverhangPerimeter => "Overhang perimeter",
            Self::InternalInfill => "Internal infill",
            Self::SolidInfill => "Solid infill",
            Self::TopSolidInfill => "Top solid infill",
            Self::BridgeInfill => "Bridge infill",
            Self::GapFill => "Gap fill",
            Self::Skirt => "Skirt",
            Self::SupportMaterial => "Support material",
            Self::SupportMaterialInterface => "Support material interface",
            Self::WipeTower => "Wipe tower",
            Self::Mixed => "Mixed",
        };
        write!(f, "{}", name)
    }
}

/// An open extruded polyline with a constant cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionPath {
    pub polyline: Vec<Point2>,
    pub width: f32,
    pub height: f32,
    /// Volumetric flow (mm³ of extrudate per mm of travel); 0 when unknown.
    #[serde(default)]
    pub mm3_per_mm: f32,
    pub role: ExtrusionRole,
}

impl ExtrusionPath {
    pub fn new(polyline: Vec<Point2>, width: f32, height: f32, role: ExtrusionRole) -> Self {
        Self {
            polyline,
            width,
            height,
            mm3_per_mm: 0.0,
            role,
        }
    }

    pub fn with_flow(mut self, mm3_per_mm: f32) -> Self {
        self.mm3_per_mm = mm3_per_mm;
        self
    }

    /// Segments of the path, skipping any shorter than [`EPSILON`].
    pub fn lines(&self) -> impl Iterator<Item = Line2> + '_ {
        self.polyline
            .windows(2)
            .map(|w| Line2::new(w[0], w[1]))
            .filter(|l| l.length() > EPSILON)
    }

    pub fn first_point(&self) -> Option<Point2> {
        self.polyline.first().copied()
    }

    pub fn last_point(&self) -> Option<Point2> {
        self.polyline.last().copied()
    }
}

/// A closed chain of paths; the last path ends where the first begins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtrusionLoop {
    pub paths: Vec<ExtrusionPath>,
}

impl ExtrusionLoop {
    pub fn new(paths: Vec<ExtrusionPath>) -> Self {
        Self { paths }
    }

    /// Single-path loop around a polygon. The closing segment is implied.
    pub fn from_polygon(
        mut polygon: Vec<Point2>,
        width: f32,
        height: f32,
        role: ExtrusionRole,
    ) -> Self {
        if let Some(first) = polygon.first().copied() {
            if polygon.last().map(|p| p.distance_to(first) > EPSILON) == Some(true) {
                polygon.push(first);
            }
        }
        Self::new(vec![ExtrusionPath::new(polygon, width, height, role)])
    }

    pub fn role(&self) -> ExtrusionRole {
        self.paths
            .first()
            .map(|p| p.role)
            .unwrap_or(ExtrusionRole::Mixed)
    }
}

/// Ordered set of entities, possibly nested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtrusionCollection {
    pub entities: Vec<ExtrusionEntity>,
}

impl ExtrusionCollection {
    pub fn new(entities: Vec<ExtrusionEntity>) -> Self {
        Self { entities }
    }

    pub fn push(&mut self, entity: impl Into<ExtrusionEntity>) {
        self.entities.push(entity.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn visit<F: FnMut(Toolpath)>(&self, f: &mut F) {
        for entity in &self.entities {
            entity.visit(f);
        }
    }

    pub fn flatten(&self) -> Vec<Toolpath> {
        let mut out = Vec::new();
        self.visit(&mut |tp| out.push(tp));
        out
    }
}

/// The three kinds of extrusion entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtrusionEntity {
    Path(ExtrusionPath),
    Loop(ExtrusionLoop),
    Collection(ExtrusionCollection),
}

impl From<ExtrusionPath> for ExtrusionEntity {
    fn from(path: ExtrusionPath) -> Self {
        Self::Path(path)
    }
}

impl From<ExtrusionLoop> for ExtrusionEntity {
    fn from(lp: ExtrusionLoop) -> Self {
        Self::Loop(lp)
    }
}

impl From<ExtrusionCollection> for ExtrusionEntity {
    fn from(c: ExtrusionCollection) -> Self {
        Self::Collection(c)
    }
}

impl ExtrusionEntity {
    /// Depth-first traversal yielding one toolpath per path or loop.
    /// Entities that reduce to no segments are skipped.
    pub fn visit<F: FnMut(Toolpath)>(&self, f: &mut F) {
        match self {
            Self::Path(path) => {
                let tp = Toolpath::from_path(path);
                if !tp.is_empty() {
                    f(tp);
                }
            }
            Self::Loop(lp) => {
                let tp = Toolpath::from_loop(lp);
                if !tp.is_empty() {
                    f(tp);
                }
            }
            Self::Collection(c) => c.visit(f),
        }
    }
}

/// Flattened segment list with per-segment cross-sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Toolpath {
    pub lines: Vec<Line2>,
    pub widths: Vec<f32>,
    pub heights: Vec<f32>,
    /// Per-segment volumetric flow, 0 where unknown.
    pub flows: Vec<f32>,
    pub role: Option<ExtrusionRole>,
    pub closed: bool,
}

impl Toolpath {
    pub fn from_path(path: &ExtrusionPath) -> Self {
        let mut tp = Self {
            role: Some(path.role),
            ..Default::default()
        };
        tp.append_path(path);
        tp
    }

    pub fn from_loop(lp: &ExtrusionLoop) -> Self {
        let mut tp = Self {
            role: Some(lp.role()),
            closed: true,
            ..Default::default()
        };
        for path in &lp.paths {
            tp.append_path(path);
        }
        // Close the chain if the paths stop short of the start.
        if let (Some(first), Some(last)) = (tp.lines.first().copied(), tp.lines.last().copied()) {
            if last.b.distance_to(first.a) > EPSILON {
                let width = tp.widths.last().copied().unwrap_or_default();
                let height = tp.heights.last().copied().unwrap_or_default();
                let flow = tp.flows.last().copied().unwrap_or_default();
                tp.push(Line2::new(last.b, first.a), width, height, flow);
            }
        }
        if tp.lines.len() < 2 {
            tp.closed = false;
        }
        tp
    }

    fn append_path(&mut self, path: &ExtrusionPath) {
        for line in path.lines() {
            self.push(line, path.width, path.height, path.mm3_per_mm);
        }
    }

    pub fn push(&mut self, line: Line2, width: f32, height: f32, flow: f32) {
        self.lines.push(line);
        self.widths.push(width);
        self.heights.push(height);
        self.flows.push(flow);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn translate(&mut self, offset: Point2) {
        for line in &mut self.lines {
            *line = line.translate(offset);
        }
    }

    /// Check the invariants the tube builder relies on.
    pub fn validate(&self) -> Result<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyPolyline);
        }
        for len in [self.widths.len(), self.heights.len()] {
            if len != self.lines.len() {
                return Err(CoreError::MismatchedArrays {
                    expected: self.lines.len(),
                    actual: len,
                });
            }
        }
        for (index, line) in self.lines.iter().enumerate() {
            let length = line.length();
            if length <= EPSILON {
                return Err(CoreError::InvalidSegment { index, length });
            }
            let (width, height) = (self.widths[index], self.heights[index]);
            if width <= 0.0 || height <= 0.0 {
                return Err(CoreError::InvalidCrossSection {
                    index,
                    width,
                    height,
                });
            }
        }
        Ok(())
    }
}
