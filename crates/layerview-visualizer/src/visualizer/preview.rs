//! # Toolpath Preview
//!
//! [`PreviewScene`] turns a sliced [`Print`] into coloured tube volumes and
//! clips them to a layer range. It wraps a [`Scene`] and adds:
//!
//! - role classification into a fixed palette, one volume per colour
//! - geometry or instanced upload, per [`RenderMode`]
//! - the sorted list of layer tops that drives the height slider
//!
//! A print whose slicing step is not done shows nothing and hides the
//! slider.

use super::config::{Palette, PreviewConfig, RenderMode, Rgba};
use super::device::RenderDevice;
use super::scene::{RenderHooks, Scene, NO_CLIP};
use super::volume::Volume;
use crate::geometry::{ExtrusionGeometry, GeometryStats, InstanceArray, TubeMesh};
use layerview_core::constants::CLIP_EPSILON;
use layerview_core::{ExtrusionCollection, ExtrusionRole, Point2, Print, PrintStep, Toolpath};

/// Palette bucket of an extrusion role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleGroup {
    Perimeter,
    Infill,
    Support,
    Default,
}

impl RoleGroup {
    pub fn of(role: Option<ExtrusionRole>) -> Self {
        match role {
            Some(r) if r.is_perimeter() => Self::Perimeter,
            Some(r) if r.is_infill() => Self::Infill,
            Some(r) if r.is_support() => Self::Support,
            _ => Self::Default,
        }
    }

    pub fn color(self, palette: &Palette) -> Rgba {
        match self {
            Self::Perimeter => palette.perimeter,
            Self::Infill => palette.infill,
            Self::Support => palette.support,
            Self::Default => palette.default,
        }
    }
}

/// Summary of one [`PreviewScene::load_toolpaths`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadStats {
    pub toolpaths: usize,
    /// Toolpaths dropped because they failed validation.
    pub skipped: usize,
    pub segments: usize,
    pub volumes: usize,
    pub layers: usize,
    pub geometry: GeometryStats,
}

/// Geometry collected for one colour before it becomes a volume.
enum Accumulator {
    Mesh(TubeMesh),
    Instances(InstanceArray),
}

struct ColorBucket {
    color: Rgba,
    data: Accumulator,
}

pub struct PreviewScene<D: RenderDevice> {
    scene: Scene<D>,
    config: PreviewConfig,
    layers_z: Vec<f32>,
    range: (f32, f32),
    range_visible: bool,
}

impl<D: RenderDevice> PreviewScene<D> {
    pub fn new(device: D, config: PreviewConfig) -> Self {
        Self {
            scene: Scene::new(device, config.scene.clone()),
            config,
            layers_z: Vec::new(),
            range: NO_CLIP,
            range_visible: false,
        }
    }

    pub fn scene(&self) -> &Scene<D> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene<D> {
        &mut self.scene
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Replace the settings. Takes effect on the next load.
    pub fn set_config(&mut self, config: PreviewConfig) {
        self.scene.set_config(config.scene.clone());
        self.config = config;
    }

    /// Sorted distinct layer tops of the loaded print.
    pub fn layers_z(&self) -> &[f32] {
        &self.layers_z
    }

    pub fn range_control_visible(&self) -> bool {
        self.range_visible
    }

    /// Current `(min_z, max_z)` as last passed to [`Self::set_range`].
    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    /// Rebuild all toolpath volumes from `print`.
    pub fn load_toolpaths(&mut self, print: &Print) -> LoadStats {
        self.scene.clear_volumes();
        self.layers_z.clear();

        if !print.is_step_done(PrintStep::Slice) {
            tracing::debug!("print not sliced; preview cleared");
            self.range_visible = false;
            self.range = NO_CLIP;
            self.scene.set_clip_range(NO_CLIP.0, NO_CLIP.1);
            return LoadStats::default();
        }

        self.scene.set_bed_outline(print.bed_outline());

        let perimeter_tubes = ExtrusionGeometry::new(0.0);
        let infill_tubes = ExtrusionGeometry::new(self.config.infill_flatness);
        let mut buckets: Vec<ColorBucket> = Vec::new();
        let mut stats = LoadStats::default();
        let with_support = print.is_step_done(PrintStep::SupportMaterial);

        for object in &print.objects {
            let mut layers: Vec<(f32, &ExtrusionCollection)> = Vec::new();
            for layer in &object.layers {
                self.layers_z.push(layer.print_z);
                for region in &layer.regions {
                    layers.push((layer.print_z, &region.perimeters));
                    layers.push((layer.print_z, &region.fills));
                }
            }
            if with_support {
                for support in &object.support_layers {
                    self.layers_z.push(support.print_z);
                    layers.push((support.print_z, &support.support_fills));
                }
            }

            for &(top_z, collection) in &layers {
                for toolpath in collection.flatten() {
                    if let Err(e) = toolpath.validate() {
                        tracing::warn!(error = %e, top_z, "skipping invalid toolpath");
                        stats.skipped += 1;
                        continue;
                    }
                    let group = RoleGroup::of(toolpath.role);
                    let builder = if group == RoleGroup::Infill {
                        &infill_tubes
                    } else {
                        &perimeter_tubes
                    };
                    for &copy in &object.copies {
                        self.accumulate(
                            &mut buckets,
                            &mut stats,
                            group,
                            builder,
                            &toolpath,
                            copy,
                            top_z,
                        );
                    }
                }
            }
        }

        self.layers_z.sort_by(f32::total_cmp);
        self.layers_z.dedup_by(|a, b| (*a - *b).abs() <= CLIP_EPSILON);

        for bucket in buckets {
            let volume = match bucket.data {
                Accumulator::Mesh(mesh) if !mesh.is_empty() => {
                    Volume::new(bucket.color, mesh.into_triangles())
                }
                Accumulator::Instances(instances) if !instances.is_empty() => {
                    Volume::instanced(bucket.color, instances)
                }
                _ => continue,
            };
            self.scene.add_volume(volume);
            stats.volumes += 1;
        }
        stats.layers = self.layers_z.len();

        self.range_visible = !self.layers_z.is_empty();
        self.range = NO_CLIP;
        self.scene.set_clip_range(NO_CLIP.0, NO_CLIP.1);

        tracing::info!(
            toolpaths = stats.toolpaths,
            segments = stats.segments,
            volumes = stats.volumes,
            layers = stats.layers,
            triangles = stats.geometry.total_triangles(),
            "toolpaths loaded"
        );
        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        &self,
        buckets: &mut Vec<ColorBucket>,
        stats: &mut LoadStats,
        group: RoleGroup,
        builder: &ExtrusionGeometry,
        toolpath: &Toolpath,
        copy: Point2,
        top_z: f32,
    ) {
        let color = group.color(&self.config.palette);
        let index = match buckets.iter().position(|b| b.color == color) {
            Some(index) => index,
            None => {
                let data = match self.config.render_mode {
                    RenderMode::Geometry => Accumulator::Mesh(TubeMesh::new()),
                    RenderMode::Instanced => Accumulator::Instances(InstanceArray::new()),
                };
                buckets.push(ColorBucket { color, data });
                buckets.len() - 1
            }
        };

        let mut shifted = toolpath.clone();
        shifted.translate(copy);
        stats.toolpaths += 1;
        stats.segments += shifted.len();

        match &mut buckets[index].data {
            Accumulator::Mesh(mesh) => {
                let built = builder.build_toolpath(&shifted, top_z, mesh);
                stats.geometry.merge(&built);
            }
            Accumulator::Instances(instances) => {
                instances.extend_from_toolpath(&shifted, top_z, color);
            }
        }
    }

    /// Show layers whose tops lie in `[min_z, max_z]`.
    ///
    /// The lower bound clips at the top of the layer beneath `min_z`, so the
    /// lowest visible layer keeps its full height.
    pub fn set_range(&mut self, min_z: f32, max_z: f32) {
        self.range = (min_z, max_z);
        let below = self
            .layers_z
            .iter()
            .rev()
            .find(|z| **z < min_z - CLIP_EPSILON)
            .copied()
            .unwrap_or(f32::MIN);
        self.scene.set_clip_range(below, max_z);
        self.scene.request_redraw();
    }

    pub fn render(&mut self) -> bool {
        self.scene.render()
    }

    pub fn render_with<H: RenderHooks<D>>(&mut self, hooks: &mut H) -> bool {
        self.scene.render_with(hooks)
    }
}
