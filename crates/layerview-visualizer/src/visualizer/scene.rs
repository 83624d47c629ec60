//! # Scene
//!
//! Owns the camera, the bed helpers and a list of [`Volume`]s, and drives
//! one frame through a [`RenderDevice`] in a fixed order:
//!
//! 1. clear
//! 2. background gradient (unless the theme is flat)
//! 3. ground, grid and bed outline, blended
//! 4. [`RenderHooks::before_render`]
//! 5. opaque volumes
//! 6. selection outlines
//! 7. world axes without depth test
//! 8. [`RenderHooks::after_render`], then [`RenderHooks::overlay`]
//! 9. present
//!
//! When picking is enabled a hover move schedules an index-colour pass that
//! runs before step 1; its pixels are never presented.

use super::camera::{Camera, Ray};
use super::config::SceneConfig;
use super::device::{RenderDevice, StaticPass, StaticSlot, VolumeDraw};
use super::picking::{decode_pick_color, encode_pick_color};
use super::volume::Volume;
use crate::error::Result;
use crate::geometry::bed::{axes, selection_brackets, BedColors, BedGeometry};
use crate::geometry::{ColoredMesh, GeometryBuffer, TriangleMesh};
use glam::{Mat4, Vec3};
use layerview_core::{BoundingBox3, Point2};

/// Clip window that shows everything.
pub const NO_CLIP: (f32, f32) = (f32::MIN, f32::MAX);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Uninitialized,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Rendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Mouse input in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseEvent {
    Down { button: MouseButton, x: f32, y: f32 },
    Up { button: MouseButton, x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Wheel { notches: f32, x: f32, y: f32 },
}

/// Extension points inside the frame. All default to doing nothing.
pub trait RenderHooks<D: RenderDevice> {
    fn before_render(&mut self, _device: &mut D, _camera: &Camera) {}
    fn after_render(&mut self, _device: &mut D, _camera: &Camera) {}
    fn overlay(&mut self, _device: &mut D, _camera: &Camera) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<D: RenderDevice> RenderHooks<D> for NoHooks {}

#[derive(Debug, Clone, Copy, Default)]
struct MouseState {
    position: (f32, f32),
    last: (f32, f32),
    dragging: Option<MouseButton>,
}

pub struct Scene<D: RenderDevice> {
    // Declared before the device so GPU buffers go first on drop.
    volumes: Vec<Volume<D::Buffers>>,
    device: D,
    camera: Camera,
    config: SceneConfig,
    state: SceneState,
    frame: FrameState,
    bed_outline: Vec<Point2>,
    statics_dirty: bool,
    outlines_dirty: bool,
    clip: (f32, f32),
    hovered: Option<usize>,
    mouse: MouseState,
    pick_pending: bool,
    redraw: bool,
    /// Framebuffer pixels per window pixel.
    scale: f32,
}

impl<D: RenderDevice> Scene<D> {
    pub fn new(device: D, config: SceneConfig) -> Self {
        Self {
            volumes: Vec::new(),
            device,
            camera: Camera::default(),
            config,
            state: SceneState::Uninitialized,
            frame: FrameState::Idle,
            bed_outline: Vec::new(),
            statics_dirty: true,
            outlines_dirty: true,
            clip: NO_CLIP,
            hovered: None,
            mouse: MouseState::default(),
            pick_pending: false,
            redraw: true,
            scale: 1.0,
        }
    }

    /// Create GPU resources. Repeated calls after success do nothing; on
    /// failure the scene stays uninitialized and the call can be retried.
    pub fn init(&mut self) -> Result<()> {
        if self.state == SceneState::Ready {
            return Ok(());
        }
        if let Err(e) = self.device.init().and_then(|_| self.upload_statics()) {
            tracing::error!(error = %e, "scene initialization failed");
            return Err(e);
        }
        self.state = SceneState::Ready;
        self.redraw = true;
        tracing::info!("scene initialized");
        Ok(())
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SceneState::Ready
    }

    pub fn frame_state(&self) -> FrameState {
        self.frame
    }

    /// Resize to `width` x `height` window pixels on a display with
    /// `scale` framebuffer pixels per window pixel. Ignored unless both
    /// dimensions and the scale are positive.
    ///
    /// The camera and mouse work in window pixels; the device gets the
    /// framebuffer size.
    pub fn resize(&mut self, width: i32, height: i32, scale: f32) {
        if width <= 0 || height <= 0 || !(scale.is_finite() && scale > 0.0) {
            tracing::debug!(width, height, scale, "ignoring non-positive resize");
            return;
        }
        let framebuffer = |logical: i32| ((logical as f32 * scale).round() as u32).max(1);
        self.device.resize(framebuffer(width), framebuffer(height));
        self.camera.set_viewport(width as f32, height as f32);
        self.scale = scale;
        self.redraw = true;
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.redraw = true;
        &mut self.camera
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SceneConfig) {
        self.config = config;
        self.statics_dirty = true;
        self.outlines_dirty = true;
        self.redraw = true;
    }

    pub fn set_bed_outline(&mut self, outline: Vec<Point2>) {
        self.bed_outline = outline;
        self.statics_dirty = true;
        self.redraw = true;
    }

    pub fn bed_outline(&self) -> &[Point2] {
        &self.bed_outline
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    // Volumes

    pub fn add_volume(&mut self, mut volume: Volume<D::Buffers>) -> usize {
        volume.set_clip(self.clip.0, self.clip.1);
        self.volumes.push(volume);
        self.outlines_dirty = true;
        self.redraw = true;
        self.volumes.len() - 1
    }

    /// Add a static mesh as a flat-normal volume placed at `origin`.
    pub fn load_mesh(&mut self, mesh: &TriangleMesh, color: [f32; 4], origin: Vec3) -> usize {
        let mut volume = Volume::new(color, GeometryBuffer::from_mesh(mesh));
        volume.set_origin(origin);
        self.add_volume(volume)
    }

    /// Drop every volume and its GPU buffers.
    pub fn clear_volumes(&mut self) {
        self.volumes.clear();
        self.hovered = None;
        self.outlines_dirty = true;
        self.redraw = true;
    }

    pub fn volumes(&self) -> &[Volume<D::Buffers>] {
        &self.volumes
    }

    pub fn volume(&self, index: usize) -> Option<&Volume<D::Buffers>> {
        self.volumes.get(index)
    }

    pub fn volume_mut(&mut self, index: usize) -> Option<&mut Volume<D::Buffers>> {
        self.outlines_dirty = true;
        self.redraw = true;
        self.volumes.get_mut(index)
    }

    /// Select a single volume, or clear the selection.
    pub fn select(&mut self, index: Option<usize>) {
        for (i, volume) in self.volumes.iter_mut().enumerate() {
            volume.selected = Some(i) == index;
        }
        self.outlines_dirty = true;
        self.redraw = true;
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) {
        if let Some(volume) = self.volumes.get_mut(index) {
            volume.selected = selected;
            self.outlines_dirty = true;
            self.redraw = true;
        }
    }

    pub fn selected(&self) -> Vec<usize> {
        self.volumes
            .iter()
            .enumerate()
            .filter(|(_, v)| v.selected)
            .map(|(i, _)| i)
            .collect()
    }

    /// Union of all visible volume bounds.
    pub fn bounding_box(&self) -> BoundingBox3 {
        let mut bbox = BoundingBox3::empty();
        for volume in self.volumes.iter().filter(|v| v.visible) {
            bbox.merge(&volume.bounding_box());
        }
        bbox
    }

    pub fn zoom_to_volumes(&mut self) {
        let bbox = self.bounding_box();
        if !bbox.is_empty() {
            self.camera.zoom_to_bounds(&bbox);
            self.redraw = true;
        }
    }

    /// Show only material between `min_z` and `max_z`.
    pub fn set_clip_range(&mut self, min_z: f32, max_z: f32) {
        self.clip = (min_z, max_z);
        for volume in &mut self.volumes {
            volume.set_clip(min_z, max_z);
        }
        self.redraw = true;
    }

    pub fn clip_range(&self) -> (f32, f32) {
        self.clip
    }

    // Picking

    /// Volume under the cursor from the last picking pass.
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Camera ray through a window pixel.
    pub fn pick_ray(&self, x: f32, y: f32) -> Ray {
        self.camera.screen_to_world(x, y)
    }

    fn set_hovered(&mut self, index: Option<usize>) {
        if self.hovered == index {
            return;
        }
        for (i, volume) in self.volumes.iter_mut().enumerate() {
            volume.hovered = Some(i) == index;
        }
        self.hovered = index;
    }

    // Input

    /// Apply a mouse event. Returns whether a redraw is needed.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> bool {
        match event {
            MouseEvent::Down { button, x, y } => {
                self.mouse.dragging = Some(button);
                self.mouse.last = (x, y);
                self.mouse.position = (x, y);
                false
            }
            MouseEvent::Up { x, y, .. } => {
                self.mouse.dragging = None;
                self.mouse.position = (x, y);
                false
            }
            MouseEvent::Move { x, y } => {
                let dx = x - self.mouse.last.0;
                let dy = y - self.mouse.last.1;
                self.mouse.last = (x, y);
                self.mouse.position = (x, y);
                match self.mouse.dragging {
                    Some(MouseButton::Left) => {
                        let s = self.config.rotate_sensitivity;
                        self.camera.rotate(-dy * s, -dx * s);
                    }
                    Some(MouseButton::Middle | MouseButton::Right) => self.camera.pan(dx, dy),
                    None => {
                        if !self.config.picking {
                            return false;
                        }
                        self.pick_pending = true;
                    }
                }
                self.redraw = true;
                true
            }
            MouseEvent::Wheel { notches, x, y } => {
                self.mouse.position = (x, y);
                self.camera.zoom_notches(notches);
                self.redraw = true;
                true
            }
        }
    }

    // Frame

    /// Render one frame without hooks.
    pub fn render(&mut self) -> bool {
        self.render_with(&mut NoHooks)
    }

    /// Render one frame. Returns `false` if the scene is not initialized.
    pub fn render_with<H: RenderHooks<D>>(&mut self, hooks: &mut H) -> bool {
        if self.state != SceneState::Ready {
            tracing::warn!("render requested before scene initialization");
            return false;
        }
        self.frame = FrameState::Rendering;

        if self.statics_dirty {
            if let Err(e) = self.upload_statics() {
                tracing::warn!(error = %e, "failed to rebuild bed geometry");
            }
        }
        self.upload_volumes();

        let view_projection = self.camera.view_projection();

        if self.pick_pending {
            self.pick_pending = false;
            if self.config.picking {
                let hovered = self.pick_pass(&view_projection);
                self.set_hovered(hovered);
            }
        }

        let theme = self.config.theme;
        self.device.clear(theme.background_bottom);
        if !theme.flat_background {
            self.device
                .draw_background(theme.background_top, theme.background_bottom);
        }

        let blended = StaticPass {
            depth_test: true,
            blend: true,
        };
        self.device
            .draw_static(StaticSlot::Ground, &view_projection, blended);
        self.device
            .draw_static(StaticSlot::Grid, &view_projection, blended);
        self.device
            .draw_static(StaticSlot::BedOutline, &view_projection, blended);

        hooks.before_render(&mut self.device, &self.camera);

        self.draw_volumes(&view_projection, false);

        if self.outlines_dirty {
            self.upload_outlines();
        }
        self.device.draw_static(
            StaticSlot::SelectionOutlines,
            &view_projection,
            StaticPass {
                depth_test: true,
                blend: false,
            },
        );
        self.device.draw_static(
            StaticSlot::Axes,
            &view_projection,
            StaticPass {
                depth_test: false,
                blend: false,
            },
        );

        hooks.after_render(&mut self.device, &self.camera);
        hooks.overlay(&mut self.device, &self.camera);

        self.device.present();
        self.frame = FrameState::Idle;
        self.redraw = false;
        true
    }

    fn upload_statics(&mut self) -> Result<()> {
        let theme = &self.config.theme;
        let colors = BedColors {
            ground: theme.ground,
            grid: theme.grid,
            outline: theme.bed_outline,
        };
        let bed = BedGeometry::from_outline(&self.bed_outline, self.config.grid_spacing, &colors);
        self.device.set_static(StaticSlot::Ground, &bed.ground)?;
        self.device.set_static(StaticSlot::Grid, &bed.grid)?;
        self.device.set_static(StaticSlot::BedOutline, &bed.outline)?;
        self.device
            .set_static(StaticSlot::Axes, &axes(self.config.axes_length))?;
        self.statics_dirty = false;
        Ok(())
    }

    fn upload_outlines(&mut self) {
        let mut mesh = ColoredMesh::lines();
        for volume in self.volumes.iter().filter(|v| v.selected && v.visible) {
            selection_brackets(&volume.bounding_box(), self.config.theme.selection, &mut mesh);
        }
        match self.device.set_static(StaticSlot::SelectionOutlines, &mesh) {
            Ok(()) => self.outlines_dirty = false,
            Err(e) => tracing::warn!(error = %e, "failed to upload selection outlines"),
        }
    }

    fn upload_volumes(&mut self) {
        for (index, volume) in self.volumes.iter_mut().enumerate() {
            if !volume.visible || volume.is_empty() {
                continue;
            }
            if let Err(e) = volume.ensure_uploaded(&mut self.device) {
                tracing::warn!(volume = index, error = %e, "volume upload failed; skipping");
            }
        }
    }

    fn draw_volumes(&mut self, view_projection: &Mat4, picking: bool) {
        let theme = self.config.theme;
        for (index, volume) in self.volumes.iter().enumerate() {
            if !volume.visible || volume.is_dirty() {
                continue;
            }
            let Some(buffers) = volume.buffers() else {
                continue;
            };
            let color = if picking {
                encode_pick_color(index)
            } else if volume.hovered {
                theme.hover
            } else {
                volume.color
            };
            let (clip_min, clip_max) = volume.clip();
            let draw = VolumeDraw {
                view_projection: *view_projection,
                origin: volume.origin(),
                color,
                light_direction: self.config.light_direction,
                clip_min,
                clip_max,
                flat: picking,
                override_color: picking || volume.hovered,
                instances: volume.visible_range(),
            };
            self.device.draw_volume(buffers, &draw);
        }
    }

    /// Index-colour pass; returns the volume under the cursor.
    fn pick_pass(&mut self, view_projection: &Mat4) -> Option<usize> {
        self.device.clear([0.0, 0.0, 0.0, 0.0]);
        self.draw_volumes(view_projection, true);
        let (x, y) = self.mouse.position;
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let pixel = self
            .device
            .read_pixel((x * self.scale) as u32, (y * self.scale) as u32);
        decode_pick_color(pixel)
    }
}
