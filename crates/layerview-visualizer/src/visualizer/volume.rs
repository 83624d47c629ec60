//! # Volumes
//!
//! A volume is one colour-grouped render unit: a triangle buffer or an
//! instance array, its placement, selection flags and the GPU buffers
//! that mirror it.
//!
//! Upload follows a two-state machine. Every CPU-side mutation moves the
//! volume to [`UploadState::Dirty`]; [`Volume::ensure_uploaded`] releases
//! the old GPU buffers, uploads once and moves back to
//! [`UploadState::Clean`].

use super::device::RenderDevice;
use crate::error::Result;
use crate::geometry::{GeometryBuffer, InstanceArray};
use glam::Vec3;
use layerview_core::BoundingBox3;
use std::cell::Cell;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Dirty,
    Clean,
}

#[derive(Debug)]
pub struct Volume<B> {
    pub color: [f32; 4],
    geometry: GeometryBuffer,
    instances: Option<InstanceArray>,
    origin: Vec3,
    pub selected: bool,
    pub hovered: bool,
    pub visible: bool,
    /// Caller-defined grouping, e.g. the object this volume belongs to.
    pub object_id: Option<usize>,
    bbox: Cell<Option<BoundingBox3>>,
    clip: (f32, f32),
    visible_range: Range<usize>,
    state: UploadState,
    buffers: Option<B>,
    upload_count: usize,
}

impl<B> Volume<B> {
    /// Volume drawn from a triangle buffer. Quad buffers are triangulated.
    pub fn new(color: [f32; 4], geometry: GeometryBuffer) -> Self {
        Self {
            color,
            geometry: geometry.triangulate(),
            instances: None,
            origin: Vec3::ZERO,
            selected: false,
            hovered: false,
            visible: true,
            object_id: None,
            bbox: Cell::new(None),
            clip: (f32::MIN, f32::MAX),
            visible_range: 0..0,
            state: UploadState::Dirty,
            buffers: None,
            upload_count: 0,
        }
    }

    /// Volume drawn by instancing the shared tube template.
    pub fn instanced(color: [f32; 4], instances: InstanceArray) -> Self {
        let mut volume = Self::new(color, GeometryBuffer::triangles());
        volume.set_instances(instances);
        volume
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    /// Mutable geometry; marks the volume dirty.
    pub fn geometry_mut(&mut self) -> &mut GeometryBuffer {
        self.mark_dirty();
        &mut self.geometry
    }

    pub fn instances(&self) -> Option<&InstanceArray> {
        self.instances.as_ref()
    }

    pub fn is_instanced(&self) -> bool {
        self.instances.is_some()
    }

    /// Replace the instance records. They are sorted by Z before use.
    pub fn set_instances(&mut self, mut instances: InstanceArray) {
        instances.sort_by_z();
        self.visible_range = instances.clip_range(self.clip.0, self.clip.1);
        self.instances = Some(instances);
        self.mark_dirty();
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        if origin != self.origin {
            self.origin = origin;
            self.bbox.set(None);
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == UploadState::Dirty
    }

    /// Number of uploads performed so far.
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    pub fn buffers(&self) -> Option<&B> {
        self.buffers.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        match &self.instances {
            Some(instances) => instances.is_empty(),
            None => self.geometry.is_empty(),
        }
    }

    fn mark_dirty(&mut self) {
        self.state = UploadState::Dirty;
        self.bbox.set(None);
    }

    /// World-space bounds, cached until the next mutation.
    pub fn bounding_box(&self) -> BoundingBox3 {
        if let Some(bbox) = self.bbox.get() {
            return bbox;
        }
        let local = match &self.instances {
            Some(instances) => instances.bounding_box(),
            None => self.geometry.bounding_box(),
        };
        let bbox = local.translated(self.origin);
        self.bbox.set(Some(bbox));
        bbox
    }

    /// Update the Z clip window. Instance ranges are only searched again
    /// when the window actually moves.
    pub fn set_clip(&mut self, min_z: f32, max_z: f32) {
        if self.clip == (min_z, max_z) {
            return;
        }
        self.clip = (min_z, max_z);
        if let Some(instances) = &self.instances {
            self.visible_range = instances.clip_range(min_z, max_z);
        }
    }

    pub fn clip(&self) -> (f32, f32) {
        self.clip
    }

    /// Visible instance records under the current clip window.
    pub fn visible_range(&self) -> Range<usize> {
        self.visible_range.clone()
    }

    /// Upload if dirty. On failure the volume stays dirty and keeps no
    /// GPU buffers.
    pub fn ensure_uploaded<D>(&mut self, device: &mut D) -> Result<()>
    where
        D: RenderDevice<Buffers = B>,
    {
        if self.state == UploadState::Clean {
            return Ok(());
        }
        // Release the old buffers before allocating new ones.
        self.buffers = None;
        let buffers = device.upload_volume(&self.geometry, self.instances.as_ref())?;
        self.buffers = Some(buffers);
        self.state = UploadState::Clean;
        self.upload_count += 1;
        Ok(())
    }
}
