//! Recording render device shared by the scene and preview tests.

#![allow(dead_code)]

use glam::Mat4;
use layerview_visualizer::error::{RenderError, Result};
use layerview_visualizer::geometry::{ColoredMesh, GeometryBuffer, InstanceArray};
use layerview_visualizer::visualizer::{
    Camera, RenderDevice, RenderHooks, StaticPass, StaticSlot, VolumeDraw,
};
use std::cell::Cell;
use std::ops::Range;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init,
    Resize(u32, u32),
    Clear([f32; 4]),
    Background,
    SetStatic(StaticSlot, usize),
    DrawStatic(StaticSlot, StaticPass),
    Upload {
        vertices: usize,
        instances: Option<usize>,
    },
    DrawVolume {
        color: [f32; 4],
        flat: bool,
        override_color: bool,
        clip: (f32, f32),
        instances: Range<usize>,
    },
    ReadPixel(u32, u32),
    Present,
    Hook(&'static str),
}

/// Buffers that count themselves alive.
#[derive(Debug)]
pub struct RecordedBuffers {
    live: Rc<Cell<usize>>,
}

impl Drop for RecordedBuffers {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub calls: Vec<Call>,
    pub fail_init: bool,
    pub fail_upload: bool,
    /// Forced read-back; otherwise the colour of the last flat draw.
    pub pixel: Option<[u8; 4]>,
    pub live_buffers: Rc<Cell<usize>>,
    last_flat: [u8; 4],
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn volume_draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawVolume { .. }))
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl RenderDevice for RecordingDevice {
    type Buffers = RecordedBuffers;

    fn init(&mut self) -> Result<()> {
        if self.fail_init {
            return Err(RenderError::ShaderCompile {
                stage: "vertex",
                log: "0:1: error".to_string(),
            });
        }
        self.calls.push(Call::Init);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.last_flat = [0; 4];
        self.calls.push(Call::Clear(color));
    }

    fn draw_background(&mut self, _top: [f32; 4], _bottom: [f32; 4]) {
        self.calls.push(Call::Background);
    }

    fn set_static(&mut self, slot: StaticSlot, mesh: &ColoredMesh) -> Result<()> {
        self.calls.push(Call::SetStatic(slot, mesh.vertex_count()));
        Ok(())
    }

    fn draw_static(&mut self, slot: StaticSlot, _view_projection: &Mat4, pass: StaticPass) {
        self.calls.push(Call::DrawStatic(slot, pass));
    }

    fn upload_volume(
        &mut self,
        geometry: &GeometryBuffer,
        instances: Option<&InstanceArray>,
    ) -> Result<RecordedBuffers> {
        if self.fail_upload {
            return Err(RenderError::Allocation("out of memory".to_string()));
        }
        self.calls.push(Call::Upload {
            vertices: geometry.vertex_count(),
            instances: instances.map(InstanceArray::len),
        });
        self.live_buffers.set(self.live_buffers.get() + 1);
        Ok(RecordedBuffers {
            live: Rc::clone(&self.live_buffers),
        })
    }

    fn draw_volume(&mut self, _buffers: &RecordedBuffers, draw: &VolumeDraw) {
        if draw.flat {
            self.last_flat = draw.color.map(|c| (c * 255.0).round() as u8);
        }
        self.calls.push(Call::DrawVolume {
            color: draw.color,
            flat: draw.flat,
            override_color: draw.override_color,
            clip: (draw.clip_min, draw.clip_max),
            instances: draw.instances.clone(),
        });
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> [u8; 4] {
        self.calls.push(Call::ReadPixel(x, y));
        self.pixel.unwrap_or(self.last_flat)
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }
}

/// Hooks that log themselves into the device's call list.
#[derive(Debug, Default)]
pub struct RecordingHooks;

impl RenderHooks<RecordingDevice> for RecordingHooks {
    fn before_render(&mut self, device: &mut RecordingDevice, _camera: &Camera) {
        device.calls.push(Call::Hook("before_render"));
    }

    fn after_render(&mut self, device: &mut RecordingDevice, _camera: &Camera) {
        device.calls.push(Call::Hook("after_render"));
    }

    fn overlay(&mut self, device: &mut RecordingDevice, _camera: &Camera) {
        device.calls.push(Call::Hook("overlay"));
    }
}
