//! # Render Device
//!
//! [`RenderDevice`] is everything the scene asks of the GPU. [`GlDevice`]
//! implements it with `glow`; tests drive the scene with a recording
//! implementation instead.

use crate::error::{RenderError, Result};
use crate::geometry::{tube_template, ColoredMesh, DrawMode, GeometryBuffer, InstanceArray, Primitive};
use crate::gpu::shaders::{
    BACKGROUND_FRAGMENT_SHADER, BACKGROUND_VERTEX_SHADER, FLAT_FRAGMENT_SHADER,
    FLAT_VERTEX_SHADER, INSTANCED_VERTEX_SHADER, VOLUME_FRAGMENT_SHADER, VOLUME_VERTEX_SHADER,
};
use crate::gpu::{
    ShaderProgram, VertexArray, VertexBuffer, COLOR_LAYOUT, INSTANCE_LAYOUT, SHADED_LAYOUT,
};
use glam::{Mat4, Vec3};
use glow::HasContext;
use layerview_core::constants::CLIP_EPSILON;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;

/// Static helper meshes the scene keeps on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticSlot {
    Ground,
    Grid,
    BedOutline,
    SelectionOutlines,
    Axes,
}

/// Fixed-function state for a static draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPass {
    pub depth_test: bool,
    pub blend: bool,
}

/// Per-draw parameters of one volume.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDraw {
    pub view_projection: Mat4,
    pub origin: Vec3,
    pub color: [f32; 4],
    pub light_direction: Vec3,
    pub clip_min: f32,
    pub clip_max: f32,
    /// Unlit solid colour (picking pass).
    pub flat: bool,
    /// Use `color` instead of per-instance colours (hover and picking).
    pub override_color: bool,
    /// Instance records to draw; ignored for plain geometry.
    pub instances: Range<usize>,
}

/// GPU operations used by the scene.
pub trait RenderDevice {
    /// GPU-side buffers of one volume; dropping them frees the GPU objects.
    type Buffers;

    /// Compile shaders and create static resources. Either everything is
    /// created or nothing is kept.
    fn init(&mut self) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);

    /// Clear colour and depth.
    fn clear(&mut self, color: [f32; 4]);

    fn draw_background(&mut self, top: [f32; 4], bottom: [f32; 4]);

    /// Replace the contents of a static slot.
    fn set_static(&mut self, slot: StaticSlot, mesh: &ColoredMesh) -> Result<()>;

    /// Draw a static slot; empty slots draw nothing.
    fn draw_static(&mut self, slot: StaticSlot, view_projection: &Mat4, pass: StaticPass);

    /// Upload triangle geometry, or instance records over the shared tube
    /// template when `instances` is given.
    fn upload_volume(
        &mut self,
        geometry: &GeometryBuffer,
        instances: Option<&InstanceArray>,
    ) -> Result<Self::Buffers>;

    fn draw_volume(&mut self, buffers: &Self::Buffers, draw: &VolumeDraw);

    /// RGBA of the framebuffer pixel at `(x, y)`, origin top-left.
    fn read_pixel(&mut self, x: u32, y: u32) -> [u8; 4];

    fn present(&mut self);
}

struct GlPrograms {
    volume: ShaderProgram,
    instanced: ShaderProgram,
    flat: ShaderProgram,
    background: ShaderProgram,
}

struct GlResources {
    programs: GlPrograms,
    background_vao: VertexArray,
    template: VertexBuffer,
    template_vertices: i32,
}

struct StaticMesh {
    vao: VertexArray,
    // Kept alive for the VAO.
    _vbo: VertexBuffer,
    count: i32,
    mode: u32,
}

/// Buffers of one uploaded volume.
pub struct GlVolumeBuffers {
    vao: VertexArray,
    vertices: Option<VertexBuffer>,
    vertex_count: i32,
    instances: Option<VertexBuffer>,
}

impl std::fmt::Debug for GlVolumeBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlVolumeBuffers")
            .field("vao", &self.vao)
            .field("vertex_count", &self.vertex_count)
            .field("instanced", &self.instances.is_some())
            .finish()
    }
}

/// OpenGL 3.3 core implementation over a shared `glow` context.
pub struct GlDevice {
    statics: HashMap<StaticSlot, StaticMesh>,
    resources: Option<GlResources>,
    width: u32,
    height: u32,
    gl: Rc<glow::Context>,
}

impl GlDevice {
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self {
            statics: HashMap::new(),
            resources: None,
            width: 1,
            height: 1,
            gl,
        }
    }

    fn create_resources(&self) -> Result<GlResources> {
        let gl = &self.gl;
        let programs = GlPrograms {
            volume: ShaderProgram::compile(gl.clone(), VOLUME_VERTEX_SHADER, VOLUME_FRAGMENT_SHADER)?,
            instanced: ShaderProgram::compile(
                gl.clone(),
                INSTANCED_VERTEX_SHADER,
                VOLUME_FRAGMENT_SHADER,
            )?,
            flat: ShaderProgram::compile(gl.clone(), FLAT_VERTEX_SHADER, FLAT_FRAGMENT_SHADER)?,
            background: ShaderProgram::compile(
                gl.clone(),
                BACKGROUND_VERTEX_SHADER,
                BACKGROUND_FRAGMENT_SHADER,
            )?,
        };
        let background_vao = VertexArray::new(gl.clone())?;

        let template_mesh = tube_template();
        let mut template = VertexBuffer::new(gl.clone())?;
        template.upload(template_mesh.vertices(), glow::STATIC_DRAW);
        template.unbind();

        Ok(GlResources {
            programs,
            background_vao,
            template,
            template_vertices: template_mesh.vertex_count() as i32,
        })
    }

    fn resources(&self) -> Result<&GlResources> {
        self.resources.as_ref().ok_or(RenderError::NotInitialized)
    }
}

impl RenderDevice for GlDevice {
    type Buffers = GlVolumeBuffers;

    fn init(&mut self) -> Result<()> {
        if self.resources.is_some() {
            return Ok(());
        }
        // Anything created before a failure is dropped with the partial struct.
        let resources = self.create_resources()?;
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(glow::LEQUAL);
        }
        self.resources = Some(resources);
        tracing::debug!("OpenGL device initialized");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        unsafe {
            self.gl.viewport(0, 0, self.width as i32, self.height as i32);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.depth_mask(true);
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_background(&mut self, top: [f32; 4], bottom: [f32; 4]) {
        let Ok(resources) = self.resources() else {
            return;
        };
        let program = &resources.programs.background;
        program.bind();
        program.set_vec4("top_color", top);
        program.set_vec4("bottom_color", bottom);
        resources.background_vao.bind();
        unsafe {
            self.gl.disable(glow::DEPTH_TEST);
            self.gl.depth_mask(false);
            self.gl.draw_arrays(glow::TRIANGLES, 0, 3);
            self.gl.depth_mask(true);
            self.gl.enable(glow::DEPTH_TEST);
        }
        resources.background_vao.unbind();
    }

    fn set_static(&mut self, slot: StaticSlot, mesh: &ColoredMesh) -> Result<()> {
        if mesh.is_empty() {
            self.statics.remove(&slot);
            return Ok(());
        }
        let vao = VertexArray::new(self.gl.clone())?;
        let mut vbo = VertexBuffer::new(self.gl.clone())?;
        vao.bind();
        vbo.upload(&mesh.vertices, glow::STATIC_DRAW);
        vao.attributes(&COLOR_LAYOUT, 0);
        vao.unbind();
        vbo.unbind();

        let mode = match mesh.mode {
            DrawMode::Lines => glow::LINES,
            DrawMode::Triangles => glow::TRIANGLES,
        };
        self.statics.insert(
            slot,
            StaticMesh {
                vao,
                _vbo: vbo,
                count: mesh.vertex_count() as i32,
                mode,
            },
        );
        Ok(())
    }

    fn draw_static(&mut self, slot: StaticSlot, view_projection: &Mat4, pass: StaticPass) {
        let (Ok(resources), Some(mesh)) = (self.resources(), self.statics.get(&slot)) else {
            return;
        };
        let program = &resources.programs.flat;
        program.bind();
        program.set_mat4("view_projection", view_projection);
        unsafe {
            if pass.depth_test {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            if pass.blend {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            }
            mesh.vao.bind();
            self.gl.draw_arrays(mesh.mode, 0, mesh.count);
            mesh.vao.unbind();
            if pass.blend {
                self.gl.disable(glow::BLEND);
            }
            self.gl.enable(glow::DEPTH_TEST);
        }
    }

    fn upload_volume(
        &mut self,
        geometry: &GeometryBuffer,
        instances: Option<&InstanceArray>,
    ) -> Result<GlVolumeBuffers> {
        let resources = self.resources()?;
        let vao = VertexArray::new(self.gl.clone())?;
        vao.bind();

        let buffers = match instances {
            Some(instances) => {
                resources.template.bind();
                vao.attributes(&SHADED_LAYOUT, 0);
                let mut records = VertexBuffer::new(self.gl.clone())?;
                records.upload(instances.records(), glow::STATIC_DRAW);
                vao.attributes(&INSTANCE_LAYOUT, 0);
                records.unbind();
                GlVolumeBuffers {
                    vao,
                    vertices: None,
                    vertex_count: resources.template_vertices,
                    instances: Some(records),
                }
            }
            None => {
                debug_assert_eq!(geometry.primitive(), Primitive::Triangles);
                let mut vbo = VertexBuffer::new(self.gl.clone())?;
                vbo.upload(geometry.vertices(), glow::STATIC_DRAW);
                vao.attributes(&SHADED_LAYOUT, 0);
                vbo.unbind();
                GlVolumeBuffers {
                    vao,
                    vertices: Some(vbo),
                    vertex_count: geometry.vertex_count() as i32,
                    instances: None,
                }
            }
        };
        buffers.vao.unbind();
        Ok(buffers)
    }

    fn draw_volume(&mut self, buffers: &GlVolumeBuffers, draw: &VolumeDraw) {
        let Ok(resources) = self.resources() else {
            return;
        };
        let program = if buffers.instances.is_some() {
            &resources.programs.instanced
        } else {
            &resources.programs.volume
        };
        program.bind();
        program.set_mat4("view_projection", &draw.view_projection);
        program.set_vec3("origin", draw.origin);
        program.set_vec4("color", draw.color);
        program.set_vec3("light_direction", draw.light_direction);
        program.set_f32("clip_min", draw.clip_min);
        program.set_f32("clip_max", draw.clip_max);
        program.set_f32("clip_epsilon", CLIP_EPSILON);
        program.set_bool("flat_color", draw.flat);
        program.set_bool("override_color", draw.override_color);

        buffers.vao.bind();
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            match &buffers.instances {
                Some(records) => {
                    let range = &draw.instances;
                    if !range.is_empty() {
                        // Start the per-instance attributes at the first visible record.
                        records.bind();
                        let offset = (range.start * INSTANCE_LAYOUT.stride as usize) as i32;
                        buffers.vao.attributes(&INSTANCE_LAYOUT, offset);
                        records.unbind();
                        self.gl.draw_arrays_instanced(
                            glow::TRIANGLES,
                            0,
                            buffers.vertex_count,
                            range.len() as i32,
                        );
                    }
                }
                None => {
                    if buffers.vertices.is_some() && buffers.vertex_count > 0 {
                        self.gl.draw_arrays(glow::TRIANGLES, 0, buffers.vertex_count);
                    }
                }
            }
        }
        buffers.vao.unbind();
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> [u8; 4] {
        let mut pixel = [0u8; 4];
        if x >= self.width || y >= self.height {
            return pixel;
        }
        unsafe {
            self.gl.read_pixels(
                x as i32,
                (self.height - 1 - y) as i32,
                1,
                1,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixel),
            );
        }
        pixel
    }

    fn present(&mut self) {
        unsafe {
            self.gl.flush();
        }
    }
}
