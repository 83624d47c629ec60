use crate::error::{RenderError, Result};
use glow::HasContext;
use std::rc::Rc;

/// One float vertex attribute inside an interleaved record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub location: u32,
    pub components: i32,
    /// Byte offset inside the record.
    pub offset: i32,
}

/// Interleaved attribute layout of one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub attributes: &'static [Attribute],
    pub stride: i32,
    /// 0 for per-vertex data, 1 for per-instance data.
    pub divisor: u32,
}

/// `Vertex`: position, normal, tube coordinate, layer top.
pub const SHADED_LAYOUT: Layout = Layout {
    attributes: &[
        Attribute { location: 0, components: 3, offset: 0 },
        Attribute { location: 1, components: 3, offset: 12 },
        Attribute { location: 2, components: 1, offset: 24 },
        Attribute { location: 6, components: 1, offset: 28 },
    ],
    stride: 32,
    divisor: 0,
};

/// `ColorVertex`: position, RGBA.
pub const COLOR_LAYOUT: Layout = Layout {
    attributes: &[
        Attribute { location: 0, components: 3, offset: 0 },
        Attribute { location: 1, components: 4, offset: 12 },
    ],
    stride: 28,
    divisor: 0,
};

/// `InstanceRecord`: (pos_a, width), (pos_b, height), colour.
pub const INSTANCE_LAYOUT: Layout = Layout {
    attributes: &[
        Attribute { location: 3, components: 4, offset: 0 },
        Attribute { location: 4, components: 4, offset: 16 },
        Attribute { location: 5, components: 4, offset: 32 },
    ],
    stride: 48,
    divisor: 1,
};

/// Owned vertex array object, deleted on drop.
pub struct VertexArray {
    vao: glow::VertexArray,
    gl: Rc<glow::Context>,
}

impl VertexArray {
    pub fn new(gl: Rc<glow::Context>) -> Result<Self> {
        let vao = unsafe {
            gl.create_vertex_array()
                .map_err(|e| RenderError::Allocation(format!("Create VAO: {}", e)))?
        };
        Ok(Self { vao, gl })
    }

    pub fn bind(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
        }
    }

    pub fn unbind(&self) {
        unsafe {
            self.gl.bind_vertex_array(None);
        }
    }

    /// Point the attributes of `layout` at the currently bound `ARRAY_BUFFER`,
    /// starting `base_offset` bytes into it. The array must be bound.
    pub fn attributes(&self, layout: &Layout, base_offset: i32) {
        unsafe {
            for attr in layout.attributes {
                self.gl.enable_vertex_attrib_array(attr.location);
                self.gl.vertex_attrib_pointer_f32(
                    attr.location,
                    attr.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    base_offset + attr.offset,
                );
                self.divisor(attr.location, layout.divisor);
            }
        }
    }

    pub fn divisor(&self, location: u32, divisor: u32) {
        unsafe {
            self.gl.vertex_attrib_divisor(location, divisor);
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vao);
        }
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArray").field("vao", &self.vao).finish()
    }
}
