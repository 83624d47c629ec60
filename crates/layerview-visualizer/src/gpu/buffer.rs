use crate::error::{RenderError, Result};
use bytemuck::Pod;
use glow::HasContext;
use std::rc::Rc;

/// Owned `ARRAY_BUFFER`. Not `Clone`; the handle is deleted on drop.
pub struct VertexBuffer {
    buffer: glow::Buffer,
    len_bytes: usize,
    gl: Rc<glow::Context>,
}

impl VertexBuffer {
    pub fn new(gl: Rc<glow::Context>) -> Result<Self> {
        let buffer = unsafe {
            gl.create_buffer()
                .map_err(|e| RenderError::Allocation(format!("Create VBO: {}", e)))?
        };
        Ok(Self {
            buffer,
            len_bytes: 0,
            gl,
        })
    }

    /// Replace the contents. Leaves the buffer bound.
    pub fn upload<T: Pod>(&mut self, data: &[T], usage: u32) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffer));
            self.gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, usage);
        }
        self.len_bytes = bytes.len();
    }

    pub fn bind(&self) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.buffer));
        }
    }

    pub fn unbind(&self) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.len_bytes == 0
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.buffer);
        }
    }
}

impl std::fmt::Debug for VertexBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("buffer", &self.buffer)
            .field("len_bytes", &self.len_bytes)
            .finish()
    }
}
