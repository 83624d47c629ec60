use crate::error::{RenderError, Result};
use glam::{Mat4, Vec3};
use glow::HasContext;
use std::rc::Rc;

/// Linked shader program, deleted on drop.
pub struct ShaderProgram {
    program: glow::Program,
    gl: Rc<glow::Context>,
}

impl ShaderProgram {
    /// Compile and link a vertex/fragment pair. Compiler and linker logs are
    /// returned in the error.
    pub fn compile(gl: Rc<glow::Context>, vertex_src: &str, fragment_src: &str) -> Result<Self> {
        unsafe {
            let vs = compile_shader(&gl, glow::VERTEX_SHADER, "vertex", vertex_src)?;
            let fs = match compile_shader(&gl, glow::FRAGMENT_SHADER, "fragment", fragment_src) {
                Ok(fs) => fs,
                Err(e) => {
                    gl.delete_shader(vs);
                    return Err(e);
                }
            };

            let program = match gl.create_program() {
                Ok(p) => p,
                Err(e) => {
                    gl.delete_shader(vs);
                    gl.delete_shader(fs);
                    return Err(RenderError::Allocation(format!("Create program: {}", e)));
                }
            };
            gl.attach_shader(program, vs);
            gl.attach_shader(program, fs);
            gl.link_program(program);

            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vs);
            gl.detach_shader(program, fs);
            gl.delete_shader(vs);
            gl.delete_shader(fs);

            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(RenderError::ShaderLink(log));
            }

            Ok(Self { program, gl })
        }
    }

    pub fn bind(&self) {
        unsafe {
            self.gl.use_program(Some(self.program));
        }
    }

    pub fn unbind(&self) {
        unsafe {
            self.gl.use_program(None);
        }
    }

    fn location(&self, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(self.program, name) }
    }

    // Setters expect the program to be bound. Unknown names are ignored, the
    // driver strips uniforms the shader never reads.

    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        if let Some(loc) = self.location(name) {
            unsafe {
                self.gl
                    .uniform_matrix_4_f32_slice(Some(&loc), false, &value.to_cols_array());
            }
        }
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        if let Some(loc) = self.location(name) {
            unsafe {
                self.gl.uniform_3_f32(Some(&loc), value.x, value.y, value.z);
            }
        }
    }

    pub fn set_vec4(&self, name: &str, value: [f32; 4]) {
        if let Some(loc) = self.location(name) {
            unsafe {
                self.gl
                    .uniform_4_f32(Some(&loc), value[0], value[1], value[2], value[3]);
            }
        }
    }

    pub fn set_f32(&self, name: &str, value: f32) {
        if let Some(loc) = self.location(name) {
            unsafe {
                self.gl.uniform_1_f32(Some(&loc), value);
            }
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        if let Some(loc) = self.location(name) {
            unsafe {
                self.gl.uniform_1_i32(Some(&loc), i32::from(value));
            }
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.program);
        }
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .finish()
    }
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: &'static str,
    source: &str,
) -> Result<glow::Shader> {
    let shader = gl
        .create_shader(kind)
        .map_err(|e| RenderError::Allocation(format!("Create {} shader: {}", stage, e)))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(RenderError::ShaderCompile { stage, log });
    }
    Ok(shader)
}
