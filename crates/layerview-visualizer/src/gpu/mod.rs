//! Thin RAII wrappers over `glow` objects.
//!
//! Each wrapper holds an `Rc<glow::Context>` and deletes its handle on drop,
//! so GPU objects are freed exactly once on the context thread. None of them
//! are `Clone`.

pub mod buffer;
pub mod shader;
pub mod shaders;
pub mod vertex_array;

pub use buffer::VertexBuffer;
pub use shader::ShaderProgram;
pub use vertex_array::{Attribute, Layout, VertexArray, COLOR_LAYOUT, INSTANCE_LAYOUT, SHADED_LAYOUT};
