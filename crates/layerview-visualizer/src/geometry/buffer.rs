//! # CPU Geometry Buffers
//!
//! Interleaved vertex containers filled on the CPU and uploaded as-is.
//! [`GeometryBuffer`] carries shaded geometry (position, normal, tube
//! coordinate, layer top); [`ColoredMesh`] carries per-vertex coloured lines and
//! triangles for the bed, axes and selection outlines.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use layerview_core::BoundingBox3;

/// Shaded vertex: position, normal and the tube coordinate in [-1, 1].
///
/// `layer_top` is the Z the layer clip compares against. Tube vertices
/// carry the top of the layer they belong to so every face of a bead is
/// kept or discarded as a whole; other geometry uses its own Z.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tube: f32,
    pub layer_top: f32,
}

impl Vertex {
    /// Floats per vertex in the interleaved layout.
    pub const STRIDE_FLOATS: usize = 8;

    pub fn new(position: Vec3, normal: Vec3, tube: f32) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tube,
            layer_top: position.z,
        }
    }

    pub fn with_layer_top(self, layer_top: f32) -> Self {
        Self { layer_top, ..self }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// How consecutive vertices group into faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Every 3 vertices form a triangle.
    Triangles,
    /// Every 4 vertices form a quad `(a, b, c, d)`; not drawable directly.
    Quads,
}

impl Primitive {
    pub fn vertices_per_face(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
        }
    }
}

/// Interleaved position/normal/tube-coordinate/layer-top array.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuffer {
    primitive: Primitive,
    vertices: Vec<Vertex>,
}

impl GeometryBuffer {
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            vertices: Vec::new(),
        }
    }

    pub fn triangles() -> Self {
        Self::new(Primitive::Triangles)
    }

    pub fn quads() -> Self {
        Self::new(Primitive::Quads)
    }

    pub fn with_capacity(primitive: Primitive, vertices: usize) -> Self {
        Self {
            primitive,
            vertices: Vec::with_capacity(vertices),
        }
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / self.primitive.vertices_per_face()
    }

    /// Triangle count after quad triangulation.
    pub fn triangle_count(&self) -> usize {
        match self.primitive {
            Primitive::Triangles => self.face_count(),
            Primitive::Quads => self.face_count() * 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
    }

    pub fn push_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn push_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
        debug_assert_eq!(self.primitive, Primitive::Triangles);
        self.vertices.extend_from_slice(&[a, b, c]);
    }

    pub fn push_quad(&mut self, a: Vertex, b: Vertex, c: Vertex, d: Vertex) {
        debug_assert_eq!(self.primitive, Primitive::Quads);
        self.vertices.extend_from_slice(&[a, b, c, d]);
    }

    /// Append another buffer, triangulating it first if the primitives differ.
    pub fn append(&mut self, other: &GeometryBuffer) {
        if other.primitive == self.primitive {
            self.vertices.extend_from_slice(&other.vertices);
        } else if self.primitive == Primitive::Triangles {
            self.vertices.extend_from_slice(&other.triangulate().vertices);
        } else {
            tracing::warn!("cannot append triangles to a quad buffer; ignoring");
        }
    }

    /// Convert to a triangle list: quad `(a, b, c, d)` becomes `(a, b, c)` and `(a, c, d)`.
    pub fn triangulate(&self) -> GeometryBuffer {
        match self.primitive {
            Primitive::Triangles => self.clone(),
            Primitive::Quads => {
                let mut out =
                    GeometryBuffer::with_capacity(Primitive::Triangles, self.face_count() * 6);
                for q in self.vertices.chunks_exact(4) {
                    out.vertices
                        .extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
                }
                out
            }
        }
    }

    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(self.vertices.iter().map(Vertex::position))
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (v.position() + offset).to_array();
            v.layer_top += offset.z;
        }
    }

    /// Apply an affine transform to positions and normals. The layer top
    /// follows the transformed Z of the point lifted to it.
    pub fn transform(&mut self, transform: &Mat4) {
        let normal_matrix = transform.inverse().transpose();
        for v in &mut self.vertices {
            let [x, y, _] = v.position;
            v.layer_top = transform.transform_point3(Vec3::new(x, y, v.layer_top)).z;
            v.position = transform.transform_point3(v.position()).to_array();
            v.normal = normal_matrix
                .transform_vector3(v.normal())
                .normalize_or_zero()
                .to_array();
        }
    }

    /// Load a static indexed mesh with flat per-face normals.
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        let mut out = Self::with_capacity(Primitive::Triangles, mesh.indices.len() * 3);
        for tri in &mesh.indices {
            let [a, b, c] = tri.map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a).normalize_or_zero();
            out.push_triangle(
                Vertex::new(a, normal, 0.0),
                Vertex::new(b, normal, 0.0),
                Vertex::new(c, normal, 0.0),
            );
        }
        out
    }
}

/// Minimal indexed triangle mesh for static models.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Axis-aligned box from the origin to `size`, outward-facing.
    pub fn cuboid(size: Vec3) -> Self {
        let (x, y, z) = (size.x, size.y, size.z);
        #[rustfmt::skip]
        let positions = vec![
            [0.0, 0.0, 0.0], [x, 0.0, 0.0], [x, y, 0.0], [0.0, y, 0.0],
            [0.0, 0.0, z],   [x, 0.0, z],   [x, y, z],   [0.0, y, z],
        ];
        #[rustfmt::skip]
        let indices = vec![
            // Bottom
            [0, 2, 1], [0, 3, 2],
            // Top
            [4, 5, 6], [4, 6, 7],
            // Front (Y-)
            [0, 1, 5], [0, 5, 4],
            // Back (Y+)
            [3, 7, 6], [3, 6, 2],
            // Left (X-)
            [0, 4, 7], [0, 7, 3],
            // Right (X+)
            [1, 2, 6], [1, 6, 5],
        ];
        Self { positions, indices }
    }

    pub fn cube(size: f32) -> Self {
        Self::cuboid(Vec3::splat(size))
    }
}

/// Coloured vertex for lines and flat-shaded helpers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Draw mode of a [`ColoredMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Lines,
    Triangles,
}

/// Per-vertex coloured lines or triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredMesh {
    pub mode: DrawMode,
    pub vertices: Vec<ColorVertex>,
}

impl ColoredMesh {
    pub fn lines() -> Self {
        Self {
            mode: DrawMode::Lines,
            vertices: Vec::new(),
        }
    }

    pub fn triangles() -> Self {
        Self {
            mode: DrawMode::Triangles,
            vertices: Vec::new(),
        }
    }

    pub fn push_line(&mut self, from: Vec3, to: Vec3, color: [f32; 4]) {
        self.vertices.push(ColorVertex {
            position: from.to_array(),
            color,
        });
        self.vertices.push(ColorVertex {
            position: to.to_array(),
            color,
        });
    }

    pub fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: [f32; 4]) {
        for p in [a, b, c] {
            self.vertices.push(ColorVertex {
                position: p.to_array(),
                color,
            });
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
