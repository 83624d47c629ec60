//! CPU-side geometry: vertex buffers, the extrusion tube builder, instance
//! records and the static bed/axes/outline helpers.

pub mod bed;
pub mod buffer;
pub mod extrusion;
pub mod instancing;

pub use bed::{BedColors, BedGeometry, OUTLINE_Z_BIAS};
pub use buffer::{
    ColorVertex, ColoredMesh, DrawMode, GeometryBuffer, Primitive, TriangleMesh, Vertex,
};
pub use extrusion::{
    stadium_area, stadium_width, ExtrusionGeometry, GeometryStats, Ring, StadiumProfile, TubeMesh,
    RING_POINTS,
};
pub use instancing::{layer_visible, tube_template, InstanceArray, InstanceRecord};
