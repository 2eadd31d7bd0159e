pub mod mesh;
pub mod vertex;

pub use mesh::{GpuMesh, Mesh};
pub use vertex::Vertex;
