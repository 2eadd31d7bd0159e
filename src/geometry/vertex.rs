/// Vertex struct.
///
/// Uses C-compatible memory layout (`#[repr(C)]`)
/// so it can be safely shared with GPU graphics APIs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex
{
        pub position: [f32; 3],
        pub tex_coords: [f32; 2],
        pub normal: [f32; 3],
}

impl Vertex
{
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
                wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];

        pub fn desc() -> wgpu::VertexBufferLayout<'static>
        {
                wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &Self::ATTRIBUTES,
                }
        }
}
