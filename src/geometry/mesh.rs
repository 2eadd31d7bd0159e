use std::f32::consts::PI;

use wgpu::util::{BufferInitDescriptor, DeviceExt};

use crate::geometry::vertex::Vertex;

/// CPU-side indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Mesh
{
        pub vertices: Vec<Vertex>,
        pub indices: Vec<u32>,
}

impl Mesh
{
        /// UV sphere laid out like three.js' `SphereGeometry`: `u` runs with
        /// longitude starting at `-x`, `v` runs from the north pole down.
        pub fn uv_sphere(
                radius: f32,
                width_segments: u32,
                height_segments: u32,
        ) -> Self
        {
                let width_segments = width_segments.max(3);
                let height_segments = height_segments.max(2);
                let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);

                for iy in 0..=height_segments
                {
                        let v = iy as f32 / height_segments as f32;
                        let theta = v * PI;

                        for ix in 0..=width_segments
                        {
                                let u = ix as f32 / width_segments as f32;
                                let phi = u * PI * 2.0;

                                let normal = [-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin()];

                                vertices.push(Vertex {
                                        position: normal.map(|n| n * radius),
                                        tex_coords: [u, v],
                                        normal,
                                });
                        }
                }

                let row = width_segments + 1;
                let mut indices = Vec::new();

                for iy in 0..height_segments
                {
                        for ix in 0..width_segments
                        {
                                let a = iy * row + ix + 1;
                                let b = iy * row + ix;
                                let c = (iy + 1) * row + ix;
                                let d = (iy + 1) * row + ix + 1;

                                if iy != 0
                                {
                                        indices.extend_from_slice(&[a, b, d]);
                                }

                                if iy != height_segments - 1
                                {
                                        indices.extend_from_slice(&[b, c, d]);
                                }
                        }
                }

                Self { vertices, indices }
        }

        /// Rotates positions and normals about the Y axis.
        pub fn rotate_y(
                mut self,
                angle: f32,
        ) -> Self
        {
                let (sin, cos) = angle.sin_cos();
                let rotate = |[x, y, z]: [f32; 3]| [x * cos + z * sin, y, -x * sin + z * cos];

                for vertex in &mut self.vertices
                {
                        vertex.position = rotate(vertex.position);
                        vertex.normal = rotate(vertex.normal);
                }

                self
        }

        pub fn upload(
                &self,
                device: &wgpu::Device,
                label: &str,
        ) -> GpuMesh
        {
                GpuMesh {
                        vertex_buffer: device.create_buffer_init(&BufferInitDescriptor {
                                label: Some(&format!("{label} vertex buffer")),
                                contents: bytemuck::cast_slice(&self.vertices),
                                usage: wgpu::BufferUsages::VERTEX,
                        }),
                        index_buffer: device.create_buffer_init(&BufferInitDescriptor {
                                label: Some(&format!("{label} index buffer")),
                                contents: bytemuck::cast_slice(&self.indices),
                                usage: wgpu::BufferUsages::INDEX,
                        }),
                        num_indices: self.indices.len() as u32,
                }
        }
}

#[derive(Debug)]
pub struct GpuMesh
{
        pub vertex_buffer: wgpu::Buffer,
        pub index_buffer: wgpu::Buffer,
        pub num_indices: u32,
}
