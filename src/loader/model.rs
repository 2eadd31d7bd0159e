use cgmath::{Matrix4, Quaternion, SquareMatrix, Vector3};

use crate::geometry::vertex::Vertex;

/// One primitive of a decoded glTF scene, in its node's space.
#[derive(Debug, Clone)]
pub struct MeshData
{
        pub name: String,
        pub vertices: Vec<Vertex>,
        pub indices: Vec<u32>,
        pub transform: Matrix4<f32>,
}

/// CPU-side result of a glTF load.
#[derive(Debug, Clone, Default)]
pub struct ModelData
{
        pub meshes: Vec<MeshData>,
}

impl ModelData
{
        /// Parses a self-contained glTF or GLB document.
        pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self>
        {
                let (document, buffers, _images) = gltf::import_slice(bytes)?;
                let mut meshes = Vec::new();

                for scene in document.scenes()
                {
                        for node in scene.nodes()
                        {
                                collect_node(&node, &buffers, &mut meshes, Matrix4::identity());
                        }
                }

                log::debug!("ModelData: {} meshes", meshes.len());

                Ok(Self { meshes })
        }

        pub fn vertex_count(&self) -> usize
        {
                self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
        }
}

fn collect_node(
        node: &gltf::Node,
        buffers: &[gltf::buffer::Data],
        meshes: &mut Vec<MeshData>,
        parent: Matrix4<f32>,
)
{
        let transform = parent * node_transform(node);

        if let Some(mesh) = node.mesh()
        {
                let mesh_name = mesh.name().unwrap_or("unnamed").to_string();
                let primitives = mesh.primitives().count();

                for (index, primitive) in mesh.primitives().enumerate()
                {
                        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

                        let positions: Vec<[f32; 3]> =
                                reader.read_positions().map(|iter| iter.collect()).unwrap_or_default();

                        if positions.is_empty()
                        {
                                continue;
                        }

                        let normals: Vec<[f32; 3]> = reader
                                .read_normals()
                                .map(|iter| iter.collect())
                                .unwrap_or_else(|| vec![[0.0, 0.0, 0.0]; positions.len()]);

                        let tex_coords: Vec<[f32; 2]> = reader
                                .read_tex_coords(0)
                                .map(|iter| iter.into_f32().collect())
                                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

                        let indices: Vec<u32> = reader
                                .read_indices()
                                .map(|iter| iter.into_u32().collect())
                                .unwrap_or_else(|| (0..positions.len() as u32).collect());

                        let vertices = positions
                                .iter()
                                .enumerate()
                                .map(|(i, position)| Vertex {
                                        position: *position,
                                        tex_coords: tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                                        normal: normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                                })
                                .collect();

                        let name = if primitives > 1 { format!("{mesh_name}_{index}") } else { mesh_name.clone() };

                        meshes.push(MeshData {
                                name,
                                vertices,
                                indices,
                                transform,
                        });
                }
        }

        for child in node.children()
        {
                collect_node(&child, buffers, meshes, transform);
        }
}

fn node_transform(node: &gltf::Node) -> Matrix4<f32>
{
        let (translation, rotation, scale) = node.transform().decomposed();

        Matrix4::from_translation(Vector3::from(translation))
                * Matrix4::from(Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]))
                * Matrix4::from_nonuniform_scale(scale[0], scale[1], scale[2])
}
