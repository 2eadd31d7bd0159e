//! GPU side of the scene: surface setup, the globe pipeline and one draw
//! per [`SceneObject`](scene::SceneObject).

pub mod camera;
pub mod gpu;
pub mod pipeline;
pub mod scene;

use std::f32::consts::FRAC_PI_2;

use wgpu::util::DeviceExt;

pub use camera::{Camera, GlobalUniform};
pub use gpu::GpuState;
pub use pipeline::PipelineManager;
pub use scene::{ObjectKind, ObjectUniform, RenderHandle, SceneGraph, SceneObject};

use crate::config::Config;
use crate::geometry::{GpuMesh, Mesh};
use crate::globe::RADIUS;
use crate::input::Viewport;
use crate::texture::{Texture, TextureData};

const GLOBE_SEGMENTS: u32 = 32;
const MARKER_SEGMENTS: u32 = 16;

/// Stand-ins shown until the real textures are decoded.
const DAY_FALLBACK: [u8; 4] = [24, 58, 110, 255];
const NIGHT_FALLBACK: [u8; 4] = [4, 6, 16, 255];
const SPECULAR_FALLBACK: [u8; 4] = [0, 0, 0, 255];

/// Size of the drawing buffer for `viewport`, in device pixels.
pub fn drawing_size(
        viewport: &Viewport,
        max_pixel_ratio: f32,
) -> (u32, u32)
{
        let ratio = viewport.pixel_ratio(max_pixel_ratio);

        ((viewport.width * ratio).round() as u32, (viewport.height * ratio).round() as u32)
}

#[derive(Debug)]
struct ObjectBinding
{
        buffer: wgpu::Buffer,
        bind_group: wgpu::BindGroup,
}

/// One acquired surface texture and the encoder recording into it.
#[derive(Debug)]
pub struct Frame
{
        output: wgpu::SurfaceTexture,
        pub view: wgpu::TextureView,
        pub encoder: wgpu::CommandEncoder,
}

impl Frame
{
        pub fn present(
                self,
                queue: &wgpu::Queue,
        )
        {
                queue.submit(std::iter::once(self.encoder.finish()));

                self.output.present();
        }
}

#[derive(Debug)]
pub struct Renderer
{
        pipelines: PipelineManager,

        globals_buffer: wgpu::Buffer,
        globals_bind_group: wgpu::BindGroup,

        objects: Vec<ObjectBinding>,
        textures_bind_group: wgpu::BindGroup,

        globe_mesh: GpuMesh,
        marker_mesh: GpuMesh,
        depth: Texture,

        camera: Camera,
        viewport: Viewport,
        max_pixel_ratio: f32,
}

impl Renderer
{
        pub fn new(
                gpu: &mut GpuState,
                viewport: Viewport,
                config: &Config,
        ) -> Self
        {
                let (width, height) = drawing_size(&viewport, config.max_pixel_ratio);
                gpu.resize(width, height);

                let device = &gpu.device;
                let pipelines = PipelineManager::new(device, gpu.format());

                let camera = Camera::new(config.camera_distance, &viewport);
                let globals = GlobalUniform::new(&camera, [width as f32, height as f32], 0.0);

                let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Globals Buffer"),
                        contents: bytemuck::cast_slice(&[globals]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });

                let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &pipelines.globals_layout,
                        entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: globals_buffer.as_entire_binding(),
                        }],
                        label: Some("globals_bind_group"),
                });

                let textures_bind_group = Self::textures_bind_group(
                        gpu,
                        &pipelines,
                        [
                                &TextureData::solid(DAY_FALLBACK),
                                &TextureData::solid(NIGHT_FALLBACK),
                                &TextureData::solid(SPECULAR_FALLBACK),
                        ],
                );

                // Texture seam on the far side, null island facing +z.
                let globe_mesh = Mesh::uv_sphere(RADIUS, GLOBE_SEGMENTS, GLOBE_SEGMENTS)
                        .rotate_y(-FRAC_PI_2)
                        .upload(&gpu.device, "globe");

                let marker_mesh = Mesh::uv_sphere(1.0, MARKER_SEGMENTS, MARKER_SEGMENTS).upload(&gpu.device, "marker");

                let depth = Texture::create_depth_texture(&gpu.device, &gpu.config, "depth_texture");

                Self {
                        pipelines,
                        globals_buffer,
                        globals_bind_group,
                        objects: Vec::new(),
                        textures_bind_group,
                        globe_mesh,
                        marker_mesh,
                        depth,
                        camera,
                        viewport,
                        max_pixel_ratio: config.max_pixel_ratio,
                }
        }

        fn textures_bind_group(
                gpu: &GpuState,
                pipelines: &PipelineManager,
                [day, night, specular]: [&TextureData; 3],
        ) -> wgpu::BindGroup
        {
                let day = Texture::from_data(&gpu.device, &gpu.queue, day, "earth_day");
                let night = Texture::from_data(&gpu.device, &gpu.queue, night, "earth_night");
                let specular = Texture::from_data(&gpu.device, &gpu.queue, specular, "earth_specular");

                gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &pipelines.textures_layout,
                        entries: &[
                                wgpu::BindGroupEntry {
                                        binding: 0,
                                        resource: wgpu::BindingResource::TextureView(&day.view),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 1,
                                        resource: wgpu::BindingResource::TextureView(&night.view),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 2,
                                        resource: wgpu::BindingResource::TextureView(&specular.view),
                                },
                                wgpu::BindGroupEntry {
                                        binding: 3,
                                        resource: wgpu::BindingResource::Sampler(&day.sampler),
                                },
                        ],
                        label: Some("globe_textures_bind_group"),
                })
        }

        /// Swaps the fallback colours for the decoded earth textures.
        pub fn set_textures(
                &mut self,
                gpu: &GpuState,
                day: &TextureData,
                night: &TextureData,
                specular: &TextureData,
        )
        {
                self.textures_bind_group = Self::textures_bind_group(gpu, &self.pipelines, [day, night, specular]);
        }

        pub fn camera(&self) -> &Camera
        {
                &self.camera
        }

        pub fn viewport(&self) -> Viewport
        {
                self.viewport
        }

        pub fn pixel_ratio(&self) -> f32
        {
                self.viewport.pixel_ratio(self.max_pixel_ratio)
        }

        pub fn resize(
                &mut self,
                gpu: &mut GpuState,
                viewport: Viewport,
        )
        {
                let (width, height) = drawing_size(&viewport, self.max_pixel_ratio);
                gpu.resize(width, height);

                self.viewport = viewport;
                self.camera.resize(&viewport);
                self.depth = Texture::create_depth_texture(&gpu.device, &gpu.config, "depth_texture");
        }

        pub fn screen_descriptor(
                &self,
                gpu: &GpuState,
        ) -> egui_wgpu::ScreenDescriptor
        {
                egui_wgpu::ScreenDescriptor {
                        size_in_pixels: [gpu.config.width, gpu.config.height],
                        pixels_per_point: self.pixel_ratio(),
                }
        }

        /// Acquires the next surface texture.
        ///
        /// `Ok(None)` skips this frame: the surface is not configured yet, or
        /// was lost and has been reconfigured.
        pub fn begin_frame(
                &self,
                gpu: &GpuState,
        ) -> anyhow::Result<Option<Frame>>
        {
                if !gpu.is_surface_configured
                {
                        return Ok(None);
                }

                let output = match gpu.surface.get_current_texture()
                {
                        Ok(output) => output,
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) =>
                        {
                                gpu.surface.configure(&gpu.device, &gpu.config);
                                return Ok(None);
                        }
                        Err(wgpu::SurfaceError::Timeout) =>
                        {
                                log::warn!("Renderer: surface timed out");
                                return Ok(None);
                        }
                        Err(e) => anyhow::bail!("Unable to acquire surface texture: {e}"),
                };

                let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

                let encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Main Render Encoder"),
                });

                Ok(Some(Frame {
                        output,
                        view,
                        encoder,
                }))
        }

        /// Uploads the uniforms and records one draw per visible object.
        pub fn draw_scene(
                &mut self,
                gpu: &GpuState,
                graph: &SceneGraph,
                time: f64,
                frame: &mut Frame,
        )
        {
                let resolution = [gpu.config.width as f32, gpu.config.height as f32];
                let globals = GlobalUniform::new(&self.camera, resolution, time as f32);
                gpu.queue.write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[globals]));

                while self.objects.len() < graph.len()
                {
                        let binding = self.object_binding(&gpu.device);
                        self.objects.push(binding);
                }

                for ((_, object), binding) in graph.objects().zip(&self.objects)
                {
                        let uniform = ObjectUniform::from(object);
                        gpu.queue.write_buffer(&binding.buffer, 0, bytemuck::cast_slice(&[uniform]));
                }

                let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Globe Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &frame.view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                                        store: wgpu::StoreOp::Store,
                                },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                view: &self.depth.view,
                                depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                });

                render_pass.set_pipeline(&self.pipelines.render_pipeline);
                render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
                render_pass.set_bind_group(2, &self.textures_bind_group, &[]);

                for ((_, object), binding) in graph.objects().zip(&self.objects)
                {
                        if !object.visible
                        {
                                continue;
                        }

                        let mesh = match object.kind
                        {
                                ObjectKind::Globe => &self.globe_mesh,
                                ObjectKind::Marker => &self.marker_mesh,
                        };

                        render_pass.set_bind_group(1, &binding.bind_group, &[]);
                        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
                }
        }

        fn object_binding(
                &self,
                device: &wgpu::Device,
        ) -> ObjectBinding
        {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Object Buffer"),
                        size: std::mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                });

                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        layout: &self.pipelines.object_layout,
                        entries: &[wgpu::BindGroupEntry {
                                binding: 0,
                                resource: buffer.as_entire_binding(),
                        }],
                        label: Some("object_bind_group"),
                });

                ObjectBinding { buffer, bind_group }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn drawing_size_caps_the_pixel_ratio()
        {
                let retina = Viewport::new(800.0, 600.0, 3.0);

                assert_eq!(drawing_size(&retina, 2.0), (1600, 1200));
                assert_eq!(drawing_size(&retina, 4.0), (2400, 1800));
        }

        #[test]
        fn drawing_size_of_plain_display()
        {
                assert_eq!(drawing_size(&Viewport::new(1280.0, 720.0, 1.0), 2.0), (1280, 720));
        }
}
