use crate::{geometry::vertex::Vertex, texture::Texture};

/// The globe pipeline and the bind group layouts it was built from.
///
/// ```text
/// @group(0)  GlobalUniform          view-projection, resolution, time
/// @group(1)  ObjectUniform          model matrix, sun direction, params
/// @group(2)  day, night, specular   + one filtering sampler
/// ```
#[derive(Debug)]
pub struct PipelineManager
{
        pub globals_layout: wgpu::BindGroupLayout,
        pub object_layout: wgpu::BindGroupLayout,
        pub textures_layout: wgpu::BindGroupLayout,
        pub render_pipeline: wgpu::RenderPipeline,
}

impl PipelineManager
{
        pub fn new(
                device: &wgpu::Device,
                format: wgpu::TextureFormat,
        ) -> Self
        {
                let globals_layout = Self::uniform_layout(
                        device,
                        "globals_bind_group_layout",
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                );

                let object_layout = Self::uniform_layout(
                        device,
                        "object_bind_group_layout",
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                );

                let textures_layout = Self::textures_layout(device);

                let render_pipeline = Self::render_pipeline(
                        device,
                        format,
                        &[&globals_layout, &object_layout, &textures_layout],
                );

                Self {
                        globals_layout,
                        object_layout,
                        textures_layout,
                        render_pipeline,
                }
        }

        fn render_pipeline(
                device: &wgpu::Device,
                format: wgpu::TextureFormat,
                bind_groups: &[&wgpu::BindGroupLayout],
        ) -> wgpu::RenderPipeline
        {
                let shader = Self::load_shader_module(device);

                let render_pipeline_layout = Self::get_render_pipeline_layout(device, bind_groups);

                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Globe Pipeline"),
                        layout: Some(&render_pipeline_layout),
                        vertex: wgpu::VertexState {
                                module: &shader,
                                entry_point: Some("vs_main"),
                                buffers: &[Vertex::desc()],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                                module: &shader,
                                entry_point: Some("fs_main"),
                                targets: &[Some(wgpu::ColorTargetState {
                                        format,
                                        blend: Some(wgpu::BlendState {
                                                color: wgpu::BlendComponent::OVER,
                                                alpha: wgpu::BlendComponent::OVER,
                                        }),
                                        write_mask: wgpu::ColorWrites::ALL,
                                })],
                                compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: wgpu::PrimitiveState {
                                topology: wgpu::PrimitiveTopology::TriangleList,
                                strip_index_format: None,
                                front_face: wgpu::FrontFace::Ccw,
                                cull_mode: Some(wgpu::Face::Back),
                                polygon_mode: wgpu::PolygonMode::Fill,
                                conservative: false,
                                unclipped_depth: false,
                        },
                        // Markers on the far side are hidden by the globe.
                        depth_stencil: Some(wgpu::DepthStencilState {
                                format: Texture::DEPTH_FORMAT,
                                depth_write_enabled: true,
                                depth_compare: wgpu::CompareFunction::Less,
                                stencil: wgpu::StencilState::default(),
                                bias: wgpu::DepthBiasState::default(),
                        }),
                        multisample: wgpu::MultisampleState {
                                count: 1,
                                mask: !0,
                                alpha_to_coverage_enabled: false,
                        },
                        multiview: None,
                        cache: None,
                })
        }

        /// Loads the shader module data from the `wgsl` file.
        fn load_shader_module(device: &wgpu::Device) -> wgpu::ShaderModule
        {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some("Globe Shader"),
                        source: wgpu::ShaderSource::Wgsl(include_str!("globe.wgsl").into()),
                })
        }

        fn get_render_pipeline_layout(
                device: &wgpu::Device,
                bind_groups: &[&wgpu::BindGroupLayout],
        ) -> wgpu::PipelineLayout
        {
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("Globe Pipeline Layout"),
                        bind_group_layouts: bind_groups,
                        push_constant_ranges: &[],
                })
        }

        fn uniform_layout(
                device: &wgpu::Device,
                label: &str,
                visibility: wgpu::ShaderStages,
        ) -> wgpu::BindGroupLayout
        {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        entries: &[wgpu::BindGroupLayoutEntry {
                                binding: 0,
                                visibility,
                                ty: wgpu::BindingType::Buffer {
                                        ty: wgpu::BufferBindingType::Uniform,
                                        has_dynamic_offset: false,
                                        min_binding_size: None,
                                },
                                count: None,
                        }],
                        label: Some(label),
                })
        }

        fn textures_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout
        {
                let texture = |binding| wgpu::BindGroupLayoutEntry {
                        binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Float {
                                        filterable: true,
                                },
                        },
                        count: None,
                };

                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        entries: &[
                                texture(0),
                                texture(1),
                                texture(2),
                                wgpu::BindGroupLayoutEntry {
                                        binding: 3,
                                        visibility: wgpu::ShaderStages::FRAGMENT,
                                        ty: wgpu::BindingType::Sampler(
                                                wgpu::SamplerBindingType::Filtering,
                                        ),
                                        count: None,
                                },
                        ],
                        label: Some("globe_textures_bind_group_layout"),
                })
        }
}
