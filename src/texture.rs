use crate::loader::LoadError;

/// Decoded RGBA8 pixels, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData
{
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
}

impl TextureData
{
        pub fn decode(
                url: &str,
                bytes: &[u8],
        ) -> Result<Self, LoadError>
        {
                let rgba = image::load_from_memory(bytes).map_err(|e| LoadError::decode(url, e))?.to_rgba8();

                Ok(Self {
                        width: rgba.width(),
                        height: rgba.height(),
                        pixels: rgba.into_raw(),
                })
        }

        /// A single opaque pixel of `rgba`.
        pub fn solid(rgba: [u8; 4]) -> Self
        {
                Self {
                        width: 1,
                        height: 1,
                        pixels: rgba.to_vec(),
                }
        }
}

#[derive(Debug)]
pub struct Texture
{
        pub texture: wgpu::Texture,
        pub view: wgpu::TextureView,
        pub sampler: wgpu::Sampler,
}

impl Texture
{
        pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

        pub fn from_data(
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                data: &TextureData,
                label: &str,
        ) -> Self
        {
                let size = wgpu::Extent3d {
                        width: data.width,
                        height: data.height,
                        depth_or_array_layers: 1,
                };

                let texture = device.create_texture(&wgpu::TextureDescriptor {
                        label: Some(label),
                        size,
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::Rgba8UnormSrgb,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                        view_formats: &[],
                });

                queue.write_texture(
                        wgpu::TexelCopyTextureInfo {
                                aspect: wgpu::TextureAspect::All,
                                texture: &texture,
                                mip_level: 0,
                                origin: wgpu::Origin3d::ZERO,
                        },
                        &data.pixels,
                        wgpu::TexelCopyBufferLayout {
                                offset: 0,
                                bytes_per_row: Some(4 * data.width),
                                rows_per_image: Some(data.height),
                        },
                        size,
                );

                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

                // Longitude wraps, latitude does not.
                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                        label: Some(label),
                        address_mode_u: wgpu::AddressMode::Repeat,
                        address_mode_v: wgpu::AddressMode::ClampToEdge,
                        address_mode_w: wgpu::AddressMode::ClampToEdge,
                        mag_filter: wgpu::FilterMode::Linear,
                        min_filter: wgpu::FilterMode::Linear,
                        mipmap_filter: wgpu::FilterMode::Nearest,
                        ..Default::default()
                });

                Self {
                        texture,
                        view,
                        sampler,
                }
        }

        pub fn create_depth_texture(
                device: &wgpu::Device,
                config: &wgpu::SurfaceConfiguration,
                label: &str,
        ) -> Self
        {
                let size = wgpu::Extent3d {
                        width: config.width.max(1),
                        height: config.height.max(1),
                        depth_or_array_layers: 1,
                };

                let texture = device.create_texture(&wgpu::TextureDescriptor {
                        label: Some(label),
                        size,
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: Self::DEPTH_FORMAT,
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                        view_formats: &[],
                });

                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                        address_mode_u: wgpu::AddressMode::ClampToEdge,
                        address_mode_v: wgpu::AddressMode::ClampToEdge,
                        address_mode_w: wgpu::AddressMode::ClampToEdge,
                        mag_filter: wgpu::FilterMode::Linear,
                        min_filter: wgpu::FilterMode::Linear,
                        mipmap_filter: wgpu::FilterMode::Nearest,
                        compare: Some(wgpu::CompareFunction::LessEqual),
                        lod_min_clamp: 0.0,
                        lod_max_clamp: 100.0,
                        ..Default::default()
                });

                Self {
                        texture,
                        view,
                        sampler,
                }
        }
}
