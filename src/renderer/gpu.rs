use std::sync::Arc;

use winit::window::Window;

/// Surface, device and queue for one window (or canvas).
///
/// Creating it is asynchronous: natively it is blocked on with `pollster`,
/// in the browser it is spawned and handed back through the event loop
/// proxy.
#[derive(Debug)]
pub struct GpuState
{
        pub window: Arc<Window>,

        /// Handle to a presentable surface.
        ///
        /// Reference: <https://www.w3.org/TR/webgpu/#canvas-rendering>
        pub surface: wgpu::Surface<'static>,

        pub device: wgpu::Device,

        pub queue: wgpu::Queue,

        /// Surface format, usage flags, width, height, and present mode.
        pub config: wgpu::SurfaceConfiguration,

        /// Rendering commands require a configured surface.
        pub is_surface_configured: bool,
}

impl GpuState
{
        pub async fn new(window: Arc<Window>) -> anyhow::Result<GpuState>
        {
                let size = window.inner_size();

                let instance = Self::new_instance();

                let surface = instance.create_surface(window.clone())?;

                let adapter = Self::get_adapter(&instance, &surface).await?;

                Self::log_current_backend(&adapter);

                let (device, queue) = Self::get_device_and_queue(&adapter).await?;

                let surface_caps = surface.get_capabilities(&adapter);

                let format = surface_caps
                        .formats
                        .iter()
                        .find(|f| f.is_srgb())
                        .or_else(|| surface_caps.formats.first())
                        .copied()
                        .ok_or_else(|| anyhow::anyhow!("Surface reports no texture formats"))?;

                let config = Self::get_surface_config(format, size.width, size.height, &surface_caps);

                let mut state = Self {
                        window,
                        surface,
                        device,
                        queue,
                        config,
                        is_surface_configured: false,
                };

                state.resize(size.width, size.height);

                Ok(state)
        }

        /// Native: Vulkan, Metal, DX12. Browser: WebGL2.
        fn new_instance() -> wgpu::Instance
        {
                wgpu::Instance::new(&wgpu::InstanceDescriptor {
                        #[cfg(not(target_arch = "wasm32"))]
                        backends: wgpu::Backends::PRIMARY,
                        #[cfg(target_arch = "wasm32")]
                        backends: wgpu::Backends::GL,
                        ..Default::default()
                })
        }

        async fn get_adapter<'a>(
                instance: &wgpu::Instance,
                surface: &wgpu::Surface<'a>,
        ) -> anyhow::Result<wgpu::Adapter, wgpu::RequestAdapterError>
        {
                instance.request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(surface),
                        force_fallback_adapter: false,
                })
                .await
        }

        async fn get_device_and_queue(
                adapter: &wgpu::Adapter
        ) -> anyhow::Result<(wgpu::Device, wgpu::Queue), wgpu::RequestDeviceError>
        {
                adapter.request_device(&wgpu::DeviceDescriptor {
                        label: Some("orbis_device"),
                        required_features: wgpu::Features::empty(),
                        // WebGL doesn't support all of wgpu's features.
                        required_limits: if cfg!(target_arch = "wasm32")
                        {
                                wgpu::Limits::downlevel_webgl2_defaults()
                        }
                        else
                        {
                                wgpu::Limits::default()
                        },
                        memory_hints: Default::default(),
                        trace: wgpu::Trace::Off,
                })
                .await
        }

        fn log_current_backend(adapter: &wgpu::Adapter)
        {
                let info = adapter.get_info();

                log::info!("GPU: {} ({:?})", info.name, info.backend);
        }

        fn get_surface_config(
                format: wgpu::TextureFormat,
                width: u32,
                height: u32,
                surface_caps: &wgpu::SurfaceCapabilities,
        ) -> wgpu::SurfaceConfiguration
        {
                wgpu::SurfaceConfiguration {
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                        format,
                        width: width.max(1),
                        height: height.max(1),
                        // Fifo is the one mode every backend supports.
                        present_mode: wgpu::PresentMode::Fifo,
                        alpha_mode: surface_caps
                                .alpha_modes
                                .first()
                                .copied()
                                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
                        view_formats: vec![],
                        desired_maximum_frame_latency: 2,
                }
        }

        pub fn format(&self) -> wgpu::TextureFormat
        {
                self.config.format
        }

        /// Reconfigures the surface to `width` x `height` device pixels.
        ///
        /// A zero-sized surface is skipped.
        pub fn resize(
                &mut self,
                width: u32,
                height: u32,
        )
        {
                if width == 0 || height == 0
                {
                        return;
                }

                // Clamping to max dim to prevent panic!
                let max_dim = self.device.limits().max_texture_dimension_2d;

                self.config.width = width.min(max_dim);
                self.config.height = height.min(max_dim);

                log::debug!("Resizing surface -> width: {}, height: {}", self.config.width, self.config.height);

                self.surface.configure(&self.device, &self.config);
                self.is_surface_configured = true;
        }
}
