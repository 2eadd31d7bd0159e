use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use instant::Instant;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use winit::{
        application::ApplicationHandler,
        event::{KeyEvent, WindowEvent},
        event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
        keyboard::{KeyCode, PhysicalKey},
        window::Window,
};

use crate::config::Config;
use crate::context::AppContext;
use crate::controller::SceneController;
use crate::input::{InputMapper, Viewport};
use crate::loader::{LoadError, LoadOptions, MediaSource};
use crate::renderer::GpuState;
use crate::utils::exit::show_exit_message;

/// Events delivered back into the event loop from async work.
#[derive(Debug)]
pub enum AppEvent
{
        /// GPU state finished initializing (always on wasm, where it cannot
        /// be blocked on).
        GpuReady(GpuState),

        /// The page-ready batch resolved.
        AssetsLoaded,

        AssetsFailed(LoadError),
}

/// Main application struct.
///
/// `App` is responsible for:
/// - Creating the window and GPU state on resume
/// - Feeding window events to the input normalizer
/// - Advancing one frame per redraw
pub struct App
{
        proxy: EventLoopProxy<AppEvent>,

        ctx: AppContext,

        mapper: InputMapper,

        window: Option<Arc<Window>>,

        controller: Option<Rc<RefCell<SceneController>>>,

        started: Instant,
}

impl App
{
        pub fn new(
                config: Config,
                event_loop: &EventLoop<AppEvent>,
        ) -> Self
        {
                Self {
                        proxy: event_loop.create_proxy(),
                        ctx: AppContext::new(config),
                        mapper: InputMapper::new(1.0),
                        window: None,
                        controller: None,
                        started: Instant::now(),
                }
        }

        /// Seconds since the app was created.
        fn time(&self) -> f64
        {
                self.started.elapsed().as_secs_f64()
        }

        fn gpu_ready(
                &mut self,
                gpu: GpuState,
        )
        {
                let window = gpu.window.clone();
                let scale_factor = window.scale_factor();
                let size = window.inner_size().to_logical::<f32>(scale_factor);

                self.mapper = InputMapper::new(scale_factor);
                self.ctx.store.borrow_mut().viewport = Viewport::new(size.width, size.height, scale_factor as f32);

                self.ctx.enable_global_events();

                self.controller = Some(SceneController::new(&self.ctx, gpu));

                self.spawn_load();

                window.request_redraw();
        }

        /// Waits for the page-ready batch and reports back through the proxy.
        fn spawn_load(&self)
        {
                let load = self.ctx.loader.load(LoadOptions {
                        media: page_media(&self.ctx.config),
                        progress: true,
                });

                let proxy = self.proxy.clone();

                self.ctx.executor.spawn(async move {
                        let event = match load.await
                        {
                                Ok(()) => AppEvent::AssetsLoaded,
                                Err(e) => AppEvent::AssetsFailed(e),
                        };

                        if proxy.send_event(event).is_err()
                        {
                                log::warn!("App: event loop closed before assets finished loading");
                        }
                });
        }

        fn redraw(&mut self)
        {
                let time = self.time();

                let more = match self.ctx.advance(time, Instant::now())
                {
                        Ok(more) => more,
                        Err(e) =>
                        {
                                log::error!("Frame at {time:.3}s failed: {e:#}");
                                true
                        }
                };

                if more
                {
                        if let Some(window) = &self.window
                        {
                                window.request_redraw();
                        }
                }
        }

        pub fn handle_key(
                &mut self,
                event_loop: &ActiveEventLoop,
                code: KeyCode,
                is_pressed: bool,
        )
        {
                if let (KeyCode::Escape, true) = (code, is_pressed)
                {
                        log::info!("Orbis exiting. bye!");

                        event_loop.exit()
                }
        }
}

#[cfg(target_arch = "wasm32")]
fn page_media(_config: &Config) -> Option<Rc<dyn MediaSource>>
{
        Some(Rc::new(crate::loader::media::DomMediaSource::default()))
}

/// Native windows have no fonts or media to wait for.
#[cfg(not(target_arch = "wasm32"))]
fn page_media(_config: &Config) -> Option<Rc<dyn MediaSource>>
{
        None
}

impl ApplicationHandler<AppEvent> for App
{
        /// Creates the window and starts GPU initialization.
        fn resumed(
                &mut self,
                event_loop: &ActiveEventLoop,
        )
        {
                if self.window.is_some()
                {
                        log::info!("App already resumed, skipping initialization.");
                        return;
                }

                #[allow(unused_mut)]
                let mut window_attributes = Window::default_attributes().with_title("Orbis");

                #[cfg(target_arch = "wasm32")]
                {
                        use wasm_bindgen::JsCast;
                        use winit::platform::web::WindowAttributesExtWebSys;

                        let window = wgpu::web_sys::window().unwrap_throw();
                        let document = window.document().unwrap_throw();
                        let canvas = document.get_element_by_id(&self.ctx.config.canvas_id).unwrap_throw();
                        let html_canvas_element = canvas.unchecked_into();

                        window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
                }

                let window = match event_loop.create_window(window_attributes)
                {
                        Ok(window) => Arc::new(window),
                        Err(e) =>
                        {
                                log::error!("Unable to create window: {e}");
                                event_loop.exit();
                                return;
                        }
                };

                self.window = Some(window.clone());

                #[cfg(not(target_arch = "wasm32"))]
                {
                        // Native builds can block on async state initialization.
                        match pollster::block_on(GpuState::new(window))
                        {
                                Ok(gpu) => self.gpu_ready(gpu),
                                Err(e) =>
                                {
                                        log::error!("Unable to initialize GPU: {e:#}");
                                        event_loop.exit();
                                }
                        }
                }

                #[cfg(target_arch = "wasm32")]
                {
                        // In WASM builds, async tasks must be spawned without blocking.
                        let proxy = self.proxy.clone();

                        wasm_bindgen_futures::spawn_local(async move {
                                match GpuState::new(window).await
                                {
                                        Ok(gpu) =>
                                        {
                                                if proxy.send_event(AppEvent::GpuReady(gpu)).is_err()
                                                {
                                                        log::error!("App: event loop closed during GPU setup");
                                                }
                                        }
                                        Err(e) => log::error!("Unable to initialize GPU: {e:#}"),
                                }
                        });
                }
        }

        fn user_event(
                &mut self,
                _event_loop: &ActiveEventLoop,
                event: AppEvent,
        )
        {
                match event
                {
                        AppEvent::GpuReady(gpu) => self.gpu_ready(gpu),
                        AppEvent::AssetsLoaded =>
                        {
                                log::info!("AssetLoader: loaded");

                                if let Some(controller) = &self.controller
                                {
                                        if let Err(e) = controller.borrow_mut().build(&self.ctx.loader)
                                        {
                                                log::error!("SceneController: {e:#}");
                                        }
                                }
                        }
                        AppEvent::AssetsFailed(e) =>
                        {
                                log::error!("AssetLoader: {e}");
                        }
                }
        }

        fn window_event(
                &mut self,
                event_loop: &ActiveEventLoop,
                _window_id: winit::window::WindowId,
                event: WindowEvent,
        )
        {
                if let Some(controller) = &self.controller
                {
                        controller.borrow_mut().handle_window_event(&event);
                }

                if let Some(input) = self.mapper.map(&event)
                {
                        if let Err(e) = self.ctx.global_events.handle(input, Instant::now())
                        {
                                log::error!("GlobalEvents: {e:#}");
                        }
                }

                match event
                {
                        WindowEvent::CloseRequested => event_loop.exit(),
                        WindowEvent::RedrawRequested => self.redraw(),
                        WindowEvent::KeyboardInput {
                                event:
                                        KeyEvent {
                                                physical_key: PhysicalKey::Code(code),
                                                state: key_state,
                                                ..
                                        },
                                ..
                        } => self.handle_key(event_loop, code, key_state.is_pressed()),

                        _ =>
                        {}
                }
        }

        fn exiting(
                &mut self,
                _event_loop: &ActiveEventLoop,
        )
        {
                show_exit_message(&self.ctx.config);
        }
}
