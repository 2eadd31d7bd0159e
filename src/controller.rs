//! Owns the rendering surface and drives the globe through the frame
//! scheduler.
//!
//! Construction starts the earth texture loads; [`SceneController::build`]
//! adds the globe once the page-ready batch resolved.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use derivative::Derivative;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::asset::asset_name;
use crate::config::Config;
use crate::context::AppContext;
use crate::events::{self, Payload, Subscription};
use crate::globe::{self, Globe, Placeholder};
use crate::input::Viewport;
use crate::loader::AssetLoader;
use crate::platform;
use crate::renderer::{GpuState, Renderer, SceneGraph};
use crate::scheduler::{FrameCallback, FrameScheduler, frame_callback};
use crate::tween::TweenEngine;
use crate::ui::DebugOverlay;

pub const GLOBE_PRIORITY: i32 = 10;

/// Drawing comes last, after every update of the frame.
pub const RENDER_PRIORITY: i32 = 99;

/// Earth texture URLs after manifest lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUrls
{
        pub day: String,
        pub night: String,
        pub specular: String,
}

impl TextureUrls
{
        pub fn resolve(config: &Config) -> Self
        {
                let url = |name: &str| config.asset_url(&asset_name(name, &config.manifest_path));

                Self {
                        day: url(&config.textures.day),
                        night: url(&config.textures.night),
                        specular: url(&config.textures.specular),
                }
        }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct SceneController
{
        gpu: GpuState,
        renderer: Renderer,
        graph: SceneGraph,
        globe: Option<Globe>,

        #[derivative(Debug = "ignore")]
        placeholder: Box<dyn Placeholder>,

        overlay: Option<DebugOverlay>,
        textures: TextureUrls,

        tweens: Rc<TweenEngine>,
        frames: Rc<FrameScheduler>,

        #[derivative(Debug = "ignore")]
        callbacks: Vec<FrameCallback>,
        subscriptions: Vec<Subscription>,
}

impl SceneController
{
        /// Sets up the renderer for the current viewport, starts the texture
        /// loads and registers the per-frame callbacks.
        pub fn new(
                ctx: &AppContext,
                mut gpu: GpuState,
        ) -> Rc<RefCell<Self>>
        {
                let viewport = ctx.store.borrow().viewport;
                let renderer = Renderer::new(&mut gpu, viewport, &ctx.config);

                let overlay = ctx.config.enable_gui.then(|| {
                        let show_stats = ctx.config.show_stats && !platform::stats_hidden();
                        DebugOverlay::new(&gpu.device, gpu.format(), &gpu.window, show_stats)
                });

                let textures = TextureUrls::resolve(&ctx.config);

                for url in [&textures.day, &textures.night, &textures.specular]
                {
                        // Registered with the loader's current batch.
                        let _ = ctx.loader.load_texture(url);
                }

                let controller = Rc::new(RefCell::new(Self {
                        gpu,
                        renderer,
                        graph: SceneGraph::new(),
                        globe: None,
                        placeholder: globe::placeholder::from_config(&ctx.config),
                        overlay,
                        textures,
                        tweens: ctx.tweens.clone(),
                        frames: ctx.frames.clone(),
                        callbacks: Vec::new(),
                        subscriptions: Vec::new(),
                }));

                Self::attach(&controller, ctx);

                controller
        }

        fn attach(
                this: &Rc<RefCell<Self>>,
                ctx: &AppContext,
        )
        {
                let controller = Rc::downgrade(this);
                let update = frame_callback(move |time| {
                        if let Some(controller) = controller.upgrade()
                        {
                                controller.borrow_mut().update(time);
                        }
                        Ok(())
                });

                let controller = Rc::downgrade(this);
                let render = frame_callback(move |time| match controller.upgrade()
                {
                        Some(controller) => controller.borrow_mut().render(time),
                        None => Ok(()),
                });

                ctx.frames.add(update.clone(), GLOBE_PRIORITY);
                ctx.frames.add(render.clone(), RENDER_PRIORITY);

                let controller = Rc::downgrade(this);
                let resize = ctx.bus.on(events::RESIZE, move |payload: &Payload| {
                        if let (Some(controller), Some(viewport)) = (controller.upgrade(), payload.viewport())
                        {
                                controller.borrow_mut().resize(viewport);
                        }
                        Ok(())
                });

                let mut this = this.borrow_mut();
                this.callbacks = vec![update, render];
                this.subscriptions.push(resize);
        }

        pub fn window(&self) -> &Arc<Window>
        {
                &self.gpu.window
        }

        pub fn globe(&self) -> Option<&Globe>
        {
                self.globe.as_ref()
        }

        pub fn graph(&self) -> &SceneGraph
        {
                &self.graph
        }

        /// Adds the globe, textured with the decoded earth maps.
        ///
        /// Calling it again once the globe exists does nothing.
        pub fn build(
                &mut self,
                loader: &AssetLoader,
        ) -> anyhow::Result<()>
        {
                if self.globe.is_some()
                {
                        return Ok(());
                }

                let texture = |url: &str| {
                        loader.texture(url).ok_or_else(|| anyhow::anyhow!("Texture {url} is not loaded"))
                };

                let day = texture(&self.textures.day)?;
                let night = texture(&self.textures.night)?;
                let specular = texture(&self.textures.specular)?;

                self.renderer.set_textures(&self.gpu, &day, &night, &specular);

                self.globe = Some(Globe::new(&mut self.graph));
                self.sync_placeholder();

                log::info!("SceneController: globe added with {} markers", self.graph.len() - 1);

                Ok(())
        }

        pub fn animate_to_location(
                &mut self,
                name: &str,
        ) -> anyhow::Result<bool>
        {
                match &mut self.globe
                {
                        Some(globe) => globe.animate_to_location(name, &self.tweens),
                        None => anyhow::bail!("Globe is not built yet"),
                }
        }

        /// Gives the overlay first look at a window event.
        pub fn handle_window_event(
                &mut self,
                event: &WindowEvent,
        ) -> bool
        {
                match &mut self.overlay
                {
                        Some(overlay) => overlay.handle_input(&self.gpu.window, event),
                        None => false,
                }
        }

        pub fn resize(
                &mut self,
                viewport: Viewport,
        )
        {
                self.renderer.resize(&mut self.gpu, viewport);
                self.sync_placeholder();
        }

        fn sync_placeholder(&mut self)
        {
                let viewport = self.renderer.viewport();

                if let (Some(globe), Some(rect)) = (&mut self.globe, self.placeholder.bounding_rect(&viewport))
                {
                        globe.on_resize(rect, &viewport, &mut self.graph);
                }
        }

        fn update(
                &mut self,
                time: f64,
        )
        {
                if let Some(globe) = &mut self.globe
                {
                        globe.on_frame(time, &mut self.graph);
                }
        }

        fn render(
                &mut self,
                time: f64,
        ) -> anyhow::Result<()>
        {
                let mut frame = match self.renderer.begin_frame(&self.gpu)?
                {
                        Some(frame) => frame,
                        None => return Ok(()),
                };

                self.renderer.draw_scene(&self.gpu, &self.graph, time, &mut frame);

                let mut clicked = None;

                if let Some(overlay) = &mut self.overlay
                {
                        overlay.record_frame(time);

                        let (locations, current) = match &self.globe
                        {
                                Some(globe) => (globe.locations(), globe.current_location()),
                                None => (&[][..], None),
                        };

                        clicked = overlay.draw(
                                &self.gpu.device,
                                &self.gpu.queue,
                                &mut frame.encoder,
                                &self.gpu.window,
                                &frame.view,
                                self.renderer.screen_descriptor(&self.gpu),
                                locations,
                                current,
                        );
                }

                frame.present(&self.gpu.queue);

                if let Some(name) = clicked
                {
                        self.animate_to_location(name)?;
                }

                Ok(())
        }
}

impl Drop for SceneController
{
        fn drop(&mut self)
        {
                for callback in &self.callbacks
                {
                        self.frames.remove(callback);
                }
        }
}
