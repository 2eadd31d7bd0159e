pub mod app;
pub mod asset;
pub mod config;
pub mod context;
pub mod controller;
pub mod events;
pub mod geometry;
pub mod globe;
pub mod input;
pub mod loader;
pub mod platform;
pub mod renderer;
pub mod scheduler;
pub mod texture;
pub mod tween;
pub mod ui;
pub mod utils;

/// Only `wasm32` is targeted for the browser build: every major browser
/// implements the 32-bit memory model, and `wasm-bindgen`, `web-sys` and
/// `wgpu` support it on stable.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use winit::event_loop::EventLoop;

use crate::app::{App, AppEvent};

/// Builds the event loop and runs the globe until the window closes.
///
/// On the web the loop is handed to the browser and this returns right
/// away.
pub fn run() -> anyhow::Result<()>
{
        utils::bootstrap::config_logging();

        let config = utils::bootstrap::create_config();

        utils::bootstrap::show_start_message(&config);

        let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;

        #[allow(unused_mut)]
        let mut app = App::new(config, &event_loop);

        #[cfg(not(target_arch = "wasm32"))]
        {
                event_loop.run_app(&mut app)?;
        }

        #[cfg(target_arch = "wasm32")]
        {
                use winit::platform::web::EventLoopExtWebSys;

                event_loop.spawn_app(app);
        }

        Ok(())
}

/// WebAssembly entry point.
///
/// The browser calls this when the module is initialized, thanks to the
/// [`wasm_bindgen(start)`] attribute. It installs a panic hook for readable
/// errors in the console, then delegates to [`run`].
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_orbis_wasm() -> Result<(), JsValue>
{
        console_error_panic_hook::set_once();

        run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
