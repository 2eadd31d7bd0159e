#[cfg(target_arch = "wasm32")]
use wasm_bindgen::UnwrapThrowExt;

use crate::config::Config;

pub fn show_start_message(config: &Config)
{
        if !config.show_start_message
        {
                return;
        }

        let banner = r#"

      ░██████   ░█████████  ░████████  ░██████  ░██████
     ░██   ░██  ░██     ░██ ░██    ░██   ░██   ░██   ░██
    ░██     ░██ ░██     ░██ ░██    ░██   ░██  ░██
    ░██     ░██ ░█████████  ░████████    ░██   ░████████
    ░██     ░██ ░██   ░██   ░██     ░██  ░██          ░██
     ░██   ░██  ░██    ░██  ░██     ░██  ░██   ░██   ░██
      ░██████   ░██     ░██ ░█████████ ░██████  ░██████

 Interactive globe scene built with wgpu and Rust.

            "#;

        log::info!("{banner}")
}

pub fn config_logging()
{
        #[cfg(not(target_arch = "wasm32"))]
        {
                // A second init (e.g. from tests) is harmless.
                let _ = env_logger::try_init();

                log::info!("Running on native.");
        }

        #[cfg(target_arch = "wasm32")]
        {
                console_log::init_with_level(log::Level::Info).unwrap_throw();

                log::info!("Running on wasm32.");
        }
}

pub fn create_config() -> Config
{
        Config::from_file().unwrap_or_else(|err| {
                log::warn!("Failed to load config: {err:#}, falling back to default");
                Config::default()
        })
}
