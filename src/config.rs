use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default file looked up next to the working directory.
pub const CONFIG_FILE: &str = "orbis.toml";

/// Environment override for [`CONFIG_FILE`].
pub const CONFIG_ENV: &str = "ORBIS_CONFIG";

/// How `global:raf` is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode
{
        /// Self-rescheduling redraw loop that can be stopped through a handle.
        Native,
        /// Follows the tween engine's ticker.
        Ticker,
}

/// Square stand-in for the DOM placeholder on native targets, expressed as
/// fractions of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig
{
        pub center_x: f32,
        pub center_y: f32,
        /// Side length relative to the smaller viewport dimension.
        pub size: f32,
}

impl Default for PlaceholderConfig
{
        fn default() -> Self
        {
                Self {
                        center_x: 0.5,
                        center_y: 0.5,
                        size: 0.6,
                }
        }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig
{
        pub day: String,
        pub night: String,
        pub specular: String,
}

impl Default for TextureConfig
{
        fn default() -> Self
        {
                Self {
                        day: "images/earth-day.jpg".to_string(),
                        night: "images/earth-night.jpg".to_string(),
                        specular: "images/earth-water.jpg".to_string(),
                }
        }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
        pub show_start_message: bool,
        pub show_exit_message: bool,

        /// Prefix prepended to every asset URL.
        pub assets_url: String,

        /// Directory assets are read from on native targets.
        pub assets_root: PathBuf,

        /// Versioned asset manifest produced by the front-end build.
        pub manifest_path: PathBuf,

        pub canvas_id: String,
        pub placeholder_selector: String,
        pub placeholder: PlaceholderConfig,

        /// Trailing-edge debounce for `global:resize`; `0` disables it.
        pub resize_debounce_ms: u64,

        pub frame_mode: FrameMode,
        pub progress_event: String,

        pub camera_distance: f32,
        pub max_pixel_ratio: f32,

        /// Deferred decode steps drained per frame.
        pub tasks_per_frame: usize,

        pub enable_gui: bool,
        pub show_stats: bool,

        pub textures: TextureConfig,
}

impl Default for Config
{
        fn default() -> Self
        {
                Self {
                        show_start_message: true,
                        show_exit_message: true,
                        assets_url: "/".to_string(),
                        assets_root: PathBuf::from("public"),
                        manifest_path: PathBuf::from("public/mix-manifest.json"),
                        canvas_id: "canvas".to_string(),
                        placeholder_selector: ".earth".to_string(),
                        placeholder: PlaceholderConfig::default(),
                        resize_debounce_ms: 0,
                        frame_mode: FrameMode::Ticker,
                        progress_event: "AssetsProgress".to_string(),
                        camera_distance: 4000.0,
                        max_pixel_ratio: 2.0,
                        tasks_per_frame: 1,
                        enable_gui: true,
                        show_stats: true,
                        textures: TextureConfig::default(),
                }
        }
}

impl Config
{
        pub fn from_toml(source: &str) -> anyhow::Result<Self>
        {
                Ok(toml::from_str(source)?)
        }

        /// Reads [`CONFIG_FILE`] (or the path in [`CONFIG_ENV`]).
        ///
        /// The browser build has no file system and always uses the defaults.
        pub fn from_file() -> anyhow::Result<Self>
        {
                #[cfg(target_arch = "wasm32")]
                {
                        Ok(Self::default())
                }

                #[cfg(not(target_arch = "wasm32"))]
                {
                        let path = std::env::var(CONFIG_ENV)
                                .map(PathBuf::from)
                                .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));

                        let source = std::fs::read_to_string(&path)
                                .with_context(|| format!("reading {}", path.display()))?;

                        Self::from_toml(&source).with_context(|| format!("parsing {}", path.display()))
                }
        }

        pub fn resize_debounce(&self) -> Option<instant::Duration>
        {
                (self.resize_debounce_ms > 0)
                        .then(|| instant::Duration::from_millis(self.resize_debounce_ms))
        }

        /// Joins [`Config::assets_url`] and a logical asset path.
        pub fn asset_url(
                &self,
                path: &str,
        ) -> String
        {
                format!(
                        "{}/{}",
                        self.assets_url.trim_end_matches('/'),
                        path.trim_start_matches('/')
                )
        }
}
