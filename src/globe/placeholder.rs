use crate::config::PlaceholderConfig;
use crate::input::Viewport;

/// Bounding box in viewport pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect
{
        pub x: f32,
        pub y: f32,
        pub width: f32,
        pub height: f32,
}

/// The page element whose box the globe is drawn over.
pub trait Placeholder
{
        fn bounding_rect(
                &self,
                viewport: &Viewport,
        ) -> Option<Rect>;
}

/// Square centered at a fraction of the viewport, sized against its
/// shorter side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalPlaceholder
{
        pub config: PlaceholderConfig,
}

impl Placeholder for FractionalPlaceholder
{
        fn bounding_rect(
                &self,
                viewport: &Viewport,
        ) -> Option<Rect>
        {
                let side = self.config.size * viewport.width.min(viewport.height);

                Some(Rect {
                        x: self.config.center_x * viewport.width - side / 2.0,
                        y: self.config.center_y * viewport.height - side / 2.0,
                        width: side,
                        height: side,
                })
        }
}

/// First element matching a CSS selector.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct DomPlaceholder
{
        pub selector: String,
}

#[cfg(target_arch = "wasm32")]
impl Placeholder for DomPlaceholder
{
        fn bounding_rect(
                &self,
                _viewport: &Viewport,
        ) -> Option<Rect>
        {
                let element = web_sys::window()?.document()?.query_selector(&self.selector).ok()??;
                let rect = element.get_bounding_client_rect();

                Some(Rect {
                        x: rect.x() as f32,
                        y: rect.y() as f32,
                        width: rect.width() as f32,
                        height: rect.height() as f32,
                })
        }
}

/// The placeholder for the current target.
pub fn from_config(config: &crate::config::Config) -> Box<dyn Placeholder>
{
        #[cfg(target_arch = "wasm32")]
        {
                Box::new(DomPlaceholder {
                        selector: config.placeholder_selector.clone(),
                })
        }

        #[cfg(not(target_arch = "wasm32"))]
        Box::new(FractionalPlaceholder {
                config: config.placeholder,
        })
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn fractional_box_is_square_and_centered()
        {
                let placeholder = FractionalPlaceholder {
                        config: PlaceholderConfig {
                                center_x: 0.5,
                                center_y: 0.5,
                                size: 0.5,
                        },
                };

                let rect = placeholder.bounding_rect(&Viewport::new(1000.0, 600.0, 1.0)).unwrap();

                assert_eq!(
                        rect,
                        Rect {
                                x: 350.0,
                                y: 150.0,
                                width: 300.0,
                                height: 300.0,
                        }
                );
        }
}
