use cgmath::{Vector2, Zero};
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

use super::{PointerKind, Viewport};

/// Window input reduced to what the normalizer consumes, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput
{
        Move
        {
                kind: PointerKind,
                position: Vector2<f32>,
        },
        Down
        {
                kind: PointerKind,
                position: Vector2<f32>,
        },
        Up
        {
                kind: PointerKind,
                position: Vector2<f32>,
        },
        Resize(Viewport),
}

/// Turns winit window events into [`RawInput`].
///
/// Mouse buttons carry no position in winit, so the last cursor position is
/// remembered here.
#[derive(Debug)]
pub struct InputMapper
{
        cursor: Vector2<f32>,
        scale_factor: f64,
}

impl InputMapper
{
        pub fn new(scale_factor: f64) -> Self
        {
                Self {
                        cursor: Vector2::zero(),
                        scale_factor,
                }
        }

        pub fn scale_factor(&self) -> f64
        {
                self.scale_factor
        }

        pub fn map(
                &mut self,
                event: &WindowEvent,
        ) -> Option<RawInput>
        {
                match event
                {
                        WindowEvent::CursorMoved { position, .. } =>
                        {
                                let logical = position.to_logical::<f32>(self.scale_factor);
                                self.cursor = Vector2::new(logical.x, logical.y);

                                Some(RawInput::Move {
                                        kind: PointerKind::Mouse,
                                        position: self.cursor,
                                })
                        }
                        WindowEvent::MouseInput {
                                state,
                                button: MouseButton::Left,
                                ..
                        } =>
                        {
                                let kind = PointerKind::Mouse;
                                let position = self.cursor;

                                Some(match state
                                {
                                        ElementState::Pressed => RawInput::Down { kind, position },
                                        ElementState::Released => RawInput::Up { kind, position },
                                })
                        }
                        WindowEvent::Touch(touch) =>
                        {
                                let logical = touch.location.to_logical::<f32>(self.scale_factor);
                                let kind = PointerKind::Touch;
                                let position = Vector2::new(logical.x, logical.y);

                                Some(match touch.phase
                                {
                                        TouchPhase::Started => RawInput::Down { kind, position },
                                        TouchPhase::Moved => RawInput::Move { kind, position },
                                        TouchPhase::Ended | TouchPhase::Cancelled => RawInput::Up { kind, position },
                                })
                        }
                        WindowEvent::ScaleFactorChanged { scale_factor, .. } =>
                        {
                                self.scale_factor = *scale_factor;
                                None
                        }
                        WindowEvent::Resized(size) =>
                        {
                                let logical = size.to_logical::<f32>(self.scale_factor);

                                Some(RawInput::Resize(Viewport::new(
                                        logical.width,
                                        logical.height,
                                        self.scale_factor as f32,
                                )))
                        }
                        _ => None,
                }
        }
}

#[cfg(test)]
mod tests
{
        use winit::dpi::{PhysicalPosition, PhysicalSize};
        use winit::event::{DeviceId, Touch};

        use super::*;

        fn device() -> DeviceId
        {
                // SAFETY: the id is only compared, never handed back to the platform.
                unsafe { DeviceId::dummy() }
        }

        #[test]
        fn cursor_is_converted_to_logical_pixels()
        {
                let mut mapper = InputMapper::new(2.0);

                let input = mapper.map(&WindowEvent::CursorMoved {
                        device_id: device(),
                        position: PhysicalPosition::new(200.0, 100.0),
                });

                assert_eq!(
                        input,
                        Some(RawInput::Move {
                                kind: PointerKind::Mouse,
                                position: Vector2::new(100.0, 50.0),
                        })
                );
        }

        #[test]
        fn mouse_buttons_use_last_cursor_position()
        {
                let mut mapper = InputMapper::new(1.0);

                mapper.map(&WindowEvent::CursorMoved {
                        device_id: device(),
                        position: PhysicalPosition::new(30.0, 40.0),
                });
                let down = mapper.map(&WindowEvent::MouseInput {
                        device_id: device(),
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                });
                let right = mapper.map(&WindowEvent::MouseInput {
                        device_id: device(),
                        state: ElementState::Pressed,
                        button: MouseButton::Right,
                });

                assert_eq!(
                        down,
                        Some(RawInput::Down {
                                kind: PointerKind::Mouse,
                                position: Vector2::new(30.0, 40.0),
                        })
                );
                assert_eq!(right, None);
        }

        #[test]
        fn touch_phases_map_to_pointer_inputs()
        {
                let mut mapper = InputMapper::new(1.0);
                let touch = |phase| {
                        WindowEvent::Touch(Touch {
                                device_id: device(),
                                phase,
                                location: PhysicalPosition::new(5.0, 6.0),
                                force: None,
                                id: 0,
                        })
                };

                assert!(matches!(
                        mapper.map(&touch(TouchPhase::Started)),
                        Some(RawInput::Down { kind: PointerKind::Touch, .. })
                ));
                assert!(matches!(
                        mapper.map(&touch(TouchPhase::Moved)),
                        Some(RawInput::Move { kind: PointerKind::Touch, .. })
                ));
                assert!(matches!(
                        mapper.map(&touch(TouchPhase::Cancelled)),
                        Some(RawInput::Up { kind: PointerKind::Touch, .. })
                ));
        }

        #[test]
        fn resize_reports_logical_viewport()
        {
                let mut mapper = InputMapper::new(2.0);

                let input = mapper.map(&WindowEvent::Resized(PhysicalSize::new(1600, 1200)));

                assert_eq!(input, Some(RawInput::Resize(Viewport::new(800.0, 600.0, 2.0))));
        }
}
