use cgmath::{Vector2, Zero};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport
{
        /// Logical width in CSS pixels.
        pub width: f32,
        /// Logical height in CSS pixels.
        pub height: f32,
        pub dpr: f32,
}

impl Default for Viewport
{
        fn default() -> Self
        {
                Self {
                        width: 0.0,
                        height: 0.0,
                        dpr: 1.0,
                }
        }
}

impl Viewport
{
        pub fn new(
                width: f32,
                height: f32,
                dpr: f32,
        ) -> Self
        {
                Self { width, height, dpr }
        }

        pub fn aspect(&self) -> f32
        {
                if self.height > 0.0 { self.width / self.height } else { 1.0 }
        }

        /// Device pixel ratio capped at `max`.
        pub fn pixel_ratio(
                &self,
                max: f32,
        ) -> f32
        {
                self.dpr.min(max)
        }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind
{
        Mouse,
        Touch,
}

/// Last known pointer position in three coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState
{
        pub kind: PointerKind,

        /// Client coordinates, origin top-left.
        pub position: Vector2<f32>,

        /// Centered on the viewport, y up, in pixels.
        pub gl: Vector2<f32>,

        /// Centered on the viewport, y up, in `[-1, 1]`.
        pub gl_normalized: Vector2<f32>,

        pub is_dragging: bool,
}

impl Default for PointerState
{
        fn default() -> Self
        {
                Self {
                        kind: PointerKind::Mouse,
                        position: Vector2::zero(),
                        gl: Vector2::zero(),
                        gl_normalized: Vector2::zero(),
                        is_dragging: false,
                }
        }
}

impl PointerState
{
        pub fn update(
                &mut self,
                kind: PointerKind,
                position: Vector2<f32>,
                viewport: &Viewport,
        )
        {
                self.kind = kind;
                self.position = position;

                self.gl = Vector2::new(position.x - viewport.width / 2.0, -position.y + viewport.height / 2.0);

                self.gl_normalized = if viewport.width > 0.0 && viewport.height > 0.0
                {
                        Vector2::new(
                                (position.x / viewport.width) * 2.0 - 1.0,
                                -(position.y / viewport.height) * 2.0 + 1.0,
                        )
                }
                else
                {
                        Vector2::zero()
                };
        }
}

/// Start and previous-event coordinates of the drag in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragSession
{
        pub x: f32,
        pub y: f32,
        pub px: f32,
        pub py: f32,
}

impl DragSession
{
        pub fn start(position: Vector2<f32>) -> Self
        {
                Self {
                        x: position.x,
                        y: position.y,
                        px: position.x,
                        py: position.y,
                }
        }

        pub fn delta(
                &self,
                position: Vector2<f32>,
        ) -> DragDelta
        {
                DragDelta {
                        delta_x: position.x - self.px,
                        delta_y: position.y - self.py,
                        start_x: self.x,
                        start_y: self.y,
                }
        }

        pub fn advance(
                &mut self,
                position: Vector2<f32>,
        )
        {
                self.px = position.x;
                self.py = position.y;
        }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragDelta
{
        pub delta_x: f32,
        pub delta_y: f32,
        pub start_x: f32,
        pub start_y: f32,
}

/// Window and pointer state shared by everything that reacts to input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputStore
{
        pub viewport: Viewport,
        pub pointer: PointerState,
        pub is_touch: bool,

        /// Current value of the `--vh` custom property.
        pub vh: String,
}

impl InputStore
{
        pub fn new(viewport: Viewport) -> Self
        {
                Self {
                        viewport,
                        vh: format!("{}px", viewport.height),
                        ..Self::default()
                }
        }
}
