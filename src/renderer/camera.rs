use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};

use crate::input::Viewport;

pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::from_cols(
        cgmath::Vector4::new(1.0, 0.0, 0.0, 0.0),
        cgmath::Vector4::new(0.0, 1.0, 0.0, 0.0),
        cgmath::Vector4::new(0.0, 0.0, 0.5, 0.0),
        cgmath::Vector4::new(0.0, 0.0, 0.5, 1.0),
);

/// Perspective camera on the `+z` axis whose field of view makes one world
/// unit at `z = 0` cover one CSS pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera
{
        pub distance: f32,
        /// Vertical field of view in degrees.
        pub fovy: f32,
        pub aspect: f32,
        pub znear: f32,
        pub zfar: f32,
}

/// Vertical field of view (degrees) that spans `height` pixels at `distance`.
pub fn pixel_fov(
        height: f32,
        distance: f32,
) -> f32
{
        Deg::from(Rad(2.0 * (height / 2.0 / distance).atan())).0
}

impl Camera
{
        pub fn new(
                distance: f32,
                viewport: &Viewport,
        ) -> Self
        {
                let mut camera = Self {
                        distance,
                        fovy: 0.0,
                        aspect: 1.0,
                        znear: 0.1,
                        zfar: 10000.0,
                };

                camera.resize(viewport);
                camera
        }

        pub fn resize(
                &mut self,
                viewport: &Viewport,
        )
        {
                self.fovy = pixel_fov(viewport.height, self.distance);
                self.aspect = viewport.aspect();
        }

        pub fn build_view_projection_matrix(&self) -> Matrix4<f32>
        {
                let view = Matrix4::look_at_rh(
                        Point3::new(0.0, 0.0, self.distance),
                        Point3::new(0.0, 0.0, 0.0),
                        Vector3::unit_y(),
                );

                let proj = cgmath::perspective(Deg(self.fovy), self.aspect, self.znear, self.zfar);

                OPENGL_TO_WGPU_MATRIX * proj * view
        }
}

/// Per-frame values shared by every draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform
{
        pub view_proj: [[f32; 4]; 4],
        /// Drawing buffer size in device pixels.
        pub resolution: [f32; 2],
        pub time: f32,
        pub _padding: f32,
}

impl GlobalUniform
{
        pub fn new(
                camera: &Camera,
                resolution: [f32; 2],
                time: f32,
        ) -> Self
        {
                Self {
                        view_proj: camera.build_view_projection_matrix().into(),
                        resolution,
                        time,
                        _padding: 0.0,
                }
        }
}
