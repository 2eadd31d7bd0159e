use cgmath::{Matrix4, SquareMatrix, Vector3};

/// Opaque reference to an object in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind
{
        /// Day/night shaded sphere.
        Globe,
        /// Flat white sphere.
        Marker,
}

/// Draw state of one object; the renderer turns it into uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject
{
        pub kind: ObjectKind,
        pub model: Matrix4<f32>,
        pub sun_direction: Vector3<f32>,
        /// Size of the object on screen in pixels, for the shader.
        pub scale: f32,
        pub visible: bool,
}

impl SceneObject
{
        pub fn new(kind: ObjectKind) -> Self
        {
                Self {
                        kind,
                        model: Matrix4::identity(),
                        sun_direction: Vector3::unit_x(),
                        scale: 1.0,
                        visible: true,
                }
        }
}

/// Flat list of drawable objects, drawn in insertion order.
#[derive(Debug, Default)]
pub struct SceneGraph
{
        objects: Vec<SceneObject>,
}

impl SceneGraph
{
        pub fn new() -> Self
        {
                Self::default()
        }

        pub fn add(
                &mut self,
                kind: ObjectKind,
        ) -> RenderHandle
        {
                self.objects.push(SceneObject::new(kind));
                RenderHandle(self.objects.len() - 1)
        }

        pub fn get(
                &self,
                handle: RenderHandle,
        ) -> Option<&SceneObject>
        {
                self.objects.get(handle.0)
        }

        pub fn get_mut(
                &mut self,
                handle: RenderHandle,
        ) -> Option<&mut SceneObject>
        {
                self.objects.get_mut(handle.0)
        }

        pub fn objects(&self) -> impl Iterator<Item = (RenderHandle, &SceneObject)>
        {
                self.objects.iter().enumerate().map(|(i, object)| (RenderHandle(i), object))
        }

        pub fn len(&self) -> usize
        {
                self.objects.len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.objects.is_empty()
        }
}

/// Per-object uniform block, `@group(1)` in the globe shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform
{
        pub model: [[f32; 4]; 4],
        pub sun_direction: [f32; 4],
        /// `x`: scale, `y`: kind (0 globe, 1 marker).
        pub params: [f32; 4],
}

impl From<&SceneObject> for ObjectUniform
{
        fn from(object: &SceneObject) -> Self
        {
                let kind = match object.kind
                {
                        ObjectKind::Globe => 0.0,
                        ObjectKind::Marker => 1.0,
                };

                Self {
                        model: object.model.into(),
                        sun_direction: object.sun_direction.extend(0.0).into(),
                        params: [object.scale, kind, 0.0, 0.0],
                }
        }
}
