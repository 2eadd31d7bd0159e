//! The interactive globe: location markers, look-at animation and
//! alignment with its page placeholder.

pub mod geo;
pub mod placeholder;

use std::cell::RefCell;
use std::rc::Rc;

use cgmath::{Matrix4, Rad, Vector2, Vector3, Zero};

pub use geo::{GeoLocation, NULL_ISLAND, default_locations, lat_lng_to_vec3, vec3_to_lat_lng};
pub use placeholder::{Placeholder, Rect};

use crate::input::Viewport;
use crate::renderer::scene::{ObjectKind, RenderHandle, SceneGraph};
use crate::tween::{Ease, EaseDirection, TweenEngine, TweenVars};

pub const RADIUS: f32 = 1.0;

/// Markers float slightly above the surface.
pub const MARKER_ALTITUDE: f32 = RADIUS * 1.02;

pub const MARKER_RADIUS: f32 = RADIUS * 0.02;

pub const LOOK_DURATION: f64 = 1.0;

pub const LOOK_EASE: Ease = Ease::Expo(EaseDirection::Out);

#[derive(Debug, Clone)]
pub struct Marker
{
        pub location: &'static str,
        pub handle: RenderHandle,
        /// In globe space.
        pub position: Vector3<f32>,
}

#[derive(Debug)]
pub struct Globe
{
        handle: RenderHandle,
        locations: Vec<GeoLocation>,
        markers: Vec<Marker>,
        current_location: Option<&'static str>,

        /// Tweened pitch (x) and yaw (y).
        base_rotation: Rc<RefCell<Vector2<f32>>>,
        rotation: Vector2<f32>,

        sun_direction: Vector3<f32>,
        scale: Vector3<f32>,
        position: Vector2<f32>,
}

impl Globe
{
        /// Adds the globe and one marker per location to `graph`.
        pub fn new(graph: &mut SceneGraph) -> Self
        {
                let handle = graph.add(ObjectKind::Globe);
                let locations = default_locations();

                let markers = locations
                        .iter()
                        .map(|location| Marker {
                                location: location.name,
                                handle: graph.add(ObjectKind::Marker),
                                position: lat_lng_to_vec3(MARKER_ALTITUDE, location.lat, location.lng),
                        })
                        .collect();

                let globe = Self {
                        handle,
                        locations,
                        markers,
                        current_location: None,
                        base_rotation: Rc::new(RefCell::new(Vector2::zero())),
                        rotation: Vector2::zero(),
                        sun_direction: Vector3::unit_x(),
                        scale: Vector3::new(1.0, 1.0, 1.0),
                        position: Vector2::zero(),
                };

                globe.sync(graph);
                globe
        }

        pub fn handle(&self) -> RenderHandle
        {
                self.handle
        }

        pub fn locations(&self) -> &[GeoLocation]
        {
                &self.locations
        }

        pub fn location(
                &self,
                name: &str,
        ) -> Option<&GeoLocation>
        {
                self.locations.iter().find(|location| location.name == name)
        }

        pub fn markers(&self) -> &[Marker]
        {
                &self.markers
        }

        pub fn current_location(&self) -> Option<&'static str>
        {
                self.current_location
        }

        pub fn base_rotation(&self) -> Vector2<f32>
        {
                *self.base_rotation.borrow()
        }

        pub fn rotation(&self) -> Vector2<f32>
        {
                self.rotation
        }

        pub fn sun_direction(&self) -> Vector3<f32>
        {
                self.sun_direction
        }

        pub fn scale(&self) -> Vector3<f32>
        {
                self.scale
        }

        pub fn position(&self) -> Vector2<f32>
        {
                self.position
        }

        /// Turns the globe so `name` faces the camera.
        ///
        /// Returns `Ok(false)` without touching the running animation when
        /// `name` is already the current location.
        pub fn animate_to_location(
                &mut self,
                name: &str,
                tweens: &TweenEngine,
        ) -> anyhow::Result<bool>
        {
                if self.current_location == Some(name)
                {
                        return Ok(false);
                }

                let (reference, target) = match (self.location(NULL_ISLAND), self.location(name))
                {
                        (Some(reference), Some(target)) => (reference, target),
                        (_, None) => anyhow::bail!("Unknown location `{name}`"),
                        (None, _) => anyhow::bail!("Reference location `{NULL_ISLAND}` is missing"),
                };

                let angles = target.angles_from(reference);
                let target_name = target.name;

                tweens.to(
                        &self.base_rotation,
                        TweenVars {
                                x: Some(angles.x),
                                y: Some(angles.y),
                        },
                        LOOK_DURATION,
                        LOOK_EASE,
                );

                log::info!("Globe: turning to {target_name}");
                self.current_location = Some(target_name);

                Ok(true)
        }

        /// Moves the sun and applies the current base rotation.
        pub fn on_frame(
                &mut self,
                time: f64,
                graph: &mut SceneGraph,
        )
        {
                let angle = (time * 0.1) as f32;
                self.sun_direction = Vector3::new(angle.cos(), 0.0, angle.sin());
                self.rotation = self.base_rotation();

                self.sync(graph);
        }

        /// Matches size and position to the placeholder box.
        ///
        /// The sphere is sized by radius, so half the box is used.
        pub fn on_resize(
                &mut self,
                rect: Rect,
                viewport: &Viewport,
                graph: &mut SceneGraph,
        )
        {
                let width = rect.width / 2.0;
                let height = rect.height / 2.0;
                self.scale = Vector3::new(width, height, width);

                self.position = Vector2::new(
                        -(viewport.width / 2.0) + rect.x + rect.width / 2.0,
                        viewport.height / 2.0 - rect.y - rect.height / 2.0,
                );

                self.sync(graph);
        }

        pub fn model_matrix(&self) -> Matrix4<f32>
        {
                Matrix4::from_translation(Vector3::new(self.position.x, self.position.y, 0.0))
                        * Matrix4::from_angle_x(Rad(self.rotation.x))
                        * Matrix4::from_angle_y(Rad(self.rotation.y))
                        * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
        }

        fn sync(
                &self,
                graph: &mut SceneGraph,
        )
        {
                let model = self.model_matrix();

                if let Some(object) = graph.get_mut(self.handle)
                {
                        object.model = model;
                        object.sun_direction = self.sun_direction;
                        object.scale = self.scale.x;
                }

                for marker in &self.markers
                {
                        if let Some(object) = graph.get_mut(marker.handle)
                        {
                                object.model = model
                                        * Matrix4::from_translation(marker.position)
                                        * Matrix4::from_scale(MARKER_RADIUS);
                        }
                }
        }
}
