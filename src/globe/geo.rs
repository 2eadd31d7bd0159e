use cgmath::{Deg, InnerSpace, Rad, Vector2, Vector3};

/// Point on a sphere of `radius` for a latitude/longitude in degrees.
///
/// Polar angle is `90° - lat` and azimuth is `lng`, measured from `+z`
/// towards `+x`, so null island lands on `(0, 0, radius)`.
pub fn lat_lng_to_vec3(
        radius: f32,
        lat: f32,
        lng: f32,
) -> Vector3<f32>
{
        let phi = Rad::from(Deg(90.0 - lat)).0;
        let theta = Rad::from(Deg(lng)).0;

        Vector3::new(radius * phi.sin() * theta.sin(), radius * phi.cos(), radius * phi.sin() * theta.cos())
}

/// Inverse of [`lat_lng_to_vec3`], in degrees.
pub fn vec3_to_lat_lng(position: Vector3<f32>) -> (f32, f32)
{
        let radius = position.magnitude();

        if radius == 0.0
        {
                return (0.0, 0.0);
        }

        let phi = (position.y / radius).clamp(-1.0, 1.0).acos();
        let lat = 90.0 - Deg::from(Rad(phi)).0;
        let lng = Deg::from(Rad(position.x.atan2(position.z))).0;

        (lat, lng)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation
{
        pub name: &'static str,
        pub lat: f32,
        pub lng: f32,

        /// On the unit sphere.
        pub position: Vector3<f32>,

        /// Longitude only, latitude zeroed.
        pub lng_vec3: Vector3<f32>,

        /// Latitude only, longitude zeroed.
        pub lat_vec3: Vector3<f32>,
}

impl GeoLocation
{
        pub fn new(
                name: &'static str,
                lat: f32,
                lng: f32,
        ) -> Self
        {
                Self {
                        name,
                        lat,
                        lng,
                        position: lat_lng_to_vec3(1.0, lat, lng),
                        lng_vec3: lat_lng_to_vec3(1.0, 0.0, lng),
                        lat_vec3: lat_lng_to_vec3(1.0, lat, 0.0),
                }
        }

        /// Globe rotation (x = pitch, y = yaw) that brings this location to
        /// where `reference` sits.
        pub fn angles_from(
                &self,
                reference: &GeoLocation,
        ) -> Vector2<f32>
        {
                let yaw = reference.lng_vec3.angle(self.lng_vec3).0;
                let pitch = reference.lat_vec3.angle(self.lat_vec3).0;

                Vector2::new(
                        if self.lat < 0.0 { -pitch } else { pitch },
                        if self.lng > 0.0 { -yaw } else { yaw },
                )
        }
}

pub const NULL_ISLAND: &str = "nullIsland";

/// Locations shown on the globe, reference point first.
pub fn default_locations() -> Vec<GeoLocation>
{
        vec![
                GeoLocation::new(NULL_ISLAND, 0.0, 0.0),
                GeoLocation::new("london", 51.5074, -0.1278),
                GeoLocation::new("connecticut", 41.6032, -73.0877),
                GeoLocation::new("sydney", -33.8688, 151.2093),
        ]
}

#[cfg(test)]
mod tests
{
        use cgmath::{Matrix3, Rad};

        use super::*;

        fn close(
                a: f32,
                b: f32,
        ) -> bool
        {
                (a - b).abs() < 1e-3
        }

        #[test]
        fn null_island_faces_the_camera()
        {
                let p = lat_lng_to_vec3(1.0, 0.0, 0.0);

                assert!(close(p.x, 0.0) && close(p.y, 0.0) && close(p.z, 1.0), "{p:?}");
        }

        #[test]
        fn poles_and_meridians()
        {
                let north = lat_lng_to_vec3(2.0, 90.0, 0.0);
                let east = lat_lng_to_vec3(1.0, 0.0, 90.0);

                assert!(close(north.y, 2.0));
                assert!(close(east.x, 1.0) && close(east.z, 0.0));
        }

        #[test]
        fn round_trips_every_location()
        {
                for location in default_locations()
                {
                        let (lat, lng) = vec3_to_lat_lng(lat_lng_to_vec3(1.02, location.lat, location.lng));

                        assert!(close(lat, location.lat), "{} lat {lat}", location.name);
                        assert!(close(lng, location.lng), "{} lng {lng}", location.name);
                }
        }

        #[test]
        fn angle_signs_follow_hemispheres()
        {
                let locations = default_locations();
                let reference = &locations[0];

                let london = locations[1].angles_from(reference);
                let sydney = locations[3].angles_from(reference);

                assert!(close(london.x, Rad::from(Deg(51.5074)).0));
                assert!(london.y > 0.0);
                assert!(sydney.x < 0.0);
                assert!(sydney.y < 0.0);
        }

        #[test]
        fn rotating_by_the_angles_brings_a_location_to_the_front()
        {
                let locations = default_locations();

                for location in &locations[1..]
                {
                        let angles = location.angles_from(&locations[0]);
                        let rotation = Matrix3::from_angle_x(Rad(angles.x)) * Matrix3::from_angle_y(Rad(angles.y));
                        let front = rotation * location.position;

                        assert!(close(front.x, 0.0) && close(front.y, 0.0) && close(front.z, 1.0), "{}: {front:?}", location.name);
                }
        }
}
