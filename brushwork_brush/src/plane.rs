use approx::abs_diff_eq;
use glam::DVec3;
use thiserror::Error;

use brushwork_map::PlanePoints;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlaneError {
    #[error("plane points are collinear")]
    Degenerate,
}

/// Converts map coordinates into output space.
///
/// Map files are Z-up, output is Y-up: the Y and Z components are swapped,
/// then the point is scaled down to output units and moved relative to the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTransform {
    pub unit_scale: f64,
    pub origin: DVec3,
}

impl MapTransform {
    #[must_use]
    pub fn new(unit_scale: f64, origin: DVec3) -> Self {
        Self { unit_scale, origin }
    }

    #[must_use]
    pub fn point_to_local(&self, point: DVec3) -> DVec3 {
        remap_axes(point) / self.unit_scale - self.origin
    }

    /// Inverse of [`Self::point_to_local`] without the axis remap,
    /// ie. the position in the converted map frame.
    #[must_use]
    pub fn local_to_output(&self, point: DVec3) -> DVec3 {
        point + self.origin
    }
}

#[must_use]
pub fn remap_axes(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.z, v.y)
}

/// A plane defined by a unit normal and its distance from the origin along the normal.
///
/// Points with `normal.dot(p) < distance` are behind the plane, ie. inside the half-space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub distance: f64,
}

impl Plane {
    /// Builds the plane through three points.
    /// The normal points towards the side from which `a`, `b`, `c` appear counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the points are collinear within `epsilon`, measured as the sine of
    /// the angle between the two edges so the test does not depend on the point spacing.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3, epsilon: f64) -> Result<Self, PlaneError> {
        let ab = b - a;
        let ac = c - a;
        let cross = ab.cross(ac);
        let length = cross.length();

        if length <= epsilon * ab.length() * ac.length() || !length.is_finite() {
            return Err(PlaneError::Degenerate);
        }

        let normal = cross / length;

        Ok(Self {
            normal,
            distance: normal.dot(a),
        })
    }

    /// `normal` must be normalized.
    #[must_use]
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// The point on the plane closest to the origin.
    #[must_use]
    pub fn point(&self) -> DVec3 {
        self.normal * self.distance
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Positive in front of the plane, negative behind it.
    #[must_use]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.distance
    }

    #[must_use]
    pub fn classify_point(&self, point: DVec3, epsilon: f64) -> PointClassification {
        let distance = self.distance_to_point(point);

        if distance > epsilon {
            PointClassification::Front
        } else if distance < -epsilon {
            PointClassification::Back
        } else {
            PointClassification::OnPlane
        }
    }

    /// Intersection of the plane and the line through `a` and `b`.
    /// The points should be on opposite sides of the plane.
    #[must_use]
    pub fn intersect_segment(&self, a: DVec3, b: DVec3) -> DVec3 {
        let distance_a = self.distance_to_point(a);
        let distance_b = self.distance_to_point(b);
        let factor = distance_a / (distance_a - distance_b);

        a + (b - a) * factor
    }

    #[must_use]
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.distance_to_point(point)
    }

    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.normal.abs_diff_eq(other.normal, epsilon)
            && abs_diff_eq!(self.distance, other.distance, epsilon = epsilon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Front,
    Back,
    OnPlane,
}

/// Builds a side's plane in output space from its three defining map points.
///
/// # Errors
///
/// Returns `Err` if the points are collinear after the transform.
pub fn build_plane(
    points: &PlanePoints,
    transform: &MapTransform,
    epsilon: f64,
) -> Result<Plane, PlaneError> {
    Plane::from_points(
        transform.point_to_local(points.0),
        transform.point_to_local(points.1),
        transform.point_to_local(points.2),
        epsilon,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_creation() {
        let plane = Plane::from_points(
            DVec3::new(-1.0, 0.0, 0.0),
            DVec3::new(0.0, 3.0, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            1e-4,
        )
        .unwrap();

        let normal = DVec3::new(6.0, -2.0, -3.0).normalize();
        assert_relative_eq!(plane.normal, normal, epsilon = 1e-9);
        assert_relative_eq!(plane.distance, -6.0 / 7.0, epsilon = 1e-9);
        assert_relative_eq!(plane.normal.length(), 1.0, epsilon = 1e-12);

        let distance = plane.distance_to_point(DVec3::new(0.0, -2.0, 0.0));
        assert_relative_eq!(distance, 10.0 / 7.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_are_rejected() {
        assert_eq!(
            Plane::from_points(
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(3.0, 3.0, 3.0),
                1e-4,
            ),
            Err(PlaneError::Degenerate)
        );

        assert_eq!(
            Plane::from_points(DVec3::ONE, DVec3::ONE, DVec3::X, 1e-4),
            Err(PlaneError::Degenerate)
        );
    }

    #[test]
    fn collinearity_does_not_depend_on_unit_scale() {
        let points = PlanePoints(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
        );

        for unit_scale in [1.0, 32.0, 128.0, 1024.0] {
            let transform = MapTransform::new(unit_scale, DVec3::ZERO);
            let plane = build_plane(&points, &transform, 1e-4).unwrap();
            assert_relative_eq!(plane.normal, -DVec3::X, epsilon = 1e-9);
        }

        let transform = MapTransform::new(128.0, DVec3::ZERO);
        let collinear = PlanePoints(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, 512.0, 0.0),
        );
        assert_eq!(
            build_plane(&collinear, &transform, 1e-4),
            Err(PlaneError::Degenerate)
        );
    }

    #[test]
    fn map_points_become_outward_planes() {
        let transform = MapTransform::new(32.0, DVec3::ZERO);

        // top face of a brush reaching up to z = 64 in map space
        let top = build_plane(
            &PlanePoints(
                DVec3::new(64.0, 64.0, 64.0),
                DVec3::new(64.0, 65.0, 64.0),
                DVec3::new(65.0, 64.0, 64.0),
            ),
            &transform,
            1e-4,
        )
        .unwrap();

        assert_relative_eq!(top.normal, DVec3::Y, epsilon = 1e-9);
        assert_relative_eq!(top.distance, 2.0, epsilon = 1e-9);

        // the -x face
        let side = build_plane(
            &PlanePoints(
                DVec3::new(-64.0, -64.0, -16.0),
                DVec3::new(-64.0, -63.0, -16.0),
                DVec3::new(-64.0, -64.0, -15.0),
            ),
            &transform,
            1e-4,
        )
        .unwrap();

        assert_relative_eq!(side.normal, -DVec3::X, epsilon = 1e-9);
        assert_relative_eq!(side.distance, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn local_origin_is_applied_after_scaling() {
        let transform = MapTransform::new(32.0, DVec3::new(0.5, 0.5, 0.5));

        assert_relative_eq!(
            transform.point_to_local(DVec3::new(32.0, 64.0, 96.0)),
            DVec3::new(0.5, 2.5, 1.5),
        );
        assert_relative_eq!(
            transform.local_to_output(DVec3::new(0.5, 2.5, 1.5)),
            DVec3::new(1.0, 3.0, 2.0),
        );
    }

    #[test]
    fn point_classification_and_intersection() {
        let plane = Plane::from_point_normal(DVec3::new(0.0, 1.0, 0.0), DVec3::Y);

        assert_eq!(
            plane.classify_point(DVec3::new(5.0, 2.0, 0.0), 1e-4),
            PointClassification::Front
        );
        assert_eq!(
            plane.classify_point(DVec3::new(5.0, 0.0, 0.0), 1e-4),
            PointClassification::Back
        );
        assert_eq!(
            plane.classify_point(DVec3::new(5.0, 1.000_01, -3.0), 1e-4),
            PointClassification::OnPlane
        );

        let point = plane.intersect_segment(DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 4.0, 0.0));
        assert_relative_eq!(point, DVec3::new(0.5, 1.0, 0.0), epsilon = 1e-12);

        assert_relative_eq!(
            plane.project_point(DVec3::new(3.0, -4.0, 1.0)),
            DVec3::new(3.0, 1.0, 1.0),
        );
        assert!(plane.flipped().flipped().abs_diff_eq(&plane, 1e-12));
    }
}
