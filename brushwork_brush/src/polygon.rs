use std::f64::consts::PI;

use glam::DVec3;
use itertools::Itertools;

use crate::plane::{Plane, PointClassification};

#[allow(clippy::cast_precision_loss)]
pub(crate) fn polygon_center<I>(polygon: I) -> DVec3
where
    I: Iterator<Item = DVec3> + ExactSizeIterator,
{
    let len = polygon.len() as f64;
    polygon.fold(DVec3::ZERO, |a, b| a + b) / len
}

pub(crate) fn polygon_normal<I>(polygon: I) -> DVec3
where
    I: Clone + Iterator<Item = DVec3> + ExactSizeIterator,
{
    let center = polygon_center(polygon.clone());
    let mut normal = DVec3::ZERO;

    for (a, b) in polygon.circular_tuple_windows() {
        normal += (a - center).cross(b - center);
    }

    normal.normalize_or_zero()
}

/// Right-handed signed angle between vectors, based on a normal vector.
/// Returns an angle between [-PI, PI] radians.
pub(crate) fn signed_angle(n: DVec3, a: DVec3, b: DVec3) -> f64 {
    f64::atan2(a.cross(b).dot(n), a.dot(b))
}

/// Sorts a convex polygon counter-clockwise around `normal`,
/// starting from the first vertex.
pub(crate) fn sort_polygon<T>(polygon: &mut [T], normal: DVec3, get_vert: impl Fn(&T) -> DVec3) {
    if polygon.len() < 3 {
        return;
    }

    let center = polygon_center(polygon.iter().map(&get_vert));
    let reference = get_vert(&polygon[0]) - center;

    let angle = |v: &T| {
        let angle = signed_angle(normal, reference, get_vert(v) - center);
        if angle < 0.0 {
            angle + 2.0 * PI
        } else {
            angle
        }
    };

    polygon.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
}

/// Removes consecutive vertices closer than `epsilon`, including the wrap-around pair.
pub(crate) fn dedup_polygon(polygon: &mut Vec<DVec3>, epsilon: f64) {
    polygon.dedup_by(|a, b| a.abs_diff_eq(*b, epsilon));

    while polygon.len() > 1 {
        match (polygon.first(), polygon.last()) {
            (Some(first), Some(last)) if first.abs_diff_eq(*last, epsilon) => {
                polygon.pop();
            }
            _ => break,
        }
    }
}

/// Clips a convex polygon against a plane, keeping the part behind it.
/// Vertices within `epsilon` of the plane are kept as is.
pub(crate) fn clip_polygon(polygon: &[DVec3], plane: &Plane, epsilon: f64) -> Vec<DVec3> {
    let mut result = Vec::with_capacity(polygon.len() + 1);

    for (&a, &b) in polygon.iter().circular_tuple_windows() {
        let class_a = plane.classify_point(a, epsilon);
        let class_b = plane.classify_point(b, epsilon);

        if class_a != PointClassification::Front {
            result.push(a);
        }

        if matches!(
            (class_a, class_b),
            (PointClassification::Front, PointClassification::Back)
                | (PointClassification::Back, PointClassification::Front)
        ) {
            result.push(plane.intersect_segment(a, b));
        }
    }

    result
}

/// The world axis a plane's tangent frame is built from.
/// Planes facing mostly up or down use the depth axis, everything else uses down.
pub(crate) fn closest_tangent_axis(normal: DVec3) -> DVec3 {
    let abs = normal.abs();

    if abs.y > abs.x && abs.y > abs.z {
        DVec3::Z
    } else {
        -DVec3::Y
    }
}

/// A square lying on the plane, centred on the plane point closest to the origin,
/// wound counter-clockwise around the plane normal.
pub(crate) fn base_polygon(plane: &Plane, half_size: f64) -> Vec<DVec3> {
    let normal = plane.normal;
    let tangent = normal.cross(closest_tangent_axis(normal)).normalize();
    let bitangent = normal.cross(tangent);
    let center = plane.point();

    let tangent = tangent * half_size;
    let bitangent = bitangent * half_size;

    vec![
        center - tangent - bitangent,
        center + tangent - bitangent,
        center + tangent + bitangent,
        center - tangent + bitangent,
    ]
}
