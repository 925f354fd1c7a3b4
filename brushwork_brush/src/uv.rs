use approx::abs_diff_eq;
use glam::{DVec2, DVec3, Vec2};
use serde::Serialize;
use tracing::warn;

use brushwork_map::Side;

use crate::{plane::remap_axes, settings::UvSettings};

/// Texture projection convention of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UvFormat {
    /// Axis-aligned projection derived from the face normal.
    Standard,
    /// Explicit texture axes stored on every side.
    Valve220,
}

impl UvFormat {
    #[must_use]
    pub fn from_valve_flag(valve_format: bool) -> Self {
        if valve_format {
            Self::Valve220
        } else {
            Self::Standard
        }
    }

    /// Texture size assumed when a material reports no dimensions.
    #[must_use]
    pub fn fallback_texture_size(self) -> u32 {
        match self {
            Self::Standard => 32,
            Self::Valve220 => 256,
        }
    }
}

/// Divides, treating a zero divisor as "no contribution".
#[must_use]
pub fn safe_div(a: f64, b: f64) -> f64 {
    if abs_diff_eq!(b, 0.0) {
        0.0
    } else {
        a / b
    }
}

/// Rotates a texture coordinate clockwise around the origin.
#[must_use]
pub fn rotate_clockwise(point: DVec2, degrees: f64) -> DVec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();

    DVec2::new(
        point.x * cos + point.y * sin,
        -point.x * sin + point.y * cos,
    )
}

/// Wraps a texture offset into `[-size / 2, size / 2)`.
#[must_use]
pub fn wrap_offset(offset: f64, size: f64) -> f64 {
    if abs_diff_eq!(size, 0.0) {
        return 0.0;
    }

    let wrapped = offset.rem_euclid(size);

    if wrapped >= size / 2.0 {
        wrapped - size
    } else {
        wrapped
    }
}

/// Projection axes for the standard format, chosen by the dominant component of the normal.
/// Ties prefer Y, then X.
///
/// The axes point against the positive coordinate axes, the default 180° rotation bias
/// brings them back.
#[must_use]
pub fn standard_axes(normal: DVec3) -> (DVec3, DVec3) {
    let abs = normal.abs();

    if abs.y >= abs.x && abs.y >= abs.z {
        (-DVec3::X, -DVec3::Z)
    } else if abs.x >= abs.z {
        (-DVec3::Z, -DVec3::Y)
    } else {
        (-DVec3::X, -DVec3::Y)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_vec2(v: DVec2) -> Vec2 {
    Vec2::new(v.x as f32, v.y as f32)
}

/// Computes per-vertex texture coordinates of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvProjector {
    format: UvFormat,
    unit_scale: f64,
    settings: UvSettings,
}

impl UvProjector {
    #[must_use]
    pub fn new(format: UvFormat, unit_scale: f64, settings: UvSettings) -> Self {
        Self {
            format,
            unit_scale,
            settings,
        }
    }

    #[must_use]
    pub fn format(&self) -> UvFormat {
        self.format
    }

    /// Texture size in pixels, replacing missing dimensions with the format's fallback.
    #[must_use]
    pub fn texture_size(&self, width: u32, height: u32) -> DVec2 {
        let fallback = self.format.fallback_texture_size();
        let width = if width == 0 { fallback } else { width };
        let height = if height == 0 { fallback } else { height };

        DVec2::new(f64::from(width), f64::from(height))
    }

    /// Projects `positions` of a face lying on a plane with `normal`.
    /// Coordinates are produced in the order of `positions`.
    pub fn project(
        &self,
        side: &Side,
        normal: DVec3,
        positions: impl IntoIterator<Item = DVec3>,
        width: u32,
        height: u32,
    ) -> Vec<Vec2> {
        let size = self.texture_size(width, height);

        match (self.format, side.uv_axes) {
            (UvFormat::Valve220, Some(axes)) => {
                self.project_valve(side, axes.u, axes.v, positions, size)
            }
            (UvFormat::Valve220, None) => {
                warn!(
                    "side with material `{}` has no texture axes, using standard projection",
                    side.material
                );
                self.project_standard(side, normal, positions, size)
            }
            (UvFormat::Standard, _) => self.project_standard(side, normal, positions, size),
        }
    }

    fn project_standard(
        &self,
        side: &Side,
        normal: DVec3,
        positions: impl IntoIterator<Item = DVec3>,
        size: DVec2,
    ) -> Vec<Vec2> {
        let (u_axis, v_axis) = standard_axes(normal);
        let rotation = side.rotation + self.settings.rotation_bias;
        let offset = DVec2::new(
            safe_div(side.offset.x, size.x),
            safe_div(-side.offset.y, size.y),
        );

        positions
            .into_iter()
            .map(|position| {
                let raw = DVec2::new(position.dot(u_axis), position.dot(v_axis)) * self.unit_scale
                    / size;
                let rotated = rotate_clockwise(raw, rotation);
                let scaled = DVec2::new(
                    safe_div(rotated.x, side.scale.x),
                    safe_div(rotated.y, side.scale.y),
                );

                to_vec2(scaled + offset)
            })
            .collect()
    }

    fn project_valve(
        &self,
        side: &Side,
        u: DVec3,
        v: DVec3,
        positions: impl IntoIterator<Item = DVec3>,
        size: DVec2,
    ) -> Vec<Vec2> {
        let scale_u = size.x * side.scale.x / self.unit_scale;
        let scale_v = size.y * side.scale.y / self.unit_scale;

        let u_vector = remap_axes(u);
        let v_vector = remap_axes(v);
        let u_vector = DVec3::new(
            safe_div(u_vector.x, scale_u),
            safe_div(u_vector.y, scale_u),
            safe_div(u_vector.z, scale_u),
        );
        let v_vector = DVec3::new(
            safe_div(v_vector.x, scale_v),
            safe_div(v_vector.y, scale_v),
            safe_div(v_vector.z, scale_v),
        );

        let u_offset = wrap_offset(side.offset.x, size.x) / size.x;
        let v_offset = wrap_offset(side.offset.y, size.y) / size.y;

        positions
            .into_iter()
            .map(|position| {
                let mut uv = DVec2::new(
                    position.dot(u_vector) + u_offset,
                    -(position.dot(v_vector) + v_offset),
                );

                if self.settings.valve_rotation_compat {
                    uv = rotate_clockwise(uv, self.settings.rotation_bias + side.rotation);
                }

                to_vec2(uv)
            })
            .collect()
    }
}
