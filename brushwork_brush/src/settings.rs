use glam::DVec3;

use crate::uv::UvFormat;

/// How sides named `trigger`, `skip` or `waterskip` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialMaterials {
    /// Keep the faces, flagged as special and invisible.
    Import,
    /// Build the solid from every side, then drop the special faces.
    SkipFaces,
    /// Skip the whole brush before it is built if its first side is special.
    SkipBrushes,
}

impl SpecialMaterials {
    #[must_use]
    pub fn import(self) -> bool {
        matches!(self, Self::Import)
    }

    #[must_use]
    pub fn skip_faces(self) -> bool {
        matches!(self, Self::SkipFaces)
    }

    #[must_use]
    pub fn skip_brushes(self) -> bool {
        matches!(self, Self::SkipBrushes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelection {
    /// Use the document's valve format flag.
    FromMap,
    Force(UvFormat),
}

impl FormatSelection {
    #[must_use]
    pub fn resolve(self, valve_format: bool) -> UvFormat {
        match self {
            Self::FromMap => UvFormat::from_valve_flag(valve_format),
            Self::Force(format) => format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvSettings {
    /// Added to every standard format rotation, in degrees.
    pub rotation_bias: f64,
    /// Rotate valve220 coordinates by the bias plus the side rotation as well.
    pub valve_rotation_compat: bool,
}

impl Default for UvSettings {
    fn default() -> Self {
        Self {
            rotation_bias: 180.0,
            valve_rotation_compat: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct GeometrySettings {
    /// Shared tolerance for point-on-plane, collinearity and vertex welding,
    /// in output units.
    pub epsilon: f64,
    /// Map units per output unit.
    pub unit_scale: f64,
    /// Local origin in output units, subtracted from every converted point.
    pub origin: DVec3,
    /// Largest absolute output coordinate a bounded solid may have.
    pub max_extent: f64,
    pub uv_format: FormatSelection,
    pub special_materials: SpecialMaterials,
    pub uv: UvSettings,
}

impl GeometrySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn unit_scale(&mut self, unit_scale: f64) {
        self.unit_scale = unit_scale;
    }

    pub fn origin(&mut self, origin: DVec3) {
        self.origin = origin;
    }

    pub fn max_extent(&mut self, max_extent: f64) {
        self.max_extent = max_extent;
    }

    pub fn uv_format(&mut self, uv_format: FormatSelection) {
        self.uv_format = uv_format;
    }

    pub fn special_materials(&mut self, special_materials: SpecialMaterials) {
        self.special_materials = special_materials;
    }

    pub fn uv(&mut self, uv: UvSettings) {
        self.uv = uv;
    }
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            unit_scale: 32.0,
            origin: DVec3::ZERO,
            max_extent: 16384.0,
            uv_format: FormatSelection::FromMap,
            special_materials: SpecialMaterials::Import,
            uv: UvSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selection() {
        assert_eq!(FormatSelection::FromMap.resolve(true), UvFormat::Valve220);
        assert_eq!(FormatSelection::FromMap.resolve(false), UvFormat::Standard);

        let forced = FormatSelection::Force(UvFormat::Standard);
        assert_eq!(forced.resolve(true), UvFormat::Standard);
        assert_eq!(forced.resolve(false), UvFormat::Standard);
    }
}
