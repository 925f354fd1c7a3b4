use bitflags::bitflags;
use serde::{Serialize, Serializer};

/// A resolved material and the pixel dimensions of its main texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialRef<H> {
    pub handle: H,
    pub width: u32,
    pub height: u32,
}

impl<H> MaterialRef<H> {
    #[must_use]
    pub fn new(handle: H, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }
}

/// Looks up materials by name.
///
/// Conversion only reads from the resolver through `resolve`, which may cache internally.
pub trait MaterialResolver {
    type Handle: Clone;

    /// Returns the first material matching one of `candidates`, or `None` if nothing matches.
    fn resolve(&mut self, candidates: &[&str]) -> Option<MaterialRef<Self::Handle>>;

    /// The material used for names that don't resolve.
    fn default_material(&self) -> MaterialRef<Self::Handle>;
}

/// Replaces `*` with `#`, so `*04water1` is looked up as `#04water1`.
#[must_use]
pub fn normalize_material_name(name: &str) -> String {
    name.replace('*', "#")
}

bitflags! {
    pub struct SurfaceFlags: u8 {
        /// Sky surfaces, a hint for the consumer to leave them out of the final render.
        const EXCLUDE_FROM_FINAL = 1 << 0;
        /// Not rendered, collision only.
        const INVISIBLE = 1 << 1;
        /// Editor-only brush faces such as triggers.
        const SPECIAL = 1 << 2;
    }
}

impl Serialize for SurfaceFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

/// Returns whether the side name marks an editor-only surface.
#[must_use]
pub fn is_special_material(name: &str) -> bool {
    matches!(name, "trigger" | "skip" | "waterskip")
}

/// Flags implied by a side's material name. Names are matched case-sensitively.
///
/// Special surfaces are also invisible if `special_invisible` is set.
#[must_use]
pub fn surface_flags(name: &str, special_invisible: bool) -> SurfaceFlags {
    let mut flags = SurfaceFlags::empty();

    if name.starts_with("sky") {
        flags |= SurfaceFlags::EXCLUDE_FROM_FINAL;
    }

    if name == "clip" {
        flags |= SurfaceFlags::INVISIBLE;
    }

    if is_special_material(name) {
        flags |= SurfaceFlags::SPECIAL;

        if special_invisible {
            flags |= SurfaceFlags::INVISIBLE;
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_normalization() {
        assert_eq!(normalize_material_name("*04water1"), "#04water1");
        assert_eq!(normalize_material_name("*lava*"), "#lava#");
        assert_eq!(normalize_material_name("city2_3"), "city2_3");
    }

    #[test]
    fn flags_from_names() {
        assert_eq!(
            surface_flags("sky4", true),
            SurfaceFlags::EXCLUDE_FROM_FINAL
        );
        assert_eq!(surface_flags("clip", true), SurfaceFlags::INVISIBLE);
        assert_eq!(
            surface_flags("trigger", true),
            SurfaceFlags::SPECIAL | SurfaceFlags::INVISIBLE
        );
        assert_eq!(surface_flags("waterskip", false), SurfaceFlags::SPECIAL);
        assert_eq!(surface_flags("Clip", true), SurfaceFlags::empty());
        assert_eq!(surface_flags("clipboard", true), SurfaceFlags::empty());
        assert_eq!(surface_flags("*04water1", true), SurfaceFlags::empty());
    }

    #[test]
    fn flags_serialize_as_bits() {
        let flags = SurfaceFlags::SPECIAL | SurfaceFlags::INVISIBLE;
        assert_eq!(serde_json::to_string(&flags).unwrap(), "6");
    }
}
