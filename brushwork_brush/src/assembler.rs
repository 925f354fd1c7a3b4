use glam::{DVec3, Vec2, Vec3};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use brushwork_map::{Brush, Side};

use crate::{
    material::{
        is_special_material, normalize_material_name, surface_flags, MaterialRef,
        MaterialResolver, SurfaceFlags,
    },
    plane::{build_plane, MapTransform, Plane, PlaneError},
    settings::GeometrySettings,
    solid::{ConvexSolid, SolidBuilder, SolidError},
    uv::{UvFormat, UvProjector},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrushError {
    #[error("brush has no sides")]
    InvalidSideCount,
    #[error("side {side}: {source}")]
    DegeneratePlane { side: usize, source: PlaneError },
    #[error(transparent)]
    Solid(#[from] SolidError),
    #[error("brush is made of special material `{material}`")]
    Excluded { material: String },
    #[error("every face of the brush is special")]
    AllFacesExcluded,
}

/// Coarse classification of a [`BrushError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    DegeneratePlane,
    EmptySolid,
    InvalidSideCount,
    Excluded,
}

/// Conversion progress of a single brush, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BrushStage {
    Pending,
    PlanesBuilt,
    SolidBuilt,
    /// Every face has texture coordinates. Only built brushes reach this stage.
    UvProjected,
}

impl BrushError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSideCount => ErrorKind::InvalidSideCount,
            Self::DegeneratePlane { .. } => ErrorKind::DegeneratePlane,
            Self::Solid(_) => ErrorKind::EmptySolid,
            Self::Excluded { .. } | Self::AllFacesExcluded => ErrorKind::Excluded,
        }
    }

    /// The last stage the brush completed before it was rejected.
    #[must_use]
    pub fn stage(&self) -> BrushStage {
        match self {
            Self::InvalidSideCount | Self::DegeneratePlane { .. } | Self::Excluded { .. } => {
                BrushStage::Pending
            }
            Self::Solid(_) => BrushStage::PlanesBuilt,
            Self::AllFacesExcluded => BrushStage::SolidBuilt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrushMaterial<H> {
    /// Normalized material name.
    pub name: String,
    pub material: MaterialRef<H>,
    /// `false` if the resolver had no match and the default material is used.
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltFace {
    /// Index of the source side in the brush.
    pub side_index: usize,
    pub normal: Vec3,
    /// Indices into [`BuiltBrush::vertices`], counter-clockwise when viewed from outside.
    pub vertex_indices: Vec<usize>,
    /// One texture coordinate per vertex index.
    pub uvs: Vec<Vec2>,
    pub material_index: usize,
    pub flags: SurfaceFlags,
}

/// A converted brush in local space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltBrush<H> {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<BuiltFace>,
    pub materials: Vec<BrushMaterial<H>>,
    /// Faces left out because of their special material.
    pub excluded_faces: usize,
}

impl<H> BuiltBrush<H> {
    /// A built brush has completed every stage.
    #[must_use]
    pub fn stage(&self) -> BrushStage {
        BrushStage::UvProjected
    }

    #[must_use]
    pub fn material(&self, face: &BuiltFace) -> &BrushMaterial<H> {
        &self.materials[face.material_index]
    }

    pub fn face_vertices<'a>(&'a self, face: &'a BuiltFace) -> impl Iterator<Item = Vec3> + 'a {
        face.vertex_indices.iter().map(move |&i| self.vertices[i])
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_vec3(v: DVec3) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Turns brushes into textured convex solids.
#[derive(Debug, Clone, Copy)]
pub struct BrushConverter<'a> {
    settings: &'a GeometrySettings,
    transform: MapTransform,
    projector: UvProjector,
}

impl<'a> BrushConverter<'a> {
    #[must_use]
    pub fn new(settings: &'a GeometrySettings, format: UvFormat) -> Self {
        Self {
            settings,
            transform: MapTransform::new(settings.unit_scale, settings.origin),
            projector: UvProjector::new(format, settings.unit_scale, settings.uv),
        }
    }

    #[must_use]
    pub fn format(&self) -> UvFormat {
        self.projector.format()
    }

    /// Builds the planes of every side, in side order.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a side's points don't define a plane.
    pub fn build_planes(&self, brush: &Brush) -> Result<Vec<Plane>, BrushError> {
        brush
            .sides
            .iter()
            .enumerate()
            .map(|(side, s)| {
                build_plane(&s.plane, &self.transform, self.settings.epsilon)
                    .map_err(|source| BrushError::DegeneratePlane { side, source })
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns `Err` if the planes don't form a bounded solid with volume.
    pub fn build_solid(&self, planes: &[Plane]) -> Result<ConvexSolid, BrushError> {
        let solid =
            SolidBuilder::new(planes, self.settings.epsilon, self.settings.max_extent).build()?;

        Ok(solid)
    }

    /// Converts a brush, resolving its materials through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the brush is rejected. Nothing is resolved for rejected brushes
    /// unless the solid was built.
    pub fn convert<R: MaterialResolver>(
        &self,
        brush: &Brush,
        resolver: &mut R,
    ) -> Result<BuiltBrush<R::Handle>, BrushError> {
        let first = brush.sides.first().ok_or(BrushError::InvalidSideCount)?;

        if self.settings.special_materials.skip_brushes() && is_special_material(&first.material)
        {
            return Err(BrushError::Excluded {
                material: first.material.clone(),
            });
        }

        let planes = self.build_planes(brush)?;
        let solid = self.build_solid(&planes)?;

        self.finish(brush, &solid, resolver)
    }

    fn finish<R: MaterialResolver>(
        &self,
        brush: &Brush,
        solid: &ConvexSolid,
        resolver: &mut R,
    ) -> Result<BuiltBrush<R::Handle>, BrushError> {
        let special_invisible = self.settings.special_materials.import();
        let skip_special = self.settings.special_materials.skip_faces();

        let mut materials = Vec::new();
        let mut faces = Vec::with_capacity(solid.faces().len());
        let mut excluded_faces = 0;

        for face in solid.faces() {
            let side = &brush.sides[face.plane_index];
            let flags = surface_flags(&side.material, special_invisible);

            if skip_special && flags.contains(SurfaceFlags::SPECIAL) {
                excluded_faces += 1;
                continue;
            }

            let material_index = material_index(&mut materials, side, resolver);
            let material = &materials[material_index].material;

            let uvs = self.projector.project(
                side,
                face.plane.normal,
                solid
                    .face_vertices(face)
                    .map(|v| self.transform.local_to_output(v)),
                material.width,
                material.height,
            );

            faces.push(BuiltFace {
                side_index: face.plane_index,
                normal: to_vec3(face.plane.normal),
                vertex_indices: face.vertex_indices.clone(),
                uvs,
                material_index,
                flags,
            });
        }

        if faces.is_empty() {
            return Err(BrushError::AllFacesExcluded);
        }

        Ok(BuiltBrush {
            vertices: solid.vertices().iter().copied().map(to_vec3).collect(),
            faces,
            materials,
            excluded_faces,
        })
    }
}

/// Returns the index of the side's material in `materials`, resolving it on first use.
fn material_index<R: MaterialResolver>(
    materials: &mut Vec<BrushMaterial<R::Handle>>,
    side: &Side,
    resolver: &mut R,
) -> usize {
    let name = normalize_material_name(&side.material);

    if let Some(i) = materials.iter().position(|m| m.name == name) {
        return i;
    }

    let (material, resolved) = match resolver.resolve(&[name.as_str()]) {
        Some(material) => (material, true),
        None => {
            warn!("material `{}` not found, using default", name);
            (resolver.default_material(), false)
        }
    };

    materials.push(BrushMaterial {
        name,
        material,
        resolved,
    });

    materials.len() - 1
}
