use glam::DVec3;
use thiserror::Error;

use crate::{
    plane::Plane,
    polygon::{base_polygon, clip_polygon, dedup_polygon, sort_polygon},
};

#[cfg(test)]
mod tests;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolidError {
    #[error("no face of the solid survived clipping")]
    EmptySolid,
    #[error("the solid is not closed, a vertex lies outside the maximum extent")]
    Unbounded,
    #[error("the solid has no volume")]
    ZeroVolume,
}

/// A closed convex polyhedron built from the intersection of half-spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexSolid {
    vertices: Vec<DVec3>,
    faces: Vec<SolidFace>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidFace {
    /// Index of the plane this face lies on in the builder's plane list.
    pub plane_index: usize,
    pub plane: Plane,
    /// Counter-clockwise when viewed from the front of the plane.
    pub vertex_indices: Vec<usize>,
}

impl ConvexSolid {
    /// Welded vertices shared between faces.
    #[must_use]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Faces in the order of their planes.
    #[must_use]
    pub fn faces(&self) -> &[SolidFace] {
        &self.faces
    }

    pub fn face_vertices<'a>(&'a self, face: &'a SolidFace) -> impl Iterator<Item = DVec3> + 'a {
        face.vertex_indices.iter().map(move |&i| self.vertices[i])
    }

    /// Returns whether the point is inside the solid or within `epsilon` of its surface.
    #[must_use]
    pub fn contains_point(&self, point: DVec3, epsilon: f64) -> bool {
        self.faces
            .iter()
            .all(|f| f.plane.distance_to_point(point) <= epsilon)
    }

    /// Returns the axis-aligned bounding box as `(min, max)`.
    #[must_use]
    pub fn aabb(&self) -> (DVec3, DVec3) {
        let mut min = DVec3::splat(f64::INFINITY);
        let mut max = DVec3::splat(f64::NEG_INFINITY);

        for &vertex in &self.vertices {
            min = min.min(vertex);
            max = max.max(vertex);
        }

        (min, max)
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        let (min, max) = self.aabb();
        (min + max) / 2.0
    }

    /// Signed volume, positive when the faces are wound outwards.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let mut volume = 0.0;

        for face in &self.faces {
            let mut vertices = self.face_vertices(face);
            let first = match vertices.next() {
                Some(v) => v,
                None => continue,
            };
            let mut previous = match vertices.next() {
                Some(v) => v,
                None => continue,
            };

            for vertex in vertices {
                volume += first.dot(previous.cross(vertex));
                previous = vertex;
            }
        }

        volume / 6.0
    }
}

struct FaceBuilder {
    plane_index: usize,
    plane: Plane,
    polygon: Vec<DVec3>,
    vertex_indices: Vec<usize>,
}

impl FaceBuilder {
    fn new(plane_index: usize, plane: Plane, half_size: f64) -> Self {
        Self {
            plane_index,
            plane,
            polygon: base_polygon(&plane, half_size),
            vertex_indices: Vec::new(),
        }
    }

    fn clip_to_planes(&mut self, planes: &[Plane], epsilon: f64) {
        for (i, plane) in planes.iter().enumerate() {
            if i == self.plane_index || plane.abs_diff_eq(&self.plane, epsilon) {
                continue;
            }

            self.polygon = clip_polygon(&self.polygon, plane, epsilon);

            if self.polygon.len() < 3 {
                self.polygon.clear();
                return;
            }
        }

        dedup_polygon(&mut self.polygon, epsilon);
    }

    fn sort_vertices(&mut self) {
        sort_polygon(&mut self.polygon, self.plane.normal, |&v| v);
    }

    fn finish(self) -> SolidFace {
        SolidFace {
            plane_index: self.plane_index,
            plane: self.plane,
            vertex_indices: self.vertex_indices,
        }
    }
}

/// Builds a [`ConvexSolid`] from bounding planes.
///
/// Every plane's normal must point out of the solid. A plane repeating an earlier one
/// within `epsilon` produces no face of its own.
pub struct SolidBuilder<'a> {
    planes: &'a [Plane],
    epsilon: f64,
    max_extent: f64,
    faces: Vec<FaceBuilder>,
    vertices: Vec<DVec3>,
}

impl<'a> SolidBuilder<'a> {
    #[must_use]
    pub fn new(planes: &'a [Plane], epsilon: f64, max_extent: f64) -> Self {
        Self {
            planes,
            epsilon,
            max_extent,
            faces: Vec::new(),
            vertices: Vec::new(),
        }
    }

    fn create_faces(&mut self) {
        // larger than any bounded solid, so clipped seeds that remain this big are detectable
        let half_size = self.max_extent * 4.0;

        for (i, plane) in self.planes.iter().enumerate() {
            if self.planes[..i]
                .iter()
                .any(|p| p.abs_diff_eq(plane, self.epsilon))
            {
                continue;
            }

            self.faces.push(FaceBuilder::new(i, *plane, half_size));
        }
    }

    fn clip_faces(&mut self) {
        for face in &mut self.faces {
            face.clip_to_planes(self.planes, self.epsilon);
        }
    }

    fn remove_invalid_faces(&mut self) {
        self.faces.retain(|face| face.polygon.len() >= 3);
    }

    fn sort_vertices(&mut self) {
        for face in &mut self.faces {
            face.sort_vertices();
        }
    }

    fn weld_vertices(&mut self) {
        let epsilon = self.epsilon;
        let vertices = &mut self.vertices;

        for face in &mut self.faces {
            for &point in &face.polygon {
                // check if the vertex already exists
                let vertex_i = vertices
                    .iter()
                    .position(|v| v.abs_diff_eq(point, epsilon))
                    .unwrap_or_else(|| {
                        vertices.push(point);
                        vertices.len() - 1
                    });

                // welding can collapse neighbouring points of a sliver face
                if face.vertex_indices.last() != Some(&vertex_i)
                    && face.vertex_indices.first() != Some(&vertex_i)
                {
                    face.vertex_indices.push(vertex_i);
                }
            }
        }

        self.faces.retain(|face| face.vertex_indices.len() >= 3);
    }

    fn verify_bounds(&self) -> Result<(), SolidError> {
        if self
            .vertices
            .iter()
            .any(|v| v.abs().max_element() > self.max_extent)
        {
            return Err(SolidError::Unbounded);
        }

        Ok(())
    }

    /// A flat solid has every vertex on one of its face planes.
    fn verify_thickness(&self) -> Result<(), SolidError> {
        let flat = self.faces.iter().any(|face| {
            self.vertices
                .iter()
                .all(|&v| face.plane.distance_to_point(v) >= -self.epsilon)
        });

        if flat {
            return Err(SolidError::ZeroVolume);
        }

        Ok(())
    }

    fn finish(self) -> ConvexSolid {
        ConvexSolid {
            vertices: self.vertices,
            faces: self.faces.into_iter().map(FaceBuilder::finish).collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `Err` if the planes don't enclose a bounded region with non-zero volume.
    pub fn build(mut self) -> Result<ConvexSolid, SolidError> {
        self.create_faces();
        self.clip_faces();
        self.remove_invalid_faces();
        self.sort_vertices();
        self.weld_vertices();

        if self.faces.is_empty() {
            return Err(SolidError::EmptySolid);
        }

        self.verify_bounds()?;
        self.verify_thickness()?;

        Ok(self.finish())
    }
}
