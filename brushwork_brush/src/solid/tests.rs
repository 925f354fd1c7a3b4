use super::*;
use crate::polygon::polygon_normal;
use approx::{assert_relative_eq, relative_eq};

fn box_planes(min: DVec3, max: DVec3) -> Vec<Plane> {
    vec![
        Plane::from_point_normal(min, -DVec3::X),
        Plane::from_point_normal(max, DVec3::X),
        Plane::from_point_normal(min, -DVec3::Y),
        Plane::from_point_normal(max, DVec3::Y),
        Plane::from_point_normal(min, -DVec3::Z),
        Plane::from_point_normal(max, DVec3::Z),
    ]
}

fn build(planes: &[Plane]) -> Result<ConvexSolid, SolidError> {
    SolidBuilder::new(planes, 1e-4, 16384.0).build()
}

fn assert_same_points(a: &[DVec3], b: &[DVec3]) {
    assert_eq!(a.len(), b.len(), "point counts differ");

    for point in a {
        assert!(
            b.iter().any(|p| relative_eq!(p, point, epsilon = 1e-6)),
            "unexpected point {}",
            point
        );
    }
}

fn assert_faces_wound_outwards(solid: &ConvexSolid) {
    for face in solid.faces() {
        let normal = polygon_normal(solid.face_vertices(face).collect::<Vec<_>>().into_iter());
        assert_relative_eq!(normal, face.plane.normal, epsilon = 1e-6);
    }
}

#[test]
fn box_building() {
    let min = DVec3::new(-2.0, -1.0, -2.0);
    let max = DVec3::new(2.0, 1.0, 2.0);
    let solid = build(&box_planes(min, max)).unwrap();

    assert_same_points(
        solid.vertices(),
        &[
            DVec3::new(-2.0, -1.0, -2.0),
            DVec3::new(-2.0, -1.0, 2.0),
            DVec3::new(-2.0, 1.0, -2.0),
            DVec3::new(-2.0, 1.0, 2.0),
            DVec3::new(2.0, -1.0, -2.0),
            DVec3::new(2.0, -1.0, 2.0),
            DVec3::new(2.0, 1.0, -2.0),
            DVec3::new(2.0, 1.0, 2.0),
        ],
    );

    assert_eq!(solid.faces().len(), 6);
    for (i, face) in solid.faces().iter().enumerate() {
        assert_eq!(face.plane_index, i);
        assert_eq!(face.vertex_indices.len(), 4, "face {} is not a quad", i);
    }

    assert_faces_wound_outwards(&solid);
    assert_relative_eq!(solid.volume(), 32.0, epsilon = 1e-6);

    let (aabb_min, aabb_max) = solid.aabb();
    assert_relative_eq!(aabb_min, min, epsilon = 1e-6);
    assert_relative_eq!(aabb_max, max, epsilon = 1e-6);
    assert_relative_eq!(solid.center(), DVec3::ZERO, epsilon = 1e-6);
}

#[test]
fn plane_order_does_not_change_the_solid() {
    let planes = box_planes(DVec3::new(0.0, 0.0, 0.0), DVec3::new(3.0, 2.0, 1.0));
    let solid = build(&planes).unwrap();

    let mut reversed = planes.clone();
    reversed.reverse();
    let mut rotated = planes.clone();
    rotated.rotate_left(2);

    for permutation in [reversed, rotated] {
        let other = build(&permutation).unwrap();

        assert_same_points(solid.vertices(), other.vertices());
        assert_relative_eq!(solid.volume(), other.volume(), epsilon = 1e-6);

        for face in solid.faces() {
            let other_face = other
                .faces()
                .iter()
                .find(|f| f.plane.abs_diff_eq(&face.plane, 1e-9))
                .unwrap();

            let face_points: Vec<_> = solid.face_vertices(face).collect();
            let other_points: Vec<_> = other.face_vertices(other_face).collect();
            assert_same_points(&face_points, &other_points);
        }
    }
}

#[test]
fn cut_corner() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    let normal = DVec3::ONE.normalize();
    planes.push(Plane::from_point_normal(DVec3::new(1.0, 1.0, 0.0), normal));

    let solid = build(&planes).unwrap();

    assert_eq!(solid.vertices().len(), 10);
    assert_eq!(solid.faces().len(), 7);
    assert_eq!(solid.faces()[6].vertex_indices.len(), 3);
    assert_faces_wound_outwards(&solid);
    assert_relative_eq!(solid.volume(), 8.0 - 1.0 / 6.0, epsilon = 1e-6);

    assert!(solid.contains_point(DVec3::new(0.4, 0.4, 0.1), 1e-4));
    assert!(!solid.contains_point(DVec3::new(0.9, 0.9, 0.9), 1e-4));
    assert!(solid.contains_point(DVec3::new(-1.0, -1.0, -1.0), 1e-4));
}

#[test]
fn duplicate_planes_keep_the_first_face() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    let top = planes[3];
    planes.insert(0, top);

    let solid = build(&planes).unwrap();
    let indices: Vec<_> = solid.faces().iter().map(|f| f.plane_index).collect();

    assert_eq!(indices, [0, 1, 2, 3, 5, 6]);
    assert_eq!(solid.vertices().len(), 8);
}

#[test]
fn redundant_planes_produce_no_faces() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    planes.push(Plane::from_point_normal(DVec3::new(10.0, 0.0, 0.0), DVec3::X));
    // touches the box along an edge only
    planes.push(Plane::from_point_normal(
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0).normalize(),
    ));

    let solid = build(&planes).unwrap();

    assert_eq!(solid.faces().len(), 6);
    assert_relative_eq!(solid.volume(), 8.0, epsilon = 1e-6);
}

#[test]
fn open_solids_are_unbounded() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    planes.remove(3);

    assert_eq!(build(&planes), Err(SolidError::Unbounded));
}

#[test]
fn flat_solids_have_no_volume() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    // the top plane flipped onto the bottom one
    planes[3] = Plane::from_point_normal(DVec3::new(0.0, -1.0, 0.0), DVec3::Y);

    assert_eq!(build(&planes), Err(SolidError::ZeroVolume));
}

#[test]
fn disjoint_half_spaces_are_empty() {
    let mut planes = box_planes(DVec3::splat(-1.0), DVec3::splat(1.0));
    planes.push(Plane::from_point_normal(DVec3::new(-5.0, 0.0, 0.0), DVec3::X));

    assert_eq!(build(&planes), Err(SolidError::EmptySolid));
    assert_eq!(build(&[]), Err(SolidError::EmptySolid));
}
