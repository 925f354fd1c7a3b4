use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
};

use glam::DVec3;
use serde::Deserialize;
use serde_json::de::from_reader;
use walkdir::WalkDir;

use brushwork_brush::{MaterialRef, MaterialResolver};
use brushwork_map::{Brush, Entity, Map, PlanePoints, Side, UvAxes, WORLD_CLASS_NAME};

pub const DEFAULT_MATERIAL: &str = "__default";

/// Directory of the shared map fixtures.
#[must_use]
pub fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Reads a fixture map by file name.
pub fn read_fixture(name: &str) -> Map {
    let path = fixtures_path().join(name);
    eprintln!("Opening fixture `{}`", path.display());

    from_reader(BufReader::new(File::open(path).unwrap())).unwrap()
}

/// Sides of an axis-aligned box in map coordinates, wound the way editors write them.
/// Side order is -X, +X, -Y, +Y, -Z, +Z.
#[must_use]
pub fn box_sides(min: DVec3, max: DVec3, material: &str) -> Vec<Side> {
    let planes = [
        PlanePoints(
            min,
            DVec3::new(min.x, min.y + 1.0, min.z),
            DVec3::new(min.x, min.y, min.z + 1.0),
        ),
        PlanePoints(
            max,
            DVec3::new(max.x, max.y, max.z + 1.0),
            DVec3::new(max.x, max.y + 1.0, max.z),
        ),
        PlanePoints(
            min,
            DVec3::new(min.x, min.y, min.z + 1.0),
            DVec3::new(min.x + 1.0, min.y, min.z),
        ),
        PlanePoints(
            max,
            DVec3::new(max.x + 1.0, max.y, max.z),
            DVec3::new(max.x, max.y, max.z + 1.0),
        ),
        PlanePoints(
            min,
            DVec3::new(min.x + 1.0, min.y, min.z),
            DVec3::new(min.x, min.y + 1.0, min.z),
        ),
        PlanePoints(
            max,
            DVec3::new(max.x, max.y + 1.0, max.z),
            DVec3::new(max.x + 1.0, max.y, max.z),
        ),
    ];

    planes
        .into_iter()
        .map(|plane| Side::new(plane, material))
        .collect()
}

#[must_use]
pub fn box_brush(min: DVec3, max: DVec3, material: &str) -> Brush {
    Brush {
        sides: box_sides(min, max, material),
    }
}

/// Gives every side world-aligned valve220 texture axes.
pub fn with_world_axes(brush: &mut Brush) {
    for side in &mut brush.sides {
        side.uv_axes = Some(UvAxes {
            u: DVec3::X,
            v: -DVec3::Y,
        });
    }
}

#[must_use]
pub fn world(brushes: Vec<Brush>) -> Entity {
    Entity {
        class_name: WORLD_CLASS_NAME.to_string(),
        editor: Default::default(),
        brushes,
    }
}

#[must_use]
pub fn single_brush_map(brush: Brush, valve_format: bool) -> Map {
    Map {
        name: "test".to_string(),
        valve_format,
        entities: vec![world(vec![brush])],
    }
}

/// A resolver with a fixed material table that records every lookup.
#[derive(Debug, Clone, Default)]
pub struct TestResolver {
    materials: BTreeMap<String, (u32, u32)>,
    pub lookups: Vec<Vec<String>>,
}

impl TestResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_material(mut self, name: &str, width: u32, height: u32) -> Self {
        self.materials.insert(name.to_string(), (width, height));
        self
    }
}

impl MaterialResolver for TestResolver {
    type Handle = String;

    fn resolve(&mut self, candidates: &[&str]) -> Option<MaterialRef<String>> {
        self.lookups
            .push(candidates.iter().map(|&c| c.to_string()).collect());

        candidates.iter().find_map(|&name| {
            self.materials
                .get(name)
                .map(|&(width, height)| MaterialRef::new(name.to_string(), width, height))
        })
    }

    fn default_material(&self) -> MaterialRef<String> {
        MaterialRef::new(DEFAULT_MATERIAL.to_string(), 32, 32)
    }
}

pub trait FileSpec
where
    for<'de> Self: Deserialize<'de>,
{
    type Type;

    fn extension() -> &'static str;

    fn read(file: File) -> Self::Type;

    fn verify(&self, data: Self::Type);

    /// Verifies every `<name><extension>` file under `path`
    /// against its `<name>.expected.json` sibling, if there is one.
    fn verify_from_path(path: &Path) {
        let files = discover_test_files(path, Self::extension());

        for file in files {
            let spec_path = path.join(format!("{}.expected.json", file.name));

            let spec_file = match File::open(spec_path) {
                Ok(f) => f,
                Err(e) => {
                    if e.kind() == ErrorKind::NotFound {
                        continue;
                    }
                    Err(e).unwrap()
                }
            };

            eprintln!("Verifying against {}", file.name);

            let data = Self::read(File::open(&file.path).unwrap());
            let spec: Self = from_reader(BufReader::new(spec_file)).unwrap();

            spec.verify(data);
        }
    }
}

struct TestFile {
    name: String,
    path: PathBuf,
}

fn discover_test_files(path: &Path, extension: &str) -> Vec<TestFile> {
    let mut files = Vec::new();

    for result in WalkDir::new(path).sort_by_file_name() {
        let entry = result.unwrap();

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.path().strip_prefix(path).unwrap();
        let name_with_ext = file_name.to_string_lossy();
        let Some(name) = name_with_ext.strip_suffix(extension) else {
            continue;
        };

        files.push(TestFile {
            name: name.to_owned(),
            path: entry.into_path(),
        });
    }

    files
}
