use std::{fs, ops::ControlFlow, path::PathBuf};

use anyhow::Context;
use clap::{ArgEnum, Parser};
use glam::DVec3;
use serde_json::{json, Value};
use tracing::info;

use brushwork_core::{
    brush::{
        builder::{FormatSelection, GeometrySettings, SpecialMaterials, UvSettings},
        convert_map, PlacedBrush, ScenePlacement, UvFormat,
    },
    map::{Entity, Map},
};

use crate::resolver::TableResolver;

#[derive(ArgEnum, Clone, Copy)]
enum Format {
    Auto,
    Standard,
    Valve220,
}

#[derive(ArgEnum, Clone, Copy)]
enum Special {
    Import,
    SkipFaces,
    SkipBrushes,
}

#[derive(Parser)]
pub struct Convert {
    #[clap(parse(from_os_str))]
    map_path: PathBuf,
    /// JSON object mapping material names to `[width, height]`
    #[clap(short, long, parse(from_os_str))]
    materials: Option<PathBuf>,
    #[clap(long, default_value = "0.0001")]
    epsilon: f64,
    #[clap(long, default_value = "32")]
    unit_scale: f64,
    /// Local origin in output units, as `x,y,z`
    #[clap(long, use_delimiter = true, number_of_values = 3)]
    origin: Option<Vec<f64>>,
    /// Largest absolute output coordinate of a bounded solid
    #[clap(long, default_value = "16384")]
    max_extent: f64,
    #[clap(long, arg_enum, default_value = "auto")]
    format: Format,
    /// Added to every standard format rotation, in degrees
    #[clap(long, default_value = "180")]
    rotation_bias: f64,
    /// Rotate valve220 coordinates by the rotation bias and the side rotation
    #[clap(long)]
    valve_rotation_compat: bool,
    #[clap(long, arg_enum, default_value = "import")]
    special: Special,
    /// Print the converted brushes as JSON
    #[clap(short, long)]
    dump: bool,
}

impl Convert {
    fn settings(&self) -> GeometrySettings {
        let mut settings = GeometrySettings::new();

        settings.epsilon(self.epsilon);
        settings.unit_scale(self.unit_scale);

        settings.max_extent(self.max_extent);

        if let Some(origin) = &self.origin {
            settings.origin(DVec3::new(origin[0], origin[1], origin[2]));
        }

        settings.uv_format(match self.format {
            Format::Auto => FormatSelection::FromMap,
            Format::Standard => FormatSelection::Force(UvFormat::Standard),
            Format::Valve220 => FormatSelection::Force(UvFormat::Valve220),
        });

        settings.special_materials(match self.special {
            Special::Import => SpecialMaterials::Import,
            Special::SkipFaces => SpecialMaterials::SkipFaces,
            Special::SkipBrushes => SpecialMaterials::SkipBrushes,
        });

        settings.uv(UvSettings {
            rotation_bias: self.rotation_bias,
            valve_rotation_compat: self.valve_rotation_compat,
        });

        settings
    }
}

/// Collects converted brushes as JSON.
struct DumpPlacement {
    dump: bool,
    current_entity: Option<Value>,
    entities: Vec<Value>,
}

impl DumpPlacement {
    fn finish(mut self) -> Vec<Value> {
        self.entities.extend(self.current_entity.take());
        self.entities
    }
}

impl ScenePlacement<String> for DumpPlacement {
    fn begin_entity(&mut self, index: usize, entity: &Entity) {
        if !self.dump {
            return;
        }

        self.entities.extend(self.current_entity.take());
        self.current_entity = Some(json!({
            "index": index,
            "classname": entity.class_name,
            "kind": format!("{:?}", entity.kind()),
            "parent": entity.parent_editor_id(),
            "brushes": [],
        }));
    }

    fn place_brush(&mut self, brush: PlacedBrush<'_, String>) -> ControlFlow<()> {
        if let Some(Value::Array(brushes)) = self
            .current_entity
            .as_mut()
            .and_then(|e| e.get_mut("brushes"))
        {
            brushes.push(json!({
                "index": brush.brush_index,
                "mesh": brush.brush,
            }));
        }

        ControlFlow::Continue(())
    }
}

pub fn convert(opts: Convert) -> anyhow::Result<()> {
    let input = fs::read(&opts.map_path)
        .with_context(|| format!("could not read map `{}`", opts.map_path.display()))?;
    let map = Map::from_slice(&input)
        .with_context(|| format!("invalid map `{}`", opts.map_path.display()))?;

    let mut resolver = match &opts.materials {
        Some(path) => TableResolver::from_path(path)?,
        None => TableResolver::default(),
    };
    info!("loaded {} materials", resolver.material_count());

    let settings = opts.settings();
    let mut placement = DumpPlacement {
        dump: opts.dump,
        current_entity: None,
        entities: Vec::new(),
    };

    let report = convert_map(&map, &mut resolver, &settings, &mut placement);

    info!(
        entities = report.entities,
        brushes = report.built_brushes,
        faces = report.faces,
        skipped = report.skipped_brushes(),
        "converted `{}`",
        opts.map_path.display()
    );

    let output = if opts.dump {
        json!({
            "report": report,
            "entities": placement.finish(),
        })
    } else {
        serde_json::to_value(&report)?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_settings() {
        let opts = Convert::try_parse_from(["convert", "map.json"]).unwrap();

        assert_eq!(opts.settings(), GeometrySettings::default());
    }

    #[test]
    fn flags_map_onto_settings() {
        let opts = Convert::try_parse_from([
            "convert",
            "map.json",
            "--epsilon",
            "0.01",
            "--unit-scale",
            "64",
            "--origin",
            "1,2,3",
            "--max-extent",
            "512",
            "--format",
            "valve220",
            "--special",
            "skip-faces",
            "--rotation-bias",
            "90",
            "--valve-rotation-compat",
        ])
        .unwrap();

        let settings = opts.settings();

        assert_eq!(settings.epsilon, 0.01);
        assert_eq!(settings.unit_scale, 64.0);
        assert_eq!(settings.origin, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(settings.max_extent, 512.0);
        assert_eq!(
            settings.uv_format,
            FormatSelection::Force(UvFormat::Valve220)
        );
        assert_eq!(settings.special_materials, SpecialMaterials::SkipFaces);
        assert_eq!(
            settings.uv,
            UvSettings {
                rotation_bias: 90.0,
                valve_rotation_compat: true,
            }
        );
    }
}
