use std::{collections::BTreeSet, fmt, ops::ControlFlow};

use serde::Serialize;
use tracing::{debug, debug_span, warn};

use brushwork_map::{Entity, Map};

use crate::{
    assembler::{BrushConverter, BrushError, BrushStage, BuiltBrush},
    material::MaterialResolver,
    settings::GeometrySettings,
};

/// A converted brush handed to the scene placement.
#[derive(Debug)]
pub struct PlacedBrush<'a, H> {
    pub entity_index: usize,
    pub brush_index: usize,
    pub entity: &'a Entity,
    pub brush: BuiltBrush<H>,
}

/// Receives converted brushes in document order.
///
/// Returning [`ControlFlow::Break`] from [`ScenePlacement::place_brush`] stops the conversion
/// before the next brush.
pub trait ScenePlacement<H> {
    /// Called once per entity, before any of its brushes.
    fn begin_entity(&mut self, _index: usize, _entity: &Entity) {}

    fn place_brush(&mut self, brush: PlacedBrush<'_, H>) -> ControlFlow<()>;
}

impl<H, F> ScenePlacement<H> for F
where
    F: FnMut(PlacedBrush<'_, H>) -> ControlFlow<()>,
{
    fn place_brush(&mut self, brush: PlacedBrush<'_, H>) -> ControlFlow<()> {
        self(brush)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBrush {
    pub entity_index: usize,
    pub brush_index: usize,
    /// The last stage completed before the brush was rejected.
    pub stage: BrushStage,
    #[serde(serialize_with = "serialize_error")]
    pub error: BrushError,
}

fn serialize_error<S>(error: &BrushError, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(error)
}

impl fmt::Display for SkippedBrush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entity {} brush {}: {}",
            self.entity_index, self.brush_index, self.error
        )
    }
}

/// Summary of a map conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub entities: usize,
    pub built_brushes: usize,
    pub faces: usize,
    /// Faces left out because of their special material.
    pub excluded_faces: usize,
    pub skipped: Vec<SkippedBrush>,
    /// Normalized names that fell back to the default material.
    pub unresolved_materials: BTreeSet<String>,
    /// Whether the placement stopped the conversion early.
    pub cancelled: bool,
}

impl ConversionReport {
    #[must_use]
    pub fn skipped_brushes(&self) -> usize {
        self.skipped.len()
    }
}

/// Converts every brush of every entity in document order.
///
/// Rejected brushes are logged and recorded in the report, they never stop the conversion.
pub fn convert_map<R, P>(
    map: &Map,
    resolver: &mut R,
    settings: &GeometrySettings,
    placement: &mut P,
) -> ConversionReport
where
    R: MaterialResolver,
    P: ScenePlacement<R::Handle> + ?Sized,
{
    let format = settings.uv_format.resolve(map.valve_format);
    let converter = BrushConverter::new(settings, format);
    let mut report = ConversionReport::default();

    debug!("converting map `{}` with {:?} texture format", map.name, format);

    'entities: for (entity_index, entity) in map.entities.iter().enumerate() {
        let _span = debug_span!("entity", entity_index, class_name = %entity.class_name).entered();

        report.entities += 1;
        placement.begin_entity(entity_index, entity);

        for (brush_index, brush) in entity.brushes.iter().enumerate() {
            let built = match converter.convert(brush, resolver) {
                Ok(built) => built,
                Err(error) => {
                    let skipped = SkippedBrush {
                        entity_index,
                        brush_index,
                        stage: error.stage(),
                        error,
                    };
                    warn!("{}", skipped);
                    report.skipped.push(skipped);
                    continue;
                }
            };

            debug!(
                brush_index,
                stage = ?built.stage(),
                faces = built.faces.len(),
                vertices = built.vertices.len(),
                "built brush"
            );

            report.built_brushes += 1;
            report.faces += built.faces.len();
            report.excluded_faces += built.excluded_faces;
            report.unresolved_materials.extend(
                built
                    .materials
                    .iter()
                    .filter(|m| !m.resolved)
                    .map(|m| m.name.clone()),
            );

            let flow = placement.place_brush(PlacedBrush {
                entity_index,
                brush_index,
                entity,
                brush: built,
            });

            if flow.is_break() {
                debug!("conversion cancelled");
                report.cancelled = true;
                break 'entities;
            }
        }
    }

    report
}
