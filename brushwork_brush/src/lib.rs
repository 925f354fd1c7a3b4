#![warn(clippy::all, clippy::pedantic)]

mod assembler;
mod convert;
pub mod material;
pub mod plane;
mod polygon;
mod settings;
pub mod solid;
pub mod uv;

pub mod builder {
    pub use super::assembler::{
        BrushConverter, BrushError, BrushMaterial, BrushStage, BuiltBrush, BuiltFace, ErrorKind,
    };
    pub use super::settings::{FormatSelection, GeometrySettings, SpecialMaterials, UvSettings};
}

pub use convert::{convert_map, ConversionReport, PlacedBrush, ScenePlacement, SkippedBrush};
pub use material::{MaterialRef, MaterialResolver, SurfaceFlags};
pub use uv::UvFormat;
