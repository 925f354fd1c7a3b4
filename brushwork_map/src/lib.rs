#![warn(clippy::all, clippy::pedantic)]

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

pub const WORLD_CLASS_NAME: &str = "worldspawn";
pub const LAYER_TYPE: &str = "_tb_layer";
pub const GROUP_TYPE: &str = "_tb_group";

/// # Errors
///
/// Returns `Err` if the deserialization fails.
pub fn from_slice(input: &[u8]) -> serde_json::Result<Map> {
    Map::from_slice(input)
}

/// # Errors
///
/// Returns `Err` if the serialization fails.
pub fn to_string(map: &Map) -> serde_json::Result<String> {
    map.to_string()
}

/// A parsed map document.
///
/// Entities, brushes and sides keep the order they had in the map file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(expecting = "a map document")]
pub struct Map {
    #[serde(default)]
    pub name: String,
    /// Whether the sides carry explicit valve220 texture axes.
    #[serde(default)]
    pub valve_format: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
}

impl Map {
    /// # Errors
    ///
    /// Returns `Err` if the deserialization fails.
    pub fn from_slice(input: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(input)
    }

    /// # Errors
    ///
    /// Returns `Err` if the serialization fails.
    pub fn to_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn world(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_world())
    }

    /// Brushes of the worldspawn entity, or an empty slice if there is no world.
    #[must_use]
    pub fn world_brushes(&self) -> &[Brush] {
        self.world().map(|e| e.brushes.as_slice()).unwrap_or(&[])
    }

    #[must_use]
    pub fn entity_by_editor_id(&self, id: i32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.editor.id == Some(id))
    }

    /// Returns the layer entities ordered by their layer sort index.
    /// Layers without a sort index come first, ties keep document order.
    #[must_use]
    pub fn layers_in_sort_order(&self) -> Vec<&Entity> {
        let mut layers: Vec<_> = self
            .entities
            .iter()
            .filter(|e| e.kind() == EntityKind::Layer)
            .collect();

        layers.sort_by_key(|e| e.editor.layer_sort_index);
        layers
    }

    #[must_use]
    pub fn brush_count(&self) -> usize {
        self.entities.iter().map(|e| e.brushes.len()).sum()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(expecting = "an entity")]
pub struct Entity {
    #[serde(rename = "classname")]
    pub class_name: String,
    #[serde(flatten)]
    pub editor: EditorInfo,
    #[serde(default, rename = "brush", skip_serializing_if = "Vec::is_empty")]
    pub brushes: Vec<Brush>,
}

impl Entity {
    #[must_use]
    pub fn is_world(&self) -> bool {
        self.class_name == WORLD_CLASS_NAME
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        if self.is_world() {
            return EntityKind::World;
        }

        match self.editor.kind.as_deref() {
            Some(LAYER_TYPE) => EntityKind::Layer,
            Some(GROUP_TYPE) => EntityKind::Group,
            _ if self.class_name.contains("trigger") => EntityKind::Trigger,
            _ => EntityKind::Other,
        }
    }

    /// The editor id of the group or layer this entity is nested in.
    /// Groups take precedence over layers, non-positive ids mean no parent.
    #[must_use]
    pub fn parent_editor_id(&self) -> Option<i32> {
        self.editor
            .group
            .filter(|&id| id > 0)
            .or_else(|| self.editor.layer.filter(|&id| id > 0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    World,
    Layer,
    Group,
    Trigger,
    Other,
}

/// TrenchBroom hierarchy metadata.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct EditorInfo {
    #[serde(default, rename = "_tb_type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, rename = "_tb_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "_tb_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(
        default,
        rename = "_tb_layer_sort_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub layer_sort_index: Option<i32>,
    #[serde(default, rename = "_tb_group", skip_serializing_if = "Option::is_none")]
    pub group: Option<i32>,
    #[serde(default, rename = "_tb_layer", skip_serializing_if = "Option::is_none")]
    pub layer: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(expecting = "a brush")]
pub struct Brush {
    #[serde(default, rename = "side")]
    pub sides: Vec<Side>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(expecting = "a brush side")]
pub struct Side {
    pub plane: PlanePoints,
    pub material: String,
    #[serde(default)]
    pub offset: DVec2,
    /// Texture rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale: DVec2,
    /// Only present in valve220 documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_axes: Option<UvAxes>,
}

fn default_scale() -> DVec2 {
    DVec2::ONE
}

impl Side {
    #[must_use]
    pub fn new(plane: PlanePoints, material: impl Into<String>) -> Self {
        Self {
            plane,
            material: material.into(),
            offset: DVec2::ZERO,
            rotation: 0.0,
            scale: DVec2::ONE,
            uv_axes: None,
        }
    }
}

/// The three points defining a side's plane, in map coordinates.
/// Viewed from outside the brush, the points are in clockwise order.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PlanePoints(pub DVec3, pub DVec3, pub DVec3);

/// Valve220 texture axes of a side, in map coordinates.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct UvAxes {
    pub u: DVec3,
    pub v: DVec3,
}
