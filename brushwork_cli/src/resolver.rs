use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;

use brushwork_core::brush::{MaterialRef, MaterialResolver};

pub const DEFAULT_MATERIAL: &str = "__default";

/// Resolves materials from a JSON table of `name: [width, height]`.
#[derive(Debug, Default)]
pub struct TableResolver {
    materials: BTreeMap<String, (u32, u32)>,
}

impl TableResolver {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let input = fs::read(path)
            .with_context(|| format!("could not read material table `{}`", path.display()))?;
        let materials = serde_json::from_slice(&input)
            .with_context(|| format!("invalid material table `{}`", path.display()))?;

        Ok(Self { materials })
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

impl MaterialResolver for TableResolver {
    type Handle = String;

    fn resolve(&mut self, candidates: &[&str]) -> Option<MaterialRef<String>> {
        candidates.iter().find_map(|&name| {
            self.materials
                .get(name)
                .map(|&(width, height)| MaterialRef::new(name.to_owned(), width, height))
        })
    }

    fn default_material(&self) -> MaterialRef<String> {
        MaterialRef::new(DEFAULT_MATERIAL.to_owned(), 0, 0)
    }
}
