use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;

use brushwork_core::map::Map;

#[derive(Parser)]
pub struct Info {
    #[clap(parse(from_os_str))]
    map_path: PathBuf,
    /// Only list layers
    #[clap(short, long)]
    layers: bool,
}

pub fn info(opts: &Info) -> anyhow::Result<()> {
    let input = fs::read(&opts.map_path)
        .with_context(|| format!("could not read map `{}`", opts.map_path.display()))?;
    let map = Map::from_slice(&input)
        .with_context(|| format!("invalid map `{}`", opts.map_path.display()))?;

    if !opts.layers {
        println!(
            "{}: {} entities, {} brushes, {} format",
            map.name,
            map.entities.len(),
            map.brush_count(),
            if map.valve_format {
                "valve220"
            } else {
                "standard"
            }
        );

        for (i, entity) in map.entities.iter().enumerate() {
            print!(
                "{:>4} {} ({:?}), {} brushes",
                i,
                entity.class_name,
                entity.kind(),
                entity.brushes.len()
            );

            if let Some(parent) = entity
                .parent_editor_id()
                .and_then(|id| map.entity_by_editor_id(id))
            {
                print!(", in `{}`", parent.editor.name.as_deref().unwrap_or("unnamed"));
            }

            println!();
        }
    }

    for layer in map.layers_in_sort_order() {
        println!(
            "layer `{}` (sort index {})",
            layer.editor.name.as_deref().unwrap_or("unnamed"),
            layer
                .editor
                .layer_sort_index
                .map_or_else(|| "none".to_owned(), |i| i.to_string())
        );
    }

    Ok(())
}
