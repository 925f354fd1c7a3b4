#![warn(clippy::all, clippy::pedantic, clippy::multiple_crate_versions)]

pub use brushwork_brush as brush;
pub use brushwork_map as map;
