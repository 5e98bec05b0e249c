//! jianpulib — layout engine for numbered musical notation (jianpu).
//!
//! Voices of a [`Music`] value are sliced onto one shared time grid, spaced
//! across the line with a spring model, decorated with beams, slurs, tuplets
//! and ornaments, and returned as a tree of positioned primitives that can be
//! flattened into draw directives or serialized to SVG.
//!
//! # Example
//! ```
//! use jianpulib::{engrave_music_to_svg, Entity, Music, RenderConfig, TimeMultiplier, Voice};
//!
//! let music = Music {
//!     voices: vec![Voice::new(vec![
//!         Entity::note(1, TimeMultiplier::Quaver, 0),
//!         Entity::note(2, TimeMultiplier::Quaver, 0),
//!         Entity::note(3, TimeMultiplier::Crotchet, 0),
//!     ])
//!     .with_beam(0, 1)],
//! };
//! let svg = engrave_music_to_svg(&music, &RenderConfig::default()).unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```

pub mod config;
pub mod engraver;
pub mod error;
pub mod geometry;
pub mod layout_tree;
pub mod model;
pub mod placement;
pub mod slicer;
pub mod spacing;
pub mod svg_builder;

pub use config::RenderConfig;
pub use engraver::{
    engrave_music, layout_to_json, EngravedEntity, EngravedMusic, EntityEngraver, JianpuEngraver,
    RenderObject, SymbolMetrics, SymbolRegistry,
};
pub use error::{LayoutError, Result};
pub use geometry::{Anchor, BoundingBox, Rect, Transform};
pub use layout_tree::{DrawDirective, LayoutTree, Primitive};
pub use model::*;
pub use placement::{level_beams, place_spans};
pub use slicer::{slice_music, PartialEvent, Slice, SlicedEntity, SlicedMusic};
pub use spacing::{compute_slice_spacing, solve_springs, SpacingParams, Spring};
pub use svg_builder::render_svg;

/// Lays out `music` with the built-in engraver and renders it to SVG.
pub fn engrave_music_to_svg(music: &Music, config: &RenderConfig) -> Result<String> {
    let engraved = engrave_music(music, config, &JianpuEngraver::default())?;
    if engraved.overflow {
        log::warn!("rendering an overflowing line");
    }
    Ok(render_svg(&engraved))
}

/// Decodes a JSON [`Music`] value and a JSON [`RenderConfig`] and renders
/// the line to SVG. Useful for passing data across FFI boundaries.
pub fn engrave_json_to_svg(music_json: &str, config_json: &str) -> Result<String> {
    let music: Music = serde_json::from_str(music_json)
        .map_err(|e| LayoutError::Json(format!("invalid music JSON: {e}")))?;
    let config = RenderConfig::from_json(config_json)?;
    engrave_music_to_svg(&music, &config)
}
