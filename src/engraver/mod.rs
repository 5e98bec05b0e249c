//! Engraver: turns a [`Music`] value into one positioned layout tree.
//!
//! The pipeline slices the voices onto a shared time grid, renders every
//! cell, spaces the slices across the line, hangs beams and spans on each
//! voice, and finally stacks the voices vertically.

mod decorations;
mod entities;
mod primitive;
mod symbols;

use log::debug;
use serde::Serialize;

use crate::config::RenderConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{BoundingBox, Transform};
use crate::layout_tree::{DrawDirective, LayoutTree};
use crate::model::{Music, VoiceKind};
use crate::slicer::{slice_music, SlicedMusic};
use crate::spacing::{compute_slice_spacing, SliceExtent};

pub use entities::{EngravedEntity, EntityEngraver, JianpuEngraver};
pub use primitive::{text_width, RenderObject, RenderTree};
pub use symbols::{SymbolMetrics, SymbolRegistry};

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// A laid-out line of music.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngravedMusic {
    pub tree: RenderTree,
    pub width: f64,
    pub height: f64,
    pub bounding_box: BoundingBox,
    /// X of every slice origin, in the coordinates of `tree`.
    pub slice_offsets: Vec<f64>,
    /// The content did not fit in the configured line width.
    pub overflow: bool,
}

impl EngravedMusic {
    /// The flattened draw list, in paint order.
    pub fn directives(&self) -> Vec<DrawDirective<'_, RenderObject>> {
        self.tree.flatten()
    }
}

/// Lays out `music` on one line of `config.line_width`, rendering cells
/// with `engraver`.
pub fn engrave_music<E>(music: &Music, config: &RenderConfig, engraver: &E) -> Result<EngravedMusic>
where
    E: EntityEngraver + ?Sized,
{
    config.validate()?;
    let sliced = slice_music(music)?;
    if sliced.slices.is_empty() {
        debug!("nothing to engrave");
        return Ok(EngravedMusic {
            tree: LayoutTree::empty(),
            width: config.line_width,
            height: 0.0,
            bounding_box: BoundingBox::Empty,
            slice_offsets: Vec::new(),
            overflow: false,
        });
    }

    let cells = engrave_cells(&sliced, config, engraver)?;
    let extents = slice_extents(&cells, sliced.slices.len(), config);
    let spacing = compute_slice_spacing(
        &sliced.slices,
        &extents,
        config.line_width,
        &config.spacing_params(),
    )?;

    let rows = sliced
        .voices
        .iter()
        .zip(cells)
        .map(|(voice, cells)| -> Result<Row> {
            let tops: Vec<f64> = cells.iter().map(|cell| cell.bbox.bound_y().0).collect();
            let core = cells
                .iter()
                .map(|cell| cell.core_box)
                .collect::<BoundingBox>();

            let mut children: Vec<RenderTree> = cells
                .into_iter()
                .zip(&spacing.offsets)
                .map(|(cell, &x)| LayoutTree::wrap(Transform::translate(x, 0.0), cell.node))
                .collect();
            children.extend(decorations::engrave_beams(&voice.beams, &spacing.offsets, config)?);
            children.extend(decorations::engrave_spans(
                &voice.spans,
                &tops,
                &spacing.offsets,
                config,
                engraver.symbols(),
            )?);

            let tree = LayoutTree::node(Transform::IDENTITY, children);
            Ok(Row {
                kind: voice.kind,
                full: tree.bounding_box(),
                core,
                tree,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let stacked = stack_rows(rows, config);
    let bbox = stacked.bounding_box();
    let (x1, _) = bbox.bound_x();
    let (y1, _) = bbox.bound_y();
    let shift = Transform::translate((-x1).max(0.0), -y1);
    let bounding_box = bbox.transformed(&shift);
    let tree = LayoutTree::wrap(shift, stacked);

    debug!(
        "engraved {} voices over {} slices, force {:.3}",
        sliced.voices.len(),
        sliced.slices.len(),
        spacing.force
    );

    Ok(EngravedMusic {
        tree,
        width: config.line_width.max(bounding_box.bound_x().1),
        height: bounding_box.height(),
        bounding_box,
        slice_offsets: spacing.offsets.iter().map(|x| x + shift.dx).collect(),
        overflow: spacing.overflow,
    })
}

/// JSON form of a layout: sizes, slice offsets and the flattened draw list.
pub fn layout_to_json(music: &EngravedMusic) -> Result<String> {
    #[derive(Serialize)]
    struct LayoutJson<'a> {
        width: f64,
        height: f64,
        overflow: bool,
        slice_offsets: &'a [f64],
        directives: Vec<DrawDirective<'a, RenderObject>>,
    }

    let json = LayoutJson {
        width: music.width,
        height: music.height,
        overflow: music.overflow,
        slice_offsets: &music.slice_offsets,
        directives: music.directives(),
    };
    serde_json::to_string_pretty(&json).map_err(|e| LayoutError::Json(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════
// Pipeline steps
// ═══════════════════════════════════════════════════════════════════════

/// Cells indexed `[voice][slice]`.
fn engrave_cells<E>(
    sliced: &SlicedMusic,
    config: &RenderConfig,
    engraver: &E,
) -> Result<Vec<Vec<EngravedEntity>>>
where
    E: EntityEngraver + ?Sized,
{
    (0..sliced.voices.len())
        .map(|voice| {
            sliced
                .voice_cells(voice)
                .map(|cell| engraver.engrave(cell, config))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Rest length and left overhang of every slice, from the union of what
/// the voices draw in it.
fn slice_extents(
    cells: &[Vec<EngravedEntity>],
    slices: usize,
    config: &RenderConfig,
) -> Vec<SliceExtent> {
    (0..slices)
        .map(|slice| {
            let bbox: BoundingBox = cells
                .iter()
                .filter_map(|voice| voice.get(slice))
                .map(|cell| cell.bbox)
                .collect();
            SliceExtent {
                min_width: bbox.width() + config.slice_padding,
                left: bbox.bound_x().0,
            }
        })
        .collect()
}

struct Row {
    kind: VoiceKind,
    tree: RenderTree,
    full: BoundingBox,
    core: BoundingBox,
}

/// Puts each row below the previous one. The gap is measured between core
/// boxes, so ornaments do not move baselines unless the full boxes would
/// collide.
fn stack_rows(rows: Vec<Row>, config: &RenderConfig) -> RenderTree {
    let mut placed = Vec::with_capacity(rows.len());
    let mut previous: Option<(f64, BoundingBox, BoundingBox)> = None;

    for row in rows {
        let gap = match row.kind {
            VoiceKind::Music => config.line_gap,
            VoiceKind::Lyric => config.lyric_gap,
        };
        let baseline = match previous {
            None => 0.0,
            Some((base, full, core)) => {
                let by_core = base + core.bound_y().1 + gap - row.core.bound_y().0;
                let by_full = base + full.bound_y().1 - row.full.bound_y().0;
                by_core.max(by_full)
            }
        };
        debug!("{:?} voice baseline at {baseline:.2}", row.kind);
        previous = Some((baseline, row.full, row.core));
        placed.push(LayoutTree::wrap(Transform::translate(0.0, baseline), row.tree));
    }

    LayoutTree::node(Transform::IDENTITY, placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{duration, Entity, Tag, TimeMultiplier, Voice};

    fn quarter(key: u8) -> Entity {
        Entity::note(key, TimeMultiplier::Crotchet, 0)
    }

    #[test]
    fn empty_music_is_an_empty_line() {
        let engraver = JianpuEngraver::default();
        let config = RenderConfig::default();
        let engraved = engrave_music(&Music::default(), &config, &engraver).unwrap();
        assert!(engraved.bounding_box.is_empty());
        assert!(engraved.directives().is_empty());
    }

    #[test]
    fn slices_fill_the_line() {
        let music = Music {
            voices: vec![Voice::new(vec![quarter(1), quarter(2), quarter(3), quarter(4)])],
        };
        let config = RenderConfig {
            line_width: 200.0,
            ..RenderConfig::default()
        };
        let engraved = engrave_music(&music, &config, &JianpuEngraver::default()).unwrap();
        assert!(!engraved.overflow);
        assert_eq!(engraved.slice_offsets.len(), 4);
        // Equal notes get equal widths.
        let steps: Vec<f64> = engraved.slice_offsets.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.iter().all(|s| (s - 50.0).abs() < 1e-9));
        assert_eq!(engraved.bounding_box.bound_y().0, 0.0);
    }

    #[test]
    fn narrow_line_overflows_without_failing() {
        let music = Music {
            voices: vec![Voice::new(vec![quarter(1); 8])],
        };
        let config = RenderConfig {
            line_width: 20.0,
            ..RenderConfig::default()
        };
        let engraved = engrave_music(&music, &config, &JianpuEngraver::default()).unwrap();
        assert!(engraved.overflow);
    }

    #[test]
    fn lyrics_sit_below_the_notes() {
        let music = Music {
            voices: vec![
                Voice::new(vec![quarter(1), Entity::marker(Tag::BarLine), quarter(2)]),
                Voice::lyric(vec![
                    Entity::syllable("do", duration(1, 4)),
                    Entity::syllable("re", duration(1, 4)),
                ]),
            ],
        };
        let engraved =
            engrave_music(&music, &RenderConfig::default(), &JianpuEngraver::default()).unwrap();
        let directives = engraved.directives();
        let note_y = directives
            .iter()
            .find(|d| matches!(d.object, RenderObject::Glyph { .. }))
            .map(|d| d.transform.dy)
            .unwrap();
        let lyric_y = directives
            .iter()
            .find(|d| matches!(d.object, RenderObject::Text { .. }))
            .map(|d| d.transform.dy)
            .unwrap();
        assert!(lyric_y > note_y);
    }

    #[test]
    fn invalid_config_is_rejected_before_layout() {
        let config = RenderConfig {
            glyph_width: f64::NAN,
            ..RenderConfig::default()
        };
        let result = engrave_music(&Music::default(), &config, &JianpuEngraver::default());
        assert!(matches!(result, Err(LayoutError::InvalidConfig(_))));
    }

    #[test]
    fn json_lists_directives() {
        let music = Music {
            voices: vec![Voice::new(vec![quarter(5)])],
        };
        let engraved =
            engrave_music(&music, &RenderConfig::default(), &JianpuEngraver::default()).unwrap();
        let json = layout_to_json(&engraved).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["directives"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["overflow"], serde_json::Value::Bool(false));
    }
}
