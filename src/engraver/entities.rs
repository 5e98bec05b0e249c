//! Entity rendering: turns one slice cell into a layout-tree fragment.
//!
//! Every fragment is drawn around its own origin: `x = 0` is the horizontal
//! centre of the number and `y = 0` its baseline. Negative Y is above the
//! baseline.

use serde::Serialize;

use super::primitive::{leaf_at, text_width, RenderObject, RenderTree};
use super::symbols::SymbolRegistry;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::geometry::{Anchor, BoundingBox, Transform};
use crate::layout_tree::LayoutTree;
use crate::model::{Action, Event, Pitch, Sound, Syllable, Tag};
use crate::slicer::SlicedEntity;

// ═══════════════════════════════════════════════════════════════════════
// Engraver contract
// ═══════════════════════════════════════════════════════════════════════

/// A rendered cell with the boxes the layout needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngravedEntity {
    pub node: RenderTree,
    /// Everything drawn; used for spacing and decoration headroom.
    pub bbox: BoundingBox,
    /// Box without accidentals, dots and trailing symbols; used for baseline
    /// alignment.
    pub core_box: BoundingBox,
}

impl EngravedEntity {
    pub fn new(node: RenderTree) -> Self {
        let bbox = node.bounding_box();
        let core_box = node.bounding_box_where(&|object: &RenderObject| !object.is_auxiliary());
        Self {
            node,
            bbox,
            core_box,
        }
    }

    pub fn empty() -> Self {
        Self::new(LayoutTree::empty())
    }
}

/// Renders slice cells. `None` is a voice with nothing in the slice.
pub trait EntityEngraver {
    fn engrave(&self, cell: Option<&SlicedEntity>, config: &RenderConfig) -> Result<EngravedEntity>;

    /// Symbols available to decorations drawn around the entities.
    fn symbols(&self) -> &SymbolRegistry;
}

/// The built-in numbered-notation vocabulary.
#[derive(Debug, Clone)]
pub struct JianpuEngraver {
    symbols: SymbolRegistry,
}

impl Default for JianpuEngraver {
    fn default() -> Self {
        Self::new(SymbolRegistry::with_defaults())
    }
}

impl EntityEngraver for JianpuEngraver {
    fn engrave(
        &self,
        cell: Option<&SlicedEntity>,
        config: &RenderConfig,
    ) -> Result<EngravedEntity> {
        let node = match cell {
            // Continuations are shown by ties and dashes, not by the cell.
            None | Some(SlicedEntity::Partial(_)) => LayoutTree::empty(),
            Some(SlicedEntity::Event { event, .. }) => self.engrave_event(event, config)?,
            Some(SlicedEntity::Marker { tag }) => engrave_tag(*tag, config),
        };
        Ok(EngravedEntity::new(node))
    }

    fn symbols(&self) -> &SymbolRegistry {
        &self.symbols
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════════════════

impl JianpuEngraver {
    pub fn new(symbols: SymbolRegistry) -> Self {
        Self { symbols }
    }

    fn engrave_event(&self, event: &Event, config: &RenderConfig) -> Result<RenderTree> {
        Ok(match event {
            Event::Action(action) => self.engrave_action(action, config)?,
            Event::Repeater4 => leaf_at(
                0.0,
                -config.glyph_height / 2.0,
                Anchor::Centre,
                RenderObject::Rectangle {
                    width: config.repeater4_width,
                    height: config.repeater4_height,
                },
            ),
            Event::MultiBarRest { count } => engrave_multi_bar_rest(*count, config),
            Event::Pronounce { syllable: None } => LayoutTree::empty(),
            Event::Pronounce {
                syllable: Some(syllable),
            } => engrave_syllable(syllable, config),
        })
    }

    fn engrave_action(&self, action: &Action, config: &RenderConfig) -> Result<RenderTree> {
        let mut children = Vec::new();

        let mut top = match &action.sound {
            Sound::Rest => {
                children.push(leaf_at(0.0, 0.0, Anchor::Bottom, glyph("0", config)));
                -config.glyph_height
            }
            Sound::Clap => {
                children.push(leaf_at(0.0, 0.0, Anchor::Bottom, glyph("X", config)));
                -config.glyph_height
            }
            Sound::Note { pitches } => {
                let beams = action.time_multiplier.beams().max(0) as f64;
                let beam_room = beams * (config.beam_gap + config.beam_height);
                self.engrave_pitches(pitches, beam_room, config, &mut children)?
            }
        };

        let mut right = config.glyph_width / 2.0;
        for _ in 0..action.dots {
            right += config.dot_gap;
            children.push(leaf_at(
                right,
                -config.dot_radius,
                Anchor::Left,
                RenderObject::Dot {
                    radius: config.dot_radius,
                },
            ));
            right += 2.0 * config.dot_radius;
        }

        for name in &action.bottom_right_symbols {
            let metrics = self.symbols.get(name)?;
            right += config.symbol_x_gap;
            children.push(leaf_at(
                right,
                0.0,
                Anchor::BottomLeft,
                RenderObject::TrailingSymbol {
                    name: name.clone(),
                    glyph: metrics.glyph.clone(),
                    width: metrics.width,
                    height: metrics.height,
                },
            ));
            right += metrics.width;
        }

        for name in &action.top_symbols {
            let metrics = self.symbols.get(name)?;
            top -= config.symbol_gap;
            children.push(leaf_at(
                0.0,
                top,
                Anchor::Bottom,
                RenderObject::Symbol {
                    name: name.clone(),
                    glyph: metrics.glyph.clone(),
                    width: metrics.width,
                    height: metrics.height,
                },
            ));
            top -= metrics.height;
        }

        Ok(LayoutTree::node(Transform::IDENTITY, children))
    }

    /// Stacks the pitches of a chord upwards, lowest first, and returns the
    /// top Y of the stack. Octave dots below the lowest pitch leave room for
    /// `beam_room` worth of beams.
    fn engrave_pitches(
        &self,
        pitches: &[Pitch],
        beam_room: f64,
        config: &RenderConfig,
        children: &mut Vec<RenderTree>,
    ) -> Result<f64> {
        let radius = config.transpose_dot_radius;
        let step = 2.0 * radius + config.transpose_dot_gap;
        let dot = RenderObject::Dot { radius };

        let mut top = 0.0;
        for (index, pitch) in pitches.iter().enumerate() {
            let count = usize::from(pitch.octave_transpose.unsigned_abs());
            let mut base = 0.0;
            if index > 0 {
                base = top - config.chord_gap;
                if pitch.octave_transpose < 0 {
                    base -= config.transpose_dot_gap + count as f64 * step;
                }
            }

            children.push(leaf_at(
                0.0,
                base,
                Anchor::Bottom,
                glyph(&pitch.white_key.to_string(), config),
            ));
            top = base - config.glyph_height;

            if let Some(accidental) = pitch.accidental {
                let name = accidental.symbol_name();
                let metrics = self.symbols.get(name)?;
                children.push(leaf_at(
                    -config.glyph_width / 2.0 - config.symbol_gap,
                    top,
                    Anchor::TopRight,
                    RenderObject::Accidental {
                        name: name.to_string(),
                        glyph: metrics.glyph.clone(),
                        width: metrics.width,
                        height: metrics.height,
                    },
                ));
            }

            if pitch.octave_transpose > 0 {
                for i in 0..count {
                    let y = top - config.transpose_dot_gap - i as f64 * step;
                    children.push(leaf_at(0.0, y, Anchor::Bottom, dot.clone()));
                }
                top -= count as f64 * step;
            } else if pitch.octave_transpose < 0 {
                let below = if index == 0 { beam_room } else { 0.0 };
                let start = base + below + config.transpose_dot_gap;
                for i in 0..count {
                    children.push(leaf_at(0.0, start + i as f64 * step, Anchor::Top, dot.clone()));
                }
            }
        }
        Ok(top)
    }
}

fn glyph(text: &str, config: &RenderConfig) -> RenderObject {
    RenderObject::Glyph {
        text: text.to_string(),
        width: config.glyph_width,
        height: config.glyph_height,
    }
}

fn engrave_multi_bar_rest(count: u32, config: &RenderConfig) -> RenderTree {
    let mid = -config.glyph_height / 2.0;
    let text = count.to_string();
    let bar_width = text_width(&text, config.time_signature_size) + 2.0 * config.glyph_width;
    let thickness = 2.0 * config.beam_height;
    let tick = RenderObject::Rectangle {
        width: config.bar_line_width,
        height: config.glyph_height / 2.0,
    };

    LayoutTree::node(
        Transform::IDENTITY,
        vec![
            leaf_at(
                0.0,
                mid,
                Anchor::Centre,
                RenderObject::Rectangle {
                    width: bar_width,
                    height: thickness,
                },
            ),
            leaf_at(-bar_width / 2.0, mid, Anchor::Centre, tick.clone()),
            leaf_at(bar_width / 2.0, mid, Anchor::Centre, tick),
            leaf_at(
                0.0,
                mid - thickness / 2.0 - config.symbol_gap,
                Anchor::Bottom,
                RenderObject::Text {
                    content: text,
                    size: config.time_signature_size,
                },
            ),
        ],
    )
}

/// Lyric text centred on the syllable content; punctuation hangs off either
/// side.
fn engrave_syllable(syllable: &Syllable, config: &RenderConfig) -> RenderTree {
    let size = config.lyric_size;
    let half = text_width(&syllable.content, size) / 2.0;
    let text = |content: &str| RenderObject::Text {
        content: content.to_string(),
        size,
    };

    let mut children = vec![LayoutTree::leaf(Anchor::Bottom, text(&syllable.content))];
    if let Some(prefix) = &syllable.prefix {
        children.push(leaf_at(-half, 0.0, Anchor::BottomRight, text(prefix)));
    }
    if let Some(suffix) = &syllable.suffix {
        children.push(leaf_at(half, 0.0, Anchor::BottomLeft, text(suffix)));
    }
    LayoutTree::node(Transform::IDENTITY, children)
}

// ═══════════════════════════════════════════════════════════════════════
// Markers
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
enum Stroke {
    Thin,
    Thick,
    Dots,
}

fn strokes(tag: Tag) -> &'static [Stroke] {
    use Stroke::*;
    match tag {
        Tag::TimeSignature { .. } => &[],
        Tag::BarLine => &[Thin],
        Tag::DoubleBarLine => &[Thin, Thin],
        Tag::EndSign => &[Thin, Thick],
        Tag::BeginRepeat => &[Thick, Thin, Dots],
        Tag::EndRepeat => &[Dots, Thin, Thick],
        Tag::BeginEndRepeat => &[Dots, Thin, Thick, Thin, Dots],
    }
}

fn engrave_tag(tag: Tag, config: &RenderConfig) -> RenderTree {
    match tag {
        Tag::TimeSignature { beats, beat_type } => {
            engrave_time_signature(beats, beat_type, config)
        }
        _ => engrave_bar_line(strokes(tag), config),
    }
}

fn engrave_time_signature(beats: u32, beat_type: u32, config: &RenderConfig) -> RenderTree {
    let mid = -config.glyph_height / 2.0;
    let size = config.time_signature_size;
    let (upper, lower) = (beats.to_string(), beat_type.to_string());
    let width = text_width(&upper, size).max(text_width(&lower, size));
    let rule = config.bar_line_width;

    LayoutTree::node(
        Transform::IDENTITY,
        vec![
            leaf_at(
                0.0,
                mid - rule,
                Anchor::Bottom,
                RenderObject::Text {
                    content: upper,
                    size,
                },
            ),
            leaf_at(
                0.0,
                mid,
                Anchor::Centre,
                RenderObject::Rectangle {
                    width,
                    height: rule,
                },
            ),
            leaf_at(
                0.0,
                mid + rule,
                Anchor::Top,
                RenderObject::Text {
                    content: lower,
                    size,
                },
            ),
        ],
    )
}

/// Lays strokes out left to right, centred on the origin, with the bar line
/// paddings reserved on both sides.
fn engrave_bar_line(strokes: &[Stroke], config: &RenderConfig) -> RenderTree {
    let mid = -config.glyph_height / 2.0;
    let width_of = |stroke: &Stroke| match stroke {
        Stroke::Thin => config.bar_line_width,
        Stroke::Thick => config.thick_bar_line_width,
        Stroke::Dots => 2.0 * config.dot_radius,
    };
    let gaps = strokes.len().saturating_sub(1) as f64 * config.thick_bar_line_gap;
    let total: f64 = strokes.iter().map(width_of).sum::<f64>() + gaps;

    let mut children = vec![leaf_at(
        -total / 2.0 - config.bar_line_left_padding,
        mid,
        Anchor::Left,
        RenderObject::InvisibleRectangle {
            width: total + config.bar_line_left_padding + config.bar_line_right_padding,
            height: 0.0,
        },
    )];

    let mut x = -total / 2.0;
    for stroke in strokes {
        let width = width_of(stroke);
        let centre = x + width / 2.0;
        match stroke {
            Stroke::Thin | Stroke::Thick => children.push(leaf_at(
                centre,
                mid,
                Anchor::Centre,
                RenderObject::Rectangle {
                    width,
                    height: config.bar_line_length,
                },
            )),
            Stroke::Dots => {
                let dot = RenderObject::Dot {
                    radius: config.dot_radius,
                };
                let offset = config.glyph_height / 4.0;
                children.push(leaf_at(centre, mid - offset, Anchor::Centre, dot.clone()));
                children.push(leaf_at(centre, mid + offset, Anchor::Centre, dot));
            }
        }
        x += width + config.thick_bar_line_gap;
    }

    LayoutTree::node(Transform::IDENTITY, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::geometry::Rect;
    use crate::model::{duration, Accidental, Entity, TimeMultiplier};
    use crate::slicer::PartialEvent;

    fn engrave(cell: &SlicedEntity) -> EngravedEntity {
        JianpuEngraver::default()
            .engrave(Some(cell), &RenderConfig::default())
            .unwrap()
    }

    fn event(entity: Entity) -> SlicedEntity {
        match entity {
            Entity::Event { event, duration } => SlicedEntity::Event { event, duration },
            Entity::Marker { tag } => SlicedEntity::Marker { tag },
        }
    }

    fn note_with(pitch: Pitch, time_multiplier: TimeMultiplier) -> SlicedEntity {
        SlicedEntity::Event {
            event: Event::Action(Action {
                time_multiplier,
                dots: 0,
                sound: Sound::Note {
                    pitches: vec![pitch],
                },
                top_symbols: Vec::new(),
                bottom_right_symbols: Vec::new(),
            }),
            duration: time_multiplier.duration(0),
        }
    }

    #[test]
    fn rest_is_one_glyph_on_the_baseline() {
        let engraved = engrave(&event(Entity::rest(TimeMultiplier::Crotchet, 0)));
        assert_eq!(engraved.node.leaf_count(), 1);
        assert_eq!(engraved.bbox, BoundingBox::new(-5.0, -16.0, 5.0, 0.0));
        assert_eq!(engraved.core_box, engraved.bbox);
    }

    #[test]
    fn accidental_widens_box_but_not_core() {
        let pitch = Pitch {
            accidental: Some(Accidental::Sharp),
            ..Pitch::new(4)
        };
        let engraved = engrave(&note_with(pitch, TimeMultiplier::Crotchet));
        let full = engraved.bbox.rect().unwrap();
        let core = engraved.core_box.rect().unwrap();
        assert!(full.x1 < -5.0);
        assert_eq!(core.x1, -5.0);
    }

    #[test]
    fn low_octave_dot_clears_the_beams() {
        let config = RenderConfig::default();
        let pitch = Pitch {
            octave_transpose: -1,
            ..Pitch::new(5)
        };
        let engraved = engrave(&note_with(pitch, TimeMultiplier::Quaver));
        let Rect { y2, .. } = engraved.bbox.rect().unwrap();
        let expected = config.beam_gap
            + config.beam_height
            + config.transpose_dot_gap
            + 2.0 * config.transpose_dot_radius;
        assert!((y2 - expected).abs() < 1e-9);
        // The dot is auxiliary, so the core stays on the baseline.
        assert_eq!(engraved.core_box.bound_y().1, 0.0);
    }

    #[test]
    fn high_octave_dot_raises_the_top() {
        let config = RenderConfig::default();
        let pitch = Pitch {
            octave_transpose: 1,
            ..Pitch::new(1)
        };
        let engraved = engrave(&note_with(pitch, TimeMultiplier::Crotchet));
        let top = engraved.bbox.bound_y().0;
        let expected =
            -config.glyph_height - config.transpose_dot_gap - 2.0 * config.transpose_dot_radius;
        assert!((top - expected).abs() < 1e-9);
    }

    #[test]
    fn augmentation_dot_sits_right_of_the_number() {
        let engraved = engrave(&event(Entity::note(3, TimeMultiplier::Crotchet, 1)));
        let config = RenderConfig::default();
        let x2 = engraved.bbox.bound_x().1;
        assert!((x2 - (5.0 + config.dot_gap + 2.0 * config.dot_radius)).abs() < 1e-9);
        assert_eq!(engraved.core_box.bound_x().1, 5.0);
    }

    #[test]
    fn trailing_symbols_follow_the_dots() {
        let config = RenderConfig::default();
        let cell = SlicedEntity::Event {
            event: Event::Action(Action {
                bottom_right_symbols: vec!["breath".to_string(), "staccato".to_string()],
                ..Action::note(2, TimeMultiplier::Crotchet, 1)
            }),
            duration: duration(3, 8),
        };
        let engraved = engrave(&cell);
        // number, dot, breath (4 wide), staccato (2 wide)
        let expected = 5.0 + config.dot_gap + 2.0 * config.dot_radius + 1.0 + 4.0 + 1.0 + 2.0;
        assert!((engraved.bbox.bound_x().1 - expected).abs() < 1e-9);
        assert_eq!(engraved.bbox.bound_y().1, 0.0);
        assert_eq!(engraved.core_box.bound_x(), (-5.0, 5.0));
    }

    #[test]
    fn unknown_trailing_symbol_fails() {
        let cell = SlicedEntity::Event {
            event: Event::Action(Action {
                bottom_right_symbols: vec!["coda".to_string()],
                ..Action::note(1, TimeMultiplier::Crotchet, 0)
            }),
            duration: duration(1, 4),
        };
        let result = JianpuEngraver::default().engrave(Some(&cell), &RenderConfig::default());
        assert_eq!(result, Err(LayoutError::UnknownSymbol("coda".to_string())));
    }

    #[test]
    fn continuation_and_nothing_render_empty() {
        let engraver = JianpuEngraver::default();
        let config = RenderConfig::default();
        let partial = SlicedEntity::Partial(PartialEvent {
            event: Event::Repeater4,
            remaining: duration(1, 4),
            total: duration(1, 2),
        });
        assert!(engraver.engrave(Some(&partial), &config).unwrap().bbox.is_empty());
        assert!(engraver.engrave(None, &config).unwrap().bbox.is_empty());
    }

    #[test]
    fn unknown_top_symbol_fails() {
        let cell = SlicedEntity::Event {
            event: Event::Action(Action {
                top_symbols: vec!["segno".to_string()],
                ..Action::note(1, TimeMultiplier::Crotchet, 0)
            }),
            duration: duration(1, 4),
        };
        let result = JianpuEngraver::default().engrave(Some(&cell), &RenderConfig::default());
        assert_eq!(result, Err(LayoutError::UnknownSymbol("segno".to_string())));
    }

    #[test]
    fn bar_line_reserves_padding() {
        let engraved = engrave(&SlicedEntity::Marker { tag: Tag::BarLine });
        assert_eq!(engraved.bbox.bound_x(), (-4.5, 4.5));
    }

    #[test]
    fn repeat_signs_are_wider_than_plain_bar_lines() {
        let plain = engrave(&SlicedEntity::Marker { tag: Tag::BarLine });
        let repeat = engrave(&SlicedEntity::Marker {
            tag: Tag::BeginEndRepeat,
        });
        assert!(repeat.bbox.width() > plain.bbox.width());
    }

    #[test]
    fn chord_stacks_upwards() {
        let cell = SlicedEntity::Event {
            event: Event::Action(Action {
                time_multiplier: TimeMultiplier::Crotchet,
                dots: 0,
                sound: Sound::Note {
                    pitches: vec![Pitch::new(1), Pitch::new(3), Pitch::new(5)],
                },
                top_symbols: Vec::new(),
                bottom_right_symbols: Vec::new(),
            }),
            duration: duration(1, 4),
        };
        let engraved = engrave(&cell);
        assert_eq!(engraved.node.leaf_count(), 3);
        assert_eq!(engraved.bbox.bound_y(), (-52.0, 0.0));
    }
}
