//! Beams, slurs, ties, tuplets and ornament spans of one voice.

use super::primitive::{leaf_at, RenderObject, RenderTree};
use super::symbols::{SymbolMetrics, SymbolRegistry};
use crate::config::RenderConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::{Anchor, Transform};
use crate::layout_tree::LayoutTree;
use crate::model::{Interval, Span, SpanKind};
use crate::placement::{level_beams, place_spans, Footprint, LeveledBeam};

const FERMATA: &str = "fermata";

/// Horizontal extent of the numbers at both ends of `interval`.
fn span_x(interval: &Interval, offsets: &[f64], config: &RenderConfig) -> Result<(f64, f64)> {
    let ends = (offsets.get(interval.start), offsets.get(interval.end));
    let (Some(&first), Some(&last)) = ends else {
        return Err(LayoutError::IntervalOutOfRange {
            start: interval.start,
            end: interval.end,
            len: offsets.len(),
        });
    };
    let half = config.glyph_width / 2.0;
    Ok((first - half, last + half))
}

fn symbol_metrics<'a>(
    kind: &SpanKind,
    symbols: &'a SymbolRegistry,
) -> Result<Option<&'a SymbolMetrics>> {
    match kind {
        SpanKind::Symbol { name } => symbols.get(name).map(Some),
        SpanKind::Fermata => symbols.get(FERMATA).map(Some),
        SpanKind::Slur | SpanKind::Tie | SpanKind::Tuplet { .. } => Ok(None),
    }
}

fn symbol_object(kind: &SpanKind, metrics: &SymbolMetrics) -> RenderObject {
    let name = match kind {
        SpanKind::Symbol { name } => name.as_str(),
        _ => FERMATA,
    };
    RenderObject::Symbol {
        name: name.to_string(),
        glyph: metrics.glyph.clone(),
        width: metrics.width,
        height: metrics.height,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Beams
// ═══════════════════════════════════════════════════════════════════════

/// One rectangle per beam, hanging below the numbers at its level.
pub(super) fn engrave_beams(
    beams: &[Interval],
    offsets: &[f64],
    config: &RenderConfig,
) -> Result<Vec<RenderTree>> {
    level_beams(beams)
        .into_iter()
        .map(|LeveledBeam { interval, level }| {
            let (x1, x2) = span_x(&interval, offsets, config)?;
            let (x1, x2) = (x1 - config.beam_overhang, x2 + config.beam_overhang);
            Ok(leaf_at(
                x1,
                config.beam_offset(level),
                Anchor::TopLeft,
                RenderObject::Rectangle {
                    width: x2 - x1,
                    height: config.beam_height,
                },
            ))
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Spans
// ═══════════════════════════════════════════════════════════════════════

/// Vertical room `span` takes above its band baseline.
pub(super) fn footprint(
    span: &Span,
    config: &RenderConfig,
    symbols: &SymbolRegistry,
) -> Result<Footprint> {
    let occupied_height = match &span.kind {
        SpanKind::Slur | SpanKind::Tie => config.slur_height + config.slur_padding_bottom,
        SpanKind::Tuplet { .. } => {
            config.tuplet_bracket_height + config.tuplet_text_size + config.symbol_gap
        }
        kind => {
            let height = symbol_metrics(kind, symbols)?.map_or(0.0, |m| m.height);
            height + config.symbol_gap
        }
    };
    Ok(Footprint { occupied_height })
}

/// Places every span of a voice above `tops` and draws it on its band.
pub(super) fn engrave_spans(
    spans: &[Span],
    tops: &[f64],
    offsets: &[f64],
    config: &RenderConfig,
    symbols: &SymbolRegistry,
) -> Result<Vec<RenderTree>> {
    let placements = place_spans(spans, tops, |span| footprint(span, config, symbols))?;
    placements
        .iter()
        .map(|placement| {
            engrave_span(&spans[placement.span], placement.y, offsets, config, symbols)
        })
        .collect()
}

fn engrave_span(
    span: &Span,
    y: f64,
    offsets: &[f64],
    config: &RenderConfig,
    symbols: &SymbolRegistry,
) -> Result<RenderTree> {
    let (x1, x2) = span_x(&span.interval, offsets, config)?;
    match &span.kind {
        SpanKind::Slur | SpanKind::Tie => {
            let (x1, x2) = (x1 + config.slur_padding_x, x2 - config.slur_padding_x);
            Ok(leaf_at(
                x1,
                y - config.slur_padding_bottom,
                Anchor::BottomLeft,
                RenderObject::Curve {
                    width: (x2 - x1).max(0.0),
                    height: config.slur_height,
                },
            ))
        }
        SpanKind::Tuplet { value } => {
            let bottom = y - config.symbol_gap;
            Ok(LayoutTree::node(
                Transform::IDENTITY,
                vec![
                    leaf_at(
                        x1,
                        bottom,
                        Anchor::BottomLeft,
                        RenderObject::Curve {
                            width: x2 - x1,
                            height: config.tuplet_bracket_height,
                        },
                    ),
                    leaf_at(
                        (x1 + x2) / 2.0,
                        bottom - config.tuplet_bracket_height,
                        Anchor::Bottom,
                        RenderObject::Text {
                            content: value.to_string(),
                            size: config.tuplet_text_size,
                        },
                    ),
                ],
            ))
        }
        kind => {
            let Some(metrics) = symbol_metrics(kind, symbols)? else {
                return Ok(LayoutTree::empty());
            };
            let bottom = y - config.symbol_gap;
            let object = symbol_object(kind, metrics);
            if span.interval.start == span.interval.end || metrics.width <= 0.0 {
                return Ok(leaf_at((x1 + x2) / 2.0, bottom, Anchor::Bottom, object));
            }
            // Stretched to cover the span.
            let scale = (x2 - x1) / metrics.width;
            Ok(LayoutTree::wrap(
                Transform::new(x1, bottom, scale, 1.0),
                LayoutTree::leaf(Anchor::BottomLeft, object),
            ))
        }
    }
}
