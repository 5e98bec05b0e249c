//! Decoration placement: nesting levels for beams and collision-free
//! vertical bands for slurs, ties, tuplets and symbols.
//!
//! Y grows downwards, so "higher" bands have smaller (more negative) Y.

use log::trace;
use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::model::{Interval, Span};

/// A beam with its nesting level (0 is closest to the numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeveledBeam {
    pub interval: Interval,
    pub level: usize,
}

/// Assigns every beam a level by sweeping them in start order with a stack
/// of still-open beam ends. Equal starts keep their input order.
pub fn level_beams(beams: &[Interval]) -> Vec<LeveledBeam> {
    let mut sorted: Vec<Interval> = beams.to_vec();
    sorted.sort_by_key(|beam| beam.start);

    let mut open_ends: Vec<usize> = Vec::new();
    sorted
        .into_iter()
        .map(|interval| {
            while open_ends.last().is_some_and(|&end| end < interval.start) {
                open_ends.pop();
            }
            open_ends.push(interval.end);
            let level = open_ends.len() - 1;
            trace!("beam {}..={} at level {level}", interval.start, interval.end);
            LeveledBeam { interval, level }
        })
        .collect()
}

/// Vertical room a span takes once placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Footprint {
    pub occupied_height: f64,
}

/// Where a span ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanPlacement {
    /// Index into the input span list.
    pub span: usize,
    /// Baseline of the band the span is drawn on.
    pub y: f64,
    pub occupied_height: f64,
}

/// Index range a placed span pushes other spans out of. Signed so that the
/// interior of a span over two adjacent slices can be the inverted range
/// `end..start`, which still touches anything covering both slices.
#[derive(Debug, Clone, Copy)]
struct Reach {
    start: i64,
    end: i64,
}

impl Reach {
    fn of(span: &Span) -> Self {
        let start = span.interval.start as i64;
        let end = span.interval.end as i64;
        if span.kind.pushes_interior_only() {
            Reach {
                start: start + 1,
                end: end - 1,
            }
        } else {
            Reach { start, end }
        }
    }

    fn touches(&self, interval: &Interval) -> bool {
        let (start, end) = (interval.start as i64, interval.end as i64);
        !(self.end < start || end < self.start)
    }
}

struct Pending {
    span: usize,
    available_y: f64,
}

/// Places spans greedily, most constrained (greatest available Y) first.
///
/// `tops[i]` is the top Y of whatever the voice draws in slice `i`. A span's
/// available Y starts as the minimum top across its interval; placing a span
/// at its available Y lowers the available Y of every pending span touching
/// its reach by the span's footprint.
pub fn place_spans<F>(spans: &[Span], tops: &[f64], mut footprint: F) -> Result<Vec<SpanPlacement>>
where
    F: FnMut(&Span) -> Result<Footprint>,
{
    let mut queue = spans
        .iter()
        .enumerate()
        .map(|(index, span)| {
            let Interval { start, end } = span.interval;
            let covered = tops
                .get(start..=end)
                .filter(|_| start <= end)
                .ok_or(LayoutError::IntervalOutOfRange {
                    start,
                    end,
                    len: tops.len(),
                })?;
            let available_y = covered.iter().copied().fold(f64::INFINITY, f64::min);
            Ok(Pending {
                span: index,
                available_y,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Queue order breaks ties: inner spans end no later than the spans
    // enclosing them, and start no earlier.
    queue.sort_by(|a, b| {
        let (ia, ib) = (spans[a.span].interval, spans[b.span].interval);
        ia.end.cmp(&ib.end).then(ib.start.cmp(&ia.start))
    });

    let mut placements = Vec::with_capacity(queue.len());
    while !queue.is_empty() {
        let mut pick = 0;
        for (i, pending) in queue.iter().enumerate().skip(1) {
            if pending.available_y > queue[pick].available_y {
                pick = i;
            }
        }
        let placed = queue.remove(pick);
        let span = &spans[placed.span];
        let Footprint { occupied_height } = footprint(span)?;
        trace!(
            "span {} ({:?}) placed at y {:.2}",
            placed.span,
            span.kind,
            placed.available_y
        );

        let reach = Reach::of(span);
        let limit = placed.available_y - occupied_height;
        for other in queue.iter_mut() {
            if reach.touches(&spans[other.span].interval) {
                other.available_y = other.available_y.min(limit);
            }
        }

        placements.push(SpanPlacement {
            span: placed.span,
            y: placed.available_y,
            occupied_height,
        });
    }
    Ok(placements)
}
