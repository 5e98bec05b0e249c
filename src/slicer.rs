//! Temporal slicer: aligns independent voices on one shared time grid.
//!
//! Every step takes the shortest remaining head across all voices as the
//! slice length and cuts every other voice's head at that point. The part of
//! a note left over after a cut is carried to the next step as a
//! [`PartialEvent`]. Markers are flushed into their own zero-length slices
//! before any duration arithmetic happens.

use std::iter::Peekable;
use std::slice::Iter;

use fraction::Fraction;
use log::{debug, trace};
use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::model::{Duration, Entity, Event, Interval, Music, Span, Tag, VoiceKind};

/// The remainder of a note cut by a slice boundary (a tie continuation).
///
/// Always satisfies `0 < remaining <= total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialEvent {
    pub event: Event,
    /// Time still to sound from the start of the slice showing it.
    pub remaining: Duration,
    /// Length of the original note.
    pub total: Duration,
}

/// What one voice shows in one slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SlicedEntity {
    /// A note starting in this slice.
    Event { event: Event, duration: Duration },
    Marker { tag: Tag },
    /// A note that started in an earlier slice and still sounds.
    Partial(PartialEvent),
}

impl SlicedEntity {
    /// Length of the note this cell belongs to: the whole note for
    /// continuations, `None` for markers.
    pub fn sounding_duration(&self) -> Option<Duration> {
        match self {
            SlicedEntity::Event { duration, .. } => Some(*duration),
            SlicedEntity::Partial(partial) => Some(partial.total),
            SlicedEntity::Marker { .. } => None,
        }
    }
}

/// One time column of the aligned score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub duration: Duration,
    /// One cell per voice, `None` where the voice has nothing here.
    pub entities: Vec<Option<SlicedEntity>>,
}

impl Slice {
    pub fn is_marker_only(&self) -> bool {
        self.duration == zero()
    }

    /// Shortest note sounding in this slice, counting continuations at their
    /// full length. `None` if nothing sounds.
    pub fn shortest_entity_duration(&self) -> Option<Duration> {
        self.entities
            .iter()
            .flatten()
            .filter_map(SlicedEntity::sounding_duration)
            .fold(None, |acc, d| match acc {
                Some(m) if m <= d => Some(m),
                _ => Some(d),
            })
    }
}

/// Per-voice data carried through slicing, with intervals rewritten from
/// entity indices to slice indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlicedVoice {
    pub kind: VoiceKind,
    pub spans: Vec<Span>,
    pub beams: Vec<Interval>,
}

/// Output of [`slice_music`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlicedMusic {
    pub slices: Vec<Slice>,
    pub voices: Vec<SlicedVoice>,
}

impl SlicedMusic {
    /// The cells of voice `voice`, one per slice.
    pub fn voice_cells(&self, voice: usize) -> impl Iterator<Item = Option<&SlicedEntity>> + '_ {
        self.slices
            .iter()
            .map(move |slice| slice.entities.get(voice).and_then(Option::as_ref))
    }

    /// Sum of all slice durations.
    pub fn total_duration(&self) -> Duration {
        self.slices
            .iter()
            .fold(zero(), |acc, slice| acc + slice.duration)
    }
}

fn zero() -> Duration {
    Fraction::new(0u64, 1u64)
}

/// Slicing state for one voice. Never leaves this module.
struct VoiceCursor<'a> {
    pending: Peekable<std::iter::Enumerate<Iter<'a, Entity>>>,
    ongoing: Option<PartialEvent>,
    /// Slice index where each entity first appears.
    first_slice: Vec<Option<usize>>,
}

enum Head<'a> {
    Ongoing,
    Pending(&'a Entity),
    Done,
}

impl<'a> VoiceCursor<'a> {
    fn new(entities: &'a [Entity]) -> Self {
        Self {
            pending: entities.iter().enumerate().peekable(),
            ongoing: None,
            first_slice: vec![None; entities.len()],
        }
    }

    fn head(&mut self) -> Head<'a> {
        if self.ongoing.is_some() {
            return Head::Ongoing;
        }
        match self.pending.peek() {
            Some(&(_, entity)) => Head::Pending(entity),
            None => Head::Done,
        }
    }

    fn head_is_marker(&mut self) -> bool {
        matches!(self.head(), Head::Pending(entity) if entity.is_marker())
    }

    fn head_length(&mut self) -> Option<Duration> {
        match self.head() {
            Head::Ongoing => self.ongoing.as_ref().map(|p| p.remaining),
            Head::Pending(entity) => entity.duration(),
            Head::Done => None,
        }
    }

    /// Consumes the next pending entity, recording where it landed.
    fn advance(&mut self, slice_index: usize) {
        if let Some((index, _)) = self.pending.next() {
            self.first_slice[index] = Some(slice_index);
        }
    }

    /// Emits this voice's marker head for a marker slice, if it has one.
    fn take_marker(&mut self, slice_index: usize) -> Option<SlicedEntity> {
        match self.head() {
            Head::Pending(Entity::Marker { tag }) => {
                let tag = *tag;
                self.advance(slice_index);
                Some(SlicedEntity::Marker { tag })
            }
            _ => None,
        }
    }

    /// Cuts this voice's head at `unit` and returns what the slice shows.
    fn take_timed(&mut self, unit: Duration, slice_index: usize) -> Option<SlicedEntity> {
        match self.head() {
            Head::Ongoing => {
                let partial = self.ongoing.take()?;
                let remaining = partial.remaining - unit;
                if remaining > zero() {
                    self.ongoing = Some(PartialEvent {
                        remaining,
                        ..partial.clone()
                    });
                }
                Some(SlicedEntity::Partial(partial))
            }
            Head::Pending(Entity::Event { event, duration }) => {
                let (event, duration) = (event.clone(), *duration);
                self.advance(slice_index);
                let remaining = duration - unit;
                if remaining > zero() {
                    self.ongoing = Some(PartialEvent {
                        event: event.clone(),
                        remaining,
                        total: duration,
                    });
                }
                Some(SlicedEntity::Event { event, duration })
            }
            // Markers are flushed before any timed slice is cut.
            Head::Pending(Entity::Marker { .. }) | Head::Done => None,
        }
    }
}

/// Slices every voice of `music` onto a common time grid and remaps each
/// voice's spans and beams onto slice indices.
pub fn slice_music(music: &Music) -> Result<SlicedMusic> {
    for (voice_idx, voice) in music.voices.iter().enumerate() {
        for (index, entity) in voice.entities.iter().enumerate() {
            let Some(d) = entity.duration() else {
                continue;
            };
            if d.is_nan() || d.is_infinite() {
                return Err(LayoutError::NonFiniteDuration {
                    voice: voice_idx,
                    index,
                    duration: d.to_string(),
                });
            }
            if d <= zero() {
                return Err(LayoutError::NonPositiveDuration {
                    voice: voice_idx,
                    index,
                    duration: d.to_string(),
                });
            }
        }
    }

    let mut cursors: Vec<VoiceCursor<'_>> = music
        .voices
        .iter()
        .map(|voice| VoiceCursor::new(&voice.entities))
        .collect();
    let mut slices: Vec<Slice> = Vec::new();

    loop {
        let slice_index = slices.len();

        if cursors.iter_mut().any(VoiceCursor::head_is_marker) {
            let entities = cursors
                .iter_mut()
                .map(|cursor| cursor.take_marker(slice_index))
                .collect();
            trace!("slice {slice_index}: marker slice");
            slices.push(Slice {
                duration: zero(),
                entities,
            });
            continue;
        }

        let unit = cursors
            .iter_mut()
            .filter_map(VoiceCursor::head_length)
            .fold(None, |acc: Option<Duration>, d| match acc {
                Some(m) if m <= d => Some(m),
                _ => Some(d),
            });
        let Some(unit) = unit else {
            break;
        };

        let entities = cursors
            .iter_mut()
            .map(|cursor| cursor.take_timed(unit, slice_index))
            .collect();
        trace!("slice {slice_index}: duration {unit}");
        slices.push(Slice {
            duration: unit,
            entities,
        });
    }

    debug!(
        "sliced {} voices into {} slices",
        music.voices.len(),
        slices.len()
    );

    let voices = music
        .voices
        .iter()
        .zip(&cursors)
        .enumerate()
        .map(|(voice_idx, (voice, cursor))| -> Result<SlicedVoice> {
            let remap = |interval: &Interval| {
                remap_interval(voice_idx, interval, &cursor.first_slice)
            };
            let spans = voice
                .spans
                .iter()
                .map(|span| -> Result<Span> {
                    Ok(Span {
                        interval: remap(&span.interval)?,
                        kind: span.kind.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let beams = voice.beams.iter().map(remap).collect::<Result<Vec<_>>>()?;
            Ok(SlicedVoice {
                kind: voice.kind,
                spans,
                beams,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SlicedMusic { slices, voices })
}

/// Maps an interval over entity indices to the slices where those entities
/// first appear.
fn remap_interval(
    voice: usize,
    interval: &Interval,
    first_slice: &[Option<usize>],
) -> Result<Interval> {
    let out_of_range = || LayoutError::SpanOutOfRange {
        voice,
        start: interval.start,
        end: interval.end,
        len: first_slice.len(),
    };
    if interval.start > interval.end {
        return Err(out_of_range());
    }
    let start = first_slice
        .get(interval.start)
        .copied()
        .flatten()
        .ok_or_else(out_of_range)?;
    let end = first_slice
        .get(interval.end)
        .copied()
        .flatten()
        .ok_or_else(out_of_range)?;
    Ok(Interval::new(start, end))
}
