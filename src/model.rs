//! Data model for an abstract multi-voice jianpu score.
//!
//! A [`Music`] value is the input of a layout request: an ordered list of
//! voices, each an ordered list of entities plus the decorations (spans and
//! beams) that cover ranges of those entities. Nothing here knows about
//! geometry.

use fraction::Fraction;
use serde::{Deserialize, Serialize};

/// Exact rational duration, in whole notes (a quarter note is `1/4`).
pub type Duration = Fraction;

/// Build a duration from a numerator and a denominator.
pub fn duration(numer: u64, denom: u64) -> Duration {
    Fraction::new(numer, denom)
}

/// A complete piece of music: one line of voices laid out together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Music {
    pub voices: Vec<Voice>,
}

/// Whether a voice carries notes or lyric syllables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    #[default]
    Music,
    Lyric,
}

/// One voice (row) of the score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voice {
    pub kind: VoiceKind,
    /// Ordered entities; intervals below index into this list.
    pub entities: Vec<Entity>,
    /// Slurs, ties, tuplets and symbols, in authoring order.
    pub spans: Vec<Span>,
    /// Beam (underline) intervals. Kept apart from `spans` because beams
    /// stack by nesting rather than by headroom.
    pub beams: Vec<Interval>,
}

impl Voice {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    pub fn lyric(entities: Vec<Entity>) -> Self {
        Self {
            kind: VoiceKind::Lyric,
            entities,
            ..Self::default()
        }
    }

    pub fn with_span(mut self, start: usize, end: usize, kind: SpanKind) -> Self {
        self.spans.push(Span {
            interval: Interval::new(start, end),
            kind,
        });
        self
    }

    pub fn with_beam(mut self, start: usize, end: usize) -> Self {
        self.beams.push(Interval::new(start, end));
        self
    }
}

/// Inclusive index range `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A decoration covering a contiguous range of one voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub interval: Interval,
    pub kind: SpanKind,
}

/// Kinds of non-beam decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Slur,
    Tie,
    Tuplet { value: u32 },
    /// A registry symbol stretched across the span.
    Symbol { name: String },
    Fermata,
}

impl SpanKind {
    /// Slurs and ties arc over their end notes, so only the notes strictly
    /// inside are pushed under them.
    pub fn pushes_interior_only(&self) -> bool {
        matches!(self, SpanKind::Slur | SpanKind::Tie)
    }
}

/// An element of a voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    /// Something that sounds (or rests) for `duration`.
    Event { event: Event, duration: Duration },
    /// Zero-duration notation such as a bar line.
    Marker { tag: Tag },
}

impl Entity {
    pub fn event(event: Event, duration: Duration) -> Self {
        Entity::Event { event, duration }
    }

    pub fn marker(tag: Tag) -> Self {
        Entity::Marker { tag }
    }

    /// A single-pitch note whose duration follows from its notation.
    pub fn note(white_key: u8, time_multiplier: TimeMultiplier, dots: u8) -> Self {
        let action = Action::note(white_key, time_multiplier, dots);
        let duration = time_multiplier.duration(dots);
        Entity::Event {
            event: Event::Action(action),
            duration,
        }
    }

    pub fn rest(time_multiplier: TimeMultiplier, dots: u8) -> Self {
        Entity::Event {
            event: Event::Action(Action {
                time_multiplier,
                dots,
                sound: Sound::Rest,
                top_symbols: Vec::new(),
                bottom_right_symbols: Vec::new(),
            }),
            duration: time_multiplier.duration(dots),
        }
    }

    pub fn syllable(content: &str, duration: Duration) -> Self {
        Entity::Event {
            event: Event::Pronounce {
                syllable: Some(Syllable {
                    prefix: None,
                    content: content.to_string(),
                    suffix: None,
                }),
            },
            duration,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Entity::Event { duration, .. } => Some(*duration),
            Entity::Marker { .. } => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Entity::Marker { .. })
    }
}

/// Musical content of an [`Entity::Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Action(Action),
    /// Dash extending the previous note by a quarter.
    Repeater4,
    MultiBarRest { count: u32 },
    /// A lyric syllable (or a silent placeholder).
    Pronounce { syllable: Option<Syllable> },
}

/// One written number of the score: a note, chord, rest or clap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub time_multiplier: TimeMultiplier,
    pub dots: u8,
    pub sound: Sound,
    /// Ornament symbols stacked above the number, innermost first.
    #[serde(default)]
    pub top_symbols: Vec<String>,
    /// Symbols set on the baseline after the number, left to right.
    #[serde(default)]
    pub bottom_right_symbols: Vec<String>,
}

impl Action {
    pub fn note(white_key: u8, time_multiplier: TimeMultiplier, dots: u8) -> Self {
        Self {
            time_multiplier,
            dots,
            sound: Sound::Note {
                pitches: vec![Pitch::new(white_key)],
            },
            top_symbols: Vec::new(),
            bottom_right_symbols: Vec::new(),
        }
    }
}

/// Number of beams under a number; also fixes its nominal length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeMultiplier {
    Whole,
    Minim,
    Crotchet,
    Quaver,
    Semiquaver,
    Demisemiquaver,
}

impl TimeMultiplier {
    /// Beams drawn under the number (negative for notes longer than a quarter).
    pub fn beams(self) -> i32 {
        match self {
            TimeMultiplier::Whole => -2,
            TimeMultiplier::Minim => -1,
            TimeMultiplier::Crotchet => 0,
            TimeMultiplier::Quaver => 1,
            TimeMultiplier::Semiquaver => 2,
            TimeMultiplier::Demisemiquaver => 3,
        }
    }

    /// Exact length of a number with this multiplier and `dots` augmentation
    /// dots: each dot adds half of the previous addition.
    pub fn duration(self, dots: u8) -> Duration {
        let base = match self {
            TimeMultiplier::Whole => duration(1, 1),
            TimeMultiplier::Minim => duration(1, 2),
            TimeMultiplier::Crotchet => duration(1, 4),
            TimeMultiplier::Quaver => duration(1, 8),
            TimeMultiplier::Semiquaver => duration(1, 16),
            TimeMultiplier::Demisemiquaver => duration(1, 32),
        };
        let mut total = base;
        let mut addition = base;
        for _ in 0..dots {
            addition = addition / duration(2, 1);
            total = total + addition;
        }
        total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sound {
    /// One or more simultaneous pitches, lowest first.
    Note { pitches: Vec<Pitch> },
    Rest,
    Clap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    /// Scale degree 1..=7.
    pub white_key: u8,
    /// Octaves above (positive) or below (negative) the middle register.
    #[serde(default)]
    pub octave_transpose: i8,
    #[serde(default)]
    pub accidental: Option<Accidental>,
}

impl Pitch {
    pub fn new(white_key: u8) -> Self {
        Self {
            white_key,
            octave_transpose: 0,
            accidental: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
    DoubleSharp,
    DoubleFlat,
}

impl Accidental {
    pub fn symbol_name(self) -> &'static str {
        match self {
            Accidental::Natural => "accidentalNatural",
            Accidental::Sharp => "accidentalSharp",
            Accidental::Flat => "accidentalFlat",
            Accidental::DoubleSharp => "accidentalDoubleSharp",
            Accidental::DoubleFlat => "accidentalDoubleFlat",
        }
    }
}

/// Lyric text, with punctuation kept apart so it does not shift alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllable {
    pub prefix: Option<String>,
    pub content: String,
    pub suffix: Option<String>,
}

/// Payload of an [`Entity::Marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    TimeSignature { beats: u32, beat_type: u32 },
    BarLine,
    DoubleBarLine,
    BeginRepeat,
    EndRepeat,
    BeginEndRepeat,
    EndSign,
}
