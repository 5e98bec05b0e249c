//! Render configuration: every size the engraver uses, in SVG user units.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::spacing::SpacingParams;

/// Flat set of named numeric options. Any subset may be given as JSON; the
/// rest keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    // ── Line ────────────────────────────────────────────────────────────
    pub line_width: f64,
    /// Vertical gap between two music voices.
    pub line_gap: f64,
    /// Vertical gap above a lyric voice.
    pub lyric_gap: f64,
    /// Extra width added to every slice's rest length.
    pub slice_padding: f64,

    // ── Spacing rule ────────────────────────────────────────────────────
    pub min_duration_width: f64,
    pub magic: f64,

    // ── Numbers ─────────────────────────────────────────────────────────
    pub glyph_width: f64,
    pub glyph_height: f64,
    pub chord_gap: f64,
    pub transpose_dot_radius: f64,
    pub transpose_dot_gap: f64,
    /// Augmentation dots.
    pub dot_radius: f64,
    pub dot_gap: f64,
    pub repeater4_width: f64,
    pub repeater4_height: f64,

    // ── Beams ───────────────────────────────────────────────────────────
    pub beam_height: f64,
    pub beam_gap: f64,
    pub beam_overhang: f64,

    // ── Bar lines ───────────────────────────────────────────────────────
    pub bar_line_length: f64,
    pub bar_line_width: f64,
    pub bar_line_left_padding: f64,
    pub bar_line_right_padding: f64,
    pub thick_bar_line_width: f64,
    pub thick_bar_line_gap: f64,
    pub time_signature_size: f64,

    // ── Decorations ─────────────────────────────────────────────────────
    pub slur_height: f64,
    pub slur_padding_x: f64,
    pub slur_padding_bottom: f64,
    pub tuplet_bracket_height: f64,
    pub tuplet_text_size: f64,
    pub symbol_gap: f64,
    /// Horizontal gap before each symbol set after a number.
    pub symbol_x_gap: f64,

    // ── Lyrics ──────────────────────────────────────────────────────────
    pub lyric_size: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            line_width: 800.0,
            line_gap: 24.0,
            lyric_gap: 8.0,
            slice_padding: 6.0,

            min_duration_width: 1.0,
            magic: 1.0,

            glyph_width: 10.0,
            glyph_height: 16.0,
            chord_gap: 2.0,
            transpose_dot_radius: 1.2,
            transpose_dot_gap: 1.5,
            dot_radius: 1.5,
            dot_gap: 2.0,
            repeater4_width: 8.0,
            repeater4_height: 1.5,

            beam_height: 1.5,
            beam_gap: 2.5,
            beam_overhang: 1.0,

            bar_line_length: 24.0,
            bar_line_width: 1.0,
            bar_line_left_padding: 4.0,
            bar_line_right_padding: 4.0,
            thick_bar_line_width: 3.0,
            thick_bar_line_gap: 2.0,
            time_signature_size: 11.0,

            slur_height: 5.0,
            slur_padding_x: 2.0,
            slur_padding_bottom: 2.0,
            tuplet_bracket_height: 4.0,
            tuplet_text_size: 9.0,
            symbol_gap: 2.0,
            symbol_x_gap: 1.0,

            lyric_size: 14.0,
        }
    }
}

impl RenderConfig {
    /// Decodes a (possibly partial) JSON object and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RenderConfig =
            serde_json::from_str(json).map_err(|e| LayoutError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Every option must be a finite, non-negative number, and the stiffness
    /// rule needs a positive `min_duration_width`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.options() {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "`{name}` must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.min_duration_width == 0.0 {
            return Err(LayoutError::InvalidConfig(
                "`min_duration_width` must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn spacing_params(&self) -> SpacingParams {
        SpacingParams {
            min_duration_width: self.min_duration_width,
            magic: self.magic,
        }
    }

    /// Distance from the baseline down to the top of beam `level`.
    pub fn beam_offset(&self, level: usize) -> f64 {
        self.beam_gap + level as f64 * (self.beam_gap + self.beam_height)
    }

    fn options(&self) -> [(&'static str, f64); 33] {
        [
            ("line_width", self.line_width),
            ("line_gap", self.line_gap),
            ("lyric_gap", self.lyric_gap),
            ("slice_padding", self.slice_padding),
            ("min_duration_width", self.min_duration_width),
            ("magic", self.magic),
            ("glyph_width", self.glyph_width),
            ("glyph_height", self.glyph_height),
            ("chord_gap", self.chord_gap),
            ("transpose_dot_radius", self.transpose_dot_radius),
            ("transpose_dot_gap", self.transpose_dot_gap),
            ("dot_radius", self.dot_radius),
            ("dot_gap", self.dot_gap),
            ("repeater4_width", self.repeater4_width),
            ("repeater4_height", self.repeater4_height),
            ("beam_height", self.beam_height),
            ("beam_gap", self.beam_gap),
            ("beam_overhang", self.beam_overhang),
            ("bar_line_length", self.bar_line_length),
            ("bar_line_width", self.bar_line_width),
            ("bar_line_left_padding", self.bar_line_left_padding),
            ("bar_line_right_padding", self.bar_line_right_padding),
            ("thick_bar_line_width", self.thick_bar_line_width),
            ("thick_bar_line_gap", self.thick_bar_line_gap),
            ("time_signature_size", self.time_signature_size),
            ("slur_height", self.slur_height),
            ("slur_padding_x", self.slur_padding_x),
            ("slur_padding_bottom", self.slur_padding_bottom),
            ("tuplet_bracket_height", self.tuplet_bracket_height),
            ("tuplet_text_size", self.tuplet_text_size),
            ("symbol_gap", self.symbol_gap),
            ("symbol_x_gap", self.symbol_x_gap),
            ("lyric_size", self.lyric_size),
        ]
    }
}
