//! Symbol registry: name → metrics table for accidentals and ornaments.
//!
//! The registry is an ordinary value owned by whoever engraves; there is no
//! process-wide table.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{LayoutError, Result};

/// Size and text glyph of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMetrics {
    pub width: f64,
    pub height: f64,
    pub glyph: String,
}

impl SymbolMetrics {
    pub fn new(width: f64, height: f64, glyph: &str) -> Self {
        Self {
            width,
            height,
            glyph: glyph.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    symbols: HashMap<String, SymbolMetrics>,
}

/// Built-in symbols: `(name, width, height, glyph)`.
const DEFAULT_SYMBOLS: &[(&str, f64, f64, &str)] = &[
    ("accidentalNatural", 5.0, 10.0, "♮"),
    ("accidentalSharp", 5.0, 10.0, "♯"),
    ("accidentalFlat", 5.0, 9.0, "♭"),
    ("accidentalDoubleSharp", 6.0, 6.0, "𝄪"),
    ("accidentalDoubleFlat", 8.0, 9.0, "𝄫"),
    ("fermata", 12.0, 7.0, "𝄐"),
    ("trill", 10.0, 8.0, "tr"),
    ("accent", 7.0, 5.0, ">"),
    ("staccato", 2.0, 2.0, "·"),
    ("tenuto", 8.0, 1.0, "–"),
    ("mordent", 10.0, 5.0, "~"),
    ("turn", 10.0, 5.0, "∽"),
    ("breath", 4.0, 6.0, ","),
];

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in accidental and ornament.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for &(name, width, height, glyph) in DEFAULT_SYMBOLS {
            registry.register(name, SymbolMetrics::new(width, height, glyph));
        }
        registry
    }

    /// Adds or replaces a symbol.
    pub fn register(&mut self, name: &str, metrics: SymbolMetrics) {
        self.symbols.insert(name.to_string(), metrics);
    }

    pub fn get(&self, name: &str) -> Result<&SymbolMetrics> {
        self.symbols
            .get(name)
            .ok_or_else(|| LayoutError::UnknownSymbol(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
