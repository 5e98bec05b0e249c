//! Drawable primitives of the jianpu vocabulary.
//!
//! Every primitive carries its own size, so bounding boxes can be computed
//! without going back to the configuration or the symbol registry.

use serde::Serialize;

use crate::geometry::{Anchor, Transform};
use crate::layout_tree::{LayoutTree, Primitive};

/// Average advance of a character, as a fraction of the font size.
const TEXT_ADVANCE: f64 = 0.6;

/// Layout tree of jianpu primitives.
pub type RenderTree = LayoutTree<RenderObject>;

/// Estimated width of `content` set at `size`.
pub fn text_width(content: &str, size: f64) -> f64 {
    content.chars().count() as f64 * size * TEXT_ADVANCE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderObject {
    /// A number (or `0`, `X`) of the score.
    Glyph {
        text: String,
        width: f64,
        height: f64,
    },
    Accidental {
        name: String,
        glyph: String,
        width: f64,
        height: f64,
    },
    /// An ornament from the symbol registry.
    Symbol {
        name: String,
        glyph: String,
        width: f64,
        height: f64,
    },
    /// A registry symbol set after the number on its baseline, such as a
    /// breath mark.
    TrailingSymbol {
        name: String,
        glyph: String,
        width: f64,
        height: f64,
    },
    Rectangle {
        width: f64,
        height: f64,
    },
    /// Occupies room but draws nothing.
    InvisibleRectangle {
        width: f64,
        height: f64,
    },
    Dot {
        radius: f64,
    },
    /// An arc from the bottom-left to the bottom-right corner of its box,
    /// peaking at the top edge.
    Curve {
        width: f64,
        height: f64,
    },
    Text {
        content: String,
        size: f64,
    },
}

impl RenderObject {
    /// Auxiliary marks stay out of the core (non-intrusive) box.
    pub fn is_auxiliary(&self) -> bool {
        matches!(
            self,
            RenderObject::Accidental { .. }
                | RenderObject::Dot { .. }
                | RenderObject::TrailingSymbol { .. }
        )
    }
}

/// A leaf whose anchor sits at `(x, y)` of the parent.
pub(super) fn leaf_at(x: f64, y: f64, anchor: Anchor, object: RenderObject) -> RenderTree {
    LayoutTree::wrap(Transform::translate(x, y), LayoutTree::leaf(anchor, object))
}

impl Primitive for RenderObject {
    fn size(&self) -> (f64, f64) {
        match self {
            RenderObject::Glyph { width, height, .. }
            | RenderObject::Accidental { width, height, .. }
            | RenderObject::Symbol { width, height, .. }
            | RenderObject::TrailingSymbol { width, height, .. }
            | RenderObject::Rectangle { width, height }
            | RenderObject::InvisibleRectangle { width, height }
            | RenderObject::Curve { width, height } => (*width, *height),
            RenderObject::Dot { radius } => (radius * 2.0, radius * 2.0),
            RenderObject::Text { content, size } => (text_width(content, *size), *size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_size_is_its_diameter() {
        assert_eq!(RenderObject::Dot { radius: 1.5 }.size(), (3.0, 3.0));
    }

    #[test]
    fn text_size_scales_with_length() {
        let text = RenderObject::Text {
            content: "la".to_string(),
            size: 10.0,
        };
        assert_eq!(text.size(), (12.0, 10.0));
    }

    #[test]
    fn marks_beside_the_number_are_auxiliary() {
        assert!(RenderObject::Dot { radius: 1.0 }.is_auxiliary());
        assert!(RenderObject::TrailingSymbol {
            name: "breath".to_string(),
            glyph: ",".to_string(),
            width: 4.0,
            height: 6.0,
        }
        .is_auxiliary());
        assert!(!RenderObject::Rectangle {
            width: 1.0,
            height: 1.0
        }
        .is_auxiliary());
    }
}
