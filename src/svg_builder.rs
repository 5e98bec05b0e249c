//! SVG builder: accumulates SVG elements and produces the final string.
//!
//! The builder knows nothing about music. [`render_svg`] walks the flattened
//! draw list of an [`EngravedMusic`] and emits one element per primitive.

use crate::engraver::{EngravedMusic, RenderObject};
use crate::geometry::{BoundingBox, Rect};
use crate::layout_tree::{DrawDirective, Primitive};

const INK_COLOR: &str = "#1a1a1a";
const CURVE_STROKE_WIDTH: f64 = 1.0;

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(crate) struct SvgBuilder {
    elements: Vec<String>,
    width: f64,
    height: f64,
}

fn escape(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl SvgBuilder {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            width,
            height,
        }
    }

    pub(crate) fn build(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}" style="font-family: 'Georgia', 'Times New Roman', serif;">"#,
            self.width, self.height, self.width, self.height
        );
        svg.push('\n');
        for el in &self.elements {
            svg.push_str("  ");
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    pub(crate) fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) {
        self.elements.push(format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x, y, w, h, fill
        ));
    }

    pub(crate) fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str) {
        self.elements.push(format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            cx, cy, r, fill
        ));
    }

    /// Text centred on `x` with its baseline at `y`. `length` stretches the
    /// run to an exact width.
    pub(crate) fn text(&mut self, x: f64, y: f64, content: &str, size: f64, length: Option<f64>) {
        let stretch = length
            .map(|l| format!(r#" textLength="{:.2}" lengthAdjust="spacingAndGlyphs""#, l))
            .unwrap_or_default();
        self.elements.push(format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{:.2}" fill="{}" text-anchor="middle"{}>{}</text>"#,
            x,
            y,
            size,
            INK_COLOR,
            stretch,
            escape(content)
        ));
    }

    pub(crate) fn path(&mut self, d: &str, fill: &str, stroke: &str, stroke_width: f64) {
        self.elements.push(format!(
            r#"<path d="{}" fill="{}" stroke="{}" stroke-width="{:.1}" stroke-linecap="round"/>"#,
            d, fill, stroke, stroke_width
        ));
    }

    /// Quadratic arc from the bottom corners of `r`, peaking at its top edge.
    pub(crate) fn arc(&mut self, r: &Rect) {
        let cx = (r.x1 + r.x2) / 2.0;
        let cy = r.y1 - r.height();
        let d = format!(
            "M{:.2},{:.2} Q{:.2},{:.2} {:.2},{:.2}",
            r.x1, r.y2, cx, cy, r.x2, r.y2
        );
        self.path(&d, "none", INK_COLOR, CURVE_STROKE_WIDTH);
    }

    /// Draws one directive inside `r`, the primitive's absolute box.
    fn directive(&mut self, object: &RenderObject, r: &Rect) {
        let cx = (r.x1 + r.x2) / 2.0;
        match object {
            RenderObject::Glyph { text, .. } => self.text(cx, r.y2, text, r.height(), None),
            RenderObject::Text { content, .. } => self.text(cx, r.y2, content, r.height(), None),
            RenderObject::Accidental { glyph, .. } | RenderObject::TrailingSymbol { glyph, .. } => {
                self.text(cx, r.y2, glyph, r.height(), None)
            }
            RenderObject::Symbol { glyph, .. } => {
                self.text(cx, r.y2, glyph, r.height(), Some(r.width()))
            }
            RenderObject::Rectangle { .. } => {
                self.rect(r.x1, r.y1, r.width(), r.height(), INK_COLOR)
            }
            RenderObject::Dot { .. } => {
                self.circle(cx, (r.y1 + r.y2) / 2.0, r.width() / 2.0, INK_COLOR)
            }
            RenderObject::Curve { .. } => self.arc(r),
            RenderObject::InvisibleRectangle { .. } => {}
        }
    }
}

/// Absolute box of a directive: the leaf box with its anchor at the origin,
/// mapped through the accumulated transform.
pub fn directive_rect<P: Primitive>(directive: &DrawDirective<'_, P>) -> Option<Rect> {
    let (width, height) = directive.object.size();
    BoundingBox::of_leaf(width, height, directive.anchor)
        .transformed(&directive.transform)
        .rect()
}

/// Serializes a laid-out line as a self-contained SVG document.
pub fn render_svg(music: &EngravedMusic) -> String {
    let mut svg = SvgBuilder::new(music.width, music.height);
    svg.rect(0.0, 0.0, music.width, music.height, "white");
    for directive in music.directives() {
        if let Some(r) = directive_rect(&directive) {
            svg.directive(directive.object, &r);
        }
    }
    svg.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Anchor, Transform};

    #[test]
    fn directive_box_subtracts_anchor() {
        let object = RenderObject::Rectangle {
            width: 10.0,
            height: 4.0,
        };
        let directive = DrawDirective {
            transform: Transform::new(100.0, 50.0, 2.0, 1.0),
            anchor: Anchor::Bottom,
            object: &object,
        };
        let r = directive_rect(&directive).unwrap();
        assert_eq!((r.x1, r.y1, r.x2, r.y2), (90.0, 46.0, 110.0, 50.0));
    }

    #[test]
    fn text_is_escaped() {
        let mut svg = SvgBuilder::new(10.0, 10.0);
        svg.text(0.0, 0.0, "a<b", 10.0, None);
        let out = svg.build();
        assert!(out.contains("a&lt;b"));
        assert!(out.ends_with("</svg>\n"));
    }

    #[test]
    fn invisible_rectangles_draw_nothing() {
        let mut svg = SvgBuilder::new(10.0, 10.0);
        let r = Rect::from_corners(0.0, 0.0, 4.0, 4.0);
        svg.directive(
            &RenderObject::InvisibleRectangle {
                width: 4.0,
                height: 4.0,
            },
            &r,
        );
        assert!(svg.elements.is_empty());
    }
}
