//! Geometry kernel: translate-and-scale transforms, anchors and
//! axis-aligned bounding boxes.
//!
//! Y grows downwards, as in SVG. Zero scale collapses an axis and negative
//! scale mirrors it; both are valid inputs.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// A translation followed by independent X/Y scaling.
///
/// A point `p` in the child space maps to `translation + p * scale` in the
/// parent space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub dx: f64,
    pub dy: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        dx: 0.0,
        dy: 0.0,
        sx: 1.0,
        sy: 1.0,
    };

    pub const fn new(dx: f64, dy: f64, sx: f64, sy: f64) -> Self {
        Self { dx, dy, sx, sy }
    }

    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self::new(dx, dy, 1.0, 1.0)
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(0.0, 0.0, sx, sy)
    }

    /// `self ∘ child`: the transform of `child` as seen from `self`'s parent.
    ///
    /// Associative but not commutative.
    #[must_use]
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            dx: self.dx + child.dx * self.sx,
            dy: self.dy + child.dy * self.sy,
            sx: self.sx * child.sx,
            sy: self.sy * child.sy,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.dx + x * self.sx, self.dy + y * self.sy)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

/// Reference point of a leaf, as a fraction of its own width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    Centre,
    Bottom,
    BottomLeft,
    BottomRight,
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    /// Any point of `[0,1]×[0,1]`.
    Arbitrary { x: f64, y: f64 },
}

impl Anchor {
    pub fn norm(self) -> (f64, f64) {
        match self {
            Anchor::Centre => (0.5, 0.5),
            Anchor::Bottom => (0.5, 1.0),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
            Anchor::Left => (0.0, 0.5),
            Anchor::Right => (1.0, 0.5),
            Anchor::Top => (0.5, 0.0),
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::Arbitrary { x, y } => (x, y),
        }
    }
}

/// Non-empty axis-aligned rectangle with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Builds a rectangle from two opposite corners in any order.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x1: ax.min(bx),
            y1: ay.min(by),
            x2: ax.max(bx),
            y2: ay.max(by),
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// A bounding box that may be empty (a node with no drawable leaves).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BoundingBox {
    #[default]
    Empty,
    Rect(Rect),
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        BoundingBox::Rect(Rect::from_corners(x1, y1, x2, y2))
    }

    /// Box of a `width`×`height` leaf whose anchor sits at the local origin.
    pub fn of_leaf(width: f64, height: f64, anchor: Anchor) -> Self {
        let (ax, ay) = anchor.norm();
        Self::new(
            -ax * width,
            -ay * height,
            (1.0 - ax) * width,
            (1.0 - ay) * height,
        )
    }

    /// Smallest box containing both; `Empty` is the identity.
    #[must_use]
    pub fn union(self, other: BoundingBox) -> BoundingBox {
        match (self, other) {
            (BoundingBox::Empty, b) => b,
            (a, BoundingBox::Empty) => a,
            (BoundingBox::Rect(a), BoundingBox::Rect(b)) => BoundingBox::Rect(Rect {
                x1: a.x1.min(b.x1),
                y1: a.y1.min(b.y1),
                x2: a.x2.max(b.x2),
                y2: a.y2.max(b.y2),
            }),
        }
    }

    /// Maps both corners through `transform`. Mirroring scales swap the
    /// corners so the result stays normalised.
    #[must_use]
    pub fn transformed(self, transform: &Transform) -> BoundingBox {
        match self {
            BoundingBox::Empty => BoundingBox::Empty,
            BoundingBox::Rect(r) => {
                let (ax, ay) = transform.apply(r.x1, r.y1);
                let (bx, by) = transform.apply(r.x2, r.y2);
                BoundingBox::Rect(Rect::from_corners(ax, ay, bx, by))
            }
        }
    }

    pub fn rect(&self) -> Option<Rect> {
        match self {
            BoundingBox::Empty => None,
            BoundingBox::Rect(r) => Some(*r),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BoundingBox::Empty)
    }

    /// Horizontal extent, `(0, 0)` when empty.
    pub fn bound_x(&self) -> (f64, f64) {
        self.rect().map_or((0.0, 0.0), |r| (r.x1, r.x2))
    }

    /// Vertical extent, `(0, 0)` when empty.
    pub fn bound_y(&self) -> (f64, f64) {
        self.rect().map_or((0.0, 0.0), |r| (r.y1, r.y2))
    }

    pub fn width(&self) -> f64 {
        self.rect().map_or(0.0, |r| r.width())
    }

    pub fn height(&self) -> f64 {
        self.rect().map_or(0.0, |r| r.height())
    }
}

impl FromIterator<BoundingBox> for BoundingBox {
    fn from_iter<I: IntoIterator<Item = BoundingBox>>(iter: I) -> Self {
        iter.into_iter().fold(BoundingBox::Empty, BoundingBox::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_scales_child_translation() {
        let parent = Transform::new(10.0, 5.0, 2.0, 3.0);
        let child = Transform::new(1.0, 1.0, 0.5, 1.0);
        let t = parent.compose(&child);
        assert_eq!(t, Transform::new(12.0, 8.0, 1.0, 3.0));
        assert_eq!(parent * child, t);
    }

    #[test]
    fn compose_is_not_commutative() {
        let a = Transform::new(1.0, 0.0, 2.0, 1.0);
        let b = Transform::new(3.0, 0.0, 1.0, 1.0);
        assert_ne!(a * b, b * a);
    }

    #[test]
    fn leaf_box_follows_anchor() {
        let b = BoundingBox::of_leaf(10.0, 20.0, Anchor::Bottom);
        assert_eq!(b, BoundingBox::new(-5.0, -20.0, 5.0, 0.0));
        let b = BoundingBox::of_leaf(10.0, 20.0, Anchor::TopLeft);
        assert_eq!(b, BoundingBox::new(0.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn negative_scale_mirrors_box() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0).transformed(&Transform::scale(-1.0, 1.0));
        assert_eq!(b, BoundingBox::new(-3.0, 2.0, -1.0, 4.0));
    }

    #[test]
    fn zero_scale_collapses_axis() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0).transformed(&Transform::scale(0.0, 1.0));
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 2.0);
    }

    #[test]
    fn empty_box_is_absorbed() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(b.union(BoundingBox::Empty), b);
        assert_eq!(BoundingBox::Empty.union(b), b);
        assert!(BoundingBox::Empty
            .transformed(&Transform::translate(3.0, 3.0))
            .is_empty());
    }

    #[test]
    fn arbitrary_anchor_passes_through() {
        assert_eq!(Anchor::Arbitrary { x: 0.25, y: 0.75 }.norm(), (0.25, 0.75));
    }
}
