//! Layout tree: an owned scene graph of anchored primitives under
//! translate/scale nodes.

use serde::Serialize;

use crate::geometry::{Anchor, BoundingBox, Transform};

/// Anything a leaf can draw. The tree only needs its intrinsic size.
pub trait Primitive {
    /// Width and height in local (unscaled) units.
    fn size(&self) -> (f64, f64);
}

/// Immutable layout tree. Children are owned; a subtree is never shared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayoutTree<P> {
    Leaf { anchor: Anchor, object: P },
    Node {
        transform: Transform,
        children: Vec<LayoutTree<P>>,
    },
}

/// One absolute drawing instruction produced by [`LayoutTree::flatten`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawDirective<'a, P> {
    pub transform: Transform,
    pub anchor: Anchor,
    pub object: &'a P,
}

impl<P> LayoutTree<P> {
    pub fn leaf(anchor: Anchor, object: P) -> Self {
        LayoutTree::Leaf { anchor, object }
    }

    pub fn node(transform: Transform, children: Vec<LayoutTree<P>>) -> Self {
        LayoutTree::Node {
            transform,
            children,
        }
    }

    /// Wraps a single subtree in a transform node.
    pub fn wrap(transform: Transform, child: LayoutTree<P>) -> Self {
        Self::node(transform, vec![child])
    }

    /// A node with nothing to draw.
    pub fn empty() -> Self {
        Self::node(Transform::IDENTITY, Vec::new())
    }

    /// Depth-first, left-to-right list of leaves with their absolute
    /// transforms. The order is the paint order.
    pub fn flatten(&self) -> Vec<DrawDirective<'_, P>> {
        self.flatten_from(Transform::IDENTITY)
    }

    /// Same as [`flatten`](Self::flatten) but starting from `acc` instead of
    /// the identity.
    pub fn flatten_from(&self, acc: Transform) -> Vec<DrawDirective<'_, P>> {
        let mut out = Vec::new();
        self.flatten_into(acc, &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, acc: Transform, out: &mut Vec<DrawDirective<'a, P>>) {
        match self {
            LayoutTree::Leaf { anchor, object } => out.push(DrawDirective {
                transform: acc,
                anchor: *anchor,
                object,
            }),
            LayoutTree::Node {
                transform,
                children,
            } => {
                let next = acc.compose(transform);
                for child in children {
                    child.flatten_into(next, out);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            LayoutTree::Leaf { .. } => 1,
            LayoutTree::Node { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }
}

impl<P: Primitive> LayoutTree<P> {
    /// Box of the whole tree in the coordinate space of its parent.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box_where(&|_| true)
    }

    /// Box of the leaves for which `keep` holds. Used to compute the
    /// non-intrusive box that ignores accidentals and dots.
    pub fn bounding_box_where(&self, keep: &dyn Fn(&P) -> bool) -> BoundingBox {
        match self {
            LayoutTree::Leaf { anchor, object } => {
                if !keep(object) {
                    return BoundingBox::Empty;
                }
                let (width, height) = object.size();
                BoundingBox::of_leaf(width, height, *anchor)
            }
            LayoutTree::Node {
                transform,
                children,
            } => children
                .iter()
                .map(|child| child.bounding_box_where(keep).transformed(transform))
                .collect(),
        }
    }
}
