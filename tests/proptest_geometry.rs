//! Property-based invariant tests for the geometry kernel and layout tree.
//!
//! 1. Transform composition is associative.
//! 2. The identity transform leaves boxes unchanged.
//! 3. Union is commutative and associative.
//! 4. The empty box is the union identity and stays empty under transforms.
//! 5. A node's box equals the union of its transformed children.
//! 6. Flattening composes transforms the same way as nesting.
//! 7. Flattening from an accumulated transform prefixes it to every leaf.

use jianpulib::{Anchor, BoundingBox, LayoutTree, Primitive, Transform};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
struct Block(f64, f64);

impl Primitive for Block {
    fn size(&self) -> (f64, f64) {
        (self.0, self.1)
    }
}

fn transform_strategy() -> impl Strategy<Value = Transform> {
    (-200i32..=200, -200i32..=200, -3i32..=3, -3i32..=3)
        .prop_map(|(dx, dy, sx, sy)| Transform::new(dx as f64, dy as f64, sx as f64, sy as f64))
}

fn box_strategy() -> impl Strategy<Value = BoundingBox> {
    prop_oneof![
        1 => Just(BoundingBox::Empty),
        6 => (-500i32..=500, -500i32..=500, -500i32..=500, -500i32..=500)
            .prop_map(|(a, b, c, d)| BoundingBox::new(a as f64, b as f64, c as f64, d as f64)),
    ]
}

fn anchor_strategy() -> impl Strategy<Value = Anchor> {
    prop_oneof![
        Just(Anchor::Centre),
        Just(Anchor::Bottom),
        Just(Anchor::BottomLeft),
        Just(Anchor::TopRight),
        Just(Anchor::Left),
        (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(x, y)| Anchor::Arbitrary { x, y }),
    ]
}

fn close(a: &Transform, b: &Transform) -> bool {
    (a.dx - b.dx).abs() < EPS
        && (a.dy - b.dy).abs() < EPS
        && (a.sx - b.sx).abs() < EPS
        && (a.sy - b.sy).abs() < EPS
}

fn boxes_close(a: BoundingBox, b: BoundingBox) -> bool {
    match (a.rect(), b.rect()) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            (a.x1 - b.x1).abs() < EPS
                && (a.y1 - b.y1).abs() < EPS
                && (a.x2 - b.x2).abs() < EPS
                && (a.y2 - b.y2).abs() < EPS
        }
        _ => false,
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Composition is associative
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn compose_associative(
        a in transform_strategy(),
        b in transform_strategy(),
        c in transform_strategy(),
    ) {
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        prop_assert!(close(&left, &right), "{:?} vs {:?}", left, right);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Identity leaves boxes unchanged
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn identity_is_idempotent(b in box_strategy()) {
        prop_assert_eq!(b.transformed(&Transform::IDENTITY), b);
        prop_assert_eq!(Transform::IDENTITY.compose(&Transform::IDENTITY), Transform::IDENTITY);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Union laws
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_commutative(a in box_strategy(), b in box_strategy()) {
        prop_assert_eq!(a.union(b), b.union(a));
    }

    #[test]
    fn union_associative(a in box_strategy(), b in box_strategy(), c in box_strategy()) {
        prop_assert_eq!(a.union(b).union(c), a.union(b.union(c)));
    }

    #[test]
    fn union_contains_both(a in box_strategy(), b in box_strategy()) {
        let u = a.union(b);
        for part in [a, b] {
            if let (Some(p), Some(r)) = (part.rect(), u.rect()) {
                prop_assert!(r.x1 <= p.x1 && r.y1 <= p.y1 && r.x2 >= p.x2 && r.y2 >= p.y2);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Empty box
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn empty_is_union_identity(a in box_strategy()) {
        prop_assert_eq!(a.union(BoundingBox::Empty), a);
        prop_assert_eq!(BoundingBox::Empty.union(a), a);
    }

    #[test]
    fn empty_stays_empty(t in transform_strategy()) {
        prop_assert!(BoundingBox::Empty.transformed(&t).is_empty());
    }

    #[test]
    fn transformed_boxes_stay_normalised(b in box_strategy(), t in transform_strategy()) {
        if let Some(r) = b.transformed(&t).rect() {
            prop_assert!(r.x1 <= r.x2 && r.y1 <= r.y2);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5–6. Layout tree boxes and flattening
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn node_box_is_union_of_children(
        outer in transform_strategy(),
        inner in transform_strategy(),
        w in 0u8..50,
        h in 0u8..50,
        anchor in anchor_strategy(),
    ) {
        let leaf = LayoutTree::leaf(anchor, Block(w as f64, h as f64));
        let child = LayoutTree::wrap(inner, leaf.clone());
        let tree = LayoutTree::node(outer, vec![child.clone(), LayoutTree::empty()]);

        let expected = child.bounding_box().transformed(&outer);
        prop_assert!(boxes_close(tree.bounding_box(), expected));

        // Nesting two nodes is the same as one node with the composed transform.
        let flat = LayoutTree::wrap(outer.compose(&inner), leaf);
        prop_assert!(boxes_close(tree.bounding_box(), flat.bounding_box()));
    }

    #[test]
    fn flatten_composes_transforms(
        outer in transform_strategy(),
        inner in transform_strategy(),
        anchor in anchor_strategy(),
    ) {
        let leaf = LayoutTree::leaf(anchor, Block(1.0, 1.0));
        let tree = LayoutTree::wrap(outer, LayoutTree::wrap(inner, leaf));
        let directives = tree.flatten();
        prop_assert_eq!(directives.len(), 1);
        prop_assert!(close(&directives[0].transform, &outer.compose(&inner)));
        prop_assert_eq!(directives[0].anchor, anchor);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Flattening under an accumulated transform
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flatten_from_prefixes_accumulated_transform(
        acc in transform_strategy(),
        outer in transform_strategy(),
        inner in transform_strategy(),
        anchors in prop::collection::vec(anchor_strategy(), 1..5),
    ) {
        let leaves: Vec<LayoutTree<Block>> = anchors
            .iter()
            .map(|&anchor| LayoutTree::leaf(anchor, Block(2.0, 3.0)))
            .collect();
        let tree = LayoutTree::node(
            outer,
            vec![
                LayoutTree::node(inner, leaves),
                LayoutTree::leaf(Anchor::Centre, Block(1.0, 1.0)),
            ],
        );

        let plain = tree.flatten();
        let shifted = tree.flatten_from(acc);
        prop_assert_eq!(plain.len(), shifted.len());
        for (p, s) in plain.iter().zip(&shifted) {
            prop_assert!(close(&s.transform, &acc.compose(&p.transform)));
            prop_assert_eq!(s.anchor, p.anchor);
            prop_assert!(std::ptr::eq(s.object, p.object));
        }
    }
}
