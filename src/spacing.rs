//! Elastic horizontal spacing.
//!
//! Every slice is a spring in series: its rest length is the width its
//! content needs, and its stiffness follows Gourlay's optical spacing rule so
//! that long notes stretch more than short ones. One force is solved for the
//! whole line so that the springs add up to the target width.

use log::{debug, warn};
use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::model::Duration;
use crate::slicer::Slice;

/// Tunable constants of the stiffness rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpacingParams {
    pub min_duration_width: f64,
    /// Strength of the logarithmic duration effect.
    pub magic: f64,
}

impl Default for SpacingParams {
    fn default() -> Self {
        Self {
            min_duration_width: 1.0,
            magic: 1.0,
        }
    }
}

/// A spring with a rigid minimum (the rod).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spring {
    pub rest_length: f64,
    /// `f64::INFINITY` for springs that must not stretch.
    pub stiffness: f64,
}

/// Result of stretching springs to a target length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpringSolution {
    pub force: f64,
    pub lengths: Vec<f64>,
    /// The rest lengths alone already exceed the target.
    pub overflow: bool,
}

/// Horizontal needs of one slice, measured from its anchor origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SliceExtent {
    pub min_width: f64,
    /// Leftmost x of the slice content relative to its origin (negative when
    /// something such as an accidental sticks out to the left).
    pub left: f64,
}

/// Final horizontal layout of a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceSpacing {
    /// X of each slice's origin.
    pub offsets: Vec<f64>,
    pub widths: Vec<f64>,
    pub force: f64,
    pub overflow: bool,
}

pub(crate) fn duration_to_f64(d: Duration) -> f64 {
    match (d.numer(), d.denom()) {
        (Some(&n), Some(&den)) if den != 0 => n as f64 / den as f64,
        _ => 0.0,
    }
}

/// Gourlay's stiffness for a slice of length `slice` whose shortest sounding
/// note is `shortest_entity`, on a line whose shortest slice is
/// `shortest_slice`.
pub fn gourlay_stiffness(
    shortest_entity: Duration,
    shortest_slice: Duration,
    slice: Duration,
    params: &SpacingParams,
) -> f64 {
    let ratio1 = duration_to_f64(shortest_entity / shortest_slice);
    let ratio2 = duration_to_f64(shortest_entity / slice);
    ratio2 / (params.min_duration_width * (1.0 + params.magic * ratio1.log2()))
}

/// Stiffness of one slice. Marker-only slices and slices where nothing
/// sounds are rigid.
pub fn slice_stiffness(
    slice: &Slice,
    shortest_slice: Option<Duration>,
    params: &SpacingParams,
) -> f64 {
    if slice.is_marker_only() {
        return f64::INFINITY;
    }
    match (slice.shortest_entity_duration(), shortest_slice) {
        (Some(entity), Some(shortest)) => {
            gourlay_stiffness(entity, shortest, slice.duration, params)
        }
        _ => f64::INFINITY,
    }
}

/// Shortest non-zero slice duration of the line.
pub fn shortest_slice_duration(slices: &[Slice]) -> Option<Duration> {
    slices
        .iter()
        .filter(|slice| !slice.is_marker_only())
        .map(|slice| slice.duration)
        .fold(None, |acc, d| match acc {
            Some(m) if m <= d => Some(m),
            _ => Some(d),
        })
}

/// Solves `target - Σrest = F · Σ(1/k)` and stretches each spring by `F/k`.
/// Lengths are clamped at zero when the target is too small.
pub fn solve_springs(springs: &[Spring], target: f64) -> Result<SpringSolution> {
    if springs.is_empty() {
        return Err(LayoutError::EmptySlices);
    }
    if target.is_nan() || target < 0.0 {
        return Err(LayoutError::InvalidTargetWidth(target));
    }

    let rest_sum: f64 = springs.iter().map(|s| s.rest_length).sum();
    let compliance: f64 = springs.iter().map(|s| 1.0 / s.stiffness).sum();
    let force = if compliance > 0.0 {
        (target - rest_sum) / compliance
    } else {
        0.0
    };
    let overflow = rest_sum > target;
    if overflow {
        warn!("line overflow: content needs {rest_sum:.2} but only {target:.2} is available");
    }

    let lengths = springs
        .iter()
        .map(|s| (s.rest_length + force / s.stiffness).max(0.0))
        .collect();

    Ok(SpringSolution {
        force,
        lengths,
        overflow,
    })
}

/// Computes slice offsets for a line of `target_width`.
pub fn compute_slice_spacing(
    slices: &[Slice],
    extents: &[SliceExtent],
    target_width: f64,
    params: &SpacingParams,
) -> Result<SliceSpacing> {
    if slices.is_empty() {
        return Err(LayoutError::EmptySlices);
    }
    if slices.len() != extents.len() {
        return Err(LayoutError::ExtentMismatch {
            slices: slices.len(),
            extents: extents.len(),
        });
    }

    let shortest = shortest_slice_duration(slices);
    let springs: Vec<Spring> = slices
        .iter()
        .zip(extents)
        .map(|(slice, extent)| Spring {
            rest_length: extent.min_width,
            stiffness: slice_stiffness(slice, shortest, params),
        })
        .collect();

    let solution = solve_springs(&springs, target_width)?;
    debug!(
        "spaced {} slices: force {:.4}, overflow {}",
        slices.len(),
        solution.force,
        solution.overflow
    );

    let mut offsets = Vec::with_capacity(slices.len());
    let mut cursor = 0.0;
    for (width, extent) in solution.lengths.iter().zip(extents) {
        offsets.push(cursor - extent.left);
        cursor += width;
    }

    Ok(SliceSpacing {
        offsets,
        widths: solution.lengths,
        force: solution.force,
        overflow: solution.overflow,
    })
}
