//! Total trace and rendering-domain computation.

use crate::core::timeline::MergedTimeline;
use tracing::debug;

/// Domain returned when there is nothing to scan, so callers can render an
/// explicit "no data" state instead of a degenerate axis.
pub const EMPTY_DOMAIN: [f64; 2] = [0.0, 100.0];

/// Smallest padding ever applied, so a constant-valued series still gets a
/// domain of strictly positive width.
const MIN_PAD: f64 = 1.0;

/// How the rendering domain is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainShape {
    /// Level series (balances, equity): padded [min, max], no symmetry.
    Level,
    /// Signed series (P&L): symmetric around zero when both signs occur.
    Signed,
}

/// Fills in each point's Total as the sum over the accounts that resolved a
/// value at that date. Accounts not yet started, or excluded by conversion,
/// contribute nothing rather than zero, so totals are not understated during
/// warm-up. A date with no resolvable account keeps `None`.
pub fn apply_totals(timeline: &mut MergedTimeline) {
    for point in &mut timeline.points {
        point.total = if point.values.is_empty() {
            None
        } else {
            Some(point.values.values().sum())
        };
    }
}

/// Scans the active traces for the rendering domain.
///
/// Padding is 10% of the value range, floored at an absolute minimum.
/// `include_total` decides whether the Total trace participates in the scan;
/// the caller passes it explicitly rather than inferring it from selection
/// size.
pub fn compute_domain(
    timeline: &MergedTimeline,
    shape: DomainShape,
    include_total: bool,
) -> [f64; 2] {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for point in &timeline.points {
        for value in point.values.values() {
            min = min.min(*value);
            max = max.max(*value);
        }
        if include_total {
            if let Some(total) = point.total {
                min = min.min(total);
                max = max.max(total);
            }
        }
    }

    if !min.is_finite() || !max.is_finite() {
        debug!("No values to scan; returning the empty-domain sentinel");
        return EMPTY_DOMAIN;
    }

    let pad = ((max - min) * 0.10).max(MIN_PAD);
    match shape {
        DomainShape::Level => [min - pad, max + pad],
        DomainShape::Signed => {
            if min < 0.0 && max > 0.0 {
                let magnitude = min.abs().max(max.abs()) + pad;
                [-magnitude, magnitude]
            } else {
                [min - pad, max + pad]
            }
        }
    }
}
