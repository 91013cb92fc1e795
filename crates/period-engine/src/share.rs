//! Shares of a total and revenue concentration.

use rust_decimal::Decimal;
use serde::Serialize;

/// Share above which a share bar is drawn in the highlight color.
pub const DEFAULT_HIGHLIGHT_SHARE: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

/// `part / total * 100`, or zero when the total is zero.
pub fn share_percent(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Percentage of `total` attributable to a top-N subset, e.g. revenue from
/// a product's five largest customers. Zero when the total is not positive.
pub fn concentration(top: &[Decimal], total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let subset = top
        .iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v));
    share_percent(subset, total)
}

/// Geometry of the small horizontal bar drawn next to a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShareBar {
    /// Bar width as a percentage of the track, clamped to `0..=100`.
    pub width: Decimal,
    /// Whether the share exceeds the highlight threshold.
    pub highlighted: bool,
}

impl ShareBar {
    pub fn new(share: Decimal, highlight_above: Decimal) -> Self {
        Self {
            width: share.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            highlighted: share > highlight_above,
        }
    }
}
