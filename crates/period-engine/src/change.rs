//! Period-over-period percentage change.
//!
//! A change against a zero baseline has no finite value. Instead of a numeric
//! infinity it is reported as [`PercentChange::New`], which every consumer
//! must handle separately from a genuine `0%`.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Change of a metric between the current and the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PercentChange {
    /// Whole-number percentage, e.g. `12` for +12%.
    Percent(i64),
    /// The previous period was zero and the current one is not.
    New,
}

/// Direction shown by a trend indicator or sparkline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
}

impl PercentChange {
    /// Direction of a finite change; `None` for [`PercentChange::New`].
    /// Zero counts as up.
    pub fn trend(&self) -> Option<Trend> {
        match self {
            PercentChange::Percent(p) if *p >= 0 => Some(Trend::Up),
            PercentChange::Percent(_) => Some(Trend::Down),
            PercentChange::New => None,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, PercentChange::New)
    }
}

/// Renders the trend indicator text: `↑ 12%`, `↓ 5%` or `(New)`.
impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentChange::Percent(p) => {
                let arrow = if *p >= 0 { '↑' } else { '↓' };
                write!(f, "{} {}%", arrow, p.unsigned_abs())
            }
            PercentChange::New => f.write_str("(New)"),
        }
    }
}

/// `(current - previous) / previous * 100`, rounded to the nearest integer.
///
/// Halves round toward positive infinity (`2.5 → 3`, `-2.5 → -2`). A zero
/// baseline yields `Percent(0)` when `current` is also zero and
/// [`PercentChange::New`] otherwise.
///
/// # Examples
///
/// ```
/// use period_engine::change::{percentage_change, PercentChange};
/// use rust_decimal::Decimal;
///
/// let change = percentage_change(Decimal::from(150), Decimal::from(100));
/// assert_eq!(change, PercentChange::Percent(50));
/// assert_eq!(percentage_change(Decimal::from(1), Decimal::ZERO), PercentChange::New);
/// ```
pub fn percentage_change(current: Decimal, previous: Decimal) -> PercentChange {
    if previous.is_zero() {
        return if current.is_zero() {
            PercentChange::Percent(0)
        } else {
            PercentChange::New
        };
    }

    let growing = (current > previous) == previous.is_sign_positive();
    let saturated = if growing { i64::MAX } else { i64::MIN };

    let percent = current
        .checked_sub(previous)
        .and_then(|delta| delta.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|ratio| ratio.checked_add(Decimal::new(5, 1)))
        .and_then(|ratio| ratio.floor().to_i64())
        .unwrap_or(saturated);
    PercentChange::Percent(percent)
}

/// [`percentage_change`] where either side may be missing.
///
/// A category with only one period has nothing to compare, which reads as no
/// change.
pub fn percentage_change_opt(current: Option<Decimal>, previous: Option<Decimal>) -> PercentChange {
    match (current, previous) {
        (Some(current), Some(previous)) => percentage_change(current, previous),
        _ => PercentChange::Percent(0),
    }
}
