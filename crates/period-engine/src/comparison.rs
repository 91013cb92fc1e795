//! Period-over-period merging of per-category aggregates.
//!
//! Each period is queried independently (`GROUP BY` channel, company class,
//! ...), so a category may be missing from either result set. Merging keys
//! the rows by category name and synthesizes zero-valued entries, so every
//! category in the union carries exactly one [`PeriodMetric`] per period,
//! ordered most-recent-first.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::change::{percentage_change_opt, PercentChange};
use crate::error::PeriodError;
use crate::timeframe::DateRange;

/// One row of a per-category aggregation query, as returned by the database.
///
/// Aggregates arrive as strings (`SUM` over `numeric` columns) and may be
/// null when the group is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryTotals {
    #[serde(alias = "sales_channel", alias = "company_class", alias = "channel")]
    pub category: Option<String>,
    #[serde(default)]
    pub total_revenue: Option<String>,
    #[serde(default)]
    pub order_count: Option<String>,
}

impl CategoryTotals {
    pub fn new(category: &str, total_revenue: &str, order_count: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            total_revenue: Some(total_revenue.to_string()),
            order_count: Some(order_count.to_string()),
        }
    }
}

/// Snapshot of one category's totals for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodMetric {
    /// `YYYY-MM-DD`
    pub period_start: String,
    /// `YYYY-MM-DD`
    pub period_end: String,
    /// Decimal as string, e.g. `"1234.50"`.
    pub total_revenue: String,
    /// Integer as string, e.g. `"17"`.
    pub order_count: String,
}

impl PeriodMetric {
    /// A zero-valued placeholder for a category absent from `range`.
    pub fn zero(range: &DateRange) -> Self {
        Self {
            period_start: range.formatted_start_date.clone(),
            period_end: range.formatted_end_date.clone(),
            total_revenue: "0".to_string(),
            order_count: "0".to_string(),
        }
    }

    /// Attach a query row to the bounds of the period it was queried for.
    /// Null or blank aggregates become `"0"`.
    pub fn from_totals(range: &DateRange, totals: &CategoryTotals) -> Self {
        Self {
            period_start: range.formatted_start_date.clone(),
            period_end: range.formatted_end_date.clone(),
            total_revenue: non_blank_or_zero(totals.total_revenue.as_deref()),
            order_count: non_blank_or_zero(totals.order_count.as_deref()),
        }
    }

    pub fn revenue(&self) -> Result<Decimal, PeriodError> {
        self.total_revenue.trim().parse::<Decimal>().map_err(|e| {
            PeriodError::InvalidMetric(format!("revenue '{}': {}", self.total_revenue, e))
        })
    }

    pub fn orders(&self) -> Result<i64, PeriodError> {
        self.order_count.trim().parse::<i64>().map_err(|e| {
            PeriodError::InvalidMetric(format!("order count '{}': {}", self.order_count, e))
        })
    }
}

/// All periods of one category, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMetrics {
    pub category: String,
    pub periods: Vec<PeriodMetric>,
}

impl CategoryMetrics {
    pub fn current(&self) -> Option<&PeriodMetric> {
        self.periods.first()
    }

    pub fn previous(&self) -> Option<&PeriodMetric> {
        self.periods.get(1)
    }

    /// Revenue change between the two most recent periods.
    pub fn revenue_change(&self) -> Result<PercentChange, PeriodError> {
        let current = self.current().map(PeriodMetric::revenue).transpose()?;
        let previous = self.previous().map(PeriodMetric::revenue).transpose()?;
        Ok(percentage_change_opt(current, previous))
    }

    /// Revenues oldest-first, the order a sparkline plots them in.
    pub fn revenue_history(&self) -> Result<Vec<Decimal>, PeriodError> {
        self.periods.iter().rev().map(PeriodMetric::revenue).collect()
    }
}

/// Merge the current and previous period results into one entry per category.
///
/// The union of categories from both sides is returned, sorted by name. A
/// category missing from one side receives a zero-valued entry for that
/// period. Rows without a category are skipped.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::comparison::{merge_periods, CategoryTotals};
/// use period_engine::timeframe::{previous_period, DateRange};
///
/// let current = DateRange::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
///     "January",
/// );
/// let previous = previous_period(current.start_date, current.end_date);
///
/// let merged = merge_periods(
///     &current,
///     &[CategoryTotals::new("Retail", "100", "2")],
///     &previous,
///     &[CategoryTotals::new("Wholesale", "50", "1")],
/// );
/// assert_eq!(merged.len(), 2);
/// assert!(merged.iter().all(|m| m.periods.len() == 2));
/// ```
pub fn merge_periods(
    current_range: &DateRange,
    current: &[CategoryTotals],
    previous_range: &DateRange,
    previous: &[CategoryTotals],
) -> Vec<CategoryMetrics> {
    merge_period_series(&[(current_range, current), (previous_range, previous)])
}

/// Merge any number of period results into one entry per category.
///
/// Every category in the union gets exactly one [`PeriodMetric`] per input
/// period, ordered by `period_start` descending regardless of input order.
/// When a category repeats within one period, the last row wins.
pub fn merge_period_series(periods: &[(&DateRange, &[CategoryTotals])]) -> Vec<CategoryMetrics> {
    let mut by_category: BTreeMap<String, Vec<Option<PeriodMetric>>> = BTreeMap::new();

    for (index, (range, rows)) in periods.iter().enumerate() {
        for row in rows.iter() {
            let Some(category) = row.category.as_deref().filter(|c| !c.is_empty()) else {
                continue;
            };
            let slots = by_category
                .entry(category.to_string())
                .or_insert_with(|| vec![None; periods.len()]);
            if slots[index].is_some() {
                tracing::debug!(
                    category,
                    period = %range.formatted_start_date,
                    "duplicate category row replaced"
                );
            }
            slots[index] = Some(PeriodMetric::from_totals(range, row));
        }
    }

    let mut synthesized = 0usize;
    let merged: Vec<CategoryMetrics> = by_category
        .into_iter()
        .map(|(category, slots)| {
            let mut entries: Vec<PeriodMetric> = slots
                .into_iter()
                .zip(periods.iter())
                .map(|(slot, (range, _))| {
                    slot.unwrap_or_else(|| {
                        synthesized += 1;
                        PeriodMetric::zero(range)
                    })
                })
                .collect();
            // YYYY-MM-DD sorts chronologically as text.
            entries.sort_by(|a, b| b.period_start.cmp(&a.period_start));
            CategoryMetrics {
                category,
                periods: entries,
            }
        })
        .collect();

    tracing::debug!(
        categories = merged.len(),
        periods = periods.len(),
        synthesized,
        "merged period metrics"
    );
    merged
}

fn non_blank_or_zero(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeframe::previous_period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn january() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            "January",
        )
    }

    fn december() -> DateRange {
        let jan = january();
        previous_period(jan.start_date, jan.end_date)
    }

    fn find<'a>(merged: &'a [CategoryMetrics], name: &str) -> &'a CategoryMetrics {
        merged.iter().find(|m| m.category == name).unwrap()
    }

    #[test]
    fn test_merge_is_union_of_categories() {
        let current = vec![
            CategoryTotals::new("A", "100", "1"),
            CategoryTotals::new("B", "200", "2"),
        ];
        let previous = vec![
            CategoryTotals::new("B", "150", "3"),
            CategoryTotals::new("C", "75", "4"),
        ];
        let merged = merge_periods(&january(), &current, &december(), &previous);

        let names: Vec<&str> = merged.iter().map(|m| m.category.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(merged.iter().all(|m| m.periods.len() == 2));
    }

    #[test]
    fn test_merge_synthesizes_missing_previous() {
        let merged = merge_periods(
            &january(),
            &[CategoryTotals::new("A", "100", "1")],
            &december(),
            &[],
        );
        let a = find(&merged, "A");
        assert_eq!(a.periods[0].total_revenue, "100");
        assert_eq!(a.periods[1], PeriodMetric::zero(&december()));
        assert_eq!(a.periods[1].period_start, "2023-12-01");
    }

    #[test]
    fn test_merge_synthesizes_missing_current() {
        let merged = merge_periods(
            &january(),
            &[],
            &december(),
            &[CategoryTotals::new("C", "75", "4")],
        );
        let c = find(&merged, "C");
        assert_eq!(c.periods[0], PeriodMetric::zero(&january()));
        assert_eq!(c.periods[1].total_revenue, "75");
        assert_eq!(c.periods[1].order_count, "4");
    }

    #[test]
    fn test_merge_orders_most_recent_first_regardless_of_input_order() {
        let rows = [CategoryTotals::new("A", "1", "1")];
        let dec_range = december();
        let jan_range = january();
        let merged = merge_period_series(&[(&dec_range, &rows[..]), (&jan_range, &rows[..])]);
        let a = find(&merged, "A");
        assert_eq!(a.periods[0].period_start, "2024-01-01");
        assert_eq!(a.periods[1].period_start, "2023-12-01");
    }

    #[test]
    fn test_merge_skips_rows_without_category() {
        let current = vec![
            CategoryTotals {
                category: None,
                total_revenue: Some("10".into()),
                order_count: Some("1".into()),
            },
            CategoryTotals::new("", "5", "1"),
        ];
        let merged = merge_periods(&january(), &current, &december(), &[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_defaults_null_aggregates_to_zero() {
        let current = vec![CategoryTotals {
            category: Some("A".into()),
            total_revenue: None,
            order_count: Some("  ".into()),
        }];
        let merged = merge_periods(&january(), &current, &december(), &[]);
        let a = find(&merged, "A");
        assert_eq!(a.periods[0].total_revenue, "0");
        assert_eq!(a.periods[0].order_count, "0");
    }

    #[test]
    fn test_merge_duplicate_row_last_wins() {
        let current = vec![
            CategoryTotals::new("A", "1", "1"),
            CategoryTotals::new("A", "9", "9"),
        ];
        let merged = merge_periods(&january(), &current, &december(), &[]);
        assert_eq!(find(&merged, "A").periods[0].total_revenue, "9");
    }

    #[test]
    fn test_merge_three_periods_fills_every_slot() {
        let jan = january();
        let dec_range = december();
        let nov = previous_period(dec_range.start_date, dec_range.end_date);
        let jan_rows = [CategoryTotals::new("A", "30", "3")];
        let nov_rows = [CategoryTotals::new("B", "10", "1")];
        let merged =
            merge_period_series(&[(&jan, &jan_rows[..]), (&dec_range, &[][..]), (&nov, &nov_rows[..])]);
        assert_eq!(merged.len(), 2);
        for metrics in &merged {
            assert_eq!(metrics.periods.len(), 3);
        }
        let b = find(&merged, "B");
        assert_eq!(b.revenue_history().unwrap(), vec![dec!(10), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_revenue_change_for_new_category() {
        let merged = merge_periods(
            &january(),
            &[CategoryTotals::new("A", "100", "1")],
            &december(),
            &[],
        );
        assert_eq!(find(&merged, "A").revenue_change().unwrap(), PercentChange::New);
    }

    #[test]
    fn test_revenue_change_for_existing_category() {
        let merged = merge_periods(
            &january(),
            &[CategoryTotals::new("A", "150.00", "3")],
            &december(),
            &[CategoryTotals::new("A", "100.00", "2")],
        );
        assert_eq!(
            find(&merged, "A").revenue_change().unwrap(),
            PercentChange::Percent(50)
        );
    }

    #[test]
    fn test_malformed_revenue_is_reported() {
        let metric = PeriodMetric {
            period_start: "2024-01-01".into(),
            period_end: "2024-01-31".into(),
            total_revenue: "12,5".into(),
            order_count: "x".into(),
        };
        assert!(matches!(metric.revenue(), Err(PeriodError::InvalidMetric(_))));
        assert!(matches!(metric.orders(), Err(PeriodError::InvalidMetric(_))));
    }

    #[test]
    fn test_totals_deserialize_from_sales_channel_rows() {
        let rows: Vec<CategoryTotals> = serde_json::from_str(
            r#"[{"sales_channel": "Retail", "total_revenue": "10.5", "order_count": "2"},
                {"sales_channel": null, "total_revenue": null}]"#,
        )
        .unwrap();
        assert_eq!(rows[0], CategoryTotals::new("Retail", "10.5", "2"));
        assert_eq!(rows[1].category, None);
        assert_eq!(rows[1].order_count, None);
    }
}
