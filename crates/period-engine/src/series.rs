//! Weekly bucketing and the revenue trend summary.

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;
use crate::format::format_short_date;
use crate::timeframe::DateRange;

/// A Monday-aligned week, clipped to the range it was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    /// First day of the bucket inside the range.
    pub start: NaiveDate,
    /// Last day of the bucket inside the range.
    pub end: NaiveDate,
}

/// Split a range into weeks starting on Monday.
///
/// The first and last buckets are clipped to the range, so the buckets tile
/// it exactly with no gap or overlap.
pub fn weekly_buckets(range: &DateRange) -> Vec<WeekBucket> {
    let mut buckets = Vec::new();
    let offset = u64::from(range.start_date.weekday().num_days_from_monday());
    let mut monday = range
        .start_date
        .checked_sub_days(Days::new(offset))
        .unwrap_or(range.start_date);

    while monday <= range.end_date {
        let Some(sunday) = monday.checked_add_days(Days::new(6)) else {
            buckets.push(WeekBucket {
                week_start: monday,
                start: monday.max(range.start_date),
                end: range.end_date,
            });
            break;
        };
        buckets.push(WeekBucket {
            week_start: monday,
            start: monday.max(range.start_date),
            end: sunday.min(range.end_date),
        });
        match sunday.succ_opt() {
            Some(next) => monday = next,
            None => break,
        }
    }
    buckets
}

/// One point of the weekly revenue query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRevenue {
    pub date: NaiveDate,
    /// Decimal as string.
    pub revenue: String,
    pub order_count: i64,
}

/// A chart-ready point: short label plus parsed revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    /// `Jun 15`
    pub label: String,
    pub revenue: Decimal,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSummary {
    pub points: Vec<ChartPoint>,
    pub total_revenue: Decimal,
    pub total_orders: i64,
}

/// Label every point and total revenue and orders across the series.
pub fn summarize_series(series: &[WeeklyRevenue]) -> Result<SeriesSummary, PeriodError> {
    let points = series
        .iter()
        .map(|item| {
            let revenue = item.revenue.trim().parse::<Decimal>().map_err(|e| {
                PeriodError::InvalidMetric(format!("weekly revenue '{}': {}", item.revenue, e))
            })?;
            Ok(ChartPoint {
                label: format_short_date(item.date),
                revenue,
                order_count: item.order_count,
            })
        })
        .collect::<Result<Vec<_>, PeriodError>>()?;

    let total_revenue = points
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.revenue));
    let total_orders = points
        .iter()
        .fold(0i64, |acc, p| acc.saturating_add(p.order_count));

    Ok(SeriesSummary {
        points,
        total_revenue,
        total_orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_buckets_are_clipped_to_range() {
        // Wed Jan 3 .. Tue Jan 16, 2024
        let range = DateRange::new(date(2024, 1, 3), date(2024, 1, 16), "Span");
        let buckets = weekly_buckets(&range);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].week_start, date(2024, 1, 1));
        assert_eq!(buckets[0].start, date(2024, 1, 3));
        assert_eq!(buckets[0].end, date(2024, 1, 7));
        assert_eq!(buckets[1].start, date(2024, 1, 8));
        assert_eq!(buckets[1].end, date(2024, 1, 14));
        assert_eq!(buckets[2].start, date(2024, 1, 15));
        assert_eq!(buckets[2].end, date(2024, 1, 16));
    }

    #[test]
    fn test_buckets_tile_range_without_gaps() {
        let range = DateRange::new(date(2023, 12, 20), date(2024, 3, 5), "Span");
        let buckets = weekly_buckets(&range);
        assert_eq!(buckets.first().unwrap().start, range.start_date);
        assert_eq!(buckets.last().unwrap().end, range.end_date);
        for pair in buckets.windows(2) {
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
            assert_eq!(pair[1].week_start.weekday(), chrono::Weekday::Mon);
        }
    }

    #[test]
    fn test_single_day_range_is_one_bucket() {
        let range = DateRange::new(date(2024, 6, 15), date(2024, 6, 15), "Day");
        let buckets = weekly_buckets(&range);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].week_start, date(2024, 6, 10));
    }

    #[test]
    fn test_summarize_series_totals() {
        let series = vec![
            WeeklyRevenue {
                date: date(2024, 6, 3),
                revenue: "1200.50".into(),
                order_count: 4,
            },
            WeeklyRevenue {
                date: date(2024, 6, 10),
                revenue: "799.50".into(),
                order_count: 2,
            },
        ];
        let summary = summarize_series(&series).unwrap();
        assert_eq!(summary.total_revenue, dec!(2000));
        assert_eq!(summary.total_orders, 6);
        assert_eq!(summary.points[0].label, "Jun 3");
    }

    #[test]
    fn test_summarize_rejects_bad_revenue() {
        let series = vec![WeeklyRevenue {
            date: date(2024, 6, 3),
            revenue: "n/a".into(),
            order_count: 1,
        }];
        assert!(matches!(
            summarize_series(&series),
            Err(PeriodError::InvalidMetric(_))
        ));
    }
}
