//! Mini sparkline geometry for the channel table's trend column.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::change::Trend;
use crate::comparison::PeriodMetric;
use crate::error::PeriodError;
use crate::format::{format_currency, format_long_date};
use crate::timeframe::parse_date;

pub const WIDTH: f64 = 64.0;
pub const HEIGHT: f64 = 24.0;
pub const PADDING: f64 = 4.0;

/// A plotted series: one point per period, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub points: Vec<(f64, f64)>,
    pub trend: Trend,
    /// SVG path data, `M x y L x y ...`.
    pub path: String,
    /// One line per period: `Jan 1, 2024 - Jan 31, 2024: $1,234`.
    pub tooltip: Vec<String>,
}

impl Sparkline {
    /// Plot `periods` given most-recent-first, as stored on a category.
    ///
    /// Returns `Ok(None)` with fewer than two periods; the table shows "N/A".
    pub fn from_periods(periods: &[PeriodMetric]) -> Result<Option<Self>, PeriodError> {
        let chronological: Vec<&PeriodMetric> = periods.iter().rev().collect();
        let values = chronological
            .iter()
            .map(|p| p.revenue())
            .collect::<Result<Vec<Decimal>, _>>()?;

        let Some((points, trend)) = plot(&values) else {
            return Ok(None);
        };

        let tooltip = chronological
            .iter()
            .filter(|p| !p.period_start.is_empty() && !p.period_end.is_empty())
            .map(|p| tooltip_line(p))
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(Self {
            path: svg_path(&points),
            points,
            trend,
            tooltip,
        }))
    }
}

/// Scale `values` into the sparkline box. Flat series use a range of 1.
fn plot(values: &[Decimal]) -> Option<(Vec<(f64, f64)>, Trend)> {
    if values.len() < 2 {
        return None;
    }
    let floats: Vec<f64> = values.iter().map(|v| v.to_f64().unwrap_or(0.0)).collect();
    let max = floats.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = floats.iter().copied().fold(f64::INFINITY, f64::min);
    let range = if max - min == 0.0 { 1.0 } else { max - min };

    let graph_height = HEIGHT - 2.0 * PADDING;
    let x_step = WIDTH / (floats.len() - 1) as f64;
    let points = floats
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let y = graph_height - ((v - min) / range) * graph_height + PADDING;
            (i as f64 * x_step, y)
        })
        .collect();

    let trend = if values[0] >= values[values.len() - 1] {
        Trend::Down
    } else {
        Trend::Up
    };
    Some((points, trend))
}

fn svg_path(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{cmd} {x} {y}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tooltip_line(period: &PeriodMetric) -> Result<String, PeriodError> {
    Ok(format!(
        "{} - {}: {}",
        format_long_date(parse_date(&period.period_start)?),
        format_long_date(parse_date(&period.period_end)?),
        format_currency(period.revenue()?)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(start: &str, end: &str, revenue: &str) -> PeriodMetric {
        PeriodMetric {
            period_start: start.into(),
            period_end: end.into(),
            total_revenue: revenue.into(),
            order_count: "1".into(),
        }
    }

    #[test]
    fn test_single_period_has_no_sparkline() {
        let periods = [metric("2024-01-01", "2024-01-31", "10")];
        assert_eq!(Sparkline::from_periods(&periods).unwrap(), None);
    }

    #[test]
    fn test_two_periods_rising() {
        // Most recent first: January 200, December 100.
        let periods = [
            metric("2024-01-01", "2024-01-31", "200"),
            metric("2023-12-01", "2023-12-31", "100"),
        ];
        let spark = Sparkline::from_periods(&periods).unwrap().unwrap();
        assert_eq!(spark.trend, Trend::Up);
        assert_eq!(spark.points, vec![(0.0, 20.0), (64.0, 4.0)]);
        assert_eq!(spark.path, "M 0 20 L 64 4");
        assert_eq!(
            spark.tooltip,
            vec![
                "Dec 1, 2023 - Dec 31, 2023: $100".to_string(),
                "Jan 1, 2024 - Jan 31, 2024: $200".to_string(),
            ]
        );
    }

    #[test]
    fn test_flat_series_is_down_and_sits_at_bottom() {
        let periods = [
            metric("2024-01-01", "2024-01-31", "50"),
            metric("2023-12-01", "2023-12-31", "50"),
        ];
        let spark = Sparkline::from_periods(&periods).unwrap().unwrap();
        assert_eq!(spark.trend, Trend::Down);
        assert!(spark.points.iter().all(|(_, y)| *y == 20.0));
    }

    #[test]
    fn test_three_points_are_evenly_spaced() {
        let periods = [
            metric("2024-03-01", "2024-03-31", "0"),
            metric("2024-02-01", "2024-02-29", "5"),
            metric("2024-01-01", "2024-01-31", "10"),
        ];
        let spark = Sparkline::from_periods(&periods).unwrap().unwrap();
        let xs: Vec<f64> = spark.points.iter().map(|(x, _)| *x).collect();
        assert_eq!(xs, vec![0.0, 32.0, 64.0]);
        assert_eq!(spark.points[1].1, 12.0);
        assert_eq!(spark.trend, Trend::Down);
    }

    #[test]
    fn test_malformed_revenue_is_an_error() {
        let periods = [
            metric("2024-01-01", "2024-01-31", "abc"),
            metric("2023-12-01", "2023-12-31", "1"),
        ];
        assert!(Sparkline::from_periods(&periods).is_err());
    }
}
