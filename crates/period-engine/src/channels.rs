//! The "Sales by Channel" table on the orders page.
//!
//! Turns merged [`CategoryMetrics`] into display rows: current revenue and
//! orders, their share of the table total, the revenue change against the
//! previous period, average order value and a sparkline.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::change::PercentChange;
use crate::comparison::CategoryMetrics;
use crate::error::PeriodError;
use crate::format::{format_count, format_currency, format_percent};
use crate::share::{share_percent, ShareBar, DEFAULT_HIGHLIGHT_SHARE};
use crate::sparkline::Sparkline;

/// Channels merged under one marketplace are reported as `"<prefix> <name>"`.
const COMBINED_CHANNEL_PREFIX: &str = "Amazon Combined:";

/// Options for [`build_channel_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Channels never shown in the table.
    pub hidden_channels: Vec<String>,
    /// Share above which a share bar is highlighted.
    pub highlight_share: Decimal,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            hidden_channels: vec!["Contractor".to_string(), "EXPORT from WWD".to_string()],
            highlight_share: DEFAULT_HIGHLIGHT_SHARE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRow {
    /// The channel key as stored, used for drill-down links.
    pub channel: String,
    pub display_name: String,
    pub revenue: Decimal,
    pub revenue_share: Decimal,
    pub revenue_bar: ShareBar,
    pub revenue_change: PercentChange,
    pub orders: i64,
    pub order_share: Decimal,
    pub order_bar: ShareBar,
    pub average_order_value: Decimal,
    /// `None` when fewer than two periods are available.
    pub sparkline: Option<Sparkline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelTotals {
    pub revenue: Decimal,
    pub orders: i64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelTable {
    pub rows: Vec<ChannelRow>,
    pub totals: ChannelTotals,
}

/// Build the channel table from merged metrics.
///
/// Hidden channels, channels without periods and channels with no current
/// revenue are dropped. Shares and totals cover the remaining rows' current
/// period. Rows are sorted by channel key.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidMetric`] if a revenue or order count does
/// not parse.
pub fn build_channel_table(
    metrics: &[CategoryMetrics],
    options: &TableOptions,
) -> Result<ChannelTable, PeriodError> {
    let mut visible: Vec<(&CategoryMetrics, Decimal, i64)> = Vec::new();
    for metric in metrics {
        if options.hidden_channels.iter().any(|h| h == &metric.category) {
            continue;
        }
        let Some(current) = metric.current() else {
            continue;
        };
        let revenue = current.revenue()?;
        if revenue <= Decimal::ZERO {
            continue;
        }
        visible.push((metric, revenue, current.orders()?));
    }
    visible.sort_by(|a, b| a.0.category.cmp(&b.0.category));

    let total_revenue = visible
        .iter()
        .fold(Decimal::ZERO, |acc, (_, revenue, _)| acc.saturating_add(*revenue));
    let total_orders = visible
        .iter()
        .fold(0i64, |acc, (_, _, orders)| acc.saturating_add(*orders));

    let rows = visible
        .into_iter()
        .map(|(metric, revenue, orders)| {
            let revenue_share = share_percent(revenue, total_revenue);
            let order_share = share_percent(Decimal::from(orders), Decimal::from(total_orders));
            Ok(ChannelRow {
                channel: metric.category.clone(),
                display_name: display_channel_name(&metric.category),
                revenue,
                revenue_share,
                revenue_bar: ShareBar::new(revenue_share, options.highlight_share),
                revenue_change: metric.revenue_change()?,
                orders,
                order_share,
                order_bar: ShareBar::new(order_share, options.highlight_share),
                average_order_value: average_order_value(revenue, orders),
                sparkline: Sparkline::from_periods(&metric.periods)?,
            })
        })
        .collect::<Result<Vec<_>, PeriodError>>()?;

    Ok(ChannelTable {
        rows,
        totals: ChannelTotals {
            revenue: total_revenue,
            orders: total_orders,
            average_order_value: average_order_value(total_revenue, total_orders),
        },
    })
}

/// Strip the combined-marketplace prefix; blank names read "Unknown".
pub fn display_channel_name(channel: &str) -> String {
    let name = match channel.strip_prefix(COMBINED_CHANNEL_PREFIX) {
        Some(rest) => rest.trim(),
        None => channel,
    };
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

/// Revenue per order; zero when there are no orders.
pub fn average_order_value(revenue: Decimal, orders: i64) -> Decimal {
    if orders == 0 {
        return Decimal::ZERO;
    }
    revenue
        .checked_div(Decimal::from(orders))
        .unwrap_or(Decimal::ZERO)
}

impl ChannelTable {
    /// Render as aligned plain-text columns, totals last.
    pub fn render_text(&self) -> String {
        let header = [
            "Channel", "Revenue", "Share", "Trend", "Orders", "Share", "Avg Order",
        ];
        let mut lines: Vec<[String; 7]> = Vec::with_capacity(self.rows.len() + 2);
        lines.push(header.map(str::to_string));
        for row in &self.rows {
            lines.push([
                row.display_name.clone(),
                format_currency(row.revenue),
                format_percent(row.revenue_share),
                row.revenue_change.to_string(),
                format_count(row.orders),
                format_percent(row.order_share),
                format_currency(row.average_order_value),
            ]);
        }
        lines.push([
            "Total".to_string(),
            format_currency(self.totals.revenue),
            String::new(),
            String::new(),
            format_count(self.totals.orders),
            String::new(),
            format_currency(self.totals.average_order_value),
        ]);

        let mut widths = [0usize; 7];
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        lines
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if i == 0 {
                            format!("{:<w$}", cell, w = widths[i])
                        } else {
                            format!("{:>w$}", cell, w = widths[i])
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
