//! Deterministic date-range resolution for dashboard pages.
//!
//! Every dashboard page filters its aggregation queries by a window derived
//! from a symbolic `range` token such as `"last-12-months"`. This module turns
//! that token into concrete inclusive dates, and derives the immediately
//! preceding window of equal length for period-over-period comparisons.
//!
//! All functions take explicit inputs (no system clock access): the caller
//! provides the "now" anchor, which keeps resolution pure and testable.
//!
//! # Functions
//!
//! - [`resolve`] — Resolve an optional range token against a reference instant
//! - [`resolve_frame`] — Resolve an already-parsed [`TimeFrame`]
//! - [`previous_period`] — The equal-length window ending the day before a window starts
//! - [`previous_period_from_str`] — Same, from `YYYY-MM-DD` strings
//! - [`parse_reference_now`] — Parse a textual reference instant
//! - [`range_from_query`] — Extract the `range` parameter from a query string

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::PeriodError;
use crate::format::format_long_date;

/// Label used for windows derived by [`previous_period`].
const PREVIOUS_PERIOD_LABEL: &str = "Previous Period";

// ── TimeFrame ───────────────────────────────────────────────────────────────

/// A symbolic relative window selectable from the dashboard's range picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    Last30Days,
    #[serde(rename = "last-90-days")]
    Last90Days,
    #[serde(rename = "last-6-months")]
    Last6Months,
    #[default]
    #[serde(rename = "last-12-months")]
    Last12Months,
    #[serde(rename = "year-to-date")]
    YearToDate,
    #[serde(rename = "all-time")]
    AllTime,
}

impl TimeFrame {
    /// Every supported frame, in picker order.
    pub const ALL: [TimeFrame; 7] = [
        TimeFrame::Last7Days,
        TimeFrame::Last30Days,
        TimeFrame::Last90Days,
        TimeFrame::Last6Months,
        TimeFrame::Last12Months,
        TimeFrame::YearToDate,
        TimeFrame::AllTime,
    ];

    /// The token accepted in the `range` query parameter.
    pub fn as_token(&self) -> &'static str {
        match self {
            TimeFrame::Last7Days => "last-7-days",
            TimeFrame::Last30Days => "last-30-days",
            TimeFrame::Last90Days => "last-90-days",
            TimeFrame::Last6Months => "last-6-months",
            TimeFrame::Last12Months => "last-12-months",
            TimeFrame::YearToDate => "year-to-date",
            TimeFrame::AllTime => "all-time",
        }
    }

    /// Human label used as the prefix of [`DateRange::display_text`].
    pub fn label(&self) -> &'static str {
        match self {
            TimeFrame::Last7Days => "Last 7 Days",
            TimeFrame::Last30Days => "Last 30 Days",
            TimeFrame::Last90Days => "Last 90 Days",
            TimeFrame::Last6Months => "Last 6 Months",
            TimeFrame::Last12Months => "Last 12 Months",
            TimeFrame::YearToDate => "Year to Date",
            TimeFrame::AllTime => "All Time",
        }
    }

    /// Match a token, ignoring surrounding whitespace and ASCII case.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = token.trim().to_ascii_lowercase();
        TimeFrame::ALL
            .into_iter()
            .find(|frame| frame.as_token() == normalized)
    }

    /// Match a token, falling back to `default` when it is absent or unknown.
    pub fn from_token_or(token: Option<&str>, default: TimeFrame) -> Self {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            None => default,
            Some(t) => TimeFrame::from_token(t).unwrap_or_else(|| {
                tracing::debug!(
                    token = t,
                    fallback = default.as_token(),
                    "unrecognized range token"
                );
                default
            }),
        }
    }

    /// First day of this frame's window when the window ends on `end`.
    ///
    /// Month-based frames use calendar-month arithmetic, clamping to the last
    /// valid day of the target month (Mar 31 minus 1 month is Feb 28/29).
    pub fn start_for(&self, end: NaiveDate) -> NaiveDate {
        match self {
            TimeFrame::Last7Days => saturating_sub_days(end, 7),
            TimeFrame::Last30Days => saturating_sub_days(end, 30),
            TimeFrame::Last90Days => saturating_sub_days(end, 90),
            TimeFrame::Last6Months => saturating_sub_months(end, 6),
            TimeFrame::Last12Months => saturating_sub_months(end, 12),
            TimeFrame::YearToDate => NaiveDate::from_ymd_opt(end.year(), 1, 1).unwrap_or(end),
            TimeFrame::AllTime => all_time_start().min(end),
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Strict parsing: unknown tokens are an error, not the default frame.
impl FromStr for TimeFrame {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFrame::from_token(s)
            .ok_or_else(|| PeriodError::InvalidRange(format!("unknown range token '{}'", s.trim())))
    }
}

// ── ResolveOptions ──────────────────────────────────────────────────────────

/// Options for [`resolve_with_options`] and [`resolve_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Frame used when the token is absent or unrecognized.
    pub default_frame: TimeFrame,
    /// Timezone whose calendar date is "today" for the reference instant.
    pub timezone: Tz,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            default_frame: TimeFrame::default(),
            timezone: chrono_tz::UTC,
        }
    }
}

// ── DateRange ───────────────────────────────────────────────────────────────

/// A concrete, inclusive date window plus its UI label.
///
/// Recomputed per request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
    /// `start_date` as `YYYY-MM-DD`, for SQL `>=` predicates.
    pub formatted_start_date: String,
    /// `end_date` as `YYYY-MM-DD`, for SQL `<=` predicates.
    pub formatted_end_date: String,
    /// Human label, e.g. "Last 12 Months (Jun 15, 2023 - Jun 15, 2024)".
    pub display_text: String,
}

impl DateRange {
    /// Build a range, ordering the bounds so that `start_date <= end_date`.
    pub fn new(start: NaiveDate, end: NaiveDate, label: &str) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start_date: start,
            end_date: end,
            formatted_start_date: start.format("%Y-%m-%d").to_string(),
            formatted_end_date: end.format("%Y-%m-%d").to_string(),
            display_text: format!(
                "{} ({} - {})",
                label,
                format_long_date(start),
                format_long_date(end)
            ),
        }
    }

    /// Elapsed days between the bounds (`end_date - start_date`).
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Whether `date` falls inside the inclusive window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

// ── resolve ─────────────────────────────────────────────────────────────────

/// Resolve an optional range token against a reference instant.
///
/// Uses UTC and the `last-12-months` default. For a configurable timezone or
/// default, use [`resolve_with_options`].
///
/// Never fails: absent or unrecognized tokens resolve to the default window.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use period_engine::timeframe::resolve;
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
/// let range = resolve(Some("last-12-months"), now);
/// assert_eq!(range.formatted_start_date, "2023-06-15");
/// assert_eq!(range.formatted_end_date, "2024-06-15");
/// ```
pub fn resolve(token: Option<&str>, reference_now: DateTime<Utc>) -> DateRange {
    resolve_with_options(token, reference_now, &ResolveOptions::default())
}

/// Resolve an optional range token with explicit options.
pub fn resolve_with_options(
    token: Option<&str>,
    reference_now: DateTime<Utc>,
    options: &ResolveOptions,
) -> DateRange {
    let frame = TimeFrame::from_token_or(token, options.default_frame);
    resolve_frame(frame, reference_now, options)
}

/// Resolve a parsed [`TimeFrame`].
///
/// The window ends on the calendar date of `reference_now` in
/// `options.timezone` and starts on [`TimeFrame::start_for`] that date.
pub fn resolve_frame(
    frame: TimeFrame,
    reference_now: DateTime<Utc>,
    options: &ResolveOptions,
) -> DateRange {
    let end = reference_now.with_timezone(&options.timezone).date_naive();
    let start = frame.start_for(end);
    DateRange::new(start, end, frame.label())
}

// ── previous_period ─────────────────────────────────────────────────────────

/// The window of identical length immediately preceding `start..=end`.
///
/// `previous.end_date` is the day before `start` and `previous.start_date`
/// lies `end - start` elapsed days before that, so month lengths and leap
/// days never change the duration. Bounds are taken in order; arithmetic
/// saturates at the calendar limits of [`NaiveDate`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use period_engine::timeframe::previous_period;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// let prev = previous_period(start, end);
/// assert_eq!(prev.formatted_start_date, "2023-12-01");
/// assert_eq!(prev.formatted_end_date, "2023-12-31");
/// ```
pub fn previous_period(start: NaiveDate, end: NaiveDate) -> DateRange {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let elapsed = (end - start).num_days().unsigned_abs();

    let prev_end = start.pred_opt().unwrap_or(NaiveDate::MIN);
    let prev_start = prev_end
        .checked_sub_days(Days::new(elapsed))
        .unwrap_or(NaiveDate::MIN);

    DateRange::new(prev_start, prev_end, PREVIOUS_PERIOD_LABEL)
}

/// [`previous_period`] for `YYYY-MM-DD` strings.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] if either date cannot be parsed, or
/// [`PeriodError::InvalidRange`] if `start` is after `end`.
pub fn previous_period_from_str(start: &str, end: &str) -> Result<DateRange, PeriodError> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    if start_date > end_date {
        return Err(PeriodError::InvalidRange(format!(
            "start '{}' is after end '{}'",
            start.trim(),
            end.trim()
        )));
    }
    Ok(previous_period(start_date, end_date))
}

// ── Input parsing ───────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, PeriodError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PeriodError::InvalidDate(format!("'{}': {}", s.trim(), e)))
}

/// Parse a reference instant: RFC 3339, or `YYYY-MM-DD` taken as midnight UTC.
///
/// # Errors
///
/// Returns [`PeriodError::InvalidDate`] for anything else. A malformed
/// reference instant is an input-validation failure, never silently replaced.
pub fn parse_reference_now(s: &str) -> Result<DateTime<Utc>, PeriodError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            PeriodError::InvalidDate(format!(
                "'{}': expected RFC 3339 datetime or YYYY-MM-DD",
                s
            ))
        })
}

/// Extract the `range` parameter from a URL query string.
///
/// A leading `?` is ignored. When the parameter repeats, the first value
/// wins; an empty value counts as absent.
pub fn range_from_query(query: &str) -> Option<String> {
    let query = query.trim().trim_start_matches('?');
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "range")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Floor of the `all-time` window; the dataset has no earlier orders.
fn all_time_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn saturating_sub_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

fn saturating_sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

// ── Tests ───────────────────────────────────────────────────────────────────
