//! Calendar bucketing for `exchanges.grouped`.
//!
//! Buckets are indexed by how many whole units (UTC, weeks starting on
//! Sunday) separate a trade from the end of the unit holding the newest
//! trade: index 0 is the newest unit. Indices with no trades are absent
//! from the map.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use clap::ValueEnum;
use hzn_data::exchanges::Exchange;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AggregateError {
    #[error("no exchanges found in the requested window")]
    NoRecords,

    #[error("timestamp {0} is out of range")]
    OutOfRange(i64),

    #[error("cannot go back {0} units from now")]
    WindowTooLarge(u32),
}

/// Calendar unit to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Unit {
    #[default]
    Days,
    Weeks,
    Months,
}

/// Totals for one calendar unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub volume: i64,
    pub fees: i64,
    pub unique: u32,
    pub trades: u32,
    pub label: String,
}

impl Bucket {
    fn empty(label: String) -> Self {
        Self {
            volume: 0,
            fees: 0,
            unique: 0,
            trades: 0,
            label,
        }
    }
}

/// The fields of a trade that feed a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Milliseconds.
    pub timestamp: i64,
    pub volume_usd: f64,
    pub fees_usd: f64,
    pub account: String,
}

impl From<&Exchange> for Trade {
    fn from(exchange: &Exchange) -> Self {
        Self {
            timestamp: exchange.timestamp,
            volume_usd: exchange.from_amount_in_usd,
            fees_usd: exchange.fees_in_usd,
            account: exchange.from_address.clone(),
        }
    }
}

/// Buckets produced by [`group`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    pub unit: Unit,
    /// Start of the unit at index 0.
    pub anchor: DateTime<Utc>,
    pub buckets: BTreeMap<usize, Bucket>,
}

impl Grouped {
    /// Every index up to the oldest bucket; `None` for units with no trades.
    pub fn sparse(&self) -> Vec<Option<&Bucket>> {
        let len = self.buckets.keys().next_back().map_or(0, |last| last + 1);
        (0..len).map(|i| self.buckets.get(&i)).collect()
    }

    /// Like [`Grouped::sparse`], with zeroed buckets in the gaps.
    pub fn filled(&self) -> Vec<Bucket> {
        self.sparse()
            .into_iter()
            .enumerate()
            .map(|(i, bucket)| match bucket {
                Some(b) => b.clone(),
                None => Bucket::empty(self.label_for_index(i)),
            })
            .collect()
    }

    /// Buckets that saw at least one trade, newest first.
    pub fn present(&self) -> Vec<&Bucket> {
        self.buckets.values().collect()
    }

    fn label_for_index(&self, index: usize) -> String {
        let start = match self.unit {
            Unit::Days => self.anchor - Duration::days(index as i64),
            Unit::Weeks => self.anchor - Duration::weeks(index as i64),
            Unit::Months => self
                .anchor
                .checked_sub_months(Months::new(index as u32))
                .unwrap_or(self.anchor),
        };
        label(self.unit, start)
    }
}

/// Group reverse-chronological trades into calendar buckets.
pub fn group(trades: &[Trade], unit: Unit) -> Result<Grouped, AggregateError> {
    let newest = trades.first().ok_or(AggregateError::NoRecords)?;
    let newest_at = from_millis(newest.timestamp)?;
    let anchor = start_of(unit, newest_at);
    let window_end = next_start(unit, anchor) - Duration::milliseconds(1);

    let mut buckets: BTreeMap<usize, Bucket> = BTreeMap::new();
    let mut seen: BTreeMap<usize, HashSet<&str>> = BTreeMap::new();

    for trade in trades {
        let at = from_millis(trade.timestamp)?;
        let index = units_between(unit, at, window_end);

        let bucket = buckets
            .entry(index)
            .or_insert_with(|| Bucket::empty(label(unit, at)));
        bucket.volume = (bucket.volume as f64 + trade.volume_usd).round() as i64;
        bucket.fees = (bucket.fees as f64 + trade.fees_usd).round() as i64;
        bucket.trades += 1;
        if seen.entry(index).or_default().insert(trade.account.as_str()) {
            bucket.unique += 1;
        }
    }

    Ok(Grouped {
        unit,
        anchor,
        buckets,
    })
}

/// Oldest timestamp (seconds) covered by `offset` units before the current one.
pub fn window_start(
    unit: Unit,
    offset: u32,
    now: DateTime<Utc>,
) -> Result<i64, AggregateError> {
    let start = start_of(unit, now);
    let start = match unit {
        Unit::Days => start.checked_sub_signed(Duration::days(offset as i64)),
        Unit::Weeks => start.checked_sub_signed(Duration::weeks(offset as i64)),
        Unit::Months => start.checked_sub_months(Months::new(offset)),
    };
    start
        .map(|start| start.timestamp())
        .ok_or(AggregateError::WindowTooLarge(offset))
}

/// Display label for the unit containing `at`.
pub fn label(unit: Unit, at: DateTime<Utc>) -> String {
    match unit {
        Unit::Days => at.format("%d %b %y").to_string(),
        Unit::Months => at.format("%b %y").to_string(),
        Unit::Weeks => format!("Week {:02}, {}", week_of_year(at.date_naive()), at.format("%y")),
    }
}

/// Week number where weeks start on Sunday and week 1 holds 1 January.
fn week_of_year(date: NaiveDate) -> i64 {
    let week_start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
    let week_end = week_start + Duration::days(6);
    let year = week_end.year();

    let first_day = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(week_end);
    let first_week = first_day - Duration::days(first_day.weekday().num_days_from_sunday() as i64);
    (week_start - first_week).num_days() / 7 + 1
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, AggregateError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(AggregateError::OutOfRange(millis))
}

fn start_of(unit: Unit, at: DateTime<Utc>) -> DateTime<Utc> {
    let date = at.date_naive();
    let date = match unit {
        Unit::Days => date,
        Unit::Weeks => date - Duration::days(date.weekday().num_days_from_sunday() as i64),
        Unit::Months => date.with_day(1).unwrap_or(date),
    };
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn next_start(unit: Unit, start: DateTime<Utc>) -> DateTime<Utc> {
    match unit {
        Unit::Days => start + Duration::days(1),
        Unit::Weeks => start + Duration::weeks(1),
        Unit::Months => start
            .checked_add_months(Months::new(1))
            .unwrap_or(start + Duration::days(31)),
    }
}

fn units_between(unit: Unit, at: DateTime<Utc>, window_end: DateTime<Utc>) -> usize {
    let units = match unit {
        Unit::Days => (window_end - at).num_days(),
        Unit::Weeks => (window_end - at).num_weeks(),
        Unit::Months => {
            let end = window_end.year() as i64 * 12 + window_end.month0() as i64;
            let start = at.year() as i64 * 12 + at.month0() as i64;
            end - start
        }
    };
    units.unsigned_abs() as usize
}
