//! Account history input shapes and normalization.
//!
//! The journal API reports each account's history as loosely-typed rows with
//! string dates. The registry turns those rows into validated, ordered
//! series the merge pipeline can rely on, dropping individual bad samples
//! instead of whole accounts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One history row as reported upstream. The date stays a string until the
/// registry validates it; `equity` and `profit` are optional because older
/// journal entries only recorded a balance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSeriesPoint {
    pub date: String,
    pub balance: f64,
    pub equity: Option<f64>,
    pub profit: Option<f64>,
}

/// One account with its raw history, as fetched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccountSeries {
    pub account_id: i64,
    pub account_name: String,
    /// Absent when the journal has no currency metadata for the account.
    pub currency: Option<String>,
    pub data: Vec<RawSeriesPoint>,
}

/// Which metric of a history row feeds a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueField {
    Balance,
    Equity,
    Profit,
}

impl ValueField {
    fn pick(self, point: &RawSeriesPoint) -> Option<f64> {
        match self {
            ValueField::Balance => Some(point.balance),
            ValueField::Equity => point.equity,
            ValueField::Profit => point.profit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeReason {
    MissingRate,
    MalformedDate,
}

/// A data-quality signal attached to chart output instead of failing the
/// computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub account_id: i64,
    pub date: String,
    pub reason: NoticeReason,
}

/// A validated account series: ordered, de-duplicated points keyed by
/// instant. Currency stays `None` when the journal never tagged one.
#[derive(Debug, Clone)]
pub struct AccountSeries {
    pub account_id: i64,
    pub account_name: String,
    pub currency: Option<String>,
    pub points: BTreeMap<DateTime<Utc>, f64>,
}

impl AccountSeries {
    /// Normalizes one raw account for the given metric.
    ///
    /// Samples whose date does not parse are dropped individually with a
    /// `MalformedDate` notice; the rest of the series stays usable. Samples
    /// missing the selected metric are skipped silently, since optional
    /// fields are a permitted input state. Duplicate dates resolve to the
    /// later row.
    pub fn from_raw(raw: &RawAccountSeries, field: ValueField) -> (Self, Vec<Notice>) {
        let mut points = BTreeMap::new();
        let mut notices = Vec::new();

        for row in &raw.data {
            let Some(instant) = parse_instant(&row.date) else {
                debug!(
                    account_id = raw.account_id,
                    date = %row.date,
                    "Dropping sample with malformed date"
                );
                notices.push(Notice {
                    account_id: raw.account_id,
                    date: row.date.clone(),
                    reason: NoticeReason::MalformedDate,
                });
                continue;
            };
            if let Some(value) = field.pick(row) {
                // Later rows supersede earlier ones for the same instant.
                points.insert(instant, value);
            }
        }

        let series = AccountSeries {
            account_id: raw.account_id,
            account_name: raw.account_name.clone(),
            currency: raw.currency.clone(),
            points,
        };
        (series, notices)
    }

    /// Sums the series into per-month buckets dated at the first of each
    /// month. Used for flow-type (per-period P&L) charts.
    pub fn monthly_sums(&self) -> Self {
        let mut buckets: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for (instant, value) in &self.points {
            let month_start = NaiveDate::from_ymd_opt(instant.year(), instant.month(), 1)
                .expect("first of month is always valid")
                .and_time(NaiveTime::MIN)
                .and_utc();
            *buckets.entry(month_start).or_insert(0.0) += value;
        }
        AccountSeries {
            account_id: self.account_id,
            account_name: self.account_name.clone(),
            currency: self.currency.clone(),
            points: buckets,
        }
    }

    /// Replaces each point with the running sum of all points up to and
    /// including it. Used for cumulative P&L charts.
    pub fn running_sum(&self) -> Self {
        let mut sum = 0.0;
        let points = self
            .points
            .iter()
            .map(|(instant, value)| {
                sum += value;
                (*instant, sum)
            })
            .collect();
        AccountSeries {
            account_id: self.account_id,
            account_name: self.account_name.clone(),
            currency: self.currency.clone(),
            points,
        }
    }
}

/// Parses an upstream date string into an instant.
///
/// Accepts RFC 3339 datetimes and plain `YYYY-MM-DD` dates; plain dates land
/// at midnight UTC so both spellings of the same instant collide on one
/// axis slot.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Renders an instant back into the shortest faithful form: `YYYY-MM-DD`
/// for midnight UTC, RFC 3339 otherwise.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    if instant.time() == NaiveTime::MIN {
        instant.format("%Y-%m-%d").to_string()
    } else {
        instant.to_rfc3339()
    }
}

/// Upstream source of raw account history.
#[async_trait]
pub trait AccountHistoryProvider: Send + Sync {
    async fn fetch_accounts(&self) -> Result<Vec<RawAccountSeries>>;
}
