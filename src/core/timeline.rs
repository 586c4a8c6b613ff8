//! Multi-account timeline merging.
//!
//! Accounts sample their history independently, so their date axes rarely
//! line up. The merger builds the union of all instants, then walks it once
//! per account, filling gaps according to the chart's policy and converting
//! values through the rate table when the display mode asks for it.

use crate::core::rates::RateTable;
use crate::core::series::{AccountSeries, Notice, NoticeReason, format_instant};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// How an account's missing sample at an axis date is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFill {
    /// Level-type series (balance, equity, cumulative P&L): reuse the last
    /// known value; before the first sample the account is simply absent.
    Carry,
    /// Flow-type series (per-period P&L): a missing period contributed
    /// nothing, so it is exactly zero, never carried.
    Zero,
}

/// Conversion parameters for a merge pass.
#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    pub table: &'a RateTable,
    pub target: &'a str,
}

/// One date on the merged axis with every account value that resolved there.
#[derive(Debug, Clone)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    /// Values keyed by account name. An account with no resolvable value at
    /// this date is absent, not zero.
    pub values: BTreeMap<String, f64>,
    /// Filled in by the aggregate pass; `None` until then, and `None` for
    /// dates where no account resolved.
    pub total: Option<f64>,
}

/// A freshly merged timeline. Recomputed whole on every input change and
/// never mutated after publication; the newest result replaces the old one.
#[derive(Debug, Clone, Default)]
pub struct MergedTimeline {
    pub points: Vec<TimelinePoint>,
    pub notices: Vec<Notice>,
}

impl MergedTimeline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Merges the given accounts onto one chronological axis.
///
/// The axis is the union of every account's instants, ordered by instant.
/// With `conversion` set, each recorded-or-filled value is converted into
/// the target currency; a value with no usable rate is excluded from that
/// date (not coerced to zero) and reported with a `MissingRate` notice.
/// Accounts without currency metadata cannot participate in a converted
/// view and are excluded quietly, as documented for unknown currencies.
pub fn merge_accounts(
    accounts: &[AccountSeries],
    policy: GapFill,
    conversion: Option<Conversion<'_>>,
) -> MergedTimeline {
    let mut axis: BTreeSet<DateTime<Utc>> = BTreeSet::new();
    for account in accounts {
        axis.extend(account.points.keys().copied());
    }
    debug!(
        accounts = accounts.len(),
        dates = axis.len(),
        "Merging account series"
    );

    let mut points = Vec::with_capacity(axis.len());
    let mut notices = Vec::new();
    let mut last_known: HashMap<i64, f64> = HashMap::new();

    for date in &axis {
        let mut values = BTreeMap::new();

        for account in accounts {
            let raw = match account.points.get(date) {
                Some(value) => {
                    last_known.insert(account.account_id, *value);
                    Some(*value)
                }
                None => match policy {
                    GapFill::Carry => last_known.get(&account.account_id).copied(),
                    GapFill::Zero => Some(0.0),
                },
            };
            // No recorded or filled value: the account has not started yet.
            let Some(raw) = raw else { continue };

            let resolved = match conversion {
                None => Some(raw),
                Some(conversion) => convert_value(account, raw, *date, conversion, &mut notices),
            };
            if let Some(value) = resolved {
                values.insert(account.account_name.clone(), value);
            }
        }

        points.push(TimelinePoint {
            date: *date,
            values,
            total: None,
        });
    }

    MergedTimeline { points, notices }
}

fn convert_value(
    account: &AccountSeries,
    raw: f64,
    date: DateTime<Utc>,
    conversion: Conversion<'_>,
    notices: &mut Vec<Notice>,
) -> Option<f64> {
    let Some(currency) = account.currency.as_deref() else {
        debug!(
            account_id = account.account_id,
            "Account has no currency metadata; excluded from converted view"
        );
        return None;
    };
    match conversion.table.convert(raw, currency, conversion.target) {
        Some(value) => Some(value),
        None => {
            notices.push(Notice {
                account_id: account.account_id,
                date: format_instant(&date),
                reason: NoticeReason::MissingRate,
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::parse_instant;
    use std::collections::HashMap;

    fn series(id: i64, name: &str, currency: Option<&str>, points: &[(&str, f64)]) -> AccountSeries {
        AccountSeries {
            account_id: id,
            account_name: name.to_string(),
            currency: currency.map(str::to_string),
            points: points
                .iter()
                .map(|(date, value)| (parse_instant(date).unwrap(), *value))
                .collect(),
        }
    }

    fn usd_table() -> RateTable {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 1.0);
        rates.insert("EUR".to_string(), 1.1);
        RateTable::new("USD", rates).unwrap()
    }

    #[test]
    fn test_axis_is_union_of_valid_dates() {
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 1.0), ("2024-01-04", 2.0)]);
        let b = series(2, "B", Some("USD"), &[("2024-01-03", 3.0), ("2024-01-04", 4.0)]);

        let merged = merge_accounts(&[a, b], GapFill::Carry, None);

        assert_eq!(merged.points.len(), 3);
        let dates: Vec<String> = merged
            .points
            .iter()
            .map(|p| format_instant(&p.date))
            .collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
    }

    #[test]
    fn test_carry_forward_uses_last_known_value() {
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 100.0), ("2024-01-05", 130.0)]);
        let b = series(2, "B", Some("USD"), &[("2024-01-03", 50.0)]);

        let merged = merge_accounts(&[a, b], GapFill::Carry, None);

        // A carries 100.0 across B's date, then records 130.0.
        assert_eq!(merged.points[1].values["A"], 100.0);
        assert_eq!(merged.points[2].values["A"], 130.0);
        // B carries 50.0 to the final date.
        assert_eq!(merged.points[2].values["B"], 50.0);
    }

    #[test]
    fn test_carry_forward_absent_before_first_sample() {
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 100.0)]);
        let b = series(2, "B", Some("USD"), &[("2024-01-05", 50.0)]);

        let merged = merge_accounts(&[a, b], GapFill::Carry, None);

        // B has not started on the first date: absent, not zero.
        assert!(!merged.points[0].values.contains_key("B"));
        assert_eq!(merged.points[1].values["B"], 50.0);
    }

    #[test]
    fn test_zero_fill_is_exactly_zero_never_carried() {
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 10.0)]);
        let b = series(2, "B", Some("USD"), &[("2024-01-02", 5.0), ("2024-01-03", 7.0)]);

        let merged = merge_accounts(&[a, b], GapFill::Zero, None);

        assert_eq!(merged.points[1].values["A"], 0.0);
        assert_eq!(merged.points[1].values["B"], 7.0);
    }

    #[test]
    fn test_conversion_applies_to_recorded_and_carried_values() {
        let table = usd_table();
        let a = series(1, "A", Some("EUR"), &[("2024-01-02", 90.0)]);
        let b = series(2, "B", Some("USD"), &[("2024-01-03", 10.0)]);

        let merged = merge_accounts(
            &[a, b],
            GapFill::Carry,
            Some(Conversion {
                table: &table,
                target: "USD",
            }),
        );

        assert!((merged.points[0].values["A"] - 99.0).abs() < 1e-9);
        // Carried EUR value converts on the later date too.
        assert!((merged.points[1].values["A"] - 99.0).abs() < 1e-9);
        assert!(merged.notices.is_empty());
    }

    #[test]
    fn test_missing_rate_excludes_value_and_emits_notice_per_date() {
        let table = usd_table();
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 10.0), ("2024-01-03", 20.0)]);
        let z = series(9, "Z", Some("GBP"), &[("2024-01-02", 5.0)]);

        let merged = merge_accounts(
            &[a, z],
            GapFill::Carry,
            Some(Conversion {
                table: &table,
                target: "USD",
            }),
        );

        // Z is excluded on both dates (recorded, then carried), never zeroed.
        assert!(!merged.points[0].values.contains_key("Z"));
        assert!(!merged.points[1].values.contains_key("Z"));
        assert_eq!(merged.notices.len(), 2);
        assert!(
            merged
                .notices
                .iter()
                .all(|n| n.account_id == 9 && n.reason == NoticeReason::MissingRate)
        );
    }

    #[test]
    fn test_unknown_currency_excluded_from_converted_view_without_notice() {
        let table = usd_table();
        let a = series(1, "A", Some("USD"), &[("2024-01-02", 10.0)]);
        let u = series(2, "U", None, &[("2024-01-02", 99.0)]);

        let merged = merge_accounts(
            &[a, u],
            GapFill::Carry,
            Some(Conversion {
                table: &table,
                target: "USD",
            }),
        );

        assert!(!merged.points[0].values.contains_key("U"));
        assert!(merged.notices.is_empty());
    }

    #[test]
    fn test_unknown_currency_included_in_native_view() {
        let u = series(2, "U", None, &[("2024-01-02", 99.0)]);
        let merged = merge_accounts(&[u], GapFill::Carry, None);
        assert_eq!(merged.points[0].values["U"], 99.0);
    }

    #[test]
    fn test_no_accounts_yields_empty_timeline() {
        let merged = merge_accounts(&[], GapFill::Carry, None);
        assert!(merged.is_empty());
        assert!(merged.notices.is_empty());
    }
}
