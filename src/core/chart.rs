//! The chart pipeline.
//!
//! `build_chart` is the one entry point the rendering layer calls: it takes
//! immutable snapshots of the raw account history, the rate table and the
//! selection, and produces a fresh, fully-derived chart. Callers re-invoke
//! it whenever any input changes; each result simply replaces the previous
//! one.

use crate::core::aggregate::{self, DomainShape};
use crate::core::display::{self, ResolvedDisplay};
use crate::core::rates::RateTable;
use crate::core::series::{AccountSeries, RawAccountSeries, ValueField};
use crate::core::timeline::{self, Conversion, GapFill, MergedTimeline};
use tracing::debug;

/// The comparative charts the dashboard renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Balance,
    Equity,
    MonthlyPnl,
    CumulativePnl,
}

impl ChartKind {
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Balance => "Balance",
            ChartKind::Equity => "Equity",
            ChartKind::MonthlyPnl => "Monthly P&L",
            ChartKind::CumulativePnl => "Cumulative P&L",
        }
    }

    fn field(self) -> ValueField {
        match self {
            ChartKind::Balance => ValueField::Balance,
            ChartKind::Equity => ValueField::Equity,
            ChartKind::MonthlyPnl | ChartKind::CumulativePnl => ValueField::Profit,
        }
    }

    fn gap_fill(self) -> GapFill {
        match self {
            // Per-period P&L is a flow: a silent period contributed nothing.
            ChartKind::MonthlyPnl => GapFill::Zero,
            // Balances, equity and cumulative P&L are levels.
            ChartKind::Balance | ChartKind::Equity | ChartKind::CumulativePnl => GapFill::Carry,
        }
    }

    fn domain_shape(self) -> DomainShape {
        match self {
            ChartKind::Balance | ChartKind::Equity => DomainShape::Level,
            ChartKind::MonthlyPnl | ChartKind::CumulativePnl => DomainShape::Signed,
        }
    }
}

/// One chart computation request.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub kind: ChartKind,
    /// Selected account ids; empty means every account.
    pub selection: &'a [i64],
    /// Currency for the converted modes.
    pub target_currency: &'a str,
    /// Forces conversion in the native display modes.
    pub show_converted: bool,
}

/// Everything the rendering layer needs for one chart.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub kind: ChartKind,
    pub display: ResolvedDisplay,
    pub timeline: MergedTimeline,
    pub domain: [f64; 2],
    /// Account column order, matching the order accounts arrived in.
    pub account_names: Vec<String>,
    /// Whether the Total trace is part of the presentation (and its domain).
    pub show_total: bool,
}

/// Builds one chart from immutable input snapshots.
///
/// Pure and synchronous: no I/O, no shared state, no surprises. Degraded
/// inputs (bad dates, missing rates) shrink the output and leave notices;
/// they never fail the computation.
pub fn build_chart(
    raw_accounts: &[RawAccountSeries],
    rates: &RateTable,
    request: &ChartRequest<'_>,
) -> ChartData {
    let selected: Vec<&RawAccountSeries> = if request.selection.is_empty() {
        raw_accounts.iter().collect()
    } else {
        raw_accounts
            .iter()
            .filter(|account| request.selection.contains(&account.account_id))
            .collect()
    };
    debug!(
        kind = ?request.kind,
        selected = selected.len(),
        "Building chart"
    );

    let mut notices = Vec::new();
    let mut accounts: Vec<AccountSeries> = Vec::with_capacity(selected.len());
    for raw in selected {
        let (series, series_notices) = AccountSeries::from_raw(raw, request.kind.field());
        notices.extend(series_notices);
        accounts.push(match request.kind {
            ChartKind::MonthlyPnl => series.monthly_sums(),
            ChartKind::CumulativePnl => series.running_sum(),
            ChartKind::Balance | ChartKind::Equity => series,
        });
    }

    let display = display::resolve_display(
        !request.selection.is_empty(),
        &accounts,
        request.target_currency,
        request.show_converted,
    );

    let conversion = display.convert.then_some(Conversion {
        table: rates,
        target: display
            .currency
            .as_deref()
            .unwrap_or(request.target_currency),
    });

    let mut merged = timeline::merge_accounts(&accounts, request.kind.gap_fill(), conversion);
    notices.append(&mut merged.notices);
    merged.notices = notices;

    let show_total = accounts.len() > 1;
    aggregate::apply_totals(&mut merged);
    let domain = aggregate::compute_domain(&merged, request.kind.domain_shape(), show_total);

    ChartData {
        kind: request.kind,
        display,
        timeline: merged,
        domain,
        account_names: accounts.iter().map(|a| a.account_name.clone()).collect(),
        show_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::display::DisplayMode;
    use crate::core::series::{NoticeReason, RawSeriesPoint};
    use std::collections::HashMap;

    fn balance_point(date: &str, balance: f64) -> RawSeriesPoint {
        RawSeriesPoint {
            date: date.to_string(),
            balance,
            equity: None,
            profit: None,
        }
    }

    fn profit_point(date: &str, profit: f64) -> RawSeriesPoint {
        RawSeriesPoint {
            date: date.to_string(),
            balance: 0.0,
            equity: None,
            profit: Some(profit),
        }
    }

    fn account(
        id: i64,
        name: &str,
        currency: Option<&str>,
        data: Vec<RawSeriesPoint>,
    ) -> RawAccountSeries {
        RawAccountSeries {
            account_id: id,
            account_name: name.to_string(),
            currency: currency.map(str::to_string),
            data,
        }
    }

    fn usd_rates() -> RateTable {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 1.0);
        rates.insert("EUR".to_string(), 1.1);
        RateTable::new("USD", rates).unwrap()
    }

    #[test]
    fn test_all_accounts_converted_with_carry_forward() {
        // X records on both dates; Y only on the first, carried forward.
        let accounts = vec![
            account(
                1,
                "X",
                Some("USD"),
                vec![balance_point("2024-01-02", 100.0), balance_point("2024-01-03", 150.0)],
            ),
            account(2, "Y", Some("EUR"), vec![balance_point("2024-01-02", 90.0)]),
        ];
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        assert_eq!(chart.display.mode, DisplayMode::AllConverted);
        assert_eq!(chart.display.currency.as_deref(), Some("USD"));
        assert!(chart.show_total);
        assert_eq!(chart.timeline.points.len(), 2);
        assert!((chart.timeline.points[0].total.unwrap() - 199.0).abs() < 1e-9);
        assert!((chart.timeline.points[1].total.unwrap() - 249.0).abs() < 1e-9);
        assert!(chart.timeline.notices.is_empty());
    }

    #[test]
    fn test_account_without_rate_is_excluded_with_notices() {
        let accounts = vec![
            account(
                1,
                "X",
                Some("USD"),
                vec![balance_point("2024-01-02", 100.0), balance_point("2024-01-03", 150.0)],
            ),
            account(
                9,
                "Z",
                Some("GBP"),
                vec![balance_point("2024-01-02", 40.0)],
            ),
        ];
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        // Z's recorded and carried values are both excluded; one notice per
        // affected date.
        assert_eq!(chart.timeline.points[0].total, Some(100.0));
        assert_eq!(chart.timeline.points[1].total, Some(150.0));
        let missing: Vec<_> = chart
            .timeline
            .notices
            .iter()
            .filter(|n| n.reason == NoticeReason::MissingRate)
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|n| n.account_id == 9));
    }

    #[test]
    fn test_single_account_chart_in_isolation() {
        let accounts = vec![
            account(1, "W", Some("USD"), vec![balance_point("2024-01-02", 500.0)]),
            account(2, "Other", Some("EUR"), vec![balance_point("2024-01-02", 1.0)]),
        ];
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[1],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        assert_eq!(chart.display.mode, DisplayMode::SingleNative);
        assert!(!chart.show_total);
        assert_eq!(chart.timeline.points.len(), 1);
        assert_eq!(chart.account_names, vec!["W".to_string()]);
        // Constant single point: the minimum padding floor applies.
        assert_eq!(chart.domain, [499.0, 501.0]);
    }

    #[test]
    fn test_monthly_pnl_buckets_and_zero_fills() {
        let accounts = vec![
            account(
                1,
                "A",
                Some("USD"),
                vec![
                    profit_point("2024-01-05", 10.0),
                    profit_point("2024-01-20", -4.0),
                    profit_point("2024-03-02", 3.0),
                ],
            ),
            account(2, "B", Some("USD"), vec![profit_point("2024-02-10", 8.0)]),
        ];
        let request = ChartRequest {
            kind: ChartKind::MonthlyPnl,
            selection: &[],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        // Axis: Jan, Feb, Mar. A's silent February is zero, not carried.
        assert_eq!(chart.timeline.points.len(), 3);
        assert_eq!(chart.timeline.points[0].values["A"], 6.0);
        assert_eq!(chart.timeline.points[0].values["B"], 0.0);
        assert_eq!(chart.timeline.points[1].values["A"], 0.0);
        assert_eq!(chart.timeline.points[1].values["B"], 8.0);
        assert_eq!(chart.timeline.points[2].values["A"], 3.0);
    }

    #[test]
    fn test_cumulative_pnl_is_running_sum_with_carry() {
        let accounts = vec![account(
            1,
            "A",
            Some("USD"),
            vec![
                profit_point("2024-01-05", 10.0),
                profit_point("2024-01-20", -4.0),
            ],
        )];
        let request = ChartRequest {
            kind: ChartKind::CumulativePnl,
            selection: &[1],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        let values: Vec<f64> = chart
            .timeline
            .points
            .iter()
            .map(|p| p.values["A"])
            .collect();
        assert_eq!(values, vec![10.0, 6.0]);
    }

    #[test]
    fn test_malformed_dates_surface_in_chart_notices() {
        let accounts = vec![account(
            1,
            "A",
            Some("USD"),
            vec![balance_point("bogus", 1.0), balance_point("2024-01-02", 2.0)],
        )];
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        assert_eq!(chart.timeline.points.len(), 1);
        assert_eq!(chart.timeline.notices.len(), 1);
        assert_eq!(chart.timeline.notices[0].reason, NoticeReason::MalformedDate);
    }

    #[test]
    fn test_no_accounts_yields_sentinel_domain() {
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&[], &usd_rates(), &request);

        assert!(chart.timeline.is_empty());
        assert_eq!(chart.domain, [0.0, 100.0]);
    }

    #[test]
    fn test_native_multi_same_currency_skips_conversion() {
        let accounts = vec![
            account(1, "A", Some("EUR"), vec![balance_point("2024-01-02", 10.0)]),
            account(2, "B", Some("EUR"), vec![balance_point("2024-01-02", 20.0)]),
        ];
        let request = ChartRequest {
            kind: ChartKind::Balance,
            selection: &[1, 2],
            target_currency: "USD",
            show_converted: false,
        };

        let chart = build_chart(&accounts, &usd_rates(), &request);

        assert_eq!(chart.display.mode, DisplayMode::MultiSameCurrencyNative);
        // Values stay in EUR, untouched by the USD rate table.
        assert_eq!(chart.timeline.points[0].values["A"], 10.0);
        assert_eq!(chart.timeline.points[0].total, Some(30.0));
    }
}
