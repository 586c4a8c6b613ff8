//! Exchange-rate table and conversion math.

use anyhow::{Result, bail};
use std::collections::HashMap;
use tracing::debug;

/// A read-only exchange-rate table quoted against one base currency.
///
/// `rates[code]` is the value of one unit of `code` expressed in the base
/// currency, so the base itself always maps to `1.0`. The table is supplied
/// by the settings layer and never mutated here.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base_currency: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Validates and builds a rate table.
    ///
    /// Rejects zero, negative and non-finite rates, and a base entry that is
    /// not `1.0`. A missing base entry is filled in as `1.0`.
    pub fn new(base_currency: &str, rates: HashMap<String, f64>) -> Result<Self> {
        for (code, rate) in &rates {
            if !rate.is_finite() || *rate <= 0.0 {
                bail!("Invalid exchange rate for {code}: {rate} (rates must be positive)");
            }
        }
        if let Some(base_rate) = rates.get(base_currency) {
            if (base_rate - 1.0).abs() > f64::EPSILON {
                bail!("Base currency {base_currency} must have a rate of 1.0, got {base_rate}");
            }
        }

        let mut rates = rates;
        rates.entry(base_currency.to_string()).or_insert(1.0);

        Ok(RateTable {
            base_currency: base_currency.to_string(),
            rates,
        })
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Conversion factor from `from` to `to`, or `None` when either side has
    /// no quote. Identical codes always resolve to `1.0`, even codes the
    /// table has never heard of.
    ///
    /// Non-base pairs pivot through the base currency: with the base entry
    /// pinned to `1.0`, `rates[from] / rates[to]` covers the direct, inverse
    /// and cross cases alike.
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        let from_rate = self.rates.get(from)?;
        let to_rate = self.rates.get(to)?;
        Some(from_rate / to_rate)
    }

    /// Converts `amount` from one currency to another, or `None` when the
    /// pair cannot be resolved. Unavailability is a value callers branch on,
    /// never an error.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        match self.rate(from, to) {
            Some(rate) => Some(amount * rate),
            None => {
                debug!("No usable rate from {from} to {to}");
                None
            }
        }
    }
}
