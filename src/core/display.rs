//! Display-mode resolution.
//!
//! A small deterministic resolver: from the account selection and the set of
//! distinct currencies involved, decide whether values are shown natively or
//! converted, and in which currency. Every selection maps to a mode; there
//! is no invalid state.

use crate::core::series::AccountSeries;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Empty selection, read as "all accounts"; always converted.
    AllConverted,
    /// Exactly one account, shown in its own currency.
    SingleNative,
    /// Several accounts sharing one currency; no conversion needed.
    MultiSameCurrencyNative,
    /// Several accounts spanning currencies; conversion is mandatory.
    MultiMixedConverted,
}

/// The resolved presentation for one chart computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDisplay {
    pub mode: DisplayMode,
    /// Whether values are run through the rate table. True for the converted
    /// modes, and for native modes when the caller forces conversion.
    pub convert: bool,
    /// The currency values are presented in. `None` only in native modes
    /// where no currency metadata exists.
    pub currency: Option<String>,
}

/// Resolves the display mode for the accounts under consideration.
///
/// `explicit_selection` is false when the user selected nothing, which means
/// "all accounts, converted". `show_converted` forces conversion in the two
/// native modes and is ignored elsewhere.
pub fn resolve_display(
    explicit_selection: bool,
    accounts: &[AccountSeries],
    target_currency: &str,
    show_converted: bool,
) -> ResolvedDisplay {
    if !explicit_selection || accounts.is_empty() {
        return ResolvedDisplay {
            mode: DisplayMode::AllConverted,
            convert: true,
            currency: Some(target_currency.to_string()),
        };
    }

    if accounts.len() == 1 {
        let native = accounts[0].currency.clone();
        return converted_or(
            DisplayMode::SingleNative,
            native,
            target_currency,
            show_converted,
        );
    }

    let currencies: BTreeSet<Option<String>> =
        accounts.iter().map(|a| a.currency.clone()).collect();
    if currencies.len() == 1 {
        // One shared tag, which may be "no tag at all": still native, since
        // nothing would be gained (or possible) by converting.
        let shared = currencies.into_iter().next().unwrap();
        return converted_or(
            DisplayMode::MultiSameCurrencyNative,
            shared,
            target_currency,
            show_converted,
        );
    }

    ResolvedDisplay {
        mode: DisplayMode::MultiMixedConverted,
        convert: true,
        currency: Some(target_currency.to_string()),
    }
}

fn converted_or(
    mode: DisplayMode,
    native: Option<String>,
    target_currency: &str,
    show_converted: bool,
) -> ResolvedDisplay {
    if show_converted {
        ResolvedDisplay {
            mode,
            convert: true,
            currency: Some(target_currency.to_string()),
        }
    } else {
        ResolvedDisplay {
            mode,
            convert: false,
            currency: native,
        }
    }
}
