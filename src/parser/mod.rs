//! Parse the user input.
//!
//! Everything typed by the user is turned into numbers and names here, so
//! the rest of the crate only deals with parsed values.

mod bill;

pub use bill::parse_bill;

use chrono::NaiveDate;

use crate::{
    currency::find_currency,
    error::InputError,
    types::{Currency, PaymentMethod},
};

/// Rates given to `/rates`, as `card=<rate>` and `cash=<rate>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RatesUpdate {
    pub card: Option<f64>,
    pub cash: Option<f64>,
}

pub fn parse_travelers(s: &str) -> Result<Vec<String>, InputError> {
    let parts: Vec<_> = s.split_whitespace().map(|x| x.to_string()).collect();
    if parts.is_empty() {
        Err(InputError::travelers_not_provided())
    } else {
        Ok(parts)
    }
}

/// Parse `name BASE TARGET`. The name can contain spaces.
pub fn parse_trip(s: &str) -> Result<(String, Currency, Currency), InputError> {
    let mut parts: Vec<_> = s.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(InputError::InvalidTripSyntax);
    }

    let target = parts.pop().expect("Just checked that there are at least three elements");
    let base = parts.pop().expect("Just checked that there are at least three elements");
    let base = find_currency(base).ok_or_else(|| InputError::unknown_currency(base.to_string()))?;
    let target =
        find_currency(target).ok_or_else(|| InputError::unknown_currency(target.to_string()))?;

    Ok((parts.join(" "), base, target))
}

/// Parse a whole string as a number, accepting `,` as decimal separator.
pub fn parse_number(s: &str) -> Result<f64, InputError> {
    let s = s.trim();
    match bill::parse_amount(s) {
        Ok(("", amount)) if amount.is_finite() => Ok(amount),
        _ => Err(InputError::invalid_amount(s.to_string())),
    }
}

pub fn parse_rates(s: &str) -> Result<RatesUpdate, InputError> {
    let mut update = RatesUpdate::default();

    for part in s.split_whitespace() {
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| InputError::invalid_amount(part.to_string()))?;
        let value = parse_number(value)?;
        match key.to_lowercase().as_str() {
            "card" => update.card = Some(value),
            "cash" => update.cash = Some(value),
            _ => return Err(InputError::invalid_amount(part.to_string())),
        }
    }

    if update == RatesUpdate::default() {
        Err(InputError::invalid_amount(s.trim().to_string()))
    } else {
        Ok(update)
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| InputError::invalid_date(s.trim().to_string()))
}

/// Parse `amount CODE [cash|card]`, e.g. `150 THB card`.
pub fn parse_conversion(s: &str) -> Result<(f64, Currency, Option<PaymentMethod>), InputError> {
    let parts: Vec<_> = s.split_whitespace().collect();
    let (amount, code, method) = match parts.as_slice() {
        [amount, code] => (amount, code, None),
        [amount, code, method] => (amount, code, Some(method)),
        _ => return Err(InputError::invalid_amount(s.trim().to_string())),
    };

    let amount = parse_number(amount)?;
    let currency =
        find_currency(code).ok_or_else(|| InputError::unknown_currency(code.to_string()))?;
    let method = method
        .map(|m| m.parse::<PaymentMethod>())
        .transpose()
        .map_err(|_| InputError::invalid_amount(s.trim().to_string()))?;
    Ok((amount, currency, method))
}
