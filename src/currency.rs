//! Conversion between the base currency of a trip (the one travelers are
//! billed back home) and its target currency (the one spent at destination).
//!
//! A trip only ever knows one rate: how many target units one base unit buys.

use crate::{error::RateError, types::Currency};

const CATALOG: &[(&str, &str, &str)] = &[
    ("MYR", "Malaysian Ringgit", "RM"),
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
    ("JPY", "Japanese Yen", "¥"),
    ("THB", "Thai Baht", "฿"),
    ("SGD", "Singapore Dollar", "S$"),
    ("IDR", "Indonesian Rupiah", "Rp"),
    ("KRW", "South Korean Won", "₩"),
    ("AUD", "Australian Dollar", "A$"),
    ("CNY", "Chinese Yuan", "¥"),
    ("VND", "Vietnamese Dong", "₫"),
    ("PHP", "Philippine Peso", "₱"),
    ("TWD", "New Taiwan Dollar", "NT$"),
    ("HKD", "Hong Kong Dollar", "HK$"),
    ("INR", "Indian Rupee", "₹"),
];

#[derive(Clone, Copy, Debug)]
pub struct FormatOptions {
    pub show_symbol: bool,
    pub show_code: bool,
    pub decimals: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            show_symbol: true,
            show_code: false,
            decimals: 2,
        }
    }
}

/// Look up a currency in the catalog, ignoring case.
pub fn find_currency(code: &str) -> Option<Currency> {
    CATALOG
        .iter()
        .find(|(c, _, _)| c.eq_ignore_ascii_case(code.trim()))
        .map(|(code, name, symbol)| Currency::new(code, name, symbol))
}

pub fn check_rate(rate: f64) -> Result<f64, RateError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(RateError::InvalidRate(rate))
    }
}

/// Target currency to base currency.
pub fn to_base(amount: f64, rate: f64) -> Result<f64, RateError> {
    Ok(amount / check_rate(rate)?)
}

/// Base currency to target currency.
pub fn to_target(amount: f64, rate: f64) -> Result<f64, RateError> {
    Ok(amount * check_rate(rate)?)
}

/// Convert `amount` from one currency code to another.
///
/// When neither code is `base` the conversion goes through the base currency
/// with the same rate in both directions, since no cross rate is known.
pub fn convert(amount: f64, from: &str, to: &str, base: &str, rate: f64) -> Result<f64, RateError> {
    check_rate(rate)?;

    let from_base = from.eq_ignore_ascii_case(base);
    let to_base_currency = to.eq_ignore_ascii_case(base);

    if from.eq_ignore_ascii_case(to) {
        Ok(amount)
    } else if from_base {
        to_target(amount, rate)
    } else if to_base_currency {
        to_base(amount, rate)
    } else {
        to_target(to_base(amount, rate)?, rate)
    }
}

/// Round half away from zero.
pub fn round_to(amount: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (amount * factor).round() / factor
}

pub fn format_amount(amount: f64, currency: &Currency, options: FormatOptions) -> String {
    let decimals = options.decimals;
    let mut number = format!("{:.*}", decimals, round_to(amount, decimals));
    // Avoid printing "-0.00" for values that round to zero.
    if number.starts_with('-') && number[1..].chars().all(|c| c == '0' || c == '.') {
        number.remove(0);
    }

    match (options.show_symbol, options.show_code) {
        (true, true) => format!("{}{} {}", currency.symbol, number, currency.code),
        (true, false) => format!("{}{}", currency.symbol, number),
        (false, true) => format!("{} {}", number, currency.code),
        (false, false) => number,
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn test_convert_directions() -> anyhow::Result<()> {
        assert_abs_diff_eq!(convert(10.0, "MYR", "THB", "MYR", 7.5)?, 75.0);
        assert_abs_diff_eq!(convert(75.0, "THB", "MYR", "MYR", 7.5)?, 10.0);
        assert_abs_diff_eq!(convert(75.0, "thb", "THB", "MYR", 7.5)?, 75.0);
        // No cross rate: going through the base with the same rate.
        assert_abs_diff_eq!(convert(75.0, "THB", "USD", "MYR", 7.5)?, 75.0);
        Ok(())
    }

    #[test]
    fn test_invalid_rate() {
        assert_eq!(to_base(10.0, 0.0), Err(RateError::InvalidRate(0.0)));
        assert_eq!(to_target(10.0, -2.0), Err(RateError::InvalidRate(-2.0)));
        assert!(convert(10.0, "MYR", "MYR", "MYR", f64::NAN).is_err());
        assert!(convert(10.0, "MYR", "THB", "MYR", f64::INFINITY).is_err());
    }

    #[test]
    fn test_round_trip() -> anyhow::Result<()> {
        for amount in [0.01, 1.0, 33.33, 1234.56, 987654.321] {
            for rate in [0.0012, 0.21, 1.0, 4.47, 15800.0] {
                let base = convert(amount, "IDR", "MYR", "MYR", rate)?;
                let back = convert(base, "MYR", "IDR", "MYR", rate)?;
                assert_relative_eq!(back, amount, max_relative = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_format_amount() {
        let myr = find_currency("myr").expect("test");
        assert_eq!(format_amount(12.346, &myr, FormatOptions::default()), "RM12.35");
        assert_eq!(format_amount(-2.5, &myr, FormatOptions::default()), "RM-2.50");
        assert_eq!(format_amount(-0.001, &myr, FormatOptions::default()), "RM0.00");

        let options = FormatOptions {
            show_symbol: false,
            show_code: true,
            decimals: 0,
        };
        assert_eq!(format_amount(2.5, &myr, options), "3 MYR");

        let options = FormatOptions {
            show_symbol: true,
            show_code: true,
            decimals: 1,
        };
        assert_eq!(format_amount(7.25, &myr, options), "RM7.3 MYR");
    }

    #[test]
    fn test_find_currency() {
        assert_eq!(find_currency(" thb ").expect("test").symbol, "฿");
        assert!(find_currency("XYZ").is_none());
    }
}
