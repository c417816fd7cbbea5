//! Pick the exchange rate that applies to a bill.

use log::debug;

use crate::{
    error::RateError,
    types::{Bill, PaymentMethod, Trip},
};

/// Effective rate of an existing bill.
pub fn resolve_rate(trip: &Trip, bill: &Bill) -> Result<f64, RateError> {
    resolve_rate_for(trip, bill.payment_method, bill.custom_exchange_rate).map_err(|e| match e {
        RateError::NoRateAvailable(_) => RateError::NoRateAvailable(format!("bill `{}`", bill.id)),
        e => e,
    })
}

/// Resolution order, the first usable rate wins:
/// - the custom rate given to the bill
/// - the trip card rate, for card payments
/// - the trip cash rate, for cash payments or when the method is unknown
/// - the single trip rate used before card and cash rates existed
///
/// A rate is usable when it is finite and positive. Trips saved by older
/// versions may only have the last one, so the fallback must stay.
pub fn resolve_rate_for(
    trip: &Trip,
    payment_method: Option<PaymentMethod>,
    custom_rate: Option<f64>,
) -> Result<f64, RateError> {
    let method_rate = match payment_method {
        Some(PaymentMethod::Card) => trip.card_exchange_rate,
        Some(PaymentMethod::Cash) | None => trip.cash_exchange_rate,
    };

    let rate = [custom_rate, method_rate, trip.exchange_rate]
        .into_iter()
        .flatten()
        .find(|&r| is_usable(r));

    match rate {
        Some(rate) => {
            debug!(
                "Resolved rate {rate} for trip {} (method: {:?}, custom: {:?})",
                trip.id, payment_method, custom_rate
            );
            Ok(rate)
        }
        None => Err(RateError::NoRateAvailable(format!("trip `{}`", trip.name))),
    }
}

fn is_usable(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::currency::find_currency;

    use super::*;

    fn make_trip(legacy: Option<f64>, card: Option<f64>, cash: Option<f64>) -> Trip {
        let mut trip = Trip::new(
            "1",
            "bangkok",
            find_currency("MYR").expect("test"),
            find_currency("THB").expect("test"),
        );
        trip.exchange_rate = legacy;
        trip.card_exchange_rate = card;
        trip.cash_exchange_rate = cash;
        trip
    }

    fn make_bill(method: Option<PaymentMethod>, custom: Option<f64>) -> Bill {
        Bill {
            id: "10".to_string(),
            trip_id: "1".to_string(),
            description: "dinner".to_string(),
            category: "food".to_string(),
            total_amount: 100.0,
            additional_charges: None,
            payer_id: "a".to_string(),
            payment_method: method,
            custom_exchange_rate: custom,
            splits: vec![],
            created_at: Utc::now(),
            receipt_photos: vec![],
        }
    }

    #[test]
    fn test_precedence() {
        let trip = make_trip(Some(1.0), Some(4.0), Some(3.0));

        let bill = make_bill(Some(PaymentMethod::Card), Some(5.0));
        assert_eq!(resolve_rate(&trip, &bill), Ok(5.0));

        let bill = make_bill(Some(PaymentMethod::Card), None);
        assert_eq!(resolve_rate(&trip, &bill), Ok(4.0));

        let bill = make_bill(Some(PaymentMethod::Cash), None);
        assert_eq!(resolve_rate(&trip, &bill), Ok(3.0));

        let bill = make_bill(None, None);
        assert_eq!(resolve_rate(&trip, &bill), Ok(3.0));
    }

    #[test]
    fn test_zero_rates_are_skipped() {
        let trip = make_trip(Some(1.0), Some(0.0), Some(3.0));
        let bill = make_bill(Some(PaymentMethod::Card), Some(0.0));
        assert_eq!(resolve_rate(&trip, &bill), Ok(1.0));

        let bill = make_bill(Some(PaymentMethod::Card), Some(f64::NAN));
        assert_eq!(resolve_rate(&trip, &bill), Ok(1.0));
    }

    #[test]
    fn test_legacy_trip() {
        let trip = make_trip(Some(4.5), None, Some(0.0));
        let bill = make_bill(None, None);
        assert_eq!(resolve_rate(&trip, &bill), Ok(4.5));
    }

    #[test]
    fn test_no_rate_available() {
        let trip = make_trip(None, Some(0.0), None);
        let bill = make_bill(Some(PaymentMethod::Card), None);
        assert_eq!(
            resolve_rate(&trip, &bill),
            Err(RateError::NoRateAvailable("bill `10`".to_string()))
        );
        assert!(resolve_rate_for(&trip, None, Some(-3.0)).is_err());
    }
}
