//! Propose how a bill is shared between travelers.

use crate::{
    currency::{round_to, to_base},
    error::RateError,
    types::{Amount, BillSplit, TravelerId},
};

/// Give every traveler the same share, rounded to the cent.
///
/// The rounding remainder is NOT distributed: three travelers sharing 10.00
/// get 3.33 each, and the shares add up to 9.99. The result must go through
/// `validator::validate_split` before being saved, which reports a mismatch
/// larger than one cent instead of hiding it.
///
/// The order of the output follows `traveler_ids`. An empty list gives an
/// empty allocation.
pub fn allocate_equally<T: AsRef<str>>(total: Amount, traveler_ids: &[T]) -> Vec<(TravelerId, Amount)> {
    if traveler_ids.is_empty() {
        return vec![];
    }

    let share = round_to(total / traveler_ids.len() as f64, 2);
    traveler_ids
        .iter()
        .map(|id| (id.as_ref().to_string(), share))
        .collect()
}

/// Pair each share with its value in the base currency, using the rate of the bill.
pub fn build_splits(shares: &[(TravelerId, Amount)], rate: f64) -> Result<Vec<BillSplit>, RateError> {
    shares
        .iter()
        .map(|(id, amount)| Ok(BillSplit::new(id, *amount, to_base(*amount, rate)?)))
        .collect()
}
