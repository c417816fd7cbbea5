//! The core of the settlement logic: who owes money to whom after a set of
//! bills.
//!
//! Every split of a bill that does not belong to its payer is a debt from the
//! split traveler to the payer. Debts are accumulated per directed pair and
//! never netted: if A owes B on one bill and B owes A on another, both
//! directions are reported.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone};
use log::debug;

use crate::{
    currency::to_base,
    error::RateError,
    rate::resolve_rate,
    types::{Bill, PaymentSummary, SettlementEdge, Trip},
};

/// Where the base-currency side of each debt comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SettlementBasis {
    /// Sum the `amount_myr` stored in each split, i.e. the rate at the time
    /// the bill was created.
    #[default]
    StoredSnapshot,
    /// Convert each split again with the rate the bill resolves to now.
    CurrentRates,
}

/// Compute the debts accumulated over `bills`.
///
/// The output follows the order in which each pair first appears (bills first,
/// then splits), so callers that want a display order must sort it. Pairs
/// whose total is not positive are dropped. A single run uses a single basis;
/// if any bill has no usable rate under `CurrentRates`, the whole run fails.
pub fn compute_settlements(
    trip: &Trip,
    bills: &[Bill],
    basis: SettlementBasis,
) -> Result<Vec<SettlementEdge>, RateError> {
    let mut edges: Vec<SettlementEdge> = vec![];
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for bill in bills {
        let rate = match basis {
            SettlementBasis::StoredSnapshot => None,
            SettlementBasis::CurrentRates => Some(resolve_rate(trip, bill)?),
        };

        for split in bill.splits.iter().filter(|s| s.traveler_id != bill.payer_id) {
            let amount_myr = match rate {
                Some(rate) => to_base(split.amount, rate)?,
                None => split.amount_myr,
            };

            let key = (split.traveler_id.clone(), bill.payer_id.clone());
            match index.get(&key) {
                Some(&i) => {
                    edges[i].amount += split.amount;
                    edges[i].amount_myr += amount_myr;
                }
                None => {
                    index.insert(key, edges.len());
                    edges.push(SettlementEdge::new(
                        &split.traveler_id,
                        &bill.payer_id,
                        split.amount,
                        amount_myr,
                    ));
                }
            }
        }
    }

    edges.retain(|e| e.amount > 0.0);

    debug!(
        "Computed {} settlement edges from {} bills of trip {}",
        edges.len(),
        bills.len(),
        trip.id
    );

    Ok(edges)
}

/// What each traveler owes the payer of a single bill, one entry per split
/// that does not belong to the payer.
pub fn payment_summaries(trip: &Trip, bill: &Bill) -> Vec<PaymentSummary> {
    let owes_to_name = trip.traveler_name(&bill.payer_id);

    bill.splits
        .iter()
        .filter(|s| s.traveler_id != bill.payer_id)
        .map(|s| PaymentSummary {
            traveler_id: s.traveler_id.clone(),
            traveler_name: trip.traveler_name(&s.traveler_id),
            total_owed: s.amount,
            total_owed_myr: s.amount_myr,
            owes_to: bill.payer_id.clone(),
            owes_to_name: owes_to_name.clone(),
        })
        .collect()
}

/// Bills created on the given calendar day in the time zone `tz`.
pub fn bills_on_day<Tz: TimeZone>(bills: &[Bill], day: NaiveDate, tz: &Tz) -> Vec<Bill> {
    bills
        .iter()
        .filter(|b| b.created_at.with_timezone(tz).date_naive() == day)
        .cloned()
        .collect()
}
