//! Detect bills that point to travelers removed from the trip.
//!
//! Travelers can be removed after bills were created for them, so these
//! references are tolerated everywhere (names fall back to a placeholder).
//! The warnings only make the stale data visible.

use log::warn;

use crate::{
    error::IntegrityWarning,
    types::{Bill, Trip},
};

pub fn check_bill_references(trip: &Trip, bill: &Bill) -> Vec<IntegrityWarning> {
    let mut warnings = vec![];

    if trip.traveler(&bill.payer_id).is_none() {
        warnings.push(IntegrityWarning::UnknownPayer {
            bill_id: bill.id.clone(),
            traveler_id: bill.payer_id.clone(),
        });
    }

    for split in &bill.splits {
        if trip.traveler(&split.traveler_id).is_none() {
            warnings.push(IntegrityWarning::UnknownSplitTraveler {
                bill_id: bill.id.clone(),
                traveler_id: split.traveler_id.clone(),
            });
        }
    }

    for warning in &warnings {
        warn!("Trip {}: {}", trip.id, warning);
    }

    warnings
}
