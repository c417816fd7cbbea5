//! Storage of trips, bills and receipt photos.

use chrono::{DateTime, Utc};

use crate::{
    error::DatabaseError,
    types::{Bill, Currency, ReceiptPhoto, Trip},
};

type DatabaseResult<T> = Result<T, DatabaseError>;

pub mod sqlite;

/// This trait abstracts over the type of database.
///
/// Handlers receive it explicitly, so the implementation could save the data
/// in any suitable database or even in memory. Trips and bills are metadata;
/// receipt photos are only referenced by their URI and kept apart, since the
/// files can be large.
pub trait Database {
    /// Create an empty trip and return its ID.
    fn create_trip(
        &mut self,
        name: &str,
        base_currency: &Currency,
        target_currency: &Currency,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<String>;

    /// Get all trips, most recent first, with their current travelers.
    fn get_trips(&self) -> DatabaseResult<Vec<Trip>>;

    /// Get the trip with the given *trip_id*, if it exists.
    fn get_trip(&self, trip_id: &str) -> DatabaseResult<Option<Trip>>;

    /// Update the card and cash rates of a trip.
    ///
    /// Rates that are `None` are left unchanged. Bills already saved keep the
    /// base-currency values computed when they were created.
    fn update_rates(
        &mut self,
        trip_id: &str,
        card_exchange_rate: Option<f64>,
        cash_exchange_rate: Option<f64>,
    ) -> DatabaseResult<()>;

    /// Add travelers to the given trip.
    fn add_travelers<T: AsRef<str>>(&mut self, trip_id: &str, names: &[T]) -> DatabaseResult<()>;

    /// Remove travelers from the given trip.
    ///
    /// If some travelers do not exist, ignore them. Bills that reference removed
    /// travelers are left untouched.
    fn remove_travelers<T: AsRef<str>>(&mut self, trip_id: &str, names: &[T])
        -> DatabaseResult<()>;

    /// Save a bill with its splits and return the new bill ID.
    ///
    /// The `id` of the given bill is ignored.
    fn save_bill(&mut self, bill: &Bill) -> DatabaseResult<String>;

    /// Get the bills of a trip ordered by creation time, with their splits and
    /// receipt photos.
    fn get_bills(&self, trip_id: &str) -> DatabaseResult<Vec<Bill>>;

    /// Delete the bill with the given *bill_id*.
    ///
    /// Return false if no such bill exists in the trip.
    fn delete_bill(&mut self, trip_id: &str, bill_id: &str) -> DatabaseResult<bool>;

    /// Attach a receipt photo to a bill and return the photo ID.
    fn add_receipt_photo(&mut self, bill_id: &str, photo: &ReceiptPhoto) -> DatabaseResult<String>;

    /// Get the receipt photos of a bill.
    fn get_receipt_photos(&self, bill_id: &str) -> DatabaseResult<Vec<ReceiptPhoto>>;
}
