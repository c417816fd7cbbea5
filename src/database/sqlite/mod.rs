//! The implementation of a data storage using Sqlite.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task::block_in_place;

use crate::{
    currency::find_currency,
    error::DatabaseError,
    types::{Bill, BillSplit, Currency, ReceiptPhoto, Traveler, Trip},
};

use super::{Database, DatabaseResult};

mod schema;

pub struct SqliteDatabase {
    connection: Connection,
}

impl SqliteDatabase {
    pub fn new<P: AsRef<Path>>(path: P) -> DatabaseResult<SqliteDatabase> {
        block_in_place(|| {
            let connection = Connection::open(path)
                .map_err(|e| DatabaseError::new("cannot open database", e.into()))?;
            schema::create_all_tables(&connection)
                .map_err(|e| DatabaseError::new("cannot create tables", e))?;
            Ok(SqliteDatabase { connection })
        })
    }
}

impl Database for SqliteDatabase {
    fn create_trip(
        &mut self,
        name: &str,
        base_currency: &Currency,
        target_currency: &Currency,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<String> {
        let fn_impl = || -> anyhow::Result<String> {
            let mut stmt = self.connection.prepare_cached(
                "INSERT INTO trip (name, base_currency, target_currency, created_at)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
            )?;
            let trip_id: i64 = stmt.query_row(
                params![name, &base_currency.code, &target_currency.code, &created_at],
                |row| row.get(0),
            )?;

            debug!("trip_id is {trip_id}");
            Ok(trip_id.to_string())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot create trip", e)))
    }

    fn get_trips(&self) -> DatabaseResult<Vec<Trip>> {
        let fn_impl = || -> anyhow::Result<Vec<Trip>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT id, name, base_currency, target_currency, exchange_rate,
                        card_exchange_rate, cash_exchange_rate, created_at
                 FROM trip ORDER BY created_at DESC, id DESC",
            )?;
            let trip_iter = stmt.query_map([], read_trip_row)?;
            let mut trips = trip_iter.collect::<Result<Vec<_>, _>>()?;

            let mut travelers = self.get_all_travelers()?;
            for trip in &mut trips {
                trip.travelers = travelers.remove(&trip.id).unwrap_or_default();
            }
            Ok(trips)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get trips", e)))
    }

    fn get_trip(&self, trip_id: &str) -> DatabaseResult<Option<Trip>> {
        let fn_impl = || -> anyhow::Result<Option<Trip>> {
            let trip = self
                .connection
                .query_row(
                    "SELECT id, name, base_currency, target_currency, exchange_rate,
                            card_exchange_rate, cash_exchange_rate, created_at
                     FROM trip WHERE id = ?1",
                    params![trip_id],
                    read_trip_row,
                )
                .optional()?;

            match trip {
                Some(mut trip) => {
                    let mut stmt = self.connection.prepare_cached(
                        "SELECT id, name FROM traveler
                         WHERE trip_id = ?1 AND deleted_at IS NULL ORDER BY id",
                    )?;
                    let traveler_iter = stmt.query_map(params![trip_id], |row| {
                        let id: i64 = row.get(0)?;
                        Ok(Traveler {
                            id: id.to_string(),
                            name: row.get(1)?,
                        })
                    })?;
                    trip.travelers = traveler_iter.collect::<Result<_, _>>()?;
                    Ok(Some(trip))
                }
                None => Ok(None),
            }
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get trip", e)))
    }

    fn update_rates(
        &mut self,
        trip_id: &str,
        card_exchange_rate: Option<f64>,
        cash_exchange_rate: Option<f64>,
    ) -> DatabaseResult<()> {
        debug!(
            "Updating rates of trip {trip_id}. Card: {:?}. Cash: {:?}",
            card_exchange_rate, cash_exchange_rate
        );
        let fn_impl = || -> anyhow::Result<()> {
            let num_updated_rows = self.connection.execute(
                "UPDATE trip SET
                   card_exchange_rate = COALESCE(?2, card_exchange_rate),
                   cash_exchange_rate = COALESCE(?3, cash_exchange_rate)
                 WHERE id = ?1",
                params![trip_id, &card_exchange_rate, &cash_exchange_rate],
            )?;
            if num_updated_rows == 0 {
                return Err(DatabaseError::concurrency("the trip was not found").into());
            }
            Ok(())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot update rates", e)))
    }

    fn add_travelers<T: AsRef<str>>(&mut self, trip_id: &str, names: &[T]) -> DatabaseResult<()> {
        let mut fn_impl = || -> anyhow::Result<()> {
            let tx = self.connection.transaction()?;

            {
                let mut insert_traveler_stmt =
                    tx.prepare_cached("INSERT INTO traveler (trip_id, name) VALUES (?1, ?2)")?;
                // It's unclear how to use an IN clause, so we use a loop
                // https://github.com/rusqlite/rusqlite/issues/345
                for name in names {
                    insert_traveler_stmt.execute(params![trip_id, name.as_ref()])?;
                }
            }

            tx.commit()?;

            Ok(())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot add travelers", e)))
    }

    fn remove_travelers<T: AsRef<str>>(
        &mut self,
        trip_id: &str,
        names: &[T],
    ) -> DatabaseResult<()> {
        let mut fn_impl = || -> anyhow::Result<()> {
            let tx = self.connection.transaction()?;

            {
                let mut delete_traveler_stmt = tx.prepare_cached(
                    "UPDATE traveler SET deleted_at = CURRENT_TIMESTAMP
                     WHERE trip_id = ?1 AND name = ?2 COLLATE NOCASE AND deleted_at IS NULL",
                )?;

                for name in names {
                    delete_traveler_stmt.execute(params![trip_id, name.as_ref()])?;
                }
            }

            tx.commit()?;

            Ok(())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot remove travelers", e)))
    }

    fn save_bill(&mut self, bill: &Bill) -> DatabaseResult<String> {
        let mut fn_impl = || -> anyhow::Result<String> {
            let tx = self.connection.transaction()?;

            let bill_id: i64 = {
                let mut insert_bill_stmt = tx.prepare_cached(
                    "INSERT INTO bill (trip_id, description, category, total_amount,
                                       additional_charges, payer_id, payment_method,
                                       custom_exchange_rate, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING id",
                )?;

                insert_bill_stmt.query_row(
                    params![
                        &bill.trip_id,
                        &bill.description,
                        &bill.category,
                        &bill.total_amount,
                        &bill.additional_charges,
                        &bill.payer_id,
                        &bill.payment_method.map(|m| m.as_str()),
                        &bill.custom_exchange_rate,
                        &bill.created_at,
                    ],
                    |row| row.get(0),
                )?
            };

            debug!("bill_id is {bill_id}");

            {
                let mut insert_split_stmt = tx.prepare_cached(
                    "INSERT INTO bill_split (bill_id, traveler_id, amount, amount_myr)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;

                for split in &bill.splits {
                    insert_split_stmt.execute(params![
                        &bill_id,
                        &split.traveler_id,
                        &split.amount,
                        &split.amount_myr,
                    ])?;
                }
            }

            tx.commit()?;

            Ok(bill_id.to_string())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot save bill", e)))
    }

    fn get_bills(&self, trip_id: &str) -> DatabaseResult<Vec<Bill>> {
        let fn_impl = || -> anyhow::Result<Vec<Bill>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT b.id, b.trip_id, b.description, b.category, b.total_amount,
                        b.additional_charges, b.payer_id, b.payment_method,
                        b.custom_exchange_rate, b.created_at,
                        s.traveler_id, s.amount, s.amount_myr
                 FROM bill b
                 LEFT JOIN bill_split s ON b.id = s.bill_id
                 WHERE b.trip_id = :trip_id AND b.deleted_at IS NULL
                 ORDER BY b.created_at, b.id, s.rowid",
            )?;

            let bill_iter = stmt.query_map(&[(":trip_id", &trip_id)], |row| {
                let id: i64 = row.get(0)?;
                let trip_id: i64 = row.get(1)?;
                let payment_method: Option<String> = row.get(7)?;
                Ok(BillQuery {
                    id: id.to_string(),
                    trip_id: trip_id.to_string(),
                    description: row.get(2)?,
                    category: row.get(3)?,
                    total_amount: row.get(4)?,
                    additional_charges: row.get(5)?,
                    payer_id: row.get(6)?,
                    payment_method,
                    custom_exchange_rate: row.get(8)?,
                    created_at: row.get(9)?,
                    s_traveler_id: row.get(10)?,
                    s_amount: row.get(11)?,
                    s_amount_myr: row.get(12)?,
                })
            })?;

            let rows: Result<Vec<_>, _> = bill_iter.collect();
            let mut bills = parse_bills_query(rows?);

            let mut photos = self.get_trip_receipt_photos(trip_id)?;
            for bill in &mut bills {
                bill.receipt_photos = photos.remove(&bill.id).unwrap_or_default();
            }
            Ok(bills)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get bills", e)))
    }

    fn delete_bill(&mut self, trip_id: &str, bill_id: &str) -> DatabaseResult<bool> {
        debug!("Deleting bill. Trip ID: {trip_id}. Bill ID: {bill_id}");
        let fn_impl = || -> anyhow::Result<bool> {
            let num_updated_rows = self.connection.execute(
                "UPDATE bill SET deleted_at = CURRENT_TIMESTAMP
                 WHERE trip_id = ?1 AND id = ?2 AND deleted_at IS NULL",
                params![trip_id, bill_id],
            )?;

            Ok(num_updated_rows > 0)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot delete bill", e)))
    }

    fn add_receipt_photo(&mut self, bill_id: &str, photo: &ReceiptPhoto) -> DatabaseResult<String> {
        let fn_impl = || -> anyhow::Result<String> {
            let mut stmt = self.connection.prepare_cached(
                "INSERT INTO receipt_photo (bill_id, uri, name, size, mime_type, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
            )?;
            let photo_id: i64 = stmt.query_row(
                params![
                    bill_id,
                    &photo.uri,
                    &photo.name,
                    &(photo.size as i64),
                    &photo.mime_type,
                    &photo.uploaded_at,
                ],
                |row| row.get(0),
            )?;
            Ok(photo_id.to_string())
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot add receipt photo", e)))
    }

    fn get_receipt_photos(&self, bill_id: &str) -> DatabaseResult<Vec<ReceiptPhoto>> {
        let fn_impl = || -> anyhow::Result<Vec<ReceiptPhoto>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT id, bill_id, uri, name, size, mime_type, uploaded_at
                 FROM receipt_photo WHERE bill_id = ?1 ORDER BY id",
            )?;
            let photo_iter = stmt.query_map(params![bill_id], read_photo_row)?;
            let photos = photo_iter
                .map(|r| r.map(|(_, photo)| photo))
                .collect::<Result<_, _>>()?;
            Ok(photos)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get receipt photos", e)))
    }
}

impl SqliteDatabase {
    /// Current travelers of every trip, keyed by trip ID.
    fn get_all_travelers(&self) -> anyhow::Result<HashMap<String, Vec<Traveler>>> {
        let mut stmt = self.connection.prepare_cached(
            "SELECT id, trip_id, name FROM traveler WHERE deleted_at IS NULL ORDER BY id",
        )?;
        let traveler_iter = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let trip_id: i64 = row.get(1)?;
            Ok((trip_id.to_string(), Traveler::new(&id.to_string(), &row.get::<_, String>(2)?)))
        })?;

        let mut result: HashMap<String, Vec<Traveler>> = HashMap::new();
        for row in traveler_iter {
            let (trip_id, traveler) = row?;
            result.entry(trip_id).or_default().push(traveler);
        }
        Ok(result)
    }

    /// Receipt photos of every bill of a trip, keyed by bill ID.
    fn get_trip_receipt_photos(
        &self,
        trip_id: &str,
    ) -> anyhow::Result<HashMap<String, Vec<ReceiptPhoto>>> {
        let mut stmt = self.connection.prepare_cached(
            "SELECT p.id, p.bill_id, p.uri, p.name, p.size, p.mime_type, p.uploaded_at
             FROM receipt_photo p INNER JOIN bill b ON p.bill_id = b.id
             WHERE b.trip_id = ?1 ORDER BY p.id",
        )?;
        let photo_iter = stmt.query_map(params![trip_id], read_photo_row)?;

        let mut result: HashMap<String, Vec<ReceiptPhoto>> = HashMap::new();
        for row in photo_iter {
            let (bill_id, photo) = row?;
            result.entry(bill_id).or_default().push(photo);
        }
        Ok(result)
    }
}

fn read_trip_row(row: &rusqlite::Row) -> rusqlite::Result<Trip> {
    let id: i64 = row.get(0)?;
    let base_currency: String = row.get(2)?;
    let target_currency: String = row.get(3)?;

    let mut trip = Trip::new(
        &id.to_string(),
        &row.get::<_, String>(1)?,
        currency_from_code(&base_currency),
        currency_from_code(&target_currency),
    );
    trip.exchange_rate = row.get(4)?;
    trip.card_exchange_rate = row.get(5)?;
    trip.cash_exchange_rate = row.get(6)?;
    trip.created_at = row.get(7)?;
    Ok(trip)
}

fn read_photo_row(row: &rusqlite::Row) -> rusqlite::Result<(String, ReceiptPhoto)> {
    let id: i64 = row.get(0)?;
    let bill_id: i64 = row.get(1)?;
    Ok((
        bill_id.to_string(),
        ReceiptPhoto {
            id: id.to_string(),
            uri: row.get(2)?,
            name: row.get(3)?,
            size: row.get::<_, i64>(4)? as u64,
            mime_type: row.get(5)?,
            uploaded_at: row.get(6)?,
        },
    ))
}

/// Codes are stored as they were chosen from the catalog; an unknown code
/// can only come from a newer catalog, so it is shown as it is.
fn currency_from_code(code: &str) -> Currency {
    find_currency(code).unwrap_or_else(|| {
        warn!("Unknown currency code in database: {code}");
        Currency::new(code, code, code)
    })
}

/// Group the rows of the bill query (one per split) into bills, keeping
/// the order of the rows.
fn parse_bills_query(rows: Vec<BillQuery>) -> Vec<Bill> {
    let mut bills: Vec<Bill> = vec![];

    for row in rows {
        let is_new_bill = bills.last().map(|b| b.id != row.id).unwrap_or(true);
        if is_new_bill {
            bills.push(Bill {
                id: row.id.clone(),
                trip_id: row.trip_id.clone(),
                description: row.description.clone(),
                category: row.category.clone(),
                total_amount: row.total_amount,
                additional_charges: row.additional_charges,
                payer_id: row.payer_id.clone(),
                payment_method: row.payment_method.as_deref().and_then(|m| m.parse().ok()),
                custom_exchange_rate: row.custom_exchange_rate,
                splits: vec![],
                created_at: row.created_at,
                receipt_photos: vec![],
            });
        }

        if let (Some(traveler_id), Some(amount), Some(amount_myr)) =
            (row.s_traveler_id, row.s_amount, row.s_amount_myr)
        {
            let bill = bills.last_mut().expect("a bill was just pushed");
            bill.splits.push(BillSplit {
                traveler_id,
                amount,
                amount_myr,
            });
        }
    }

    bills
}

struct BillQuery {
    id: String,
    trip_id: String,
    description: String,
    category: String,
    total_amount: f64,
    additional_charges: Option<f64>,
    payer_id: String,
    payment_method: Option<String>,
    custom_exchange_rate: Option<f64>,
    created_at: DateTime<Utc>,
    s_traveler_id: Option<String>,
    s_amount: Option<f64>,
    s_amount_myr: Option<f64>,
}

fn map_error<T: AsRef<str>>(message: T, e: anyhow::Error) -> DatabaseError {
    match e.downcast::<DatabaseError>() {
        Ok(e) => e,
        Err(e) => DatabaseError::new(message, e),
    }
}
