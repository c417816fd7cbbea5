//! Core implementation of the shell handlers.
//!
//! This is split from `shell` so that the handlers, which hold all the logic
//! between the user input and the database, can be tested without a terminal.

use chrono::{DateTime, FixedOffset, Utc};
use log::{debug, info};
use std::{cmp::Ordering, path::Path, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    allocator::{allocate_equally, build_splits},
    currency::{check_rate, convert, format_amount, FormatOptions},
    dashboard::trip_overview,
    database::Database,
    error::InputError,
    formatter::{
        format_bill_summary, format_list_bills, format_list_trips, format_overview, format_rates,
        format_receipts, format_settlements, format_simple_list,
    },
    parser::{
        parse_bill, parse_conversion, parse_date, parse_rates, parse_travelers, parse_trip,
    },
    rate::resolve_rate_for,
    settlement::{bills_on_day, compute_settlements, payment_summaries, SettlementBasis},
    types::{Amount, Bill, ParsedBill, ReceiptPhoto, TravelerId, Trip},
    validator::{
        check_bill_references, duplicate_traveler_names, validate_split,
        validate_traveler_names, validate_travelers_exist,
    },
};

const DEFAULT_CATEGORY: &str = "other";

pub async fn handle_new_trip<D: Database>(
    database: &Arc<Mutex<D>>,
    payload: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Trip> {
    let (name, base, target) = parse_trip(payload)?;
    let trip_id = database
        .lock()
        .await
        .create_trip(&name, &base, &target, now)?;
    info!("Created trip {trip_id} ({name}, {} → {})", base.code, target.code);
    load_trip(&trip_id, database).await
}

pub async fn handle_list_trips<D: Database>(database: &Arc<Mutex<D>>) -> anyhow::Result<String> {
    let trips = database.lock().await.get_trips()?;
    Ok(format_list_trips(&trips))
}

/// Get a trip, failing if it does not exist.
pub async fn load_trip<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<Trip> {
    let trip_id = trip_id.trim();
    let trip = database.lock().await.get_trip(trip_id)?;
    Ok(trip.ok_or_else(|| InputError::unknown_trip(trip_id.to_string()))?)
}

pub async fn handle_add_travelers<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
) -> anyhow::Result<()> {
    let travelers = parse_travelers(payload)?;
    validate_traveler_names(&travelers)?;

    let trip = load_trip(trip_id, database).await?;
    let duplicates = duplicate_traveler_names(&travelers, &trip);
    if !duplicates.is_empty() {
        return Err(InputError::duplicate_travelers(duplicates).into());
    }

    debug!("Adding travelers to trip {}: {:#?}", trip.id, travelers);
    database.lock().await.add_travelers(&trip.id, &travelers)?;
    Ok(())
}

/// Bills keep the removed travelers: their names are then shown as unknown.
pub async fn handle_remove_travelers<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
) -> anyhow::Result<()> {
    let travelers = parse_travelers(payload)?;
    validate_traveler_names(&travelers)?;

    let trip = load_trip(trip_id, database).await?;
    validate_travelers_exist(&travelers, &trip)?;

    debug!("Removing travelers from trip {}: {:#?}", trip.id, travelers);
    database.lock().await.remove_travelers(&trip.id, &travelers)?;
    Ok(())
}

pub async fn handle_list_travelers<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let mut names: Vec<_> = trip.travelers.iter().map(|t| t.name.clone()).collect();
    names.sort();
    Ok(format_simple_list(&names))
}

/// Set the card and cash rates. Without payload, show the current ones.
pub async fn handle_rates<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    if payload.trim().is_empty() {
        return Ok(format_rates(&trip));
    }

    let update = parse_rates(payload)?;
    let card = update.card.map(check_rate).transpose()?;
    let cash = update.cash.map(check_rate).transpose()?;

    database.lock().await.update_rates(&trip.id, card, cash)?;
    info!("Updated rates of trip {}: card {card:?}, cash {cash:?}", trip.id);

    let trip = load_trip(&trip.id, database).await?;
    Ok(format_rates(&trip))
}

/// Parse, split and save a bill, returning its ID.
///
/// The total is the amount plus the additional charges. Travelers without
/// a custom amount share equally what the custom amounts leave; without any
/// traveler listed, the whole trip shares the bill. The split must add up to
/// the total, rounding included, before anything is saved.
pub async fn handle_bill<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let (rest, parsed) = parse_bill(payload).map_err(InputError::invalid_bill_syntax)?;
    if !rest.is_empty() {
        return Err(InputError::InvalidBillSyntax(rest.to_string()).into());
    }

    let trip = load_trip(trip_id, database).await?;
    if trip.travelers.is_empty() {
        return Err(InputError::NoTravelers.into());
    }

    let bill = make_bill(&trip, parsed, now)?;
    let bill_id = database.lock().await.save_bill(&bill)?;
    info!(
        "Saved bill {bill_id} of trip {}: {} split between {} travelers",
        trip.id,
        bill.total_amount,
        bill.splits.len()
    );
    Ok(bill_id)
}

fn make_bill(trip: &Trip, parsed: ParsedBill, now: DateTime<Utc>) -> anyhow::Result<Bill> {
    validate_travelers_exist(&[&parsed.payer], trip)?;
    let names: Vec<_> = parsed.shares.iter().map(|s| &s.name).collect();
    validate_travelers_exist(&names, trip)?;

    if let Some(rate) = parsed.custom_exchange_rate {
        check_rate(rate)?;
    }
    let rate = resolve_rate_for(trip, parsed.payment_method, parsed.custom_exchange_rate)?;

    for amount in std::iter::once(parsed.amount).chain(parsed.additional_charges) {
        if !amount.is_finite() || amount < 0.0 {
            return Err(InputError::invalid_amount(amount.to_string()).into());
        }
    }
    let total = parsed.amount + parsed.additional_charges.unwrap_or(0.0);
    let shares = resolve_shares(trip, &parsed, total);

    let validation = validate_split(total, &shares);
    if !validation.is_valid {
        debug!("Rejected split of {total}, off by {}", validation.difference);
        return Err(InputError::unbalanced_split(validation.errors).into());
    }
    let splits = build_splits(&shares, rate)?;

    let payer = trip
        .traveler_by_name(&parsed.payer)
        .ok_or_else(|| InputError::unknown_traveler(parsed.payer.clone()))?;

    Ok(Bill {
        id: String::new(),
        trip_id: trip.id.clone(),
        description: parsed.description.unwrap_or_default(),
        category: parsed
            .category
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        total_amount: total,
        additional_charges: parsed.additional_charges,
        payer_id: payer.id.clone(),
        payment_method: parsed.payment_method,
        custom_exchange_rate: parsed.custom_exchange_rate,
        splits,
        created_at: now,
        receipt_photos: vec![],
    })
}

/// Turn the listed names into traveler IDs with their amount.
///
/// A traveler listed twice appears once, at the first position; a custom
/// amount supersedes any mention without.
fn resolve_shares(trip: &Trip, parsed: &ParsedBill, total: Amount) -> Vec<(TravelerId, Amount)> {
    let mut listed: Vec<(TravelerId, Option<Amount>)> = vec![];

    if parsed.shares.is_empty() {
        listed = trip.travelers.iter().map(|t| (t.id.clone(), None)).collect();
    } else {
        for share in &parsed.shares {
            let Some(traveler) = trip.traveler_by_name(&share.name) else {
                continue;
            };
            match listed.iter_mut().find(|(id, _)| *id == traveler.id) {
                Some((_, amount)) => {
                    if share.amount.is_some() {
                        *amount = share.amount;
                    }
                }
                None => listed.push((traveler.id.clone(), share.amount)),
            }
        }
    }

    let custom_total: Amount = listed.iter().filter_map(|(_, a)| *a).sum();
    let equal_shares = {
        let ids: Vec<_> = listed
            .iter()
            .filter(|(_, a)| a.is_none())
            .map(|(id, _)| id)
            .collect();
        allocate_equally(total - custom_total, &ids)
    };

    listed
        .into_iter()
        .map(|(id, amount)| match amount {
            Some(amount) => (id, amount),
            None => {
                let share = equal_shares
                    .iter()
                    .find(|(equal_id, _)| *equal_id == id)
                    .map_or(0.0, |(_, share)| *share);
                (id, share)
            }
        })
        .collect()
}

pub async fn handle_list_bills<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let bills = database.lock().await.get_bills(&trip.id)?;
    Ok(format_list_bills(&trip, &bills))
}

async fn load_bill<D: Database>(
    trip: &Trip,
    database: &Arc<Mutex<D>>,
    bill_id: &str,
) -> anyhow::Result<Bill> {
    let bill_id = bill_id.trim();
    let bills = database.lock().await.get_bills(&trip.id)?;
    let bill = bills.into_iter().find(|b| b.id == bill_id);
    Ok(bill.ok_or_else(|| InputError::unknown_bill(bill_id.to_string()))?)
}

pub async fn handle_bill_summary<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    bill_id: &str,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let bill = load_bill(&trip, database, bill_id).await?;
    let summaries = payment_summaries(&trip, &bill);
    let warnings = check_bill_references(&trip, &bill);
    Ok(format_bill_summary(&trip, &bill, &summaries, &warnings))
}

/// Who owes what to whom over the whole trip.
pub async fn handle_settle<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    basis: SettlementBasis,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let bills = database.lock().await.get_bills(&trip.id)?;
    settle(&trip, &bills, basis)
}

/// Like `handle_settle`, only counting the bills created on the given day.
pub async fn handle_settle_day<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
    utc_offset: &FixedOffset,
) -> anyhow::Result<String> {
    let day = parse_date(payload)?;
    let trip = load_trip(trip_id, database).await?;
    let bills = database.lock().await.get_bills(&trip.id)?;
    let bills = bills_on_day(&bills, day, utc_offset);
    debug!("Settling {} bills of trip {} on {day}", bills.len(), trip.id);
    settle(&trip, &bills, SettlementBasis::StoredSnapshot)
}

fn settle(trip: &Trip, bills: &[Bill], basis: SettlementBasis) -> anyhow::Result<String> {
    let mut edges = compute_settlements(trip, bills, basis)?;
    let warnings: Vec<_> = bills
        .iter()
        .flat_map(|bill| check_bill_references(trip, bill))
        .collect();

    edges.sort_by(|e1, e2| {
        let (d1, d2) = (trip.traveler_name(&e1.debtor), trip.traveler_name(&e2.debtor));
        match d1.cmp(&d2) {
            Ordering::Equal => trip
                .traveler_name(&e1.creditor)
                .cmp(&trip.traveler_name(&e2.creditor)),
            o => o,
        }
    });
    Ok(format_settlements(trip, &edges, &warnings))
}

/// Convert an amount between the currencies of the trip, with the rate a
/// bill paid the same way would get.
pub async fn handle_convert<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
) -> anyhow::Result<String> {
    let (amount, from, method) = parse_conversion(payload)?;
    let trip = load_trip(trip_id, database).await?;

    let to = if from.code == trip.base_currency.code {
        &trip.target_currency
    } else if from.code == trip.target_currency.code {
        &trip.base_currency
    } else {
        return Err(InputError::unknown_currency(from.code).into());
    };

    let rate = resolve_rate_for(&trip, method, None)?;
    let converted = convert(amount, &from.code, &to.code, &trip.base_currency.code, rate)?;

    let options = FormatOptions {
        show_code: true,
        ..FormatOptions::default()
    };
    Ok(format!(
        "{} = {}",
        format_amount(amount, &from, options),
        format_amount(converted, to, options)
    ))
}

/// Attach a receipt photo to a bill, given as `bill_id path`.
///
/// Only the metadata of the file is read: the photo itself is referenced by
/// its path.
pub async fn handle_attach_receipt<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    payload: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let (bill_id, uri) = payload
        .trim()
        .split_once(char::is_whitespace)
        .map(|(id, uri)| (id, uri.trim()))
        .ok_or_else(|| InputError::receipt_not_found(payload.trim().to_string()))?;

    let trip = load_trip(trip_id, database).await?;
    let bill = load_bill(&trip, database, bill_id).await?;

    let metadata = tokio::fs::metadata(uri)
        .await
        .map_err(|_| InputError::receipt_not_found(uri.to_string()))?;
    if !metadata.is_file() {
        return Err(InputError::receipt_not_found(uri.to_string()).into());
    }

    let path = Path::new(uri);
    let photo = ReceiptPhoto {
        id: String::new(),
        uri: uri.to_string(),
        name: path
            .file_name()
            .map_or(uri.to_string(), |n| n.to_string_lossy().to_string()),
        size: metadata.len(),
        mime_type: mime_type(path).to_string(),
        uploaded_at: now,
    };

    let photo_id = database.lock().await.add_receipt_photo(&bill.id, &photo)?;
    info!("Attached receipt {photo_id} ({} bytes) to bill {}", photo.size, bill.id);
    Ok(photo_id)
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub async fn handle_list_receipts<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    bill_id: &str,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let bill = load_bill(&trip, database, bill_id).await?;
    let photos = database.lock().await.get_receipt_photos(&bill.id)?;
    Ok(format_receipts(&photos))
}

pub async fn handle_delete_bill<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
    bill_id: &str,
) -> anyhow::Result<()> {
    let bill_id = bill_id.trim();
    let trip = load_trip(trip_id, database).await?;
    if !database.lock().await.delete_bill(&trip.id, bill_id)? {
        return Err(InputError::unknown_bill(bill_id.to_string()).into());
    }
    info!("Deleted bill {bill_id} of trip {}", trip.id);
    Ok(())
}

pub async fn handle_dashboard<D: Database>(
    trip_id: &str,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    let trip = load_trip(trip_id, database).await?;
    let bills = database.lock().await.get_bills(&trip.id)?;
    Ok(format_overview(&trip, &trip_overview(&bills)))
}
