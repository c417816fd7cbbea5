//! Produce the strings that are printed by the shell.
//! The formatting consists in using emojis, aligning columns and showing
//! each amount in both currencies of the trip.

use std::iter::repeat;

use crate::{
    currency::{format_amount, FormatOptions},
    error::IntegrityWarning,
    types::{Amount, Bill, PaymentSummary, ReceiptPhoto, SettlementEdge, Trip, TripOverview},
};

const NOTHING_TO_SHOW: &str = "Nothing to show!";

pub fn format_list_trips(trips: &[Trip]) -> String {
    if trips.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        trips
            .iter()
            .map(format_trip)
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

fn format_trip(trip: &Trip) -> String {
    format!(
        "🧳  {}: {} ({} → {}), {} travelers",
        trip.id,
        trip.name,
        trip.base_currency.code,
        trip.target_currency.code,
        trip.travelers.len()
    )
}

/// The rates of a trip, `-` when a rate is not set.
pub fn format_rates(trip: &Trip) -> String {
    let show = |rate: Option<f64>| rate.map_or("-".to_string(), |r| r.to_string());
    format!(
        "1 {} = {} {} (card), {} {} (cash)",
        trip.base_currency.code,
        show(trip.card_exchange_rate),
        trip.target_currency.code,
        show(trip.cash_exchange_rate),
        trip.target_currency.code
    )
}

pub fn format_list_bills(trip: &Trip, bills: &[Bill]) -> String {
    if bills.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        bills
            .iter()
            .map(|b| format_bill(trip, b))
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

fn format_bill(trip: &Trip, bill: &Bill) -> String {
    let mut result = format!(
        "💰  {}: {} paid {} #{}",
        bill.id,
        trip.traveler_name(&bill.payer_id),
        format_both(trip, bill.total_amount, base_total(bill)),
        bill.category
    );

    if let Some(method) = bill.payment_method {
        result = format!("{} {}", result, method);
    }
    if !bill.description.is_empty() {
        result = format!("{} - {}", result, bill.description);
    }
    if !bill.receipt_photos.is_empty() {
        result = format!("{} 📎{}", result, bill.receipt_photos.len());
    }
    result
}

/// The base-currency value of a bill as stored in its splits.
fn base_total(bill: &Bill) -> Amount {
    bill.splits.iter().map(|s| s.amount_myr).sum()
}

/// Detail of a single bill: the shares, who owes what to the payer and the
/// integrity problems found in the bill, if any.
pub fn format_bill_summary(
    trip: &Trip,
    bill: &Bill,
    summaries: &[PaymentSummary],
    warnings: &[IntegrityWarning],
) -> String {
    let mut result = format_bill(trip, bill) + "\n";

    if let Some(charges) = bill.additional_charges {
        result += &format!(
            "including charges of {}\n",
            format_amount(charges, &trip.target_currency, FormatOptions::default())
        );
    }

    for split in &bill.splits {
        result += &format!(
            "- {}: {}\n",
            trip.traveler_name(&split.traveler_id),
            format_both(trip, split.amount, split.amount_myr)
        );
    }

    for summary in summaries {
        result += &format!(
            "💸  {} owes {} to {}\n",
            summary.traveler_name,
            format_both(trip, summary.total_owed, summary.total_owed_myr),
            summary.owes_to_name
        );
    }

    result + &format_warnings(warnings)
}

fn format_warnings(warnings: &[IntegrityWarning]) -> String {
    warnings
        .iter()
        .map(|w| format!("⚠️  {w}\n"))
        .collect()
}

/// The edges must already be in display order. Warnings go after the
/// settlement lines.
pub fn format_settlements(
    trip: &Trip,
    edges: &[SettlementEdge],
    warnings: &[IntegrityWarning],
) -> String {
    let result = if edges.is_empty() {
        "All clean!\n".to_string()
    } else {
        let lines: Vec<_> = edges
            .iter()
            .map(|e| (trip.traveler_name(&e.debtor), e))
            .collect();
        let max_debtor_length = lines
            .iter()
            .map(|(debtor, _)| debtor.chars().count())
            .max()
            .expect("just checked there are edges!");
        lines
            .iter()
            .map(|(debtor, e)| format_settlement(trip, debtor, e, max_debtor_length))
            .fold(String::new(), |a, b| a + &b + "\n")
    };
    result + &format_warnings(warnings)
}

fn format_settlement(
    trip: &Trip,
    debtor: &str,
    edge: &SettlementEdge,
    target_length: usize,
) -> String {
    // Amounts stay aligned by padding the debtors where needed.
    let length = debtor.chars().count();
    let debtor = if length < target_length {
        debtor.to_string() + &make_string_of_char(' ', target_length - length)
    } else {
        debtor.to_string()
    };

    format!(
        "💰  {} 💸  {}  {} 🤑",
        debtor,
        format_both(trip, edge.amount, edge.amount_myr),
        trip.traveler_name(&edge.creditor)
    )
}

pub fn format_receipts(photos: &[ReceiptPhoto]) -> String {
    if photos.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        photos
            .iter()
            .map(|p| {
                format!(
                    "📎  {}: {} ({}, {} bytes) {}",
                    p.id, p.name, p.mime_type, p.size, p.uri
                )
            })
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

pub fn format_overview(trip: &Trip, overview: &TripOverview) -> String {
    let options = FormatOptions::default();
    let mut result = format!(
        "{}: {} bills, {}\n",
        trip.name,
        overview.bill_count,
        format_both(trip, overview.total_amount, overview.total_amount_myr)
    );

    if !overview.by_category.is_empty() {
        result += "By category:\n";
        for (category, amount) in &overview.by_category {
            result += &format!(
                "- {}: {}\n",
                category,
                format_amount(*amount, &trip.target_currency, options)
            );
        }
    }

    if !overview.paid_by.is_empty() {
        result += "Paid by:\n";
        for (payer, amount) in &overview.paid_by {
            result += &format!(
                "- {}: {}\n",
                trip.traveler_name(payer),
                format_amount(*amount, &trip.target_currency, options)
            );
        }
    }

    result
}

/// An amount of the destination currency followed by its home value.
fn format_both(trip: &Trip, amount: Amount, amount_myr: Amount) -> String {
    let options = FormatOptions::default();
    format!(
        "{} ({})",
        format_amount(amount, &trip.target_currency, options),
        format_amount(amount_myr, &trip.base_currency, options)
    )
}

fn make_string_of_char(c: char, length: usize) -> String {
    repeat(c).take(length).collect::<String>()
}

pub fn format_simple_list<T: AsRef<str>>(elements: &[T]) -> String {
    if elements.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        elements
            .iter()
            .map(|g| format!("- {}", g.as_ref()))
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{
        currency::find_currency,
        types::{BillSplit, PaymentMethod, Traveler},
    };

    use super::*;

    fn make_trip() -> Trip {
        let mut trip = Trip::new(
            "1",
            "Bangkok",
            find_currency("MYR").expect("test"),
            find_currency("THB").expect("test"),
        );
        trip.travelers = vec![
            Traveler::new("1", "alice"),
            Traveler::new("2", "bob"),
            Traveler::new("3", "carolina"),
        ];
        trip
    }

    fn make_bill() -> Bill {
        Bill {
            id: "7".to_string(),
            trip_id: "1".to_string(),
            description: "dinner".to_string(),
            category: "food".to_string(),
            total_amount: 300.0,
            additional_charges: None,
            payer_id: "1".to_string(),
            payment_method: Some(PaymentMethod::Card),
            custom_exchange_rate: None,
            splits: vec![
                BillSplit::new("1", 150.0, 20.0),
                BillSplit::new("2", 150.0, 20.0),
            ],
            created_at: Utc::now(),
            receipt_photos: vec![],
        }
    }

    #[test]
    fn test_format_bill() {
        let result = format_bill(&make_trip(), &make_bill());
        assert_eq!("💰  7: alice paid ฿300.00 (RM40.00) #food card - dinner", result);
    }

    #[test]
    fn test_format_bill_summary() {
        let trip = make_trip();
        let mut bill = make_bill();
        bill.splits.push(BillSplit::new("9", 0.0, 0.0));
        let summaries = vec![PaymentSummary {
            traveler_id: "2".to_string(),
            traveler_name: "bob".to_string(),
            total_owed: 150.0,
            total_owed_myr: 20.0,
            owes_to: "1".to_string(),
            owes_to_name: "alice".to_string(),
        }];
        let warnings = vec![IntegrityWarning::UnknownSplitTraveler {
            bill_id: "7".to_string(),
            traveler_id: "9".to_string(),
        }];

        let result = format_bill_summary(&trip, &bill, &summaries, &warnings);

        assert!(result.contains("- Unknown: ฿0.00 (RM0.00)\n"));
        assert!(result.contains("💸  bob owes ฿150.00 (RM20.00) to alice\n"));
        assert!(result.contains("⚠️  bill `7` has a split for `9`"));
    }

    #[test]
    fn test_format_settlements() {
        let trip = make_trip();
        let edges = vec![
            SettlementEdge::new("2", "1", 34.0, 4.53),
            SettlementEdge::new("3", "1", 21.12, 2.82),
        ];

        let result = format_settlements(&trip, &edges, &[]);

        assert_eq!(
            "💰  bob      💸  ฿34.00 (RM4.53)  alice 🤑\n💰  carolina 💸  ฿21.12 (RM2.82)  alice 🤑\n",
            result
        );
        assert_eq!("All clean!\n", format_settlements(&trip, &[], &[]));

        let warnings = vec![IntegrityWarning::UnknownPayer {
            bill_id: "4".to_string(),
            traveler_id: "9".to_string(),
        }];
        assert_eq!(
            "All clean!\n⚠️  bill `4` was paid by `9`, who is no longer a traveler\n",
            format_settlements(&trip, &[], &warnings)
        );
    }

    #[test]
    fn test_format_rates() {
        let mut trip = make_trip();
        trip.card_exchange_rate = Some(7.5);
        assert_eq!("1 MYR = 7.5 THB (card), - THB (cash)", format_rates(&trip));
    }

    #[test]
    fn test_format_overview() {
        let trip = make_trip();
        let overview = TripOverview {
            bill_count: 2,
            total_amount: 400.0,
            total_amount_myr: 53.33,
            by_category: vec![("food".to_string(), 400.0)],
            paid_by: vec![("2".to_string(), 400.0)],
        };

        let result = format_overview(&trip, &overview);

        assert_eq!(
            "Bangkok: 2 bills, ฿400.00 (RM53.33)\nBy category:\n- food: ฿400.00\nPaid by:\n- bob: ฿400.00\n",
            result
        );
    }

    #[test]
    fn test_format_simple_list() {
        let elements = vec!["g1", "g2", "g3"];
        let result = format_simple_list(&elements);

        assert_eq!("- g1\n- g2\n- g3\n", result);
        assert_eq!(NOTHING_TO_SHOW, format_simple_list::<&str>(&[]));
    }
}
