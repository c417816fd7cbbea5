//! Totals shown on the trip dashboard.

use crate::types::{Amount, Bill, TripOverview};

/// Spending of a trip, based on the amounts stored in each bill.
///
/// Base-currency totals add up the stored split values, so they reflect the
/// rate in use when each bill was created. Categories and payers are listed in
/// order of first appearance.
pub fn trip_overview(bills: &[Bill]) -> TripOverview {
    let mut by_category: Vec<(String, Amount)> = vec![];
    let mut paid_by: Vec<(String, Amount)> = vec![];

    for bill in bills {
        add_to(&mut by_category, &bill.category, bill.total_amount);
        add_to(&mut paid_by, &bill.payer_id, bill.total_amount);
    }

    TripOverview {
        bill_count: bills.len(),
        total_amount: bills.iter().map(|b| b.total_amount).sum(),
        total_amount_myr: bills
            .iter()
            .flat_map(|b| b.splits.iter())
            .map(|s| s.amount_myr)
            .sum(),
        by_category,
        paid_by,
    }
}

fn add_to(totals: &mut Vec<(String, Amount)>, key: &str, amount: Amount) {
    match totals.iter_mut().find(|(k, _)| k == key) {
        Some((_, total)) => *total += amount,
        None => totals.push((key.to_string(), amount)),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::Utc;

    use crate::types::BillSplit;

    use super::*;

    fn make_bill(payer: &str, category: &str, splits: Vec<BillSplit>) -> Bill {
        Bill {
            id: "1".to_string(),
            trip_id: "1".to_string(),
            description: String::new(),
            category: category.to_string(),
            total_amount: splits.iter().map(|s| s.amount).sum(),
            additional_charges: None,
            payer_id: payer.to_string(),
            payment_method: None,
            custom_exchange_rate: None,
            splits,
            created_at: Utc::now(),
            receipt_photos: vec![],
        }
    }

    #[test]
    fn test_trip_overview() {
        let bills = vec![
            make_bill(
                "a",
                "food",
                vec![BillSplit::new("a", 45.0, 10.0), BillSplit::new("b", 45.0, 10.0)],
            ),
            make_bill("b", "transport", vec![BillSplit::new("a", 9.0, 2.0)]),
            make_bill("a", "food", vec![BillSplit::new("b", 18.0, 4.0)]),
        ];

        let overview = trip_overview(&bills);
        assert_eq!(overview.bill_count, 3);
        assert_abs_diff_eq!(overview.total_amount, 117.0);
        assert_abs_diff_eq!(overview.total_amount_myr, 26.0);
        assert_eq!(
            overview.by_category,
            vec![("food".to_string(), 108.0), ("transport".to_string(), 9.0)]
        );
        assert_eq!(
            overview.paid_by,
            vec![("a".to_string(), 108.0), ("b".to_string(), 9.0)]
        );
    }

    #[test]
    fn test_empty_overview() {
        let overview = trip_overview(&[]);
        assert_eq!(overview.bill_count, 0);
        assert!(overview.by_category.is_empty());
    }
}
