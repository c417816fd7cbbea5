//! Check that the shares of a bill add up to its total.

use crate::{currency::round_to, types::Amount};

/// Maximum absolute difference between the sum of the shares and the total.
///
/// It does not scale with the total: it only absorbs the residue of
/// floating-point divisions.
pub const SPLIT_TOLERANCE: Amount = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct SplitValidation {
    pub is_valid: bool,
    pub difference: Amount,
    pub errors: Vec<String>,
}

/// Run every check and report all the failures together:
/// - at least one traveler has a share
/// - the total and the shares are finite numbers
/// - the shares add up to the total, within `SPLIT_TOLERANCE`
/// - no share is negative (a single error, however many there are)
pub fn validate_split<T: AsRef<str>>(total: Amount, shares: &[(T, Amount)]) -> SplitValidation {
    let mut errors = vec![];

    if shares.is_empty() {
        errors.push("At least one person must be assigned an amount".to_string());
    }

    let sum: Amount = shares.iter().map(|(_, amount)| amount).sum();
    let difference = (sum - total).abs();
    if !total.is_finite() || shares.iter().any(|(_, amount)| !amount.is_finite()) {
        errors.push("Amounts must be finite numbers".to_string());
    } else if difference > SPLIT_TOLERANCE {
        errors.push(format!(
            "Split amounts must add up to the bill total (difference: {:.2})",
            round_to(difference, 2)
        ));
    }

    if shares.iter().any(|(_, amount)| *amount < 0.0) {
        errors.push("Amounts cannot be negative".to_string());
    }

    SplitValidation {
        is_valid: errors.is_empty() && difference <= SPLIT_TOLERANCE,
        difference,
        errors,
    }
}
