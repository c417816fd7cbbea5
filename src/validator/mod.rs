//! Functions that check the validity of user input.
//!
//! These functions are called after the parsing phase and execute
//! checks that are not easily done by the parser.

use std::collections::HashSet;

mod split;
mod trip;

use crate::{error::InputError, types::Trip};
pub use split::validate_split;
pub use trip::check_bill_references;

/// Names must start with a letter and can contain letters, digits, `_` and `-`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

pub fn validate_traveler_names<T: AsRef<str>>(names: &[T]) -> Result<(), InputError> {
    for name in names {
        if !is_valid_name(name.as_ref()) {
            return Err(InputError::invalid_traveler_name(name.as_ref().to_string()));
        }
    }
    Ok(())
}

/// Check that all names belong to travelers of the trip.
pub fn validate_travelers_exist<T: AsRef<str>>(names: &[T], trip: &Trip) -> Result<(), InputError> {
    for name in names {
        if trip.traveler_by_name(name.as_ref()).is_none() {
            return Err(InputError::unknown_traveler(name.as_ref().to_string()));
        }
    }
    Ok(())
}

/// Names that would be added twice to the trip, either because they are
/// already travelers or because they are repeated in the input.
pub fn duplicate_traveler_names<T: AsRef<str>>(names: &[T], trip: &Trip) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.as_ref())
        .filter(|n| trip.traveler_by_name(n).is_some() || !seen.insert(n.to_lowercase()))
        .map(|n| n.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{currency::find_currency, types::Traveler};

    use super::*;

    fn make_trip() -> Trip {
        let mut trip = Trip::new(
            "1",
            "tokyo",
            find_currency("MYR").expect("test"),
            find_currency("JPY").expect("test"),
        );
        trip.travelers = vec![Traveler::new("1", "Alice"), Traveler::new("2", "bob")];
        trip
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("alice"));
        assert!(is_valid_name("Zoë_2"));
        assert!(is_valid_name("mary-jane"));
        assert!(!is_valid_name("2pac"));
        assert!(!is_valid_name("_x"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_validate_travelers_exist() {
        let trip = make_trip();
        assert!(validate_travelers_exist(&["alice", "BOB"], &trip).is_ok());
        assert!(matches!(
            validate_travelers_exist(&["alice", "carol"], &trip),
            Err(InputError::UnknownTraveler(name)) if name == "carol"
        ));
    }

    #[test]
    fn test_duplicate_traveler_names() {
        let trip = make_trip();
        let duplicates = duplicate_traveler_names(&["carol", "ALICE", "dan", "Carol"], &trip);
        assert_eq!(duplicates, vec!["ALICE", "Carol"]);
    }
}
