use thiserror::Error;

/// Error whose internal message goes to the log, while the user only sees
/// a short explanation.
#[derive(Error)]
#[error("An error occurred: {user_message}")]
pub struct ShellError {
    message: String,
    user_message: String,
}

/// The exchange rate needed to convert an amount is missing or unusable.
///
/// Never replaced by a default rate: the operation must be rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    #[error("invalid exchange rate `{0}`: a rate must be a positive finite number")]
    InvalidRate(f64),

    #[error(
        "no exchange rate available for {0}: set a card or cash rate for the trip, \
             or give the bill a custom rate"
    )]
    NoRateAvailable(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error(
        "invalid syntax for a bill; example of valid syntax: \
             alice 120.50 card #food bob carol/40 - dinner"
    )]
    InvalidBillSyntax(String),

    #[error("invalid amount `{0}`: expected a number such as 12 or 12.50")]
    InvalidAmount(String),

    #[error("invalid date `{0}`: expected a date such as 2024-05-31")]
    InvalidDate(String),

    #[error(
        "invalid traveler name `{0}`: names must start with a letter and can only \
             contain letters, digits, `_` and `-`"
    )]
    InvalidTravelerName(String),

    #[error("`{0}` is not a traveler of this trip")]
    UnknownTraveler(String),

    #[error(
        "there must be at least one traveler. Format must be \
             'traveler_name [traveler_name...]'"
    )]
    TravelersNotProvided,

    #[error("already travelers of this trip: {}", .0.join(", "))]
    DuplicateTravelers(Vec<String>),

    #[error("`{0}` is not a known currency code")]
    UnknownCurrency(String),

    #[error("missing trip name or currencies. Format must be 'trip_name BASE TARGET'")]
    InvalidTripSyntax,

    #[error("no trip selected: use /trips to list them and /use <id> to pick one")]
    NoTripSelected,

    #[error("`{0}` is not an existing trip")]
    UnknownTrip(String),

    #[error("`{0}` is not an existing bill of this trip")]
    UnknownBill(String),

    #[error("the bill does not add up: {}", .0.join("; "))]
    UnbalancedSplit(Vec<String>),

    #[error("cannot read receipt `{0}`")]
    ReceiptNotFound(String),

    #[error("the trip has no travelers yet: add some with /addtravelers")]
    NoTravelers,

    #[error("unknown command `{0}`: type /help to see the supported commands")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidCommand(String),
}

#[derive(Error, Debug)]
#[error("{message}: {reason}")]
pub struct DatabaseError {
    message: String,
    reason: anyhow::Error,
}

/// A bill references a traveler that no longer belongs to the trip.
///
/// Tolerated: names fall back to a placeholder. The warning only flags
/// stale data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    #[error("bill `{bill_id}` was paid by `{traveler_id}`, who is no longer a traveler")]
    UnknownPayer {
        bill_id: String,
        traveler_id: String,
    },

    #[error("bill `{bill_id}` has a split for `{traveler_id}`, who is no longer a traveler")]
    UnknownSplitTraveler {
        bill_id: String,
        traveler_id: String,
    },
}

impl InputError {
    // TODO: it should be possible to improve nom error messages.
    pub fn invalid_bill_syntax(e: nom::Err<nom::error::Error<&str>>) -> Self {
        InputError::InvalidBillSyntax(e.to_string())
    }

    pub fn invalid_amount(amount: String) -> Self {
        InputError::InvalidAmount(amount)
    }

    pub fn invalid_date(date: String) -> Self {
        InputError::InvalidDate(date)
    }

    pub fn invalid_traveler_name(name: String) -> Self {
        InputError::InvalidTravelerName(name)
    }

    pub fn unknown_traveler(name: String) -> Self {
        InputError::UnknownTraveler(name)
    }

    pub fn travelers_not_provided() -> Self {
        InputError::TravelersNotProvided
    }

    pub fn duplicate_travelers(names: Vec<String>) -> Self {
        InputError::DuplicateTravelers(names)
    }

    pub fn unknown_currency(code: String) -> Self {
        InputError::UnknownCurrency(code)
    }

    pub fn unknown_trip(id: String) -> Self {
        InputError::UnknownTrip(id)
    }

    pub fn unknown_bill(id: String) -> Self {
        InputError::UnknownBill(id)
    }

    pub fn unbalanced_split(errors: Vec<String>) -> Self {
        InputError::UnbalancedSplit(errors)
    }

    pub fn unknown_command(command: String) -> Self {
        InputError::UnknownCommand(command)
    }

    pub fn invalid_command(message: String) -> Self {
        InputError::InvalidCommand(message)
    }

    pub fn receipt_not_found(uri: String) -> Self {
        InputError::ReceiptNotFound(uri)
    }
}

impl DatabaseError {
    pub fn new<T: AsRef<str>>(message: T, reason: anyhow::Error) -> Self {
        DatabaseError {
            message: message.as_ref().to_string(),
            reason,
        }
    }

    /// The data changed between the check and the query.
    pub fn concurrency(message: &str) -> Self {
        DatabaseError::new(
            "the data was modified concurrently",
            anyhow::anyhow!(message.to_string()),
        )
    }
}

impl ShellError {
    pub fn new(message: String, user_message: String) -> Self {
        ShellError {
            message,
            user_message,
        }
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    /// Errors from the handlers: input and rate errors are shown as they are,
    /// everything else is hidden behind a generic message.
    pub fn from_handler(e: anyhow::Error) -> Self {
        let message = format!("{e:#}");
        let user_message = if e.is::<InputError>() || e.is::<RateError>() {
            e.to_string()
        } else if e.is::<DatabaseError>() {
            "cannot access the trip storage, please try again".to_string()
        } else {
            "unexpected error, please check the logs".to_string()
        };
        ShellError::new(message, user_message)
    }

    pub fn io(message: &str, e: std::io::Error) -> Self {
        let message = format!("{message}: {e}");
        let user_message = "cannot read or write the terminal".to_string();
        ShellError::new(message, user_message)
    }
}

impl std::fmt::Debug for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_error_hides_database_details() {
        let e = DatabaseError::new("cannot get trips", anyhow::anyhow!("disk I/O error"));
        let shell_error = ShellError::from_handler(e.into());
        assert_eq!(
            shell_error.user_message(),
            "cannot access the trip storage, please try again"
        );
        assert!(format!("{shell_error:?}").contains("disk I/O error"));
    }

    #[test]
    fn test_shell_error_shows_input_errors() {
        let e = InputError::unknown_traveler("zed".to_string());
        let shell_error = ShellError::from_handler(e.into());
        assert_eq!(shell_error.user_message(), "`zed` is not a traveler of this trip");

        let e = RateError::InvalidRate(-1.0);
        let shell_error = ShellError::from_handler(e.into());
        assert!(shell_error.user_message().starts_with("invalid exchange rate `-1`"));
    }

    #[test]
    fn test_unbalanced_split_message() {
        let e = InputError::unbalanced_split(vec![
            "first".to_string(),
            "second".to_string(),
        ]);
        assert_eq!(e.to_string(), "the bill does not add up: first; second");
    }
}
