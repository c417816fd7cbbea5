use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Amounts are plain floating-point numbers: splits are compared with a fixed
/// tolerance of one cent, see `validator::split`.
pub type Amount = f64;

pub type TravelerId = String;

pub const UNKNOWN_TRAVELER: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traveler {
    pub id: TravelerId,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
}

#[derive(Clone, Debug)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub travelers: Vec<Traveler>,
    pub base_currency: Currency,
    pub target_currency: Currency,
    /// Single rate used by trips created before card and cash rates existed.
    pub exchange_rate: Option<f64>,
    pub card_exchange_rate: Option<f64>,
    pub cash_exchange_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Bill {
    pub id: String,
    pub trip_id: String,
    pub description: String,
    pub category: String,
    /// Total in the target currency, additional charges included.
    pub total_amount: Amount,
    pub additional_charges: Option<Amount>,
    pub payer_id: TravelerId,
    pub payment_method: Option<PaymentMethod>,
    pub custom_exchange_rate: Option<f64>,
    pub splits: Vec<BillSplit>,
    pub created_at: DateTime<Utc>,
    pub receipt_photos: Vec<ReceiptPhoto>,
}

/// A traveler's share of a bill.
///
/// `amount_myr` is the share in the base currency, pinned to the rate in use
/// when the bill was created. It is never recomputed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct BillSplit {
    pub traveler_id: TravelerId,
    pub amount: Amount,
    pub amount_myr: Amount,
}

/// Metadata of a receipt photo. The file itself is never opened by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptPhoto {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// What a single traveler owes the payer of a single bill.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentSummary {
    pub traveler_id: TravelerId,
    pub traveler_name: String,
    pub total_owed: Amount,
    pub total_owed_myr: Amount,
    pub owes_to: TravelerId,
    pub owes_to_name: String,
}

/// Accumulated debt from `debtor` to `creditor` over a set of bills.
#[derive(Clone, Debug, PartialEq)]
pub struct SettlementEdge {
    pub debtor: TravelerId,
    pub creditor: TravelerId,
    pub amount: Amount,
    pub amount_myr: Amount,
}

/// A bill as typed by the user, before rates and splits are resolved.
#[derive(Clone, Debug)]
pub struct ParsedBill {
    pub payer: String,
    pub amount: Amount,
    pub additional_charges: Option<Amount>,
    pub payment_method: Option<PaymentMethod>,
    pub custom_exchange_rate: Option<f64>,
    pub category: Option<String>,
    pub shares: Vec<ParsedShare>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ParsedShare {
    pub name: String,
    pub amount: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripOverview {
    pub bill_count: usize,
    pub total_amount: Amount,
    pub total_amount_myr: Amount,
    pub by_category: Vec<(String, Amount)>,
    pub paid_by: Vec<(TravelerId, Amount)>,
}

impl Currency {
    pub fn new(code: &str, name: &str, symbol: &str) -> Currency {
        Currency {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

impl Traveler {
    pub fn new(id: &str, name: &str) -> Traveler {
        Traveler {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl Trip {
    pub fn new(id: &str, name: &str, base_currency: Currency, target_currency: Currency) -> Trip {
        Trip {
            id: id.to_string(),
            name: name.to_string(),
            travelers: vec![],
            base_currency,
            target_currency,
            exchange_rate: None,
            card_exchange_rate: None,
            cash_exchange_rate: None,
            created_at: Utc::now(),
        }
    }

    pub fn traveler(&self, id: &str) -> Option<&Traveler> {
        self.travelers.iter().find(|t| t.id == id)
    }

    pub fn traveler_by_name(&self, name: &str) -> Option<&Traveler> {
        self.travelers
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Name of the traveler with the given ID, or a placeholder if the
    /// traveler was removed after the bill was created.
    pub fn traveler_name(&self, id: &str) -> String {
        self.traveler(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_TRAVELER.to_string())
    }
}

impl BillSplit {
    pub fn new(traveler_id: &str, amount: Amount, amount_myr: Amount) -> BillSplit {
        BillSplit {
            traveler_id: traveler_id.to_string(),
            amount,
            amount_myr,
        }
    }
}

impl SettlementEdge {
    pub fn new(debtor: &str, creditor: &str, amount: Amount, amount_myr: Amount) -> SettlementEdge {
        SettlementEdge {
            debtor: debtor.to_string(),
            creditor: creditor.to_string(),
            amount,
            amount_myr,
        }
    }
}

impl ParsedShare {
    pub fn new(name: &str, amount: Option<Amount>) -> ParsedShare {
        ParsedShare {
            name: name.to_string(),
            amount,
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method `{other}`")),
        }
    }
}
