//! Parse a bill.
//!
//! Since bills have a more or less complex syntax, we use nom.

use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{alpha1, char, multispace0, multispace1, not_line_ending},
    combinator::{map, map_res, opt, recognize, verify},
    multi::many0,
    sequence::{pair, preceded, tuple},
    AsChar, IResult, InputTakeAtPosition,
};

use crate::{
    types::{Amount, ParsedBill, ParsedShare, PaymentMethod},
    validator::is_valid_name,
};

/// Parse a bill submitted by the user:
///
/// `payer amount [+charges] [cash|card] [@rate] [#category] [traveler[/amount]...] [- description]`
///
/// Only the syntax is checked here: names, amounts and rates are validated
/// later against the trip.
pub fn parse_bill(s: &str) -> IResult<&str, ParsedBill> {
    let (s, payer) = preceded(multispace0, parse_name)(s)?;
    let (s, amount) = preceded(multispace1, parse_amount)(s)?;
    let (s, additional_charges) = opt(preceded(pair(multispace1, char('+')), parse_amount))(s)?;
    let (s, payment_method) = opt(preceded(multispace1, parse_payment_method))(s)?;
    let (s, custom_exchange_rate) = opt(preceded(pair(multispace1, char('@')), parse_amount))(s)?;
    let (s, category) = opt(preceded(pair(multispace1, char('#')), parse_name))(s)?;
    let (s, shares) = many0(preceded(multispace1, parse_share))(s)?;
    let (s, description) = parse_description(s)?;
    let (s, _) = multispace0(s)?;

    Ok((
        s,
        ParsedBill {
            payer: payer.to_string(),
            amount,
            additional_charges,
            payment_method,
            custom_exchange_rate,
            category: category.map(|c| c.to_lowercase()),
            shares,
            description: description.map(|d| d.trim().to_string()),
        },
    ))
}

/// Match until a whitespace or '/' is found, then use is_valid_name
/// to make sure that a name was matched (and not a number or a keyword).
fn parse_name(s: &str) -> IResult<&str, &str> {
    recognize(verify(is_not(" \t\r\n/"), is_valid_name))(s)
}

fn parse_share(s: &str) -> IResult<&str, ParsedShare> {
    map(
        tuple((parse_name, opt(preceded(char('/'), parse_amount)))),
        |(name, amount)| ParsedShare::new(name, amount),
    )(s)
}

fn parse_payment_method(s: &str) -> IResult<&str, PaymentMethod> {
    // The keyword must be a whole word, so that a traveler named "cashew"
    // is not read as a cash payment.
    map_res(
        verify(alpha1, |w: &str| {
            w.eq_ignore_ascii_case("cash") || w.eq_ignore_ascii_case("card")
        }),
        |w: &str| w.parse::<PaymentMethod>(),
    )(s)
}

fn float1(s: &str) -> IResult<&str, &str> {
    s.split_at_position1_complete(
        |item| !item.is_dec_digit() && item != ',' && item != '.' && item != '-' && item != '+',
        nom::error::ErrorKind::Float,
    )
}

/// Amounts use either `.` or `,` as decimal separator.
pub fn parse_amount(s: &str) -> IResult<&str, Amount> {
    map_res(float1, |x: &str| x.replace(',', ".").parse::<Amount>())(s)
}

fn parse_description(s: &str) -> IResult<&str, Option<&str>> {
    opt(preceded(
        multispace0,
        preceded(tag("- "), map(not_line_ending, |s| s)),
    ))(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("3.45"), Ok(("", 3.45)));
        assert_eq!(parse_amount("3,45"), Ok(("", 3.45)));
        assert_eq!(parse_amount("3"), Ok(("", 3.0)));
        assert_eq!(parse_amount("+3"), Ok(("", 3.0)));
        assert_eq!(parse_amount("-3.5 rest"), Ok((" rest", -3.5)));
        assert!(parse_amount("3.4.5").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_payment_method() {
        assert_eq!(parse_payment_method("card"), Ok(("", PaymentMethod::Card)));
        assert_eq!(parse_payment_method("CASH x"), Ok((" x", PaymentMethod::Cash)));
        assert!(parse_payment_method("cashew").is_err());
    }

    #[test]
    fn test_parse_share() -> anyhow::Result<()> {
        let (rest, share) = parse_share("Bob/12,5 carol")?;
        assert_eq!(share.name, "Bob");
        assert_eq!(share.amount, Some(12.5));
        assert_eq!(rest, " carol");

        let (_, share) = parse_share("carol")?;
        assert_eq!(share.amount, None);
        Ok(())
    }

    #[test]
    fn test_parse_description() {
        assert_eq!(parse_description(" - abc  "), Ok(("", Some("abc  "))));
        assert_eq!(parse_description("- abc  def"), Ok(("", Some("abc  def"))));
        assert_eq!(parse_description(""), Ok(("", None)));
    }

    #[test]
    fn test_parse_full_bill() -> anyhow::Result<()> {
        let (rest, bill) =
            parse_bill(" alice 120.50 +10 card @4.2 #Food bob carol/40 - dinner by the river")?;

        assert_eq!(bill.payer, "alice");
        assert_eq!(bill.amount, 120.5);
        assert_eq!(bill.additional_charges, Some(10.0));
        assert_eq!(bill.payment_method, Some(PaymentMethod::Card));
        assert_eq!(bill.custom_exchange_rate, Some(4.2));
        assert_eq!(bill.category, Some("food".to_string()));
        assert_eq!(bill.shares.len(), 2);
        assert_eq!(bill.shares[0].name, "bob");
        assert_eq!(bill.shares[0].amount, None);
        assert_eq!(bill.shares[1].name, "carol");
        assert_eq!(bill.shares[1].amount, Some(40.0));
        assert_eq!(bill.description, Some("dinner by the river".to_string()));
        assert_eq!(rest, "");
        Ok(())
    }

    #[test]
    fn test_parse_minimal_bill() -> anyhow::Result<()> {
        let (rest, bill) = parse_bill("alice 30")?;
        assert_eq!(bill.payer, "alice");
        assert_eq!(bill.amount, 30.0);
        assert!(bill.additional_charges.is_none());
        assert!(bill.payment_method.is_none());
        assert!(bill.custom_exchange_rate.is_none());
        assert!(bill.category.is_none());
        assert!(bill.shares.is_empty());
        assert!(bill.description.is_none());
        assert_eq!(rest, "");

        // A traveler whose name starts like a payment method.
        let (_, bill) = parse_bill("alice 30 cashew")?;
        assert!(bill.payment_method.is_none());
        assert_eq!(bill.shares[0].name, "cashew");
        Ok(())
    }

    #[test]
    fn test_parse_invalid_bill() {
        assert!(parse_bill("30 alice").is_err());
        assert!(parse_bill("alice").is_err());
    }
}
