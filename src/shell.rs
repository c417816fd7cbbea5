//! Definition of the shell commands and the loop that reads them.

use std::{str::FromStr, sync::Arc};

use chrono::Utc;
use clap::{CommandFactory, Parser, ValueEnum};
use log::{debug, error, info};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::{
    config::Config,
    database::Database,
    endpoints::{
        handle_add_travelers, handle_attach_receipt, handle_bill, handle_bill_summary,
        handle_convert, handle_dashboard, handle_delete_bill, handle_list_bills,
        handle_list_receipts, handle_list_travelers, handle_list_trips, handle_new_trip,
        handle_rates, handle_remove_travelers, handle_settle, handle_settle_day, load_trip,
    },
    error::{InputError, ShellError},
    settlement::SettlementBasis,
};

/// Split the bills of a trip. Commands start with `/`, e.g. `/bill alice 30`.
#[derive(Parser, Clone, Debug, PartialEq)]
#[command(multicall = true, rename_all = "lower", disable_help_subcommand = true)]
pub enum Command {
    /// Show this message.
    Help,
    /// Create a trip and select it, e.g. `/newtrip Bangkok MYR THB`.
    NewTrip {
        #[arg(value_name = "NAME BASE TARGET", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List all trips.
    Trips,
    /// Select the trip the other commands work on.
    Use { trip_id: String },
    /// Add travelers to the trip, e.g. `/addtravelers alice bob`.
    AddTravelers {
        #[arg(value_name = "NAMES", trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Remove travelers from the trip; their old bills keep the shares.
    RemoveTravelers {
        #[arg(value_name = "NAMES", trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// List the travelers of the trip.
    Travelers,
    /// Set the rates (1 BASE = x TARGET), e.g. `/rates card=7.5 cash=7.4`; without arguments, show them.
    Rates {
        #[arg(value_name = "card=RATE cash=RATE", trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Add a bill: payer amount [+charges] [cash|card] [@rate] [#category] [traveler[/amount]...] [- description].
    #[command(alias = "b")]
    Bill {
        #[arg(value_name = "BILL", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List the bills of the trip.
    Bills,
    /// Show who owes what for a bill.
    Summary { bill_id: String },
    /// Print who owes whom over the whole trip.
    Settle {
        #[arg(value_enum)]
        rates: Option<Rates>,
    },
    /// Settle only the bills of a day, e.g. `/settleday 2024-05-31`.
    SettleDay { day: String },
    /// Convert between the trip currencies, e.g. `/convert 150 THB card`.
    Convert {
        #[arg(value_name = "AMOUNT CODE [cash|card]", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Attach a receipt photo to a bill.
    Attach {
        bill_id: String,
        #[arg(value_name = "PATH", trailing_var_arg = true, required = true)]
        path: Vec<String>,
    },
    /// List the receipt photos of a bill.
    Receipts { bill_id: String },
    /// Delete a bill; to find the ID, use /bills.
    DeleteBill { bill_id: String },
    /// Show the spending of the trip.
    Dashboard,
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

/// Which rates give the home amounts of a settlement.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rates {
    /// The rates in use when each bill was created.
    Stored,
    /// The current rates of the trip.
    Current,
}

impl From<Rates> for SettlementBasis {
    fn from(rates: Rates) -> Self {
        match rates {
            Rates::Stored => SettlementBasis::StoredSnapshot,
            Rates::Current => SettlementBasis::CurrentRates,
        }
    }
}

impl FromStr for Command {
    type Err = InputError;

    /// The first word, without its `/`, names the command; command names
    /// ignore case.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words
            .next()
            .and_then(|w| w.strip_prefix('/'))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| InputError::unknown_command(line.trim().to_string()))?;

        let args = std::iter::once(name.to_lowercase()).chain(words.map(str::to_string));
        Command::try_parse_from(args)
            .map_err(|e| InputError::invalid_command(e.to_string().trim_end().to_string()))
    }
}

/// What the shell remembers between commands.
#[derive(Clone, Debug, Default)]
pub struct State {
    trip_id: Option<String>,
}

impl State {
    fn trip_id(&self) -> Result<&str, InputError> {
        self.trip_id.as_deref().ok_or(InputError::NoTripSelected)
    }
}

/// Read commands from `input` until it ends or `/quit` is typed, writing the
/// replies to `output`.
///
/// Errors of a single command are logged and reported to the user, and the
/// loop goes on. Only failing to read or write stops it.
pub async fn run<D, R, W>(
    database: Arc<Mutex<D>>,
    config: &Config,
    input: R,
    mut output: W,
) -> Result<(), ShellError>
where
    D: Database,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut state = State::default();
    let mut lines = input.lines();

    write_reply(&mut output, "Type /help to see the supported commands.").await?;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ShellError::io("cannot read command", e))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received command: {line}");

        let reply = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => handle_command(command, &mut state, &database, config)
                .await
                .unwrap_or_else(|e| {
                    let e = ShellError::from_handler(e);
                    error!("{e:?}");
                    e.user_message().to_string()
                }),
            Err(e) => e.to_string(),
        };

        write_reply(&mut output, &reply).await?;
    }

    info!("Shell closed");
    Ok(())
}

async fn handle_command<D: Database>(
    command: Command,
    state: &mut State,
    database: &Arc<Mutex<D>>,
    config: &Config,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let reply = match command {
        Command::Help => help(),
        Command::NewTrip { args } => {
            let trip = handle_new_trip(database, &args.join(" "), now).await?;
            state.trip_id = Some(trip.id.clone());
            format!("Created trip {}: {}. It is now the current trip.", trip.id, trip.name)
        }
        Command::Trips => handle_list_trips(database).await?,
        Command::Use { trip_id } => {
            let trip = load_trip(&trip_id, database).await?;
            state.trip_id = Some(trip.id.clone());
            format!("Using trip {}: {}", trip.id, trip.name)
        }
        Command::AddTravelers { args } => {
            handle_add_travelers(state.trip_id()?, database, &args.join(" ")).await?;
            "Travelers added.".to_string()
        }
        Command::RemoveTravelers { args } => {
            handle_remove_travelers(state.trip_id()?, database, &args.join(" ")).await?;
            "Travelers removed.".to_string()
        }
        Command::Travelers => handle_list_travelers(state.trip_id()?, database).await?,
        Command::Rates { args } => {
            handle_rates(state.trip_id()?, database, &args.join(" ")).await?
        }
        Command::Bill { args } => {
            let bill_id = handle_bill(state.trip_id()?, database, &args.join(" "), now).await?;
            format!("Bill {bill_id} saved.")
        }
        Command::Bills => handle_list_bills(state.trip_id()?, database).await?,
        Command::Summary { bill_id } => {
            handle_bill_summary(state.trip_id()?, database, &bill_id).await?
        }
        Command::Settle { rates } => {
            let basis = rates.map(SettlementBasis::from).unwrap_or_default();
            handle_settle(state.trip_id()?, database, basis).await?
        }
        Command::SettleDay { day } => {
            handle_settle_day(state.trip_id()?, database, &day, &config.utc_offset).await?
        }
        Command::Convert { args } => {
            handle_convert(state.trip_id()?, database, &args.join(" ")).await?
        }
        Command::Attach { bill_id, path } => {
            let payload = format!("{bill_id} {}", path.join(" "));
            let photo_id = handle_attach_receipt(state.trip_id()?, database, &payload, now).await?;
            format!("Receipt {photo_id} attached.")
        }
        Command::Receipts { bill_id } => {
            handle_list_receipts(state.trip_id()?, database, &bill_id).await?
        }
        Command::DeleteBill { bill_id } => {
            handle_delete_bill(state.trip_id()?, database, &bill_id).await?;
            "Bill deleted.".to_string()
        }
        Command::Dashboard => handle_dashboard(state.trip_id()?, database).await?,
        Command::Quit => String::new(),
    };
    Ok(reply)
}

fn help() -> String {
    Command::command().render_help().to_string()
}

async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &str) -> Result<(), ShellError> {
    let mut reply = reply.to_string();
    if !reply.ends_with('\n') {
        reply.push('\n');
    }
    output
        .write_all(reply.as_bytes())
        .await
        .map_err(|e| ShellError::io("cannot write reply", e))?;
    output
        .flush()
        .await
        .map_err(|e| ShellError::io("cannot flush reply", e))
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use tempdir::TempDir;

    use crate::database::sqlite::SqliteDatabase;

    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_command() -> anyhow::Result<()> {
        assert_eq!(
            "/b alice 30 -5 - taxi".parse::<Command>()?,
            Command::Bill {
                args: words("alice 30 -5 - taxi")
            }
        );
        assert_eq!("/TRIPS".parse::<Command>()?, Command::Trips);
        assert_eq!(
            "/use 3".parse::<Command>()?,
            Command::Use {
                trip_id: "3".to_string()
            }
        );
        assert_eq!(
            "/settle current".parse::<Command>()?,
            Command::Settle {
                rates: Some(Rates::Current)
            }
        );
        assert_eq!("/settle".parse::<Command>()?, Command::Settle { rates: None });
        assert_eq!("/exit".parse::<Command>()?, Command::Quit);
        assert_eq!(
            "/rates".parse::<Command>()?,
            Command::Rates { args: vec![] }
        );
        Ok(())
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(matches!(
            "/settle yesterday".parse::<Command>(),
            Err(InputError::InvalidCommand(_))
        ));
        assert!(matches!(
            "/summary".parse::<Command>(),
            Err(InputError::InvalidCommand(_))
        ));
        assert!(matches!(
            "/fly home".parse::<Command>(),
            Err(InputError::InvalidCommand(_))
        ));
        assert!(matches!(
            "hello".parse::<Command>(),
            Err(InputError::UnknownCommand(c)) if c == "hello"
        ));
        assert!(matches!(
            "/".parse::<Command>(),
            Err(InputError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_settlement_basis_from_rates() {
        assert_eq!(SettlementBasis::from(Rates::Stored), SettlementBasis::StoredSnapshot);
        assert_eq!(SettlementBasis::from(Rates::Current), SettlementBasis::CurrentRates);
    }

    #[test]
    fn test_help_lists_all_commands() {
        let help = help();
        for command in Command::command().get_subcommands() {
            assert!(help.contains(command.get_name()));
        }
        assert!(help.contains("settleday"));
        assert!(help.contains("Add a bill"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_session() -> anyhow::Result<()> {
        let dir = TempDir::new("tripsplit")?;
        let database = SqliteDatabase::new(dir.path().join("test.db"))?;
        let database = Arc::new(Mutex::new(database));
        let config = Config {
            database_path: dir.path().join("test.db"),
            utc_offset: FixedOffset::east_opt(0).expect("test"),
        };

        let input: &[u8] = b"/bills\n\
            /newtrip Bangkok MYR THB\n\
            /addtravelers alice bob\n\
            /rates cash=7.5\n\
            \n\
            /bill alice 150 - dinner\n\
            /bill alice 100 bob/20\n\
            /settle\n\
            /quit\n\
            /bills\n";
        let mut output: Vec<u8> = vec![];
        run(database, &config, input, &mut output).await?;

        let output = String::from_utf8(output)?;
        let replies: Vec<_> = output.lines().collect();
        assert_eq!(replies[0], "Type /help to see the supported commands.");
        assert_eq!(replies[1], InputError::NoTripSelected.to_string());
        assert!(replies[2].starts_with("Created trip 1: Bangkok"));
        assert_eq!(replies[3], "Travelers added.");
        assert_eq!(replies[4], "1 MYR = - THB (card), 7.5 THB (cash)");
        assert_eq!(replies[5], "Bill 1 saved.");
        assert!(replies[6].starts_with("the bill does not add up"));
        assert_eq!(replies[7], "💰  bob 💸  ฿75.00 (RM10.00)  alice 🤑");
        // Nothing is read after /quit.
        assert_eq!(replies.len(), 8);
        Ok(())
    }
}
