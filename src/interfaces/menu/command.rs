use crate::domain::vehicle::VehicleType;
use crate::error::{ParkingError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum PlateArg {
    /// Generate a free plate number.
    Auto,
    Given(String),
}

/// One line of menu input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Balance,
    FreePlaces,
    Add {
        plate: PlateArg,
        vehicle_type: VehicleType,
        balance: Decimal,
    },
    Remove {
        id: String,
    },
    TopUp {
        id: String,
        amount: Decimal,
    },
    List {
        json: bool,
    },
    Transactions,
    ReadLog,
    Timers,
    Help,
    Exit,
}

pub const HELP: &str = "\
Commands:
  1 | balance                        Show the parking balance
  2 | free                           Show free places
  3 | add <id|auto> <type> <balance> Park a vehicle (type: car, truck, bus, motorcycle)
  4 | remove <id>                    Remove a vehicle
  5 | topup <id> <amount>            Top up a vehicle balance
  6 | list [--json]                  List parked vehicles
      transactions                   Print the transaction history as CSV
  7 | log                            Print the transaction log
  8 | timers                         Show timer status
      help                           Show this help
  0 | exit                           Quit";

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|_| ParkingError::Validation(format!("Invalid {field} '{raw}'")))
}

fn expect_args(args: &[&str], count: usize, usage: &str) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(ParkingError::Validation(format!("Usage: {usage}")))
    }
}

impl FromStr for Command {
    type Err = ParkingError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ParkingError::Validation("Empty command".to_string()));
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "1" | "balance" => Command::Balance,
            "2" | "free" => Command::FreePlaces,
            "3" | "add" => {
                expect_args(&args, 3, "add <id|auto> <type> <balance>")?;
                let plate = if args[0].eq_ignore_ascii_case("auto") {
                    PlateArg::Auto
                } else {
                    PlateArg::Given(args[0].to_string())
                };
                Command::Add {
                    plate,
                    vehicle_type: args[1].parse()?,
                    balance: parse_decimal("balance", args[2])?,
                }
            }
            "4" | "remove" => {
                expect_args(&args, 1, "remove <id>")?;
                Command::Remove {
                    id: args[0].to_string(),
                }
            }
            "5" | "topup" | "top-up" => {
                expect_args(&args, 2, "topup <id> <amount>")?;
                Command::TopUp {
                    id: args[0].to_string(),
                    amount: parse_decimal("amount", args[1])?,
                }
            }
            "6" | "list" => Command::List {
                json: args.contains(&"--json"),
            },
            "transactions" => Command::Transactions,
            "7" | "log" => Command::ReadLog,
            "8" | "timers" => Command::Timers,
            "help" | "?" => Command::Help,
            "0" | "exit" | "quit" => Command::Exit,
            other => {
                return Err(ParkingError::Validation(format!(
                    "Unknown command '{other}', type 'help' for a list"
                )));
            }
        };
        Ok(command)
    }
}
