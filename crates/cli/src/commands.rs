use thiserror::Error;

/// A line typed on stdin while the dashboard is running.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clear both caches and re-render
    Refresh,
    /// Change quantity and cost of a held ticker
    Set {
        ticker: String,
        quantity: f64,
        cost: f64,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (type 'h' for help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid {field} '{value}': expected a non-negative number")]
    InvalidNumber { field: &'static str, value: String },
}

pub const HELP: &str = "\
Commands:
  r, refresh                 clear caches and fetch fresh data
  set <TICKER> <QTY> <COST>  change a holding's quantity and cost per share
  h, help                    show this help
  q, quit                    exit";

const SET_USAGE: &str = "set <TICKER> <QTY> <COST>";

/// Parse one input line. Command words are case-insensitive.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };

    match head.to_ascii_lowercase().as_str() {
        "r" | "refresh" => Ok(Command::Refresh),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "set" => {
            let args: Vec<&str> = words.collect();
            let [ticker, quantity, cost] = args.as_slice() else {
                return Err(ParseError::Usage(SET_USAGE));
            };
            Ok(Command::Set {
                ticker: ticker.to_uppercase(),
                quantity: parse_amount("quantity", quantity)?,
                cost: parse_amount("cost", cost)?,
            })
        }
        _ => Err(ParseError::Unknown(head.to_string())),
    }
}

fn parse_amount(field: &'static str, value: &str) -> Result<f64, ParseError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
