use std::path::PathBuf;
use std::sync::OnceLock;

use clap::{Args, Parser, Subcommand};
use regex::Regex;

use crate::calculator::Selection;
use crate::validator::DEFAULT_LINK_TTL;

/// Default address for both the client and the server
///
/// Overridden with `--address`/`--target` or the TIPJAR_ADDRESS environment variable.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

/// Default location of the SQLite database
pub const DEFAULT_DATABASE: &str = "tipjar.sqlite3";

/// Errors that can occur when parsing the command line arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CLIError {
    #[error("Invalid target format. Should be <host>:<port>")]
    InvalidUrlFormat,
    #[error("Invalid parameter")]
    InvalidParameter,
}

fn address_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| Regex::new(r"^[a-zA-Z0-9\.\-]+:\d{1,5}$").expect("valid address regex"))
}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise InvalidUrlFormat
pub fn validate_address(url: &str) -> std::result::Result<&str, CLIError> {
    if address_format().is_match(url) {
        Ok(url)
    } else {
        Err(CLIError::InvalidUrlFormat)
    }
}

fn parse_address(url: &str) -> std::result::Result<String, CLIError> {
    validate_address(url).map(str::to_string)
}

fn parse_workers(value: &str) -> std::result::Result<usize, CLIError> {
    match value.trim().parse::<usize>() {
        Ok(workers) if workers > 0 => Ok(workers),
        _ => Err(CLIError::InvalidParameter),
    }
}

/// Server configuration, from the command line or the environment
#[derive(Parser, Debug)]
#[command(name = "server", version, about = "Digital tip jar HTTP server")]
pub struct ServerArgs {
    /// Address to listen on, as <host>:<port>
    #[arg(long, env = "TIPJAR_ADDRESS", default_value = DEFAULT_ADDRESS, value_parser = parse_address)]
    pub address: String,

    /// SQLite database file, or :memory:
    #[arg(long, env = "TIPJAR_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// JSON file with the staff to seed an empty database with
    #[arg(long, env = "TIPJAR_EMPLOYEES")]
    pub employees: Option<PathBuf>,

    /// Maximum age of a tipping link, in seconds
    #[arg(long, env = "TIPJAR_LINK_TTL", default_value_t = DEFAULT_LINK_TTL, value_parser = clap::value_parser!(i64).range(0..))]
    pub link_ttl: i64,

    /// Number of threads serving requests. Defaults to the available parallelism
    #[arg(long, env = "TIPJAR_WORKERS", value_parser = parse_workers)]
    pub workers: Option<usize>,
}

impl ServerArgs {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

/// Command line client for guests and staff
#[derive(Parser, Debug)]
#[command(name = "client", version, about = "Talk to a tip jar server")]
pub struct ClientArgs {
    /// Server address, as <host>:<port>
    #[arg(short, long, global = true, env = "TIPJAR_ADDRESS", default_value = DEFAULT_ADDRESS, value_parser = parse_address)]
    pub target: String,

    #[command(subcommand)]
    pub command: ClientCommand,
}

#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// List the staff
    Employees,

    /// Show the order behind a tipping link
    Order {
        code: String,
        #[command(flatten)]
        link: LinkArgs,
    },

    /// Leave a tip, going through the whole guest flow
    Tip {
        code: String,
        /// 1 to 5 stars
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[command(flatten)]
        amount: AmountArgs,
        #[arg(long)]
        comment: Option<String>,
        /// Do not cover the service commission
        #[arg(long)]
        no_commission: bool,
        #[command(flatten)]
        link: LinkArgs,
    },

    /// Show a tip that was already left
    ShowTip { tip_id: String },

    /// Ask for a restaurant to be connected
    Lead {
        #[arg(long)]
        workplace: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },

    /// Tip statistics of an employee
    Stats {
        employee: String,
        /// today, yesterday, week or month
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        restaurant: Option<String>,
    },

    /// Compute a tip without leaving it
    Quote {
        /// Bill amount
        #[arg(long)]
        base: u64,
        #[command(flatten)]
        amount: AmountArgs,
        #[arg(long)]
        no_commission: bool,
    },
}

/// Signature and timestamp carried by a tipping link
#[derive(Args, Debug, Default, Clone)]
pub struct LinkArgs {
    #[arg(long)]
    pub sig: Option<String>,
    #[arg(long)]
    pub ts: Option<String>,
}

/// Either a quick-pick percentage or a custom amount
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct AmountArgs {
    #[arg(long)]
    pub percent: Option<u64>,
    #[arg(long)]
    pub amount: Option<u64>,
}

impl AmountArgs {
    pub fn selection(&self) -> Selection {
        match (self.percent, self.amount) {
            (Some(percent), _) => Selection::Percentage(percent),
            (None, amount) => Selection::Custom(amount.unwrap_or_default()),
        }
    }
}
