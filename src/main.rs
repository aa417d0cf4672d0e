use std::{io, path::PathBuf, process::ExitCode};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre;
use fastnum::D128;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{
    config::Config,
    dashboard::Dashboard,
    domain::{AccountName, Session},
    errors::TrackerError,
    store::{CsvFileStore, LedgerStore},
    tracker::{NewAccount, Tracker},
};

mod config;
mod dashboard;
mod domain;
mod engine;
mod errors;
mod loader;
mod metrics;
mod store;
mod tracker;

#[derive(Parser)]
#[command(name = "propfirm-tracker", version)]
#[command(about = "Track prop firm evaluation accounts against their profit targets")]
struct Cli {
    /// Ledger CSV file
    #[arg(long, env = "PROPFIRM_LEDGER", default_value = "ledger.csv", global = true)]
    ledger: PathBuf,

    /// Comma-separated list of selectable users; empty for single-user mode
    #[arg(long, env = "PROPFIRM_USERS", value_delimiter = ',', global = true)]
    users: Vec<String>,

    /// User whose accounts are shown and created
    #[arg(long, env = "PROPFIRM_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the selectable users
    Users,
    /// List the accounts of the current user
    Accounts,
    /// Show metrics and history of an account
    Show { account: String },
    /// Print the balance chart series as CSV
    Chart { account: String },
    /// Print the history table as CSV
    History { account: String },
    /// Create an account seeded with its initial balance
    Create {
        name: String,
        #[arg(long)]
        firm: String,
        #[arg(long, default_value = "25000", value_parser = parse_amount)]
        initial: D128,
        #[arg(long, default_value = "26600", value_parser = parse_amount)]
        target: D128,
    },
    /// Record a day's gain or loss
    Add {
        account: String,
        #[arg(allow_negative_numbers = true, value_parser = parse_amount)]
        delta: D128,
        /// Trading day, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete an account and all of its entries
    Delete {
        account: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = Config::resolve(cli.ledger, cli.users, cli.user)?;
    let session = &config.session;

    let mut tracker = Tracker::open(CsvFileStore::new(&config.ledger_path))?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Users => {
            if config.owners.is_empty() {
                println!("Single-user mode: set --users to partition accounts.");
            }
            for owner in &config.owners {
                let marker = if session.owner.as_ref() == Some(owner) { "*" } else { " " };
                println!("{marker} {owner}");
            }
        }
        Command::Accounts => print_accounts(&tracker, session),
        Command::Show { account } => {
            print!("{}", render_view(&tracker, session, &AccountName::new(account), View::Dashboard)?);
        }
        Command::Chart { account } => {
            print!("{}", render_view(&tracker, session, &AccountName::new(account), View::Chart)?);
        }
        Command::History { account } => {
            print!("{}", render_view(&tracker, session, &AccountName::new(account), View::History)?);
        }
        Command::Create {
            name,
            firm,
            initial,
            target,
        } => {
            let new_account = NewAccount {
                name,
                firm,
                initial,
                target,
            };
            let result = tracker.create_account(session, new_account, today);
            let Some(seed) = recover(&tracker, session, result)? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("Created account '{}' for {}.", seed.account, seed.owner);
        }
        Command::Add {
            account,
            delta,
            date,
        } => {
            let account = AccountName::new(account);
            let result = tracker.append_daily_entry(session, &account, date.unwrap_or(today), delta);
            let Some(entry) = recover(&tracker, session, result)? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{} on {}: balance {}.", entry.account, entry.date, entry.balance);
        }
        Command::Delete { account, yes } => {
            let account = AccountName::new(account);
            if !yes {
                println!("This removes every entry of '{account}'. Re-run with --yes to confirm.");
                return Ok(ExitCode::SUCCESS);
            }
            let result = tracker.delete_account(session, &account);
            let Some(removed) = recover(&tracker, session, result)? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("Deleted account '{account}' ({removed} entries).");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let json = std::env::var("PROPFIRM_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_writer(io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .init();
    }
}

fn parse_amount(raw: &str) -> Result<D128, String> {
    raw.trim()
        .parse::<D128>()
        .map_err(|err| format!("invalid amount '{raw}': {err}"))
}

fn print_accounts<S: LedgerStore>(tracker: &Tracker<S>, session: &Session) {
    let engine = tracker.engine();
    let accounts = engine.account_names(session);
    if accounts.is_empty() {
        println!("No accounts yet. Create one with `create`.");
    }
    for account in accounts {
        println!("{account}");
    }
}

#[derive(Clone, Copy, Debug)]
enum View {
    Dashboard,
    Chart,
    History,
}

/// Renders one account. An account with no entries visible to the session
/// is an empty state, reported the same way for every view.
fn render_view<S: LedgerStore>(
    tracker: &Tracker<S>,
    session: &Session,
    account: &AccountName,
    view: View,
) -> eyre::Result<String> {
    let Some(dashboard) = Dashboard::build(&tracker.engine(), session, account) else {
        return Ok(format!("No entries for account '{account}'.\n"));
    };

    match view {
        View::Dashboard => Ok(dashboard.to_string()),
        View::Chart => to_csv(dashboard.chart),
        View::History => to_csv(dashboard.history),
    }
}

fn to_csv<T: Serialize>(records: Vec<T>) -> eyre::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Reports a recoverable mutation error and lists the unchanged accounts;
/// anything else aborts.
fn recover<S: LedgerStore, T>(
    tracker: &Tracker<S>,
    session: &Session,
    result: Result<T, TrackerError>,
) -> eyre::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_recoverable() => {
            eprintln!("error: {err}");
            print_accounts(tracker, session);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
