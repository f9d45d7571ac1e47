use std::{
    error::Error,
    io::{self},
    path::PathBuf,
    process::exit,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tokio::time::{Duration, Instant, sleep_until};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use accounting_client::{
    PasswordHash, PasswordStrength, StoreLogWriter, SystemClock, ValidatedPassword, clear_logs,
    format_minor_units,
    ledger::{BalanceSeries, Period, TransactionSet, load_transactions},
    password_strength, read_logs,
    session::{
        ActivityEvent, ActivityHub, GuardConfig, GuardTask, KeyValueStore, MemoryStore,
        SessionContext, SessionGuard, SqliteStore,
    },
};

/// Command-line front end for the accounting client.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The most verbose level to log at: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// File path to a SQLite database holding the session and the
    /// application log. An in-memory store is used if omitted.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the totals and running balance of a month's transactions.
    Report {
        /// A JSON or CSV file of transaction records.
        #[arg(long)]
        input: PathBuf,

        /// The month to report on, as a number (10) or a name (outubro).
        /// Defaults to the current month.
        #[arg(long)]
        month: Option<String>,

        /// The year to report on. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// The time zone used to determine the current month.
        #[arg(long, default_value = "Europe/Lisbon")]
        timezone: String,
    },

    /// Log a user in and wait for the idle timeout to log them out.
    Idle {
        /// Milliseconds without activity before the session expires.
        #[arg(long, env = "AUTO_LOGOUT_TIMEOUT_MS", default_value_t = 300_000)]
        timeout_ms: i64,

        /// Milliseconds between expiry checks.
        #[arg(long, default_value_t = 1_000)]
        poll_interval_ms: i64,

        /// The name of the user to log in.
        #[arg(long, default_value = "demo")]
        user: String,

        /// Simulate user activity this many milliseconds after logging in.
        /// May be given more than once.
        #[arg(long)]
        activity_after: Vec<u64>,
    },

    /// Rate a password and, if it is strong enough and confirmed, print its hash.
    Password,

    /// Print the application log.
    Logs {
        /// Delete the log after printing it.
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let store: Arc<dyn KeyValueStore> = match &args.store {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    setup_logging(args.log_level, store.clone());

    match args.command {
        Command::Report {
            input,
            month,
            year,
            timezone,
        } => report(&input, month.as_deref(), year, &timezone)?,
        Command::Idle {
            timeout_ms,
            poll_interval_ms,
            user,
            activity_after,
        } => {
            let config = GuardConfig::new(timeout_ms)?.with_poll_interval_ms(poll_interval_ms)?;
            idle(store, config, &user, activity_after).await?;
        }
        Command::Password => password(),
        Command::Logs { clear } => logs(store.as_ref(), clear)?,
    }

    Ok(())
}

fn setup_logging(level: LevelFilter, store: Arc<dyn KeyValueStore>) {
    let stdout_log = tracing_subscriber::fmt::layer().compact();

    let store_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(StoreLogWriter::new(store, Arc::new(SystemClock)));

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(stdout_log.and_then(store_log).with_filter(filter))
        .init();
}

fn report(
    input: &std::path::Path,
    month: Option<&str>,
    year: Option<i32>,
    timezone: &str,
) -> Result<(), accounting_client::Error> {
    let current = Period::current_in(time::OffsetDateTime::now_utc(), timezone)?;
    let year = year.unwrap_or(current.year());
    let period = match month {
        None => Period::new(current.month_number(), year)?,
        Some(month) => match month.trim().parse::<u8>() {
            Ok(number) => Period::new(number, year)?,
            Err(_) => Period::from_month_name(month, year)?,
        },
    };

    let transactions = TransactionSet::select(period, load_transactions(input)?);
    let totals = transactions.totals();

    println!(
        "{} {} ({} transactions)",
        period.month_name(),
        period.year(),
        transactions.len()
    );
    println!("Credits: {:>16}", format_minor_units(totals.total_credits));
    println!("Debits:  {:>16}", format_minor_units(totals.total_debits));
    println!("Total:   {:>16}", format_minor_units(totals.total));
    println!();

    match transactions.balance_series() {
        BalanceSeries::NoData => println!("No data available!"),
        BalanceSeries::Points(points) => {
            for point in points {
                println!("{:<20} {:>16}", point.label, format_minor_units(point.balance));
            }
        }
    }

    Ok(())
}

async fn idle(
    store: Arc<dyn KeyValueStore>,
    config: GuardConfig,
    user: &str,
    mut activity_after: Vec<u64>,
) -> Result<(), accounting_client::Error> {
    let context = Arc::new(SessionContext::with_system_clock(store));
    context.log_in(user, "demo-token")?;

    let hub = ActivityHub::new();
    let guard = SessionGuard::new(
        context,
        Arc::new(hub.clone()),
        Arc::new(|| println!("Redirecting to the log-in page.")),
    )
    .with_config(config);

    let started_at = Instant::now();
    let mut task = GuardTask::spawn(guard);

    activity_after.sort_unstable();
    for offset_ms in activity_after {
        sleep_until(started_at + Duration::from_millis(offset_ms)).await;

        if task.is_finished() {
            tracing::warn!("Session ended before the activity at {offset_ms} ms.");
            break;
        }

        tracing::info!("Simulating activity at {offset_ms} ms.");
        hub.dispatch(ActivityEvent::KeyPress);
    }

    task.finished().await;
    println!(
        "Session for {user} expired after {} ms.",
        started_at.elapsed().as_millis()
    );

    Ok(())
}

fn password() {
    let raw_password = match rpassword::prompt_password("Enter a password: ") {
        Ok(string) => string,
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            exit(1);
        }
    };

    let strength = match password_strength(&raw_password) {
        PasswordStrength::None => "none",
        PasswordStrength::Weak => "weak",
        PasswordStrength::Moderate => "moderate",
        PasswordStrength::Strong => "strong",
    };
    println!("Strength: {strength}");

    let validated_password = match ValidatedPassword::new(&raw_password) {
        Ok(validated_password) => validated_password,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            print_error(format!("Could not hash password: {error}"));
            exit(1);
        }
    };

    let confirmation = match rpassword::prompt_password("Confirm the password: ") {
        Ok(string) => string,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            exit(1);
        }
    };

    match password_hash.verify(&confirmation) {
        Ok(true) => println!("{password_hash}"),
        Ok(false) => {
            print_error("Passwords do not match.");
            exit(1);
        }
        Err(error) => {
            print_error(error);
            exit(1);
        }
    }
}

fn logs(store: &dyn KeyValueStore, clear: bool) -> Result<(), accounting_client::Error> {
    for entry in read_logs(store)? {
        println!("{} {}", entry.timestamp, entry.message);
    }

    if clear {
        clear_logs(store)?;
    }

    Ok(())
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}
