use clap::Parser;
use miette::{IntoDiagnostic, Result};
use parking_billing::application::parking::Parking;
use parking_billing::config::{
    DEFAULT_BILLING_INTERVAL_SECS, DEFAULT_CAPACITY, DEFAULT_LOG_PATH,
    DEFAULT_STATUS_INTERVAL_SECS, Settings,
};
use parking_billing::domain::ports::TriggerRef;
use parking_billing::domain::tariff::Tariff;
use parking_billing::infrastructure::file_log::FileLogSink;
use parking_billing::infrastructure::interval_trigger::IntervalTrigger;
use parking_billing::interfaces::menu::session::MenuSession;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of parking places
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Seconds between billing sweeps
    #[arg(long, default_value_t = DEFAULT_BILLING_INTERVAL_SECS)]
    billing_interval_secs: u64,

    /// Seconds between status log entries
    #[arg(long, default_value_t = DEFAULT_STATUS_INTERVAL_SECS)]
    status_interval_secs: u64,

    /// Transaction log file
    #[arg(long, default_value = DEFAULT_LOG_PATH)]
    log_path: PathBuf,
}

impl From<Cli> for Settings {
    fn from(cli: Cli) -> Self {
        Self {
            capacity: cli.capacity,
            billing_interval_secs: cli.billing_interval_secs,
            status_interval_secs: cli.status_interval_secs,
            log_path: cli.log_path,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let settings = Settings::from(Cli::parse());
    settings.validate().into_diagnostic()?;

    let log = Box::new(FileLogSink::new(&settings.log_path));
    let billing_trigger: TriggerRef = Arc::new(IntervalTrigger::new(
        "billing",
        settings.billing_interval().into_diagnostic()?,
    ));
    let status_trigger: TriggerRef = Arc::new(IntervalTrigger::new(
        "status",
        settings.status_interval().into_diagnostic()?,
    ));

    let parking = Parking::open(
        &settings,
        Tariff::default(),
        log,
        billing_trigger.clone(),
        status_trigger.clone(),
    )
    .await
    .into_diagnostic()?;
    info!(log = %settings.log_path.display(), "Parking ready");

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = io::stdout();
    let result = MenuSession::new(&parking, stdout.lock()).run(stdin).await;

    parking.shutdown().await;
    billing_trigger.dispose().await;
    status_trigger.dispose().await;

    result.into_diagnostic()
}
