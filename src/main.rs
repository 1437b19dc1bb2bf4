use clap::{Parser, Subcommand};
use matchday::adapters::{HttpFetcher, UnconfiguredBrowser};
use matchday::config::LoggingConfig;
use matchday::drivers::{Acquirer, Authenticator, SessionDriver};
use matchday::error::{MatchdayError, Result};
use matchday::{
    AcquisitionPipeline, AppConfig, BotEngine, IdentityPool, QueueDriver, StopController,
    TicketMonitor,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "matchday", about = "Multi-account football ticket acquisition bot")]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config", env = "MATCHDAY_CONFIG_DIR")]
    config_dir: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run continuous monitoring and acquisition
    Run,
    /// One-shot availability probe against the configured target
    Check,
    /// Validate the configuration and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Validate => run_validate(&config),
        Commands::Check => run_check(&config).await,
        Commands::Run => run_bot(config).await,
    }
}

fn run_validate(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            println!("Configuration OK");
            println!("  accounts: {}", config.accounts.len());
            println!("  proxies: {}", config.proxies.len());
            println!("  target: {}", config.target_match_url);
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("Configuration error: {error}");
            }
            Err(MatchdayError::Validation(errors.join("; ")))
        }
    }
}

async fn run_check(config: &AppConfig) -> Result<()> {
    if config.target_match_url.is_empty() {
        return Err(MatchdayError::Validation(
            "target_match_url must be set".to_string(),
        ));
    }

    let identities = IdentityPool::new(config.proxies.iter().cloned());
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_millis(
        config.monitor.fetch_timeout_ms,
    )));
    let monitor = TicketMonitor::new(fetcher);

    let identity = identities.pick_random();
    let available = monitor
        .check_availability(&config.target_match_url, identity.as_deref())
        .await;

    println!(
        "{}: {}",
        config.target_match_url,
        if available { "tickets available" } else { "no tickets" }
    );
    Ok(())
}

async fn run_bot(config: AppConfig) -> Result<()> {
    // Configuration problems are the one fatal startup condition
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {error}");
        }
        return Err(MatchdayError::Validation(errors.join("; ")));
    }

    if config.proxies.is_empty() {
        warn!("No proxies configured; all accounts will share one network identity");
    }

    let identities = Arc::new(IdentityPool::new(config.proxies.iter().cloned()));
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_millis(
        config.monitor.fetch_timeout_ms,
    )));
    let monitor = TicketMonitor::new(fetcher);

    let browser = Arc::new(UnconfiguredBrowser);
    let authenticator: Arc<dyn Authenticator> = browser.clone();
    let session_driver: Arc<dyn SessionDriver> = browser.clone();
    let acquirer: Arc<dyn Acquirer> = browser;

    let queue = Arc::new(QueueDriver::new(session_driver, config.queue.clone()));
    let pipeline = AcquisitionPipeline::new(authenticator, queue, acquirer, identities.clone());
    let engine = BotEngine::new(config, identities, monitor, pipeline);

    let controller = StopController::new();
    let signal = controller.signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt. Shutting down gracefully...");
            controller.stop();
        }
    });

    engine.run(signal).await;
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},matchday=debug", config.level)));

    if config.json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
