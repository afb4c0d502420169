//! Augur CLI entry point.

use augur::config::Config;
use augur::report::render_report;
use augur::services::{AnalysisEngine, TelegramNotifier};
use augur::tui::run_dashboard;
use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "augur")]
#[command(about = "LLM-assisted trading signal agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full analysis on a single ticker
    Analyze {
        /// Stock ticker to analyze (e.g. "AAPL")
        ticker: String,

        /// Use canned data instead of calling live APIs
        #[arg(long)]
        mock: bool,

        /// Send the signal to the configured Telegram chat
        #[arg(long)]
        alert: bool,
    },

    /// Display a live-updating dashboard of the watchlist
    Dashboard {
        /// Use canned data instead of calling live APIs
        #[arg(long)]
        mock: bool,
    },
}

/// Exit code for unrecoverable startup errors (missing API key etc.).
const EXIT_STARTUP: i32 = 2;
/// Exit code for a failed analysis.
const EXIT_ANALYSIS: i32 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; log to stderr so the TUI owns stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "augur=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Analyze {
            ticker,
            mock,
            alert,
        } => {
            let engine = build_engine(&config, mock);

            match engine.analyze(&ticker).await {
                Ok(report) => {
                    print!("{}", render_report(&report));

                    if alert {
                        match TelegramNotifier::from_config(&config) {
                            Some(notifier) => notifier.send_alert(&report.signal).await,
                            None => warn!("--alert set but Telegram is not configured"),
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, cause = %e.root_cause(), "analysis failed");
                    std::process::exit(EXIT_ANALYSIS);
                }
            }
        }

        Commands::Dashboard { mock } => {
            let engine = build_engine(&config, mock);
            run_dashboard(engine, &config, mock).await?;
        }
    }

    Ok(())
}

/// Build the engine, treating construction failure (e.g. missing API key in
/// live mode) as a fatal startup error.
fn build_engine(config: &Config, mock: bool) -> AnalysisEngine {
    match AnalysisEngine::from_config(config, mock) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "startup failed");
            std::process::exit(EXIT_STARTUP);
        }
    }
}
