//! Surebet scanner entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use surebet::api::{create_router, AppState, SurebetQuery};
use surebet::config::Config;
use surebet::metrics;
use surebet::notify::{format_opportunities, TelegramNotifier};
use surebet::odds::{OddsFeed, OddsSource};
use surebet::scanner::Scanner;
use surebet::utils::shutdown_signal;

/// Two-way sports surebet scanner.
#[derive(Parser, Debug)]
#[command(name = "surebet")]
#[command(about = "Scan bookmaker odds for two-way surebets and compute stake splits")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and scan periodically (default).
    Run {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one scan and print the results.
    Scan {
        /// Comma-separated sport names or keys to keep.
        #[arg(long)]
        sport: Option<String>,

        /// Minimum ROI in percent.
        #[arg(long)]
        min_roi: Option<Decimal>,

        /// Look-ahead window in days.
        #[arg(long)]
        days: Option<u32>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,

        /// Total stake.
        #[arg(long)]
        stake: Option<Decimal>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("surebet=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Scan {
            sport,
            min_roi,
            days,
            limit,
            stake,
        }) => {
            let query = SurebetQuery {
                sport,
                min_roi,
                days,
                limit,
                stake,
            };
            cmd_scan(query).await
        }
        Some(Command::Run { port }) => cmd_run(port).await,
        None => cmd_run(args.port).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> anyhow::Result<Config> {
    info!("Loading configuration...");
    let config = Config::load_validated().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SUREBET SCANNER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Odds API: {}", config.odds_api_url);
    println!("  Sports: {}", config.sports.join(", "));
    println!("  Regions: {}", config.regions.join(", "));
    if config.friendly_bookmakers.is_empty() {
        println!("  Bookmakers: all");
    } else {
        println!(
            "  Bookmakers: {} (fallback: {})",
            config.friendly_bookmakers.join(", "),
            if config.bookmaker_fallback { "all" } else { "skip" }
        );
    }
    println!("  Total Stake: {}", config.total_stake);
    println!("  Min ROI: {}%", config.min_roi);
    println!("  Days Window: {}", config.days_window);
    println!("  Max Results: {}", config.max_results);
    println!("  Rank Order: {}", config.rank_order);
    println!("  Scan Interval: {}s", config.fetch_interval);
    println!("  Cache TTL: {}s", config.cache_ttl_seconds);
    println!("  Log Level: {}{}", config.rust_log, if config.verbose { " (verbose)" } else { "" });
    println!(
        "  Telegram: {}",
        if config.telegram_enabled() { "Enabled" } else { "Disabled" }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run one scan and print the formatted results.
async fn cmd_scan(query: SurebetQuery) -> anyhow::Result<()> {
    let config = load_config()?;
    let params = query.apply(&config.scan_params());
    let scanner = Scanner::new(OddsFeed::from_config(&config)?, params.clone());

    let report = scanner.scan_with(&params).await?;

    println!("======================================================================");
    println!(
        "SUREBETS - {} events scanned, {} found",
        report.events_considered,
        report.opportunities.len()
    );
    if !report.failed_sports.is_empty() {
        println!("Unavailable sports: {}", report.failed_sports.join(", "));
    }
    println!("======================================================================");
    println!("{}", format_opportunities(&report.opportunities));

    Ok(())
}

/// Serve the HTTP API and run the periodic scan loop.
async fn cmd_run(port: Option<u16>) -> anyhow::Result<()> {
    let config = load_config()?;
    let port = port.unwrap_or(config.port);

    info!("Configuration loaded successfully");
    info!("Sports: {}", config.sports.join(", "));
    info!("Total stake: {}", config.total_stake);
    info!("Min ROI: {}%", config.min_roi);
    info!("Scan interval: {}s", config.fetch_interval);

    // Metrics
    let mut app_state = AppState::new(config.scan_params());
    match metrics::install_prometheus() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let notifier = TelegramNotifier::from_config(&config);
    if notifier.is_none() {
        info!("Telegram notifications disabled");
    }
    let scanner =
        Scanner::new(OddsFeed::from_config(&config)?, config.scan_params()).with_notifier(notifier);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    info!("========================================");
    info!("SUREBET SCANNER STARTED");
    info!("========================================");

    let mut ticker = tokio::time::interval(config.scan_interval());
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => run_cycle(&scanner, &app_state).await,
        }
    }

    let _ = shutdown_tx.send(true);
    server_handle.await??;

    let stats = app_state.stats.read().await;
    info!("========================================");
    info!("SHUTDOWN - scans: {}, failures: {}", stats.scans, stats.failures);
    info!("========================================");

    Ok(())
}

/// One scan cycle: scan, publish to the API, notify.
async fn run_cycle<S: OddsSource>(scanner: &Scanner<S>, app_state: &AppState) {
    let report = match scanner.scan().await {
        Ok(report) => report,
        Err(e) => {
            warn!("Scan failed: {}", e);
            app_state.record_failure(&e.to_string()).await;
            return;
        }
    };

    app_state.record_scan(&report).await;

    if report.opportunities.is_empty() {
        info!("No surebets among {} events", report.events_considered);
        return;
    }

    if scanner.has_notifier() {
        match scanner.notify_top(&report).await {
            Ok(true) => info!("Top surebet sent to Telegram"),
            Ok(false) => {}
            Err(e) => warn!("Notification failed: {}", e),
        }
    }
}
