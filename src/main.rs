use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulsecast::breaking::FingerprintGate;
use pulsecast::config::Config;
use pulsecast::delivery::{deliver, Channel, LogChannel, TelegramChannel};
use pulsecast::engine::ContentEngine;
use pulsecast::poller::BackgroundPoller;
use pulsecast::providers::MarketData;
use pulsecast::render::Composer;
use pulsecast::scheduler::{parse_jobs, Category, JitteredScheduler, PostKind};

#[derive(Parser)]
#[command(
    name = "pulsecast",
    version,
    about = "Scheduled crypto market broadcaster with breaking-news alerts",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the breaking news monitor until Ctrl-C
    Run {
        /// Log posts instead of sending them
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Skip the startup welcome post
        #[arg(long, default_value = "false")]
        no_welcome: bool,
    },

    /// Probe every provider chain once and report where data came from
    Check,

    /// Render one job's post to stdout without publishing
    Preview {
        /// Job kind, e.g. market_open
        job: String,
    },

    /// Print today's jittered timetable
    Schedule,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);

    // Initialize tracing/logging
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("pulsecast starting");

    match cli.command {
        Commands::Run {
            dry_run,
            no_welcome,
        } => {
            tracing::info!(dry_run = %dry_run, "Starting run command");
            config.validate(!dry_run)?;
            run(config, dry_run, no_welcome).await?;
        }

        Commands::Check => {
            tracing::info!("Starting check command");
            config.validate(false)?;
            check(&config).await?;
        }

        Commands::Preview { job } => {
            tracing::info!(job = %job, "Starting preview command");
            config.validate(false)?;
            preview(&config, &job).await?;
        }

        Commands::Schedule => {
            tracing::info!("Starting schedule command");
            config.validate(false)?;
            schedule(&config)?;
        }
    }

    tracing::info!("pulsecast finished");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("pulsecast=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("pulsecast={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn market(config: &Config) -> Result<Arc<MarketData>> {
    let market = MarketData::from_config(
        &config.providers,
        &config.cache,
        config.utc_offset()?,
        config.content.catalog().etf_updates,
        config.content.max_remember,
    )
    .context("Failed to build provider chains")?;
    Ok(Arc::new(market))
}

fn channel(config: &Config, dry_run: bool) -> Result<Arc<dyn Channel>> {
    if dry_run {
        return Ok(Arc::new(LogChannel::new()));
    }
    let telegram =
        TelegramChannel::new(config.channel.telegram()).context("Failed to create Telegram channel")?;
    Ok(Arc::new(telegram))
}

async fn run(config: Config, dry_run: bool, no_welcome: bool) -> Result<()> {
    let market = market(&config)?;
    let channel = channel(&config, dry_run)?;
    let composer = Arc::new(Composer::new(&config.channel.channel_name)?);

    let mut engine = ContentEngine::new(
        market.clone(),
        composer.clone(),
        channel.clone(),
        config.content.catalog(),
        config.content.engine_options(),
    )?;

    let jobs = parse_jobs(&config.schedule.jobs)?;
    let mut scheduler = JitteredScheduler::new(jobs, config.utc_offset()?, &mut rand::thread_rng());

    if config.channel.send_welcome && !no_welcome {
        let text = engine.welcome()?;
        let status = deliver(channel.as_ref(), &text, Category::System).await;
        tracing::info!(status = %status, "Welcome post");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let shutdown = async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl-C received, shutting down"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    };

    let scheduled = scheduler.run(&mut engine, config.poll_interval(), shutdown_rx.clone());

    if config.breaking.enabled {
        let poller = BackgroundPoller::new(
            market,
            Arc::new(FingerprintGate::new(config.breaking.gate())),
            composer,
            channel,
            config.breaking.poller(),
        );
        tokio::join!(shutdown, scheduled, poller.run(shutdown_rx));
    } else {
        tracing::info!("Breaking news monitor disabled");
        tokio::join!(shutdown, scheduled);
    }

    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    let market = market(config)?;

    println!("Probing provider chains...");
    let mut live = 0;
    let reports = market.probe().await;
    for report in &reports {
        if !report.provenance.is_synthetic() {
            live += 1;
        }
        println!(
            "  {:<10} [{}] -> {}",
            report.chain,
            report.providers.join(", "),
            report.provenance
        );
    }
    println!("{live}/{} chains live", reports.len());

    Ok(())
}

async fn preview(config: &Config, job: &str) -> Result<()> {
    let kind = PostKind::parse(job).with_context(|| {
        let known: Vec<&str> = PostKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("Unknown job '{job}', expected one of: {}", known.join(", "))
    })?;

    let mut engine = ContentEngine::new(
        market(config)?,
        Arc::new(Composer::new(&config.channel.channel_name)?),
        Arc::new(LogChannel::new()),
        config.content.catalog(),
        config.content.engine_options(),
    )?;

    let text = engine.compose(kind).await?;
    println!("{text}");
    Ok(())
}

fn schedule(config: &Config) -> Result<()> {
    let offset = config.utc_offset()?;
    let jobs = parse_jobs(&config.schedule.jobs)?;
    let mut scheduler = JitteredScheduler::new(jobs, offset, &mut rand::thread_rng());
    scheduler.arm(Utc::now().with_timezone(&offset));

    println!("Timetable (UTC{}):", config.schedule.utc_offset);
    for entry in scheduler.timetable() {
        println!("  {entry}");
    }
    Ok(())
}
