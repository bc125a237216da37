use anyhow::{Context, Result};
use backup_scheduler::config::{self, Config, ConfigOverrides};
use backup_scheduler::managers::backup::{BackupOrchestrator, OrchestratorOptions};
use backup_scheduler::managers::logging::{self, LoggingConfig};
use backup_scheduler::managers::scheduler::{endpoint_lock_key, BackupJob, JobOutcome, Scheduler};
use backup_scheduler::targets::{clickhouse, BackupTarget, TargetRegistry, TargetSettings};
use backup_scheduler::utils::context::{CancelToken, RunContext};
use backup_scheduler::utils::shutdown;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "backup-scheduler")]
#[command(about = "Scheduler for backup creation")]
#[command(
    long_about = "Daemon that creates, polls and uploads backups through backup-management APIs on a cron schedule"
)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backup-management API endpoint URL [default: http://localhost:7171]
    #[arg(long = "backup.endpoint", value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// Backup schedule in cron notation [default: "0 0 * * *"]
    #[arg(long = "backup.schedule", value_name = "CRON", global = true)]
    schedule: Option<String>,

    /// Seconds between backup status checks [default: 5]
    #[arg(long = "backup.poll-interval", value_name = "SECONDS", global = true)]
    poll_interval: Option<u64>,

    /// Give up waiting for a backup after this many seconds (0 = never) [default: 0]
    #[arg(long = "backup.poll-timeout", value_name = "SECONDS", global = true)]
    poll_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long = "log.level", value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Write rotated log files to this directory
    #[arg(long = "log.directory", value_name = "DIR", global = true)]
    log_directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule clickhouse backups through the clickhouse-backup API
    Clickhouse {
        /// Run a single backup now and exit instead of scheduling
        #[arg(long)]
        once: bool,
    },

    /// Validate configuration and show upcoming backup times
    Validate {
        /// Number of upcoming backup times to show
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// List available backup targets
    Targets,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            schedule: self.schedule.clone(),
            poll_interval_seconds: self.poll_interval,
            poll_timeout_seconds: self.poll_timeout,
            log_level: self.log_level.clone(),
            log_directory: self.log_directory.clone(),
        }
    }

    /// Defaults, then the config file, then command-line flags
    /// Validated once, after the flags are applied
    fn load_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => config::read_config(path)
                .with_context(|| format!("Failed to load config file {:?}", path))?,
            None => Config::default(),
        };

        Ok(base.with_overrides(self.overrides())?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands that don't require a config - use simple console logging
    if let Commands::Targets = cli.command {
        logging::init_console_logging();
        return handle_targets();
    }

    let config = cli.load_config()?;

    // Setup logging (must keep guard alive)
    let _log_guard = logging::init_logging(&LoggingConfig::from_settings(&config.logging))?;

    match cli.command {
        Commands::Clickhouse { once } => run_target(clickhouse::KIND, &config, once),
        Commands::Validate { count } => handle_validate(&config, count),
        Commands::Targets => handle_targets(),
    }
}

/// Build the adapter for `kind` and either run once or start the daemon
fn run_target(kind: &str, config: &Config, once: bool) -> Result<()> {
    let endpoint = config::parse_endpoint(&config.backup.endpoint)?;
    let schedule = config::parse_schedule(&config.backup.schedule)?;

    let settings = TargetSettings::new(endpoint.clone())
        .with_request_timeout(config.backup.request_timeout());
    let target: Arc<dyn BackupTarget> = TargetRegistry::builtin().build(kind, &settings)?.into();

    let orchestrator = BackupOrchestrator::new(
        target,
        OrchestratorOptions {
            poll_interval: config.backup.poll_interval(),
            poll_timeout: config.backup.poll_timeout(),
        },
    );
    let job = BackupJob::new(orchestrator, config::expand_tilde(&config.backup.lock_directory))
        .with_lock_key(endpoint_lock_key(kind, &endpoint));

    let token = CancelToken::new();
    let _signals = shutdown::install(token.clone())?;

    info!("Using {} backup API at {}", kind, endpoint);

    if once {
        return match job.execute(&RunContext::with_token(token)) {
            JobOutcome::Completed(report) => {
                println!("✓ Backup '{}' created and uploaded", report.name);
                Ok(())
            }
            JobOutcome::Failed(e) => Err(anyhow::Error::new(e).context("Backup run failed")),
            JobOutcome::Skipped => anyhow::bail!("Another backup run is already in progress"),
        };
    }

    let scheduler = Scheduler::new(schedule, token);
    scheduler.run(|ctx| {
        // Outcomes are logged by the job; the daemon keeps running
        job.execute(ctx);
    });

    Ok(())
}

/// Handle validate command
fn handle_validate(config: &Config, count: usize) -> Result<()> {
    let schedule = config::parse_schedule(&config.backup.schedule)?;

    println!("Configuration is valid!");
    println!("Endpoint: {}", config.backup.endpoint);
    println!("Schedule: {}", schedule);
    println!("Poll interval: {} seconds", config.backup.poll_interval_seconds);
    match config.backup.poll_timeout() {
        Some(timeout) => println!("Poll timeout: {} seconds", timeout.as_secs()),
        None => println!("Poll timeout: unbounded"),
    }
    println!();

    println!("Next backups:");
    for tick in schedule.upcoming(Local::now()).take(count) {
        println!("  {}", tick.format("%Y-%m-%d %H:%M %Z"));
    }

    Ok(())
}

/// Handle targets command (doesn't require config)
fn handle_targets() -> Result<()> {
    for kind in TargetRegistry::builtin().kinds() {
        println!("{}", kind);
    }
    Ok(())
}
