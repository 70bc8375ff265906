//! studyboard - Learner analytics server and CLI

mod cli;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studyboard_core::source::memory::{demo_records, DEMO_TOKEN, DEMO_USER};
use studyboard_core::{AnalyticsService, Config, MemorySource, SqliteSource, TimeRange, UserId};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "studyboard",
    version,
    about = "Learner analytics for AI-assisted study apps",
    long_about = "Aggregates a learner's tutoring sessions, courses, flashcards, assignments\n\
                  and achievements into the metrics, charts and insights behind the\n\
                  analytics dashboard.\n\
                  \n\
                  Examples:\n\
                    studyboard serve                           # Serve /api/analytics from config\n\
                    studyboard serve --demo                    # Serve a seeded in-memory learner\n\
                    studyboard report --user <id> --range month\n\
                    studyboard report --demo --json            # Full JSON payload\n\
                    studyboard init-db --demo                  # Create and seed a SQLite file\n\
                  \n\
                  Environment Variables:\n\
                    STUDYBOARD_CONFIG                          # Config file path\n\
                    STUDYBOARD_LOG                             # Log level (RUST_LOG wins)\n\
                    STUDYBOARD_API_KEY                         # Backend service key\n\
                    STUDYBOARD_BACKEND_URL                     # Backend project URL"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ~/.config/studyboard/config.toml)
    #[arg(long, global = true, env = "STUDYBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STUDYBOARD_LOG")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Serve a seeded in-memory learner instead of the configured backend
        #[arg(long)]
        demo: bool,
    },
    /// Compute one learner's analytics and print it
    Report {
        /// User ID to report on
        #[arg(long, short = 'u', required_unless_present = "demo")]
        user: Option<String>,
        /// Time range
        #[arg(long, short = 'r', default_value = "week", value_parser = ["week", "month", "quarter"])]
        range: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Disable ANSI colors
        #[arg(long, env = "STUDYBOARD_NO_COLOR")]
        no_color: bool,
        /// Report on the seeded in-memory learner
        #[arg(long)]
        demo: bool,
    },
    /// Create the SQLite schema, optionally seeding the demo learner
    InitDb {
        /// Database file (overrides backend.sqlite_path)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Seed the demo learner and its token
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging.level);

    match cli.command {
        Command::Serve { host, port, demo } => run_serve(config, host, port, demo).await,
        Command::Report {
            user,
            range,
            json,
            no_color,
            demo,
        } => run_report(config, user, &range, json, no_color, demo).await,
        Command::InitDb { path, demo } => run_init_db(config, path, demo),
    }
}

/// Logs go to stderr so `report --json` stays pipeable; `RUST_LOG` wins over config
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(config: &Config, demo: bool) -> Result<AnalyticsService> {
    if demo {
        tracing::info!("Using seeded demo learner");
        return Ok(AnalyticsService::from_backend(MemorySource::demo(Utc::now())));
    }
    AnalyticsService::from_config(config).context("Failed to initialize analytics backend")
}

async fn run_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    demo: bool,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = config.socket_addr()?;
    let service = build_service(&config, demo)?;

    println!("\n🌐 Analytics API: http://{}/api/analytics", addr);
    if demo {
        println!("   Demo token:    Authorization: Bearer {}", DEMO_TOKEN);
    }

    studyboard_web::run(service, addr).await
}

async fn run_report(
    config: Config,
    user: Option<String>,
    range: &str,
    json: bool,
    no_color: bool,
    demo: bool,
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Instant;

    let user = match (user, demo) {
        (Some(user), _) => UserId::from(user),
        (None, true) => UserId::from(DEMO_USER),
        (None, false) => bail!("--user is required unless --demo is set"),
    };
    let range = TimeRange::parse(Some(range));
    let service = build_service(&config, demo)?;

    let start = Instant::now();
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(format!("Fetching records for {}...", user));

    let report = service.report(&user, range).await;
    spinner.finish_and_clear();
    let report = report.with_context(|| format!("Failed to build analytics for {}", user))?;

    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        backend = service.backend_kind(),
        "Report ready"
    );

    println!("{}", cli::format_report(&report, range, json, no_color));
    Ok(())
}

fn run_init_db(config: Config, path: Option<PathBuf>, demo: bool) -> Result<()> {
    let path = path.unwrap_or(config.backend.sqlite_path);
    let source = SqliteSource::init(&path)
        .with_context(|| format!("Failed to initialize database: {}", path.display()))?;

    if demo {
        source
            .seed(&UserId::from(DEMO_USER), &demo_records(Utc::now()), Some(DEMO_TOKEN))
            .context("Failed to seed demo learner")?;
        println!(
            "✓ Seeded demo learner '{}' (token: {}) into {}",
            DEMO_USER,
            DEMO_TOKEN,
            path.display()
        );
    } else {
        println!("✓ Schema ready in {}", path.display());
    }
    Ok(())
}
