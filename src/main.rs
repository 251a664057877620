mod aggregate;
mod api_types;
mod config;
mod drilldown;
mod listing;
mod models;
mod orchestrator;
mod out_models;
mod render;
mod sentiment;
mod store;
mod summary_export;
mod taxonomy;

use anyhow::Result;
use chrono::{Datelike, Utc};
use chrono_tz::Asia::Karachi;
use clap::Parser;
use std::str::FromStr;
use tracing::{debug, info};

use drilldown::DrillSelection;
use listing::ListingQuery;
use orchestrator::{run_report, RunOptions};

/// Review Pulse - bank app review sentiment reports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: String,

    /// Path to config file (overrides REVIEW_PULSE_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<String>,

    /// Render the overview section for one app (exact name)
    #[arg(short, long)]
    app: Option<String>,

    /// Expand one summary entry, e.g. "bank:HBL:negative" or "category:ATM Service"
    #[arg(long)]
    drill: Option<String>,

    /// Include the pre-aggregated summaries listing
    #[arg(long)]
    summaries: bool,

    /// Restrict the summaries listing to one app
    #[arg(long)]
    summaries_app: Option<String>,

    /// Free-text search over the summaries listing
    #[arg(long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting review_pulse");

    let args = Args::parse();

    // Parse the drill selection early so a bad flag fails before any fetch.
    let drill = args
        .drill
        .as_deref()
        .map(DrillSelection::from_str)
        .transpose()?;

    let cfg_path = config::resolve_config_path(args.config.as_deref());
    debug!("Using config file: {}", cfg_path.display());
    let cfg = config::load_config(&cfg_path)?;

    // Date-stamp outputs in the reviews' home timezone.
    let now = Utc::now().with_timezone(&Karachi);
    let today = now.date_naive();
    let ymd = format!("{:04}-{:02}-{:02}", today.year(), today.month(), today.day());
    info!("Run date - date={}, output_dir={}", ymd, args.output_dir);
    debug!(
        "Using Asia/Karachi timezone - current_time={}",
        now.format("%Y-%m-%d %H:%M:%S %Z")
    );

    let listing = if args.summaries || args.summaries_app.is_some() || args.search.is_some() {
        Some(ListingQuery {
            app: args.summaries_app.clone(),
            search: args.search.clone(),
        })
    } else {
        None
    };

    let opts = RunOptions {
        ymd,
        output_dir: args.output_dir.clone(),
        focus_app: args.app.clone(),
        drill,
        listing,
    };

    run_report(&cfg, &opts).await
}
