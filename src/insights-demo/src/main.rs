//! Checkout Insights demo-data CLI.
//!
//! Dispatches a single endpoint through the synthetic engine and prints the
//! JSON response — the same entry point the dashboard's demo-mode route
//! layer calls, exposed for development and contract inspection.

use chrono::{DateTime, Utc};
use clap::Parser;
use insights_core::{DemoConfig, GenerationParams, Period, SystemClock};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "insights-demo")]
#[command(about = "Generate synthetic checkout-analytics responses for demo tenants")]
#[command(version)]
struct Cli {
    /// Endpoint key, e.g. metrics, revenue, analytics-payment, analytics-events
    #[arg(long, default_value = "metrics")]
    endpoint: String,

    /// Tenant account id the data is seeded from
    #[arg(long, default_value = "demo-account")]
    account: String,

    /// Reporting period: today, week, month, year, or custom
    #[arg(long, default_value = "week")]
    period: String,

    /// Window start (RFC 3339), required when period=custom
    #[arg(long)]
    start_date: Option<DateTime<Utc>>,

    /// Window end (RFC 3339), required when period=custom
    #[arg(long)]
    end_date: Option<DateTime<Utc>>,

    /// Extra query parameters as key=value (page, limit, event_type, category, step)
    #[arg(long = "query", value_parser = parse_key_value)]
    query: Vec<(String, String)>,

    /// Pretty-print the JSON response
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insights_demo=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = DemoConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DemoConfig::default()
    });

    let period: Period = cli.period.parse()?;
    let params = GenerationParams {
        account_id: cli.account,
        period,
        start_date: cli.start_date,
        end_date: cli.end_date,
    };
    let query = cli.query.into_iter().collect();

    info!(endpoint = %cli.endpoint, account = %params.account_id, period = period.as_str(), "generating demo response");

    let response = insights_demo_data::handle(
        &cli.endpoint,
        &params,
        &query,
        &SystemClock,
        &config,
    )?;

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", serde_json::to_string(&response)?);
    }

    Ok(())
}
