use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

mod projects;
mod report;
mod staleness;

use projects::Project;

const DEFAULT_ORG_TO_DESTROY: &str = "organizations/please enter you org id";

#[derive(Parser)]
#[command(about = "Prints the tiers of feature environments that are due for reaping")]
struct Args {
    /// Prints all feature environments, regardless of whether they should be reaped.
    #[arg(short = 'l', long)]
    list_feature_envs: bool,
    /// Organization whose projects are inspected, e.g. `organizations/1234`.
    #[arg(long, env = "ORG_TO_DESTROY", default_value = DEFAULT_ORG_TO_DESTROY)]
    org: String,
    /// OAuth access token for Resource Manager, e.g. from `gcloud auth print-access-token`.
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// Projects idle for more than this many days are reaped.
    #[arg(long, default_value_t = 2)]
    inactive_days: i64,
}

fn new_reqwest_client() -> Result<reqwest::Client> {
    Ok(reqwest::ClientBuilder::new()
        // Neither gov.uk nor Resource Manager should need anywhere near this.
        .timeout(Duration::from_secs(60))
        .build()?)
}

fn init_logger_or_die() {
    // Everything goes to stderr; stdout is reserved for tiers.
    let mut logger = simple_logger::SimpleLogger::new()
        .with_utc_timestamps()
        .with_level(log::LevelFilter::Warn);
    // Hyper and reqwest give a lot of `DEBUG` information.
    let our_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    for module in ["feature_env_reaper", "bank_holidays"] {
        logger = logger.with_module_level(module, our_level);
    }
    logger.init().unwrap();
}

// Checked by hand rather than by clap, so a missing token fails like any other
// setup error.
fn require_access_token(access_token: Option<String>) -> Result<String> {
    match access_token {
        Some(x) if !x.is_empty() => Ok(x),
        _ => bail!("no access token; pass --access-token or set GOOGLE_OAUTH_ACCESS_TOKEN"),
    }
}

async fn run(args: Args) -> Result<()> {
    let access_token = require_access_token(args.access_token)?;
    let client = new_reqwest_client()?;
    let holidays = bank_holidays::fetch_bank_holidays(
        &client,
        bank_holidays::get_baseline_bank_holidays_url(),
    )
    .await
    .context("fetching bank holidays")?;
    let holidays = bank_holidays::holiday_dates(&holidays);

    let resource_manager = projects::ResourceManager::new(client, access_token);
    let projects: Vec<Project> = resource_manager
        .list_projects(&args.org)
        .await
        .with_context(|| format!("listing projects in {}", args.org))?
        .into_iter()
        .filter(|x| !staleness::is_ignored(x))
        .collect();

    if args.list_feature_envs {
        for tier in report::feature_env_tiers(&projects) {
            println!("{tier}");
        }
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let stale_projects: Vec<&Project> = projects
        .iter()
        .filter(|x| staleness::is_stale(x, &holidays, args.inactive_days, today))
        .collect();
    info!(
        "Out of {} projects, {} need reaping.",
        projects.len(),
        stale_projects.len()
    );

    for tier in report::reapable_tiers(&stale_projects) {
        println!("{tier}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logger_or_die();
    run(Args::parse()).await
}
