use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser)]
struct Args {
    #[clap(long)]
    debug: bool,
    /// Only print holidays on or after this date (YYYY-MM-DD). Defaults to today.
    #[clap(long)]
    since: Option<NaiveDate>,
}

async fn run(args: Args) -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_utc_timestamps()
        .with_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init()
        .context("initializing logger")?;

    let holidays = bank_holidays::fetch_bank_holidays(
        &reqwest::Client::new(),
        bank_holidays::get_baseline_bank_holidays_url(),
    )
    .await
    .context("fetching bank holidays")?;

    let since = args
        .since
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    for holiday in holidays.iter().filter(|x| x.date >= since) {
        println!("{} {}", holiday.date, holiday.title);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    run(args).await
}
