use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate, Weekday};
use log::debug;
use serde::Deserialize;
use serde::de::Deserializer;

/// The division of the feed that holidays are taken from. Other divisions are
/// never looked at.
pub const ENGLAND_AND_WALES: &str = "england-and-wales";

const YMD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date. chrono's `%Y` is happy with years like `22`,
/// so the four digit year is checked separately. Single digit months and days
/// are fine.
pub fn parse_ymd_date(s: &str) -> Result<NaiveDate> {
    let year = s.split('-').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        bail!("{s:?} doesn't start with a four digit year");
    }
    NaiveDate::parse_from_str(s, YMD_DATE_FORMAT).with_context(|| format!("parsing date {s:?}"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankHoliday {
    pub date: NaiveDate,
    pub title: Box<str>,
    pub notes: Box<str>,
    /// gov.uk's "should there be bunting" flag. Not used for anything, but it's
    /// there.
    pub bunting: bool,
}

struct FeedDate(NaiveDate);

impl<'de> Deserialize<'de> for FeedDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let date = parse_ymd_date(&s).map_err(|x| serde::de::Error::custom(format!("{x:#}")))?;
        Ok(Self(date))
    }
}

#[derive(Deserialize)]
struct FeedEvent {
    title: String,
    date: FeedDate,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    bunting: bool,
}

#[derive(Deserialize)]
struct FeedDivision {
    events: Vec<FeedEvent>,
}

pub fn get_baseline_bank_holidays_url() -> reqwest::Url {
    reqwest::Url::parse("https://www.gov.uk/bank-holidays.json").unwrap()
}

/// Decodes the gov.uk bank holiday JSON, returning England & Wales' holidays
/// in feed order.
pub fn parse_bank_holidays_json(json: &str) -> Result<Vec<BankHoliday>> {
    // Decode divisions lazily, so junk in a division we don't use can't break us.
    let mut divisions = serde_json::from_str::<HashMap<String, serde_json::Value>>(json)
        .context("decoding bank holidays json")?;

    let Some(division) = divisions.remove(ENGLAND_AND_WALES) else {
        bail!("no {ENGLAND_AND_WALES:?} division in bank holidays json");
    };

    let division = serde_json::from_value::<FeedDivision>(division)
        .with_context(|| format!("decoding {ENGLAND_AND_WALES:?} bank holidays"))?;
    debug!(
        "Decoded {} bank holidays for {ENGLAND_AND_WALES}",
        division.events.len()
    );

    Ok(division
        .events
        .into_iter()
        .map(|e| BankHoliday {
            date: e.date.0,
            title: e.title.into(),
            notes: e.notes.into(),
            bunting: e.bunting,
        })
        .collect())
}

async fn fetch_bank_holidays_json(client: &reqwest::Client, url: reqwest::Url) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .context("getting bank holidays")?;
    let body_text = response.text().await.context("reading response body")?;
    Ok(body_text)
}

pub async fn fetch_bank_holidays(
    client: &reqwest::Client,
    url: reqwest::Url,
) -> Result<Vec<BankHoliday>> {
    let json = fetch_bank_holidays_json(client, url)
        .await
        .context("fetching JSON")?;
    parse_bank_holidays_json(&json)
}

pub fn holiday_dates(holidays: &[BankHoliday]) -> HashSet<NaiveDate> {
    holidays.iter().map(|x| x.date).collect()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts the days in `[start, end]` that are neither weekends nor in
/// `holidays`. That is, working days, despite what callers may go on to do
/// with the number.
pub fn count_non_weekend_non_holiday_days(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HashSet<NaiveDate>,
) -> i64 {
    if start > end {
        return 0;
    }

    let n = start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !is_weekend(*d) && !holidays.contains(d))
        .count();
    n as i64
}
