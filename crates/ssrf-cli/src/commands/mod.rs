pub mod config;
pub mod load;
pub mod preview;
pub mod review;
pub mod unit;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::Serialize;
use ssrf_core::{Config, ReviewDb, SsrfScheduler};
use tracing::debug;

/// Configuration, scheduler and database every unit command needs.
pub struct Context {
    pub config: Config,
    pub scheduler: SsrfScheduler,
    pub db: ReviewDb,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let scheduler = SsrfScheduler::with_config(config.scheduler_config())?;
        let path = config.database_path()?;
        debug!(path = %path.display(), "opening review database");
        let db = ReviewDb::open(&path)?;
        Ok(Self {
            config,
            scheduler,
            db,
        })
    }
}

/// Parse `--at`: RFC 3339, or a plain date meaning midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| format!("invalid timestamp '{value}', expected RFC 3339 or YYYY-MM-DD"))
}

/// `--at` or the current time, in whole seconds.
pub fn timestamp_or_now(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or_else(|| Utc::now().trunc_subsecs(0))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
