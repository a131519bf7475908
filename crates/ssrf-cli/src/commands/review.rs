use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::json;
use ssrf_core::Grade;

use super::{parse_timestamp, print_json, timestamp_or_now, Context};

#[derive(Args)]
pub struct ReviewArgs {
    /// Unit ID
    id: String,
    /// First-answer grade, 0 (not recognized) to 5 (instantly recalled)
    #[arg(long, allow_negative_numbers = true)]
    grade: i32,
    /// Review time (RFC 3339 or YYYY-MM-DD, default: now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
    /// Skip workload balancing and use the longest acceptable interval
    #[arg(long)]
    estimated: bool,
}

pub fn run(args: ReviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let grade = Grade::new(args.grade)?;
    let ctx = Context::open()?;
    let now = timestamp_or_now(args.at);

    let outcome = ctx
        .db
        .review_unit(&ctx.scheduler, &args.id, grade, now, args.estimated)?;

    print_json(&json!({
        "id": args.id,
        "grade": grade,
        "rereview": outcome.is_rereview(),
        "interval_days": outcome.interval_days,
        "window": outcome.window,
        "next_review": outcome.next_review,
        "state": outcome.state,
    }))
}
