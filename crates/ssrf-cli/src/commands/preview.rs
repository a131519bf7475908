use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use ssrf_core::{Grade, ReviewRequest};

use super::{parse_timestamp, print_json, timestamp_or_now, Context};

#[derive(Args)]
pub struct PreviewArgs {
    /// Unit ID
    id: String,
    /// Review time (RFC 3339 or YYYY-MM-DD, default: now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct GradePreview {
    grade: Grade,
    interval_days: Option<u32>,
    next_review: DateTime<Utc>,
}

pub fn run(args: PreviewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let unit = ctx.db.get_unit(&args.id)?;
    let now = timestamp_or_now(args.at);

    let previews = Grade::all()
        .map(|grade| {
            let request = ReviewRequest::new(grade)
                .with_state(unit.state.clone())
                .with_priority(unit.priority)
                .at(now);
            ctx.scheduler.estimate(&request).map(|outcome| GradePreview {
                grade,
                interval_days: outcome.interval_days,
                next_review: outcome.next_review,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    print_json(&previews)
}
