use chrono::NaiveDate;
use clap::Args;

use super::{print_json, Context};

#[derive(Args)]
pub struct LoadArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,
    /// Only this collection
    #[arg(long)]
    collection: Option<String>,
}

pub fn run(args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let days = ctx
        .db
        .daily_load(args.from, args.to, args.collection.as_deref())?;
    print_json(&days)
}
