//! Learning unit management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use ssrf_core::storage::DEFAULT_COLLECTION;
use ssrf_core::{LearningUnit, LuStatus, Priority};
use uuid::Uuid;

use super::{parse_timestamp, print_json, timestamp_or_now, Context};

#[derive(Subcommand)]
pub enum UnitAction {
    /// Add a new, never reviewed unit
    Add {
        /// Unit ID (default: random UUID)
        #[arg(long)]
        id: Option<String>,
        /// low, medium or high (default: scheduler.default_priority)
        #[arg(long)]
        priority: Option<String>,
        /// Collection the unit is balanced within
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
    },
    /// Show a unit
    Show {
        /// Unit ID
        id: String,
    },
    /// List units
    List {
        /// Only this collection
        #[arg(long)]
        collection: Option<String>,
    },
    /// List units due for review
    Due {
        /// Only this collection
        #[arg(long)]
        collection: Option<String>,
        /// Due at this time (RFC 3339 or YYYY-MM-DD, default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<DateTime<Utc>>,
    },
    /// Delete a unit
    Remove {
        /// Unit ID
        id: String,
    },
    /// Set the lifecycle status of a unit
    Status {
        /// Unit ID
        id: String,
        /// learning, final-drill or memorized
        status: String,
    },
}

pub fn run(action: UnitAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;

    match action {
        UnitAction::Add {
            id,
            priority,
            collection,
        } => {
            let priority = match priority {
                Some(p) => p.parse::<Priority>()?,
                None => ctx.config.scheduler.default_priority,
            };
            let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let unit = LearningUnit::new(id, priority)
                .with_collection(collection)
                .with_state(ctx.scheduler.initial_state());
            ctx.db.insert_unit(&unit)?;
            print_json(&unit)?;
        }
        UnitAction::Show { id } => {
            print_json(&ctx.db.get_unit(&id)?)?;
        }
        UnitAction::List { collection } => {
            print_json(&ctx.db.list_units(collection.as_deref())?)?;
        }
        UnitAction::Due { collection, at } => {
            let at = timestamp_or_now(at);
            print_json(&ctx.db.list_due(collection.as_deref(), at)?)?;
        }
        UnitAction::Remove { id } => {
            ctx.db.delete_unit(&id)?;
            println!("removed {id}");
        }
        UnitAction::Status { id, status } => {
            let status = status.parse::<LuStatus>()?;
            ctx.db.set_status(&id, status)?;
            print_json(&ctx.db.get_unit(&id)?)?;
        }
    }
    Ok(())
}
