//! # SSRF Core Library
//!
//! Spaced repetition scheduling with workload balancing. Every graded review
//! of a learning unit yields its next review date such that the unit is
//! rehearsed at expanding intervals while the whole collection's daily
//! workload and average difficulty stay level.
//!
//! All operations are also available through the standalone `ssrf-cli`
//! binary, a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Scheduler**: interval formula, difficulty estimate, load coefficients
//!   and the workload balancer behind [`SsrfScheduler::schedule`]
//! - **Provider**: [`GlobalDataProvider`], the lazily queried per-day
//!   aggregates of a collection
//! - **Status**: optional learning unit lifecycle on top of the scheduler
//! - **Storage**: SQLite review store and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SsrfScheduler`]: Computes the next review and the updated state
//! - [`LuState`]: Persisted per-unit scheduling parameters
//! - [`ReviewDb`]: Learning unit persistence, doubling as a provider
//! - [`Config`]: Application configuration management

pub mod error;
pub mod provider;
pub mod scheduler;
pub mod status;
pub mod storage;
pub mod types;

pub use error::{ConfigError, ContractError, CoreError, DatabaseError, ProviderError};
pub use provider::{FixedSeriesProvider, GlobalDataProvider, ProviderCall, SeriesKind};
pub use scheduler::{IntervalWindow, ReviewRequest, ScheduleOutcome, SchedulerConfig, SsrfScheduler};
pub use status::{schedule_with_status, LuStatus};
pub use storage::{Config, DayLoad, LearningUnit, ReviewDb};
pub use types::{Grade, LuState, Priority};
