//! SSRF review scheduler.
//!
//! Computes the next review of a learning unit so that:
//! - the unit itself is reviewed within its acceptable interval (expanding
//!   rehearsal, overlearning avoidance)
//! - the collection's daily workload and average difficulty stay as flat as
//!   possible (cognitive load avoidance)
//!
//! Steps for one graded review:
//! 1. `Imax = SSRF(n, AG(n-1), G(n), P)` and `Imin = SSRF(n, AG(n-1), G(n) - 1, P)`
//! 2. Pick the ideal interval in `[Imin, Imax]` with [`WorkloadBalancer`]
//!    (or take `Imax` in estimated mode)
//! 3. Update review count, average grade and difficulty
//!
//! A unit graded again within 24 hours of its last review keeps its
//! parameters; only its next review may be pushed out to a day from now.

mod balancer;
mod difficulty;
mod formula;
mod load;

pub use balancer::{last_zero_workload_index, max_load_reduction_index, IntervalWindow, WorkloadBalancer};
pub use difficulty::{difficulty, ideal_interval};
pub use formula::{interval, LOWER_BOUND_GRADE, OVERLEARNING_CORRECTION};
pub use load::{load_coeff, load_coeffs};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ContractError, ProviderError, Result};
use crate::provider::GlobalDataProvider;
use crate::types::{validate_avg_grade, Grade, LuState, Priority};

/// Longest accepted re-review window: one year.
pub const MAX_REREVIEW_WINDOW_HOURS: i64 = 24 * 365;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Average grade assumed for a unit that was never graded
    pub initial_avg_grade: f64,
    /// A review this soon after the previous one does not count as a new session
    pub rereview_window_hours: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_avg_grade: LuState::DEFAULT_AVG_GRADE,
            rereview_window_hours: 24,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        validate_avg_grade(self.initial_avg_grade)?;
        if !(0..=MAX_REREVIEW_WINDOW_HOURS).contains(&self.rereview_window_hours) {
            return Err(ContractError::InvalidRereviewWindow(self.rereview_window_hours));
        }
        Ok(())
    }
}

/// Input of a single `schedule` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRequest {
    pub grade: Grade,
    /// `None` for a unit reviewed for the first time
    pub state: Option<LuState>,
    pub priority: Priority,
    /// Defaults to the current time
    pub now: Option<DateTime<Utc>>,
    /// Skip workload balancing and use the maximum acceptable interval
    pub estimated: bool,
}

impl ReviewRequest {
    pub fn new(grade: Grade) -> Self {
        Self {
            grade,
            state: None,
            priority: Priority::default(),
            now: None,
            estimated: false,
        }
    }

    pub fn with_state(mut self, state: LuState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn estimated(mut self) -> Self {
        self.estimated = true;
        self
    }
}

/// Result of a `schedule` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleOutcome {
    pub next_review: DateTime<Utc>,
    pub state: LuState,
    /// Days from today; `None` when the call was a same-day re-review
    pub interval_days: Option<u32>,
    /// Acceptable window searched by the balancer
    pub window: Option<IntervalWindow>,
}

impl ScheduleOutcome {
    pub fn is_rereview(&self) -> bool {
        self.interval_days.is_none()
    }
}

/// SSRF scheduler. Holds only configuration; every call is independent.
#[derive(Debug, Clone, Default)]
pub struct SsrfScheduler {
    config: SchedulerConfig,
}

impl SsrfScheduler {
    /// Create a new scheduler with default config
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Parameters of a unit that has never been graded.
    pub fn initial_state(&self) -> LuState {
        LuState::with_avg_grade(self.config.initial_avg_grade)
    }

    /// Calculate the next review of a learning unit.
    ///
    /// # Arguments
    /// * `provider` - Per-day aggregates of the whole collection
    /// * `request` - Grade, current state, priority, time and mode
    /// * `user_context` - Forwarded unchanged to `provider`
    ///
    /// # Errors
    /// Contract violations of the inputs, of the provider's series or of the
    /// computed state, and provider failures. Nothing is returned on error.
    pub fn schedule<P: GlobalDataProvider + ?Sized>(
        &self,
        provider: &P,
        request: &ReviewRequest,
        user_context: Option<&P::UserContext>,
    ) -> Result<ScheduleOutcome> {
        let mut state = request
            .state
            .clone()
            .unwrap_or_else(|| self.initial_state());
        debug!(?state, grade = %request.grade, priority = %request.priority, "input LU data");

        state.validate()?;

        let now = request.now.unwrap_or_else(Utc::now);
        let today = now.date_naive();

        if let Some(last_review) = state.last_review {
            let window_start = now
                .checked_sub_signed(self.rereview_window()?)
                .ok_or(ContractError::InvalidRereviewWindow(self.config.rereview_window_hours))?;
            if last_review >= window_start {
                return Ok(self.rereview(state, now)?);
            }
        }

        let grade = request.grade.value();
        let max_interval = interval(state.num_reviews, state.avg_grade, grade, request.priority)?;

        let (ideal_interval, window) = if request.estimated {
            (max_interval, None)
        } else {
            let min_interval =
                interval(state.num_reviews, state.avg_grade, grade - 1, request.priority)?;
            debug!(min_interval, max_interval, "min/max acceptable intervals");
            let window = IntervalWindow::new(min_interval, max_interval)?;
            let ideal = WorkloadBalancer::new(provider).find_ideal_interval(
                window,
                state.num_reviews,
                request.priority,
                today,
                user_context,
            )?;
            if !(window.min..=window.max).contains(&ideal) {
                return Err(ContractError::InvalidInterval(ideal as i64).into());
            }
            (ideal, Some(window))
        };

        let next_review = at_time_of(balancer::add_days(today, ideal_interval)?, now);

        let old_num_reviews = state.num_reviews;
        let new_num_reviews = old_num_reviews
            .checked_add(1)
            .ok_or(ContractError::NumReviewsOverflow(old_num_reviews))?;
        state.avg_grade = (state.avg_grade * old_num_reviews as f64 + grade as f64)
            / new_num_reviews as f64;
        state.difficulty = difficulty(old_num_reviews, request.priority, ideal_interval)?;
        state.num_reviews = new_num_reviews;
        state.last_review = Some(now);
        state.next_review = Some(next_review);

        debug!(?state, "output LU data");
        state.validate()?;

        info!(
            interval = ideal_interval,
            %next_review,
            estimated = request.estimated,
            "scheduled review"
        );
        Ok(ScheduleOutcome {
            next_review,
            state,
            interval_days: Some(ideal_interval),
            window,
        })
    }

    /// Estimated next review without any global data.
    ///
    /// Same as [`schedule`](Self::schedule) in estimated mode; cheap enough
    /// for previews.
    pub fn estimate(&self, request: &ReviewRequest) -> Result<ScheduleOutcome> {
        let request = request.clone().estimated();
        self.schedule(&NoGlobalData, &request, None)
    }

    fn rereview_window(&self) -> Result<Duration, ContractError> {
        Duration::try_hours(self.config.rereview_window_hours)
            .ok_or(ContractError::InvalidRereviewWindow(self.config.rereview_window_hours))
    }

    fn rereview(&self, mut state: LuState, now: DateTime<Utc>) -> Result<ScheduleOutcome, ContractError> {
        debug!("already reviewed within {}h", self.config.rereview_window_hours);
        let earliest = now
            .checked_add_signed(self.rereview_window()?)
            .ok_or(ContractError::InvalidRereviewWindow(self.config.rereview_window_hours))?;
        state.last_review = Some(now);
        let next_review = match state.next_review {
            Some(next) if next > earliest => next,
            _ => earliest,
        };
        state.next_review = Some(next_review);
        Ok(ScheduleOutcome {
            next_review,
            state,
            interval_days: None,
            window: None,
        })
    }
}

fn at_time_of(day: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(now.time()))
}

/// Provider for estimated mode, which never queries global data.
struct NoGlobalData;

impl GlobalDataProvider for NoGlobalData {
    type UserContext = ();

    fn get_workloads(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
        _user_context: Option<&()>,
    ) -> Result<Vec<i64>, ProviderError> {
        Err("no global data available in estimated mode".into())
    }

    fn get_avg_difficulties(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
        _user_context: Option<&()>,
    ) -> Result<Vec<f64>, ProviderError> {
        Err("no global data available in estimated mode".into())
    }
}
