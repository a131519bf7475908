//! Learning unit lifecycle on top of the scheduler.
//!
//! A unit starts in [`LuStatus::Learning`]. Moving it to the final drill or
//! marking it memorized is always an explicit caller decision; no grade
//! triggers it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{ContractError, Result};
use crate::provider::GlobalDataProvider;
use crate::scheduler::{ReviewRequest, ScheduleOutcome, SsrfScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LuStatus {
    #[default]
    Learning,
    /// Last pass before the unit is considered memorized
    FinalDrill,
    /// Next review is frozen
    Memorized,
}

impl LuStatus {
    /// Next status, or `None` once memorized.
    pub fn promote(self) -> Option<LuStatus> {
        match self {
            LuStatus::Learning => Some(LuStatus::FinalDrill),
            LuStatus::FinalDrill => Some(LuStatus::Memorized),
            LuStatus::Memorized => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LuStatus::Learning => "learning",
            LuStatus::FinalDrill => "final-drill",
            LuStatus::Memorized => "memorized",
        }
    }
}

impl fmt::Display for LuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LuStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "learning" => Ok(LuStatus::Learning),
            "final-drill" => Ok(LuStatus::FinalDrill),
            "memorized" => Ok(LuStatus::Memorized),
            other => Err(format!(
                "unknown status '{other}', expected learning, final-drill or memorized"
            )),
        }
    }
}

/// Schedule a unit taking its status into account.
///
/// A memorized unit only records the review time and keeps its next review;
/// the provider is not consulted. Every other status schedules normally.
pub fn schedule_with_status<P: GlobalDataProvider + ?Sized>(
    scheduler: &SsrfScheduler,
    status: LuStatus,
    provider: &P,
    request: &ReviewRequest,
    user_context: Option<&P::UserContext>,
) -> Result<ScheduleOutcome> {
    if status != LuStatus::Memorized {
        return scheduler.schedule(provider, request, user_context);
    }

    let mut state = request
        .state
        .clone()
        .unwrap_or_else(|| scheduler.initial_state());
    state.validate()?;
    let next_review = state.next_review.ok_or(ContractError::MissingNextReview)?;

    debug!(%next_review, "memorized unit keeps its next review");
    state.last_review = Some(request.now.unwrap_or_else(Utc::now));
    Ok(ScheduleOutcome {
        next_review,
        state,
        interval_days: None,
        window: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FixedSeriesProvider;
    use crate::types::{Grade, LuState};
    use chrono::{Duration, TimeZone};

    #[test]
    fn promotion_is_sequential() {
        assert_eq!(LuStatus::default(), LuStatus::Learning);
        assert_eq!(LuStatus::Learning.promote(), Some(LuStatus::FinalDrill));
        assert_eq!(LuStatus::FinalDrill.promote(), Some(LuStatus::Memorized));
        assert_eq!(LuStatus::Memorized.promote(), None);
    }

    #[test]
    fn status_parses_cli_spellings() {
        assert_eq!("final-drill".parse::<LuStatus>().unwrap(), LuStatus::FinalDrill);
        assert_eq!("FINAL_DRILL".parse::<LuStatus>().unwrap(), LuStatus::FinalDrill);
        assert_eq!("memorized".parse::<LuStatus>().unwrap(), LuStatus::Memorized);
        assert!("done".parse::<LuStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&LuStatus::FinalDrill).unwrap(),
            "\"final-drill\""
        );
    }

    #[test]
    fn memorized_unit_keeps_next_review() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap();
        let frozen = now + Duration::days(90);
        let state = LuState {
            num_reviews: 7,
            avg_grade: 4.6,
            difficulty: 0.2,
            last_review: Some(now - Duration::days(60)),
            next_review: Some(frozen),
        };
        let provider = FixedSeriesProvider::new(vec![], vec![]);
        let request = ReviewRequest::new(Grade::new(1).unwrap())
            .with_state(state)
            .at(now);

        let outcome = schedule_with_status(
            &SsrfScheduler::new(),
            LuStatus::Memorized,
            &provider,
            &request,
            None,
        )
        .unwrap();

        assert_eq!(outcome.next_review, frozen);
        assert_eq!(outcome.state.num_reviews, 7);
        assert_eq!(outcome.state.last_review, Some(now));
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn memorized_unit_without_next_review_fails() {
        let provider = FixedSeriesProvider::new(vec![], vec![]);
        let request = ReviewRequest::new(Grade::new(4).unwrap()).with_state(LuState::new());
        let err = schedule_with_status(
            &SsrfScheduler::new(),
            LuStatus::Memorized,
            &provider,
            &request,
            None,
        )
        .unwrap_err();
        assert_eq!(err.as_contract(), Some(&ContractError::MissingNextReview));
    }

    #[test]
    fn other_statuses_schedule_normally() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap();
        for status in [LuStatus::Learning, LuStatus::FinalDrill] {
            let provider = FixedSeriesProvider::new(vec![0], vec![]);
            let request = ReviewRequest::new(Grade::new(0).unwrap()).at(now);
            let outcome =
                schedule_with_status(&SsrfScheduler::new(), status, &provider, &request, None)
                    .unwrap();
            assert_eq!(outcome.state.num_reviews, 2);
            assert_eq!(provider.calls().len(), 1);
        }
    }
}
