//! Access to data that is not associated with the learning unit being
//! scheduled.
//!
//! The workload balancer needs per-day summaries of the whole collection. It
//! only learns which days it needs after computing the acceptable interval
//! window, so the summaries are fetched lazily through this trait.

use chrono::NaiveDate;
use std::cell::RefCell;

use crate::error::ProviderError;

/// Per-day aggregates over every learning unit in a collection.
///
/// Both methods return one value per calendar day in `[from, to]`, both ends
/// inclusive, in date order. `user_context` is forwarded unchanged from the
/// `schedule` caller.
pub trait GlobalDataProvider {
    /// Identifies whose schedule to query (a user, a collection, ...).
    type UserContext: ?Sized;

    /// Number of units already scheduled on each day.
    fn get_workloads(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&Self::UserContext>,
    ) -> Result<Vec<i64>, ProviderError>;

    /// Mean difficulty of the units scheduled on each day.
    fn get_avg_difficulties(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&Self::UserContext>,
    ) -> Result<Vec<f64>, ProviderError>;
}

impl<P: GlobalDataProvider + ?Sized> GlobalDataProvider for &P {
    type UserContext = P::UserContext;

    fn get_workloads(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&Self::UserContext>,
    ) -> Result<Vec<i64>, ProviderError> {
        (**self).get_workloads(from, to, user_context)
    }

    fn get_avg_difficulties(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&Self::UserContext>,
    ) -> Result<Vec<f64>, ProviderError> {
        (**self).get_avg_difficulties(from, to, user_context)
    }
}

/// Which provider method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Workloads,
    AvgDifficulties,
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub kind: SeriesKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub user_context: Option<String>,
}

/// Provider returning canned series and recording every call.
///
/// Useful for previews, tests and callers that already hold the aggregates.
/// Series are returned as given, whatever window is requested.
#[derive(Debug, Default)]
pub struct FixedSeriesProvider {
    workloads: Vec<i64>,
    avg_difficulties: Vec<f64>,
    calls: RefCell<Vec<ProviderCall>>,
}

impl FixedSeriesProvider {
    pub fn new(workloads: Vec<i64>, avg_difficulties: Vec<f64>) -> Self {
        Self {
            workloads,
            avg_difficulties,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_of(&self, kind: SeriesKind) -> Vec<ProviderCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    fn record(&self, kind: SeriesKind, from: NaiveDate, to: NaiveDate, ctx: Option<&str>) {
        self.calls.borrow_mut().push(ProviderCall {
            kind,
            from,
            to,
            user_context: ctx.map(str::to_string),
        });
    }
}

impl GlobalDataProvider for FixedSeriesProvider {
    type UserContext = str;

    fn get_workloads(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<i64>, ProviderError> {
        self.record(SeriesKind::Workloads, from, to, user_context);
        Ok(self.workloads.clone())
    }

    fn get_avg_difficulties(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        user_context: Option<&str>,
    ) -> Result<Vec<f64>, ProviderError> {
        self.record(SeriesKind::AvgDifficulties, from, to, user_context);
        Ok(self.avg_difficulties.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_provider_records_calls() {
        let provider = FixedSeriesProvider::new(vec![1, 2], vec![0.5, 0.7]);
        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        assert_eq!(provider.get_workloads(from, to, Some("deck")).unwrap(), vec![1, 2]);
        assert_eq!(provider.get_avg_difficulties(from, to, None).unwrap(), vec![0.5, 0.7]);

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, SeriesKind::Workloads);
        assert_eq!(calls[0].user_context.as_deref(), Some("deck"));
        assert_eq!(calls[1].kind, SeriesKind::AvgDifficulties);
        assert_eq!(calls[1].user_context, None);
        assert_eq!(provider.calls_of(SeriesKind::Workloads).len(), 1);
    }

    #[test]
    fn references_forward_to_the_provider() {
        fn first_workload<P: GlobalDataProvider<UserContext = str>>(provider: P) -> i64 {
            let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
            provider.get_workloads(day, day, None).unwrap()[0]
        }

        let provider = FixedSeriesProvider::new(vec![3], vec![]);
        assert_eq!(first_workload(&provider), 3);
        assert_eq!(provider.calls().len(), 1);
    }
}
