//! Choosing a good interval inside the acceptable window.
//!
//! Any day between the minimum and maximum acceptable interval is fine for
//! the unit itself. Among them the balancer picks the one where adding this
//! review hurts the global schedule least:
//!
//! 1. Fetch workloads for the window. The latest empty day wins outright.
//! 2. Otherwise fetch average difficulties and score every day with the
//!    current load coefficient.
//! 3. Simulate the review landing on each day (`W + 1`, difficulty blended in)
//!    and score again.
//! 4. The day with the smallest new/old coefficient ratio wins; ties go to the
//!    latest day.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::difficulty::difficulty;
use super::load::{load_coeffs, validate_avg_difficulties, validate_workloads};
use crate::error::{ContractError, CoreError, Result};
use crate::provider::GlobalDataProvider;
use crate::types::Priority;

/// Closed range of acceptable intervals, in days from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalWindow {
    pub min: u32,
    pub max: u32,
}

impl IntervalWindow {
    pub fn new(min: u32, max: u32) -> Result<Self, ContractError> {
        if min > max {
            return Err(ContractError::InvalidIntervalWindow { min, max });
        }
        Ok(Self { min, max })
    }

    /// Number of candidate days; never zero.
    pub fn day_count(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    pub fn intervals(&self) -> impl Iterator<Item = u32> {
        self.min..=self.max
    }

    /// First and last candidate date.
    pub fn dates(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ContractError> {
        Ok((
            add_days(today, self.min)?,
            add_days(today, self.max)?,
        ))
    }
}

pub(crate) fn add_days(day: NaiveDate, days: u32) -> Result<NaiveDate, ContractError> {
    day.checked_add_days(Days::new(days as u64))
        .ok_or(ContractError::InvalidInterval(days as i64))
}

/// Searches an [`IntervalWindow`] using a provider's global aggregates.
pub struct WorkloadBalancer<'a, P: GlobalDataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: GlobalDataProvider + ?Sized> WorkloadBalancer<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Pick the ideal interval for a unit with `num_reviews` reviews.
    ///
    /// The result always lies inside `window`.
    pub fn find_ideal_interval(
        &self,
        window: IntervalWindow,
        num_reviews: u32,
        priority: Priority,
        today: NaiveDate,
        user_context: Option<&P::UserContext>,
    ) -> Result<u32> {
        let (date_from, date_to) = window.dates(today)?;

        let workloads = self
            .provider
            .get_workloads(date_from, date_to, user_context)
            .map_err(CoreError::Provider)?;
        debug!(%date_from, %date_to, ?workloads, "workloads");
        if workloads.len() != window.day_count() {
            return Err(ContractError::WorkloadSeriesLengthMismatch {
                expected: window.day_count(),
                actual: workloads.len(),
            }
            .into());
        }

        let offset = match last_zero_workload_index(&workloads)? {
            Some(index) => index,
            None => {
                let avg_difficulties = self
                    .provider
                    .get_avg_difficulties(date_from, date_to, user_context)
                    .map_err(CoreError::Provider)?;
                debug!(%date_from, %date_to, ?avg_difficulties, "avg. difficulties");
                if avg_difficulties.len() != workloads.len() {
                    return Err(ContractError::DifficultySeriesLengthMismatch {
                        expected: workloads.len(),
                        actual: avg_difficulties.len(),
                    }
                    .into());
                }
                max_load_reduction_index(
                    num_reviews,
                    priority,
                    window,
                    &workloads,
                    &avg_difficulties,
                )?
            }
        };

        let ideal = window.min + offset as u32;
        debug!(ideal, "ideal interval");
        Ok(ideal)
    }
}

/// Index of the last day with nothing scheduled.
pub fn last_zero_workload_index(workloads: &[i64]) -> Result<Option<usize>, ContractError> {
    validate_workloads(workloads)?;
    Ok(workloads.iter().rposition(|&w| w == 0))
}

/// Index of the day whose load grows least, relatively, when this unit's
/// review is added to it.
pub fn max_load_reduction_index(
    num_reviews: u32,
    priority: Priority,
    window: IntervalWindow,
    workloads: &[i64],
    avg_difficulties: &[f64],
) -> Result<usize, ContractError> {
    validate_workloads(workloads)?;
    validate_avg_difficulties(avg_difficulties)?;
    if workloads.len() != window.day_count() {
        return Err(ContractError::WorkloadSeriesLengthMismatch {
            expected: window.day_count(),
            actual: workloads.len(),
        });
    }

    let load = load_coeffs(workloads, avg_difficulties)?;
    debug!(?load, "load coefficients");

    let new_workloads = workloads
        .iter()
        .enumerate()
        .map(|(index, &w)| {
            w.checked_add(1)
                .ok_or(ContractError::WorkloadOverflow { index, value: w })
        })
        .collect::<Result<Vec<i64>, ContractError>>()?;
    let new_avg_difficulties = window
        .intervals()
        .zip(workloads.iter().zip(&new_workloads))
        .zip(avg_difficulties)
        .map(|((interval, (&w, &new_w)), &avg)| -> Result<f64, ContractError> {
            let new_difficulty = difficulty(num_reviews, priority, interval)?;
            Ok((w as f64 * avg + new_difficulty) / new_w as f64)
        })
        .collect::<Result<Vec<f64>, ContractError>>()?;
    debug!(?new_workloads, ?new_avg_difficulties, "projected series");

    let new_load = load_coeffs(&new_workloads, &new_avg_difficulties)?;
    debug!(?new_load, "projected load coefficients");

    let ratios: Vec<f64> = new_load
        .iter()
        .zip(&load)
        .map(|(&new, &old)| if old != 0.0 { new / old } else { f64::INFINITY })
        .collect();
    debug!(?ratios, "load coefficient ratios (new to old)");

    // Strict comparison while walking backwards keeps the latest of equal minima.
    let mut best = ratios.len() - 1;
    for index in (0..ratios.len()).rev() {
        if ratios[index] < ratios[best] {
            best = index;
        }
    }
    Ok(best)
}
