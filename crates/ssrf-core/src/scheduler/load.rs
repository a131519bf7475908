//! Load coefficients: how far each day's workload and average difficulty sit
//! above the lightest day of the window.
//!
//! ```text
//! LC(W, Wmin, AD, ADmin) = ((Wmin / W - 1)^2 + (ADmin / AD - 1)^2) / 2
//! ```
//!
//! A term is 0 when its denominator is 0. The day holding a minimum scores 0
//! on that dimension; every coefficient lies in `[0, 1]`.

use crate::error::ContractError;

/// Coefficient of a single day given the window minima.
pub fn load_coeff(
    workload: i64,
    avg_difficulty: f64,
    min_workload: i64,
    min_avg_difficulty: f64,
) -> f64 {
    let workload_term = if workload != 0 {
        (min_workload as f64 / workload as f64 - 1.0).powi(2)
    } else {
        0.0
    };
    let difficulty_term = if avg_difficulty != 0.0 {
        (min_avg_difficulty / avg_difficulty - 1.0).powi(2)
    } else {
        0.0
    };
    (workload_term + difficulty_term) / 2.0
}

/// Coefficients for every day of aligned workload and difficulty series.
pub fn load_coeffs(workloads: &[i64], avg_difficulties: &[f64]) -> Result<Vec<f64>, ContractError> {
    validate_workloads(workloads)?;
    validate_avg_difficulties(avg_difficulties)?;
    if avg_difficulties.len() != workloads.len() {
        return Err(ContractError::DifficultySeriesLengthMismatch {
            expected: workloads.len(),
            actual: avg_difficulties.len(),
        });
    }

    let Some(&min_workload) = workloads.iter().min() else {
        return Ok(Vec::new());
    };
    let min_avg_difficulty = avg_difficulties.iter().copied().fold(f64::INFINITY, f64::min);

    let coeffs: Vec<f64> = workloads
        .iter()
        .zip(avg_difficulties)
        .map(|(&w, &d)| load_coeff(w, d, min_workload, min_avg_difficulty))
        .collect();

    for (index, &value) in coeffs.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(ContractError::InvalidLoadCoefficient { index, value });
        }
    }
    Ok(coeffs)
}

pub(crate) fn validate_workloads(workloads: &[i64]) -> Result<(), ContractError> {
    match workloads.iter().position(|&w| w < 0) {
        Some(index) => Err(ContractError::InvalidWorkload {
            index,
            value: workloads[index],
        }),
        None => Ok(()),
    }
}

pub(crate) fn validate_avg_difficulties(avg_difficulties: &[f64]) -> Result<(), ContractError> {
    match avg_difficulties.iter().position(|&d| d.is_nan() || d < 0.0) {
        Some(index) => Err(ContractError::InvalidAvgDifficulty {
            index,
            value: avg_difficulties[index],
        }),
        None => Ok(()),
    }
}
