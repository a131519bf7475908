//! Difficulty of a learning unit relative to an ideal one.
//!
//! The ideal unit has an average grade of 5.0 and is graded 5, so its interval
//! is the longest the formula can produce for a given review count and
//! priority:
//!
//! ```text
//! D(P, I_ideal, I_last) = ln((I_ideal + 1) / (I_last + 1))
//! I_ideal = SSRF(n, 5.0, 5, P)
//! ```

use super::formula::interval;
use crate::error::ContractError;
use crate::types::{Grade, Priority};

/// Interval the ideal unit would get.
pub fn ideal_interval(num_reviews: u32, priority: Priority) -> Result<u32, ContractError> {
    interval(
        num_reviews,
        Grade::MAX.value() as f64,
        Grade::MAX.value(),
        priority,
    )
}

/// Difficulty of a unit whose last interval was `realized_interval` days.
///
/// Zero means the unit kept pace with the ideal one. A realized interval
/// longer than the ideal one cannot come out of the scheduler and is reported
/// as [`ContractError::InvalidDifficulty`].
pub fn difficulty(
    num_reviews: u32,
    priority: Priority,
    realized_interval: u32,
) -> Result<f64, ContractError> {
    if realized_interval < 1 {
        return Err(ContractError::InvalidInterval(realized_interval as i64));
    }
    let ideal = ideal_interval(num_reviews, priority)?;
    let difficulty = ((ideal as f64 + 1.0) / (realized_interval as f64 + 1.0)).ln();

    if difficulty < 0.0 {
        return Err(ContractError::InvalidDifficulty(difficulty));
    }
    Ok(difficulty)
}
