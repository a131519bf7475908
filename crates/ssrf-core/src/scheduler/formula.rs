//! SSRF: the maximum acceptable inter-repetition interval.
//!
//! ```text
//! SSRF(n, AG(n-1), G(n), P) = 1 + round(n ^ (AG(n-1) / 2) * exp(G(n) - P))
//! ```
//!
//! where `n` is the number of reviews, `AG(n-1)` the previous average grade,
//! `G(n)` the current grade and `P` the priority weight. The leading 1 is the
//! overlearning correction: no interval is shorter than a day.
//!
//! | Parameter (ceteris paribus) | Interval |
//! |-----------------------------|----------|
//! | more reviews                | longer   |
//! | higher average grade        | longer   |
//! | higher current grade        | longer   |
//! | higher priority             | shorter  |

use crate::error::ContractError;
use crate::types::{validate_avg_grade, validate_num_reviews, Grade, Priority};

/// Minimum gap in days between two reviews.
pub const OVERLEARNING_CORRECTION: u32 = 1;

/// Lowest grade accepted by [`interval`]; one below [`Grade::MIN`] so the
/// lower bound of the acceptable window can be computed.
pub const LOWER_BOUND_GRADE: i32 = Grade::MIN.value() - 1;

/// Maximum acceptable interval in days.
///
/// `grade` may be -1 for the lower bound of the acceptable window; everything
/// else must satisfy the state invariants.
pub fn interval(
    num_reviews: u32,
    prev_avg_grade: f64,
    grade: i32,
    priority: Priority,
) -> Result<u32, ContractError> {
    validate_num_reviews(num_reviews)?;
    validate_avg_grade(prev_avg_grade)?;
    if !(LOWER_BOUND_GRADE..=Grade::MAX.value()).contains(&grade) {
        return Err(ContractError::InvalidGrade {
            grade,
            min: LOWER_BOUND_GRADE,
            max: Grade::MAX.value(),
        });
    }

    let base_interval = (num_reviews as f64).powf(prev_avg_grade / 2.0);
    let scale_factor = (grade as f64 - priority.weight()).exp();
    let days = OVERLEARNING_CORRECTION as f64 + (base_interval * scale_factor).round_ties_even();

    if !days.is_finite() || days < 1.0 {
        return Err(ContractError::InvalidInterval(days as i64));
    }

    // Float-to-int casts saturate, which only matters for absurd review counts.
    Ok(days as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_interval(expected: u32, num_reviews: u32, avg: f64, grade: i32, p: Priority) {
        assert_eq!(
            interval(num_reviews, avg, grade, p).unwrap(),
            expected,
            "interval({num_reviews}, {avg}, {grade}, {p})"
        );
    }

    #[test]
    fn test_first_repetition() {
        assert_interval(1, 1, 0.0, 0, Priority::Medium);
        assert_interval(1, 1, 0.0, 2, Priority::Medium);
        assert_interval(2, 1, 0.0, 3, Priority::Medium);
        assert_interval(8, 1, 0.0, 5, Priority::Medium);
    }

    #[test]
    fn test_consecutive_repetition() {
        assert_interval(1, 5, 2.3, 0, Priority::High);
        assert_interval(2, 5, 2.3, 2, Priority::High);
        assert_interval(3, 5, 2.3, 3, Priority::High);
        assert_interval(18, 5, 2.3, 5, Priority::High);
    }

    #[test]
    fn test_lower_bound_grade_is_accepted() {
        assert_interval(1, 1, 0.0, -1, Priority::Medium);
        assert!(interval(1, 0.0, -2, Priority::Medium).is_err());
        assert!(interval(1, 0.0, 6, Priority::Medium).is_err());
    }

    #[test]
    fn test_rejects_zero_reviews() {
        assert_eq!(
            interval(0, 0.0, 0, Priority::Medium),
            Err(ContractError::InvalidNumReviews(0))
        );
    }

    #[test]
    fn test_avg_grade_bounds() {
        assert!(interval(1, -0.01, 0, Priority::Medium).is_err());
        assert!(interval(1, 0.0, 0, Priority::Medium).is_ok());
        assert!(interval(1, 5.0, 0, Priority::Medium).is_ok());
        assert!(interval(1, 5.01, 0, Priority::Medium).is_err());
    }

    #[test]
    fn test_higher_priority_shortens_interval() {
        let low = interval(4, 4.0, 4, Priority::Low).unwrap();
        let medium = interval(4, 4.0, 4, Priority::Medium).unwrap();
        let high = interval(4, 4.0, 4, Priority::High).unwrap();
        assert!(low > medium && medium > high);
    }
}
