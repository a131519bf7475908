//! Value types shared by the scheduling algorithm and its callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ContractError, Result};

/// Self-assessed recall quality of the first answer in a review session.
///
/// | Grade | An answer is         | Domain      |
/// |-------|----------------------|-------------|
/// | 5     | instantly recalled   | recall      |
/// | 4     | slowly recalled      | recall      |
/// | 3     | partially recalled   | recall      |
/// | 2     | instantly recognized | recognition |
/// | 1     | slowly recognized    | recognition |
/// | 0     | not recognized       | recognition |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Grade(u8);

impl Grade {
    pub const MIN: Grade = Grade(0);
    pub const MAX: Grade = Grade(5);

    /// Validate a raw grade.
    pub fn new(value: i32) -> Result<Self, ContractError> {
        if (Self::MIN.0 as i32..=Self::MAX.0 as i32).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ContractError::InvalidGrade {
                grade: value,
                min: Self::MIN.0 as i32,
                max: Self::MAX.0 as i32,
            })
        }
    }

    pub const fn value(self) -> i32 {
        self.0 as i32
    }

    /// All grades, lowest first.
    pub fn all() -> impl Iterator<Item = Grade> {
        (Self::MIN.0..=Self::MAX.0).map(Grade)
    }
}

impl TryFrom<i32> for Grade {
    type Error = ContractError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Grade::new(value)
    }
}

impl From<Grade> for i32 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority of the studied material.
///
/// Higher priority compresses intervals. Suggested use for vocabulary:
/// high for the ~2,000 most common words, medium up to ~10,000, low beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Numeric weight used by the interval formula.
    pub fn weight(self) -> f64 {
        match self {
            Priority::Low => 2.0,
            Priority::Medium => 3.0,
            Priority::High => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl TryFrom<i32> for Priority {
    type Error = ContractError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Priority::Low),
            0 => Ok(Priority::Medium),
            1 => Ok(Priority::High),
            other => Err(ContractError::InvalidPriority(other.to_string())),
        }
    }
}

impl FromStr for Priority {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "mid" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => other
                .parse::<i32>()
                .map_err(|_| ContractError::InvalidPriority(s.to_string()))
                .and_then(Priority::try_from),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling state of a single learning unit.
///
/// Owned by the caller and persisted between reviews. The scheduler never
/// mutates a caller's value; it returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuState {
    /// Number of review sessions; a new unit starts at 1.
    pub num_reviews: u32,
    /// Mean of past first grades, excluding the in-progress one.
    pub avg_grade: f64,
    /// How this unit compares to an ideal one of the same priority.
    pub difficulty: f64,
    #[serde(default)]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review: Option<DateTime<Utc>>,
}

impl LuState {
    pub const DEFAULT_AVG_GRADE: f64 = 2.5;

    /// State of a unit that has never been graded.
    pub fn new() -> Self {
        Self::with_avg_grade(Self::DEFAULT_AVG_GRADE)
    }

    pub fn with_avg_grade(avg_grade: f64) -> Self {
        Self {
            num_reviews: 1,
            avg_grade,
            difficulty: 0.0,
            last_review: None,
            next_review: None,
        }
    }

    /// Check the invariants every persisted state must satisfy.
    pub fn validate(&self) -> Result<(), ContractError> {
        validate_num_reviews(self.num_reviews)?;
        validate_avg_grade(self.avg_grade)?;
        if self.difficulty.is_nan() || self.difficulty < 0.0 {
            return Err(ContractError::InvalidDifficulty(self.difficulty));
        }
        Ok(())
    }
}

impl Default for LuState {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_num_reviews(num_reviews: u32) -> Result<(), ContractError> {
    if num_reviews == 0 {
        return Err(ContractError::InvalidNumReviews(num_reviews));
    }
    Ok(())
}

pub(crate) fn validate_avg_grade(avg_grade: f64) -> Result<(), ContractError> {
    let min = Grade::MIN.value() as f64;
    let max = Grade::MAX.value() as f64;
    if !(min..=max).contains(&avg_grade) {
        return Err(ContractError::InvalidAvgGrade(avg_grade));
    }
    Ok(())
}
