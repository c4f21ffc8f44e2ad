// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The FSRS (Free Spaced Repetition Scheduler) numeric core: pure functions
//! mapping a card's memory parameters and a grade to the next parameters.
//! All functions take the weight vector explicitly; nothing here reads
//! ambient state.

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::config::Weights;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// Memory stability, in days.
pub type Stability = f64;

/// Intrinsic recall difficulty, in `[1, 10]`.
pub type Difficulty = f64;

/// The retention level the retrievability curve is anchored to: stability is
/// the number of days for recall probability to decay to this value.
const BASE_RETENTION: f64 = 0.9;

/// The smallest stability the formulas operate on.
pub const MIN_STABILITY: f64 = 0.1;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// How well the learner recalled a card, on the four-level ordinal scale
/// `Forgot < Hard < Good < Easy`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Grade {
    Forgot,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Forgot, Grade::Hard, Grade::Good, Grade::Easy];

    /// The grade's ordinal value, 1 through 4.
    pub fn number(self) -> u8 {
        match self {
            Grade::Forgot => 1,
            Grade::Hard => 2,
            Grade::Good => 3,
            Grade::Easy => 4,
        }
    }

    /// Parse an ordinal value. This is the validation point for callers
    /// that carry grades as raw numbers.
    pub fn from_number(number: u8) -> Fallible<Self> {
        match number {
            1 => Ok(Grade::Forgot),
            2 => Ok(Grade::Hard),
            3 => Ok(Grade::Good),
            4 => Ok(Grade::Easy),
            _ => Err(ErrorReport::invalid_argument(format!(
                "grade must be between 1 and 4, got {number}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Forgot => "forgot",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    pub fn from_name(name: &str) -> Fallible<Self> {
        match name {
            "forgot" => Ok(Grade::Forgot),
            "hard" => Ok(Grade::Hard),
            "good" => Ok(Grade::Good),
            "easy" => Ok(Grade::Easy),
            _ => Err(ErrorReport::invalid_argument(format!(
                "unknown grade: {name}"
            ))),
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Grade {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Grade {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Grade::from_name(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The probability of recalling a card `elapsed_days` after a review that
/// left it with the given stability.
pub fn retrievability(elapsed_days: f64, stability: Stability) -> f64 {
    (BASE_RETENTION.ln() * elapsed_days / stability.max(MIN_STABILITY)).exp()
}

/// Stability after the very first review.
pub fn initial_stability(weights: &Weights, grade: Grade) -> Stability {
    weights[grade.number() as usize - 1].max(MIN_STABILITY)
}

/// Difficulty after the very first review.
pub fn initial_difficulty(weights: &Weights, grade: Grade) -> Difficulty {
    let difficulty = weights[4] - weights[5] * (grade.number() as f64 - 3.0);
    difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Difficulty after a subsequent review: shifted by the grade, then
/// mean-reverted toward the baseline difficulty `w[4]`.
pub fn new_difficulty(weights: &Weights, difficulty: Difficulty, grade: Grade) -> Difficulty {
    let shifted = difficulty - weights[6] * (grade.number() as f64 - 3.0);
    let reverted = weights[7] * weights[4] + (1.0 - weights[7]) * shifted;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Stability after a `Forgot` review. The retrievability factor is left out:
/// the card was just forgotten, so it is taken to be 1.
pub fn forget_stability(
    weights: &Weights,
    difficulty: Difficulty,
    stability: Stability,
) -> Stability {
    weights[11] * difficulty.powf(-weights[12]) * ((stability + 1.0).powf(weights[13]) - 1.0)
}

/// Stability after a successful review at the given retrievability.
pub fn recall_stability(
    weights: &Weights,
    difficulty: Difficulty,
    stability: Stability,
    retrievability: f64,
    grade: Grade,
) -> Stability {
    let stability = stability.max(MIN_STABILITY);
    let hard_penalty = if grade == Grade::Hard { weights[15] } else { 1.0 };
    let easy_bonus = if grade == Grade::Easy { weights[16] } else { 1.0 };
    let growth = weights[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-weights[9])
        * ((1.0 - retrievability) * weights[10]).exp_m1()
        * hard_penalty
        * easy_bonus;
    stability * (growth + 1.0)
}

/// The interval, in whole days, at which retrievability decays to the
/// desired retention: the inversion of [`retrievability`].
pub fn interval(desired_retention: f64, stability: Stability, maximum_interval: i64) -> i64 {
    let days = stability * desired_retention.ln() / BASE_RETENTION.ln();
    (days.round() as i64).clamp(1, maximum_interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::Forgot < Grade::Hard);
        assert!(Grade::Hard < Grade::Good);
        assert!(Grade::Good < Grade::Easy);
    }

    #[test]
    fn test_grade_numbers_roundtrip() {
        for grade in Grade::ALL {
            assert_eq!(Grade::from_number(grade.number()).unwrap(), grade);
            assert_eq!(Grade::from_name(grade.as_str()).unwrap(), grade);
        }
    }

    #[test]
    fn test_grade_from_number_rejects_out_of_range() {
        for number in [0u8, 5, 255] {
            let result = Grade::from_number(number);
            assert!(matches!(result, Err(ErrorReport::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_retrievability_at_zero_elapsed() {
        assert!((retrievability(0.0, 2.4) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_retrievability_at_stability() {
        // After exactly `stability` days, recall probability is the base
        // retention.
        assert!((retrievability(7.0, 7.0) - 0.9).abs() < EPSILON);
    }

    #[test]
    fn test_retrievability_decreasing() {
        let mut previous = retrievability(0.0, 5.0);
        for elapsed in 1..30 {
            let current = retrievability(elapsed as f64, 5.0);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn test_initial_stability_per_grade() {
        let weights = Weights::default();
        assert_eq!(initial_stability(&weights, Grade::Forgot), 0.4);
        assert_eq!(initial_stability(&weights, Grade::Hard), 0.6);
        assert_eq!(initial_stability(&weights, Grade::Good), 2.4);
        assert_eq!(initial_stability(&weights, Grade::Easy), 5.8);
    }

    #[test]
    fn test_initial_stability_floor() {
        let mut raw = [0.5; 17];
        raw[0] = 0.0;
        let weights = Weights::new(raw);
        assert_eq!(initial_stability(&weights, Grade::Forgot), MIN_STABILITY);
    }

    #[test]
    fn test_initial_difficulty() {
        let weights = Weights::default();
        // w[4] - w[5] * (grade - 3)
        assert!((initial_difficulty(&weights, Grade::Good) - 4.93).abs() < EPSILON);
        assert!((initial_difficulty(&weights, Grade::Forgot) - (4.93 + 2.0 * 0.94)).abs() < EPSILON);
        assert!((initial_difficulty(&weights, Grade::Easy) - (4.93 - 0.94)).abs() < EPSILON);
    }

    #[test]
    fn test_initial_difficulty_clamped() {
        let mut raw = [0.0; 17];
        raw[4] = 11.0;
        let weights = Weights::new(raw);
        assert_eq!(initial_difficulty(&weights, Grade::Good), MAX_DIFFICULTY);
        let mut raw = [0.0; 17];
        raw[4] = 0.5;
        let weights = Weights::new(raw);
        assert_eq!(initial_difficulty(&weights, Grade::Good), MIN_DIFFICULTY);
    }

    #[test]
    fn test_new_difficulty_mean_reversion() {
        let weights = Weights::default();
        // A `Good` review leaves the shift at zero, so the difficulty only
        // reverts toward the baseline.
        let baseline = weights[4];
        let above = new_difficulty(&weights, 9.0, Grade::Good);
        assert!(above < 9.0);
        assert!(above > baseline);
        let below = new_difficulty(&weights, 2.0, Grade::Good);
        assert!(below > 2.0);
        assert!(below < baseline);
    }

    #[test]
    fn test_new_difficulty_grade_direction() {
        let weights = Weights::default();
        let after_forgot = new_difficulty(&weights, 5.0, Grade::Forgot);
        let after_good = new_difficulty(&weights, 5.0, Grade::Good);
        let after_easy = new_difficulty(&weights, 5.0, Grade::Easy);
        assert!(after_forgot > after_good);
        assert!(after_good > after_easy);
    }

    #[test]
    fn test_new_difficulty_bounds() {
        let weights = Weights::default();
        let mut difficulty = 5.0;
        for _ in 0..100 {
            difficulty = new_difficulty(&weights, difficulty, Grade::Forgot);
            assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty));
        }
    }

    #[test]
    fn test_forget_stability_formula() {
        let weights = Weights::default();
        let result = forget_stability(&weights, 5.0, 10.0);
        let expected = 2.18 * 5.0f64.powf(-0.05) * (11.0f64.powf(0.34) - 1.0);
        assert!((result - expected).abs() < EPSILON);
        // Forgetting collapses stability.
        assert!(result < 10.0);
    }

    #[test]
    fn test_recall_stability_grows() {
        let weights = Weights::default();
        let retr = retrievability(5.0, 5.0);
        let result = recall_stability(&weights, 5.0, 5.0, retr, Grade::Good);
        assert!(result > 5.0);
    }

    #[test]
    fn test_recall_stability_hard_penalty_and_easy_bonus() {
        let weights = Weights::default();
        let retr = retrievability(5.0, 5.0);
        let hard = recall_stability(&weights, 5.0, 5.0, retr, Grade::Hard);
        let good = recall_stability(&weights, 5.0, 5.0, retr, Grade::Good);
        let easy = recall_stability(&weights, 5.0, 5.0, retr, Grade::Easy);
        assert!(hard < good);
        assert!(good < easy);
    }

    #[test]
    fn test_recall_stability_at_full_retrievability() {
        // With nothing forgotten yet there is nothing to consolidate: the
        // growth term vanishes.
        let weights = Weights::default();
        let result = recall_stability(&weights, 5.0, 5.0, 1.0, Grade::Good);
        assert!((result - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_interval_identity_at_base_retention() {
        assert_eq!(interval(0.9, 2.4, 36500), 2);
        assert_eq!(interval(0.9, 5.8, 36500), 6);
        assert_eq!(interval(0.9, 36.4, 36500), 36);
    }

    #[test]
    fn test_interval_lower_retention_is_longer() {
        let strict = interval(0.95, 10.0, 36500);
        let base = interval(0.9, 10.0, 36500);
        let lax = interval(0.8, 10.0, 36500);
        assert!(strict < base);
        assert!(base < lax);
    }

    #[test]
    fn test_interval_clamped() {
        assert_eq!(interval(0.9, 0.1, 36500), 1);
        assert_eq!(interval(0.9, 1000.0, 365), 365);
    }
}
