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

//! The scheduler: a stateless object that maps a card's memory state and a
//! grade to the next state and a log entry. It performs no I/O and reads no
//! clock; callers pass `now` in. Safe to share across threads.

use crate::config::SchedulerConfig;
use crate::error::Fallible;
use crate::fsrs;
use crate::fsrs::Grade;
use crate::types::card::CardState;
use crate::types::card::State;
use crate::types::review::ReviewLogEntry;
use crate::types::timestamp::Timestamp;

/// A review later than this multiple of its interval counts as badly missed.
const BADLY_MISSED_MULTIPLE: i64 = 2;

/// The flat stability cut applied to a badly missed review before
/// scheduling.
const BADLY_MISSED_STABILITY_FACTOR: f64 = 0.85;

/// The outcome of one review: the card's next state and the log entry
/// recording the review.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulingInfo {
    pub card: CardState,
    pub log: ReviewLogEntry,
}

/// The outcome of every possible grade for one card, computed at once so a
/// caller can show the learner what each answer would do before they pick
/// one. Keyed by grade through named fields rather than a map, so a missing
/// grade is unrepresentable.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    pub forgot: SchedulingInfo,
    pub hard: SchedulingInfo,
    pub good: SchedulingInfo,
    pub easy: SchedulingInfo,
}

impl Preview {
    pub fn get(&self, grade: Grade) -> &SchedulingInfo {
        match grade {
            Grade::Forgot => &self.forgot,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Fallible<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The state of a card on first exposure.
    pub fn init_card(&self, now: Timestamp) -> CardState {
        CardState::init(now)
    }

    pub fn is_overdue(&self, card: &CardState, now: Timestamp) -> bool {
        now >= card.due
    }

    /// Whole days past the due date. Zero if the card is not overdue.
    pub fn days_overdue(&self, card: &CardState, now: Timestamp) -> i64 {
        if now >= card.due {
            now.whole_days_since(card.due)
        } else {
            0
        }
    }

    /// The estimated probability of recalling the card right now. Zero for a
    /// card that has never been reviewed.
    pub fn retention(&self, card: &CardState, now: Timestamp) -> f64 {
        match card.last_review {
            Some(last_review) if card.stability > 0.0 => {
                let elapsed = now.fractional_days_since(last_review).max(0.0);
                fsrs::retrievability(elapsed, card.stability)
            }
            _ => 0.0,
        }
    }

    /// The interval the card would get if it were reviewed right now with
    /// the given grade. Does not mutate anything; used for previews.
    pub fn optimal_interval(&self, card: &CardState, grade: Grade) -> i64 {
        let weights = &self.config.weights;
        let stability = match card.state {
            State::New => fsrs::initial_stability(weights, grade),
            State::Learning | State::Review | State::Relearning => match grade {
                Grade::Forgot => fsrs::forget_stability(weights, card.difficulty, card.stability),
                Grade::Hard | Grade::Good | Grade::Easy => {
                    // Reviewed right now, nothing has decayed yet.
                    fsrs::recall_stability(weights, card.difficulty, card.stability, 1.0, grade)
                }
            },
        };
        let stability = stability.clamp(fsrs::MIN_STABILITY, self.config.maximum_interval as f64);
        fsrs::interval(
            self.config.desired_retention,
            stability,
            self.config.maximum_interval,
        )
    }

    /// Compute the outcome of every grade at once, without committing any.
    pub fn repeat(&self, card: &CardState, now: Timestamp) -> Preview {
        Preview {
            forgot: self.schedule_card_for_rating(card, Grade::Forgot, now),
            hard: self.schedule_card_for_rating(card, Grade::Hard, now),
            good: self.schedule_card_for_rating(card, Grade::Good, now),
            easy: self.schedule_card_for_rating(card, Grade::Easy, now),
        }
    }

    /// Apply one review: the single transition a caller commits.
    pub fn schedule_card_for_rating(
        &self,
        card: &CardState,
        grade: Grade,
        now: Timestamp,
    ) -> SchedulingInfo {
        let weights = &self.config.weights;
        let elapsed_days = match card.last_review {
            Some(last_review) => now.whole_days_since(last_review).max(0),
            None => 0,
        };

        // A review that arrives more than twice its interval late gets a
        // flat stability cut before scheduling; the elapsed gap is still the
        // true one.
        let mut stability = card.stability;
        if card.scheduled_days > 0
            && self.days_overdue(card, now) > BADLY_MISSED_MULTIPLE * card.scheduled_days
        {
            stability *= BADLY_MISSED_STABILITY_FACTOR;
        }

        let log = ReviewLogEntry {
            grade,
            state_before: card.state,
            stability_before: card.stability,
            difficulty_before: card.difficulty,
            elapsed_days,
            scheduled_days: card.scheduled_days,
            reviewed_at: now,
        };

        let (next_stability, next_difficulty) = match card.state {
            State::New => (
                fsrs::initial_stability(weights, grade),
                fsrs::initial_difficulty(weights, grade),
            ),
            State::Learning | State::Review | State::Relearning => {
                let next_difficulty = fsrs::new_difficulty(weights, card.difficulty, grade);
                let next_stability = match grade {
                    Grade::Forgot => {
                        fsrs::forget_stability(weights, card.difficulty, stability)
                    }
                    Grade::Hard | Grade::Good | Grade::Easy => {
                        let retrievability =
                            fsrs::retrievability(elapsed_days as f64, stability);
                        fsrs::recall_stability(
                            weights,
                            card.difficulty,
                            stability,
                            retrievability,
                            grade,
                        )
                    }
                };
                (next_stability, next_difficulty)
            }
        };
        let next_stability =
            next_stability.clamp(fsrs::MIN_STABILITY, self.config.maximum_interval as f64);
        let scheduled_days = fsrs::interval(
            self.config.desired_retention,
            next_stability,
            self.config.maximum_interval,
        );

        // A first review passes through `Learning` and lands on `Review` or
        // `Relearning` like any other; forgetting always means `Relearning`
        // and a lapse.
        let next_state = if grade == Grade::Forgot {
            State::Relearning
        } else {
            State::Review
        };
        let lapses = card.lapses + if grade == Grade::Forgot { 1 } else { 0 };

        let card = CardState {
            due: now.plus_days(scheduled_days),
            stability: next_stability,
            difficulty: next_difficulty,
            elapsed_days,
            scheduled_days,
            reps: card.reps + 1,
            lapses,
            state: next_state,
            last_review: Some(now),
        };
        SchedulingInfo { card, log }
    }
}
