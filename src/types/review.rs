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

use crate::fsrs::Difficulty;
use crate::fsrs::Grade;
use crate::fsrs::Stability;
use crate::types::card::State;
use crate::types::timestamp::Timestamp;

/// One entry in the append-only review log.
///
/// Captures the card as it stood when the review happened: the grade given,
/// the pre-review memory parameters, the interval that was in force, and the
/// true gap since the previous review. Written once by the review pipeline
/// and never touched again; kept indefinitely for audit and analytics.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewLogEntry {
    pub grade: Grade,
    /// The card's lifecycle state before this review.
    pub state_before: State,
    pub stability_before: Stability,
    pub difficulty_before: Difficulty,
    /// Days since the previous review, measured at review time.
    pub elapsed_days: i64,
    /// The interval that was in force when the review happened.
    pub scheduled_days: i64,
    pub reviewed_at: Timestamp,
}
