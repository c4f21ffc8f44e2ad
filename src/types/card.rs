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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::Difficulty;
use crate::fsrs::Stability;
use crate::types::card_hash::CardHash;
use crate::types::timestamp::Timestamp;

/// Where a card is in its learning lifecycle.
///
/// A card starts `New`, passes through `Learning` on its first review, and
/// then cycles between `Review` and `Relearning` forever: `Relearning`
/// whenever it is forgotten, `Review` otherwise. There is no terminal state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    New,
    Learning,
    Review,
    Relearning,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::New => "new",
            State::Learning => "learning",
            State::Review => "review",
            State::Relearning => "relearning",
        }
    }

    pub fn from_name(name: &str) -> Fallible<Self> {
        match name {
            "new" => Ok(State::New),
            "learning" => Ok(State::Learning),
            "review" => Ok(State::Review),
            "relearning" => Ok(State::Relearning),
            _ => Err(ErrorReport::invalid_argument(format!(
                "unknown card state: {name}"
            ))),
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for State {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for State {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        State::from_name(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The memory model for one learning item: everything the scheduler needs
/// to decide when the learner should see the card again.
#[derive(Clone, Debug, PartialEq)]
pub struct CardState {
    /// When the card should next be presented.
    pub due: Timestamp,
    /// Memory stability, in days. Zero only before the first review.
    pub stability: Stability,
    /// Intrinsic recall difficulty, in `[1, 10]` once reviewed.
    pub difficulty: Difficulty,
    /// Days between the two most recent reviews.
    pub elapsed_days: i64,
    /// The interval chosen at the most recent review, in days.
    pub scheduled_days: i64,
    /// Total completed reviews. Increments on every review, whatever the
    /// grade.
    pub reps: i64,
    /// How many times the card has been forgotten.
    pub lapses: i64,
    pub state: State,
    /// Absent only for a never-reviewed card.
    pub last_review: Option<Timestamp>,
}

impl CardState {
    /// The state of a card on first exposure, before any review.
    pub fn init(now: Timestamp) -> Self {
        Self {
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0,
            scheduled_days: 0,
            reps: 0,
            lapses: 0,
            state: State::New,
            last_review: None,
        }
    }
}

/// A card as the store holds it: the memory state plus ownership metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct CardRecord {
    pub hash: CardHash,
    pub owner: String,
    pub card: CardState,
}
