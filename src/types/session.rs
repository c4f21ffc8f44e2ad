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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::fsrs::Grade;
use crate::types::timestamp::Timestamp;

pub type SessionId = i64;

/// What a study session covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionScope {
    /// The whole collection.
    All,
    /// One deck.
    Deck(String),
    /// One subdeck within a deck.
    Subdeck { deck: String, subdeck: String },
}

impl ToSql for SessionScope {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let json = serde_json::to_string(self)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(json))
    }
}

impl FromSql for SessionScope {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        serde_json::from_str(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Per-session counters, bumped exactly once per committed review. Updated
/// only from inside the review transaction, so the counts can never drift
/// from the number of log entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionAggregate {
    pub cards_reviewed: i64,
    pub forgot_count: i64,
    pub hard_count: i64,
    pub good_count: i64,
    pub easy_count: i64,
    /// Accumulated time the learner spent answering, in milliseconds.
    pub duration_ms: i64,
}

impl SessionAggregate {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, grade: Grade, time_spent_ms: i64) {
        self.cards_reviewed += 1;
        match grade {
            Grade::Forgot => self.forgot_count += 1,
            Grade::Hard => self.hard_count += 1,
            Grade::Good => self.good_count += 1,
            Grade::Easy => self.easy_count += 1,
        }
        self.duration_ms += time_spent_ms;
    }

    /// The share of reviews graded `Good` or `Easy`. Zero when nothing was
    /// rated.
    pub fn success_rate(&self) -> f64 {
        if self.cards_reviewed == 0 {
            0.0
        } else {
            (self.good_count + self.easy_count) as f64 / self.cards_reviewed as f64
        }
    }
}

/// A session as the store holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub owner: String,
    pub scope: SessionScope,
    pub started_at: Timestamp,
    /// Set once, when the session is closed.
    pub ended_at: Option<Timestamp>,
    pub totals: SessionAggregate,
}

/// The derived numbers reported when a session closes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub cards_reviewed: i64,
    pub forgot_count: i64,
    pub hard_count: i64,
    pub good_count: i64,
    pub easy_count: i64,
    pub duration_ms: i64,
    pub success_rate: f64,
}

impl SessionSummary {
    pub fn of_aggregate(totals: &SessionAggregate) -> Self {
        Self {
            cards_reviewed: totals.cards_reviewed,
            forgot_count: totals.forgot_count,
            hard_count: totals.hard_count,
            good_count: totals.good_count,
            easy_count: totals.easy_count,
            duration_ms: totals.duration_ms,
            success_rate: totals.success_rate(),
        }
    }
}
