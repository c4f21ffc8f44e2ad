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

//! The SQLite backing store. Reviews are serialized through one connection
//! behind a mutex, so two reviews of the same card can never interleave;
//! the three-way write of a review goes through a single transaction.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::Grade;
use crate::review::ReviewStore;
use crate::review::StagedReview;
use crate::types::card::CardRecord;
use crate::types::card::CardState;
use crate::types::card_hash::CardHash;
use crate::types::review::ReviewLogEntry;
use crate::types::session::SessionAggregate;
use crate::types::session::SessionId;
use crate::types::session::SessionRecord;
use crate::types::session::SessionScope;
use crate::types::session::SessionSummary;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let conn = Connection::open(database_path)?;
        Self::prepare(conn)
    }

    /// An in-memory database, mostly useful for tests.
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn)
    }

    fn prepare(mut conn: Connection) -> Fallible<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Register a card on first exposure. The card starts with the
    /// never-reviewed state.
    pub fn add_card(&self, owner: &str, card_hash: CardHash, now: Timestamp) -> Fallible<()> {
        log::debug!("Adding new card: {card_hash}");
        let card = CardState::init(now);
        let conn = self.acquire();
        let sql = "insert into cards (card_hash, owner, due, stability, difficulty, elapsed_days, scheduled_days, reps, lapses, state, last_review) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                card_hash,
                owner,
                card.due,
                card.stability,
                card.difficulty,
                card.elapsed_days,
                card.scheduled_days,
                card.reps,
                card.lapses,
                card.state,
                card.last_review,
            ),
        )?;
        Ok(())
    }

    /// Get a card and its ownership metadata. Returns `None` for an unknown
    /// hash.
    pub fn card_record(&self, card_hash: CardHash) -> Fallible<Option<CardRecord>> {
        let conn = self.acquire();
        let sql = "select owner, due, stability, difficulty, elapsed_days, scheduled_days, reps, lapses, state, last_review from cards where card_hash = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([card_hash])?;
        if let Some(row) = rows.next()? {
            Ok(Some(CardRecord {
                hash: card_hash,
                owner: row.get(0)?,
                card: CardState {
                    due: row.get(1)?,
                    stability: row.get(2)?,
                    difficulty: row.get(3)?,
                    elapsed_days: row.get(4)?,
                    scheduled_days: row.get(5)?,
                    reps: row.get(6)?,
                    lapses: row.get(7)?,
                    state: row.get(8)?,
                    last_review: row.get(9)?,
                },
            }))
        } else {
            Ok(None)
        }
    }

    /// Find the caller's cards due at `now`. Due discovery is a query, not
    /// something the engine pushes.
    pub fn due_cards(&self, owner: &str, now: Timestamp) -> Fallible<Vec<CardHash>> {
        let mut due = Vec::new();
        let conn = self.acquire();
        let sql = "select card_hash from cards where owner = ? and due <= ? order by due;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((owner, now))?;
        while let Some(row) = rows.next()? {
            let hash: CardHash = row.get(0)?;
            due.push(hash);
        }
        Ok(due)
    }

    /// Open a new session with zeroed totals.
    pub fn start_session(
        &self,
        owner: &str,
        scope: SessionScope,
        now: Timestamp,
    ) -> Fallible<SessionId> {
        let conn = self.acquire();
        let sql =
            "insert into sessions (owner, scope, started_at) values (?, ?, ?) returning session_id;";
        let session_id: SessionId = conn.query_row(sql, (owner, scope, now), |row| row.get(0))?;
        log::debug!("Started session {session_id}.");
        Ok(session_id)
    }

    /// Get a session and its running totals. Returns `None` for an unknown
    /// id.
    pub fn session_record(&self, session_id: SessionId) -> Fallible<Option<SessionRecord>> {
        let conn = self.acquire();
        let sql = "select owner, scope, started_at, ended_at, cards_reviewed, forgot_count, hard_count, good_count, easy_count, duration_ms from sessions where session_id = ?;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([session_id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(SessionRecord {
                id: session_id,
                owner: row.get(0)?,
                scope: row.get(1)?,
                started_at: row.get(2)?,
                ended_at: row.get(3)?,
                totals: SessionAggregate {
                    cards_reviewed: row.get(4)?,
                    forgot_count: row.get(5)?,
                    hard_count: row.get(6)?,
                    good_count: row.get(7)?,
                    easy_count: row.get(8)?,
                    duration_ms: row.get(9)?,
                },
            }))
        } else {
            Ok(None)
        }
    }

    /// Close a session and report its totals. Closing an already-closed
    /// session writes nothing and returns the summary as stored.
    pub fn end_session(
        &self,
        session_id: SessionId,
        owner: &str,
        now: Timestamp,
    ) -> Fallible<SessionSummary> {
        let record = self
            .session_record(session_id)?
            .ok_or_else(|| ErrorReport::not_found(format!("no session with id {session_id}")))?;
        if record.owner != owner {
            return Err(ErrorReport::permission_denied(format!(
                "session {session_id} is not owned by the caller"
            )));
        }
        if record.ended_at.is_none() {
            let conn = self.acquire();
            let sql = "update sessions set ended_at = ? where session_id = ?;";
            conn.execute(sql, (now, session_id))?;
            log::debug!("Ended session {session_id}.");
        }
        Ok(SessionSummary::of_aggregate(&record.totals))
    }

    /// The total number of review log entries.
    pub fn review_count(&self) -> Fallible<i64> {
        let conn = self.acquire();
        let sql = "select count(*) from reviews;";
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// A card's review log, oldest first.
    pub fn reviews_for_card(&self, card_hash: CardHash) -> Fallible<Vec<ReviewLogEntry>> {
        let mut reviews = Vec::new();
        let conn = self.acquire();
        let sql = "select grade, state_before, stability_before, difficulty_before, elapsed_days, scheduled_days, reviewed_at from reviews where card_hash = ? order by reviewed_at;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([card_hash])?;
        while let Some(row) = rows.next()? {
            reviews.push(ReviewLogEntry {
                grade: row.get(0)?,
                state_before: row.get(1)?,
                stability_before: row.get(2)?,
                difficulty_before: row.get(3)?,
                elapsed_days: row.get(4)?,
                scheduled_days: row.get(5)?,
                reviewed_at: row.get(6)?,
            });
        }
        Ok(reviews)
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

impl ReviewStore for Database {
    fn load_card(&self, card_hash: CardHash) -> Fallible<Option<CardRecord>> {
        self.card_record(card_hash)
    }

    fn load_session(&self, session_id: SessionId) -> Fallible<Option<SessionRecord>> {
        self.session_record(session_id)
    }

    /// Apply the three writes of one review as a unit. If any of them fails
    /// the transaction is dropped uncommitted and none of the records change.
    fn commit_review(&self, staged: &StagedReview) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        update_card(&tx, staged)?;
        insert_review(&tx, staged)?;
        increment_session(&tx, staged)?;
        tx.commit()?;
        Ok(())
    }
}

fn update_card(tx: &Transaction, staged: &StagedReview) -> Fallible<()> {
    let card = &staged.card;
    let sql = "update cards set due = ?, stability = ?, difficulty = ?, elapsed_days = ?, scheduled_days = ?, reps = ?, lapses = ?, state = ?, last_review = ? where card_hash = ?;";
    let updated = tx.execute(
        sql,
        (
            card.due,
            card.stability,
            card.difficulty,
            card.elapsed_days,
            card.scheduled_days,
            card.reps,
            card.lapses,
            card.state,
            card.last_review,
            staged.card_hash,
        ),
    )?;
    if updated != 1 {
        return Err(ErrorReport::internal(format!(
            "card {} disappeared during review commit",
            staged.card_hash
        )));
    }
    Ok(())
}

type ReviewId = i64;

fn insert_review(tx: &Transaction, staged: &StagedReview) -> Fallible<ReviewId> {
    let log = &staged.log;
    let sql = "insert into reviews (session_id, card_hash, grade, state_before, stability_before, difficulty_before, elapsed_days, scheduled_days, reviewed_at) values (?, ?, ?, ?, ?, ?, ?, ?, ?) returning review_id;";
    let review_id: ReviewId = tx.query_row(
        sql,
        (
            staged.session_id,
            staged.card_hash,
            log.grade,
            log.state_before,
            log.stability_before,
            log.difficulty_before,
            log.elapsed_days,
            log.scheduled_days,
            log.reviewed_at,
        ),
        |row| row.get(0),
    )?;
    Ok(review_id)
}

fn increment_session(tx: &Transaction, staged: &StagedReview) -> Fallible<()> {
    let grade_column = match staged.log.grade {
        Grade::Forgot => "forgot_count",
        Grade::Hard => "hard_count",
        Grade::Good => "good_count",
        Grade::Easy => "easy_count",
    };
    let sql = format!(
        "update sessions set cards_reviewed = cards_reviewed + 1, {grade_column} = {grade_column} + 1, duration_ms = duration_ms + ? where session_id = ?;"
    );
    let updated = tx.execute(&sql, (staged.time_spent_ms, staged.session_id))?;
    if updated != 1 {
        return Err(ErrorReport::internal(format!(
            "session {} disappeared during review commit",
            staged.session_id
        )));
    }
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
