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

//! The review pipeline: applies exactly one review end to end, or nothing.
//! All preconditions are checked before any write; the three resulting
//! writes (card update, log append, session increment) go through the
//! store as one commit-or-abort unit.

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fsrs::Difficulty;
use crate::fsrs::Grade;
use crate::fsrs::Stability;
use crate::scheduler::Scheduler;
use crate::scheduler::SchedulingInfo;
use crate::types::card::CardRecord;
use crate::types::card::CardState;
use crate::types::card::State;
use crate::types::card_hash::CardHash;
use crate::types::review::ReviewLogEntry;
use crate::types::session::SessionId;
use crate::types::session::SessionRecord;
use crate::types::timestamp::Timestamp;

/// What the pipeline needs from a backing store. The pipeline never issues
/// individual writes: it stages one [`StagedReview`] and the store applies
/// it atomically, whatever its transaction primitive is.
pub trait ReviewStore {
    fn load_card(&self, card_hash: CardHash) -> Fallible<Option<CardRecord>>;
    fn load_session(&self, session_id: SessionId) -> Fallible<Option<SessionRecord>>;
    /// Apply the card update, the log append, and the session increment as
    /// one unit. On error, none of the three may have taken effect.
    fn commit_review(&self, staged: &StagedReview) -> Fallible<()>;
}

/// The three writes of one review, staged for a single commit.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedReview {
    pub session_id: SessionId,
    pub card_hash: CardHash,
    /// The card's state after the review.
    pub card: CardState,
    /// The log entry to append.
    pub log: ReviewLogEntry,
    /// How long the learner spent on the card, for the session totals.
    pub time_spent_ms: i64,
}

/// One review, as submitted by a caller.
#[derive(Clone, Debug)]
pub struct ReviewRequest {
    pub session_id: SessionId,
    pub card_hash: CardHash,
    pub grade: Grade,
    pub time_spent_ms: i64,
}

/// What a successful review reports back.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewOutcome {
    pub due: Timestamp,
    pub scheduled_days: i64,
    pub stability: Stability,
    pub difficulty: Difficulty,
    pub state: State,
}

/// Apply one review on behalf of `owner`, atomically.
///
/// The caller is assumed to be authenticated already; this checks only that
/// the session and card belong to them. Any error before the commit leaves
/// the store untouched; an `Internal` error from the commit itself leaves no
/// partial state either, so the same request can be resubmitted safely.
pub fn review_card_in_session<S: ReviewStore>(
    store: &S,
    scheduler: &Scheduler,
    owner: &str,
    request: &ReviewRequest,
    now: Timestamp,
) -> Fallible<ReviewOutcome> {
    if request.time_spent_ms < 0 {
        return Err(ErrorReport::invalid_argument(
            "time spent must be non-negative",
        ));
    }
    let session = store.load_session(request.session_id)?.ok_or_else(|| {
        ErrorReport::not_found(format!("no session with id {}", request.session_id))
    })?;
    if session.owner != owner {
        return Err(ErrorReport::permission_denied(format!(
            "session {} is not owned by the caller",
            request.session_id
        )));
    }
    let record = store
        .load_card(request.card_hash)?
        .ok_or_else(|| ErrorReport::not_found(format!("no card with hash {}", request.card_hash)))?;
    if record.owner != owner {
        return Err(ErrorReport::permission_denied(format!(
            "card {} is not owned by the caller",
            request.card_hash
        )));
    }

    let SchedulingInfo { card, log } =
        scheduler.schedule_card_for_rating(&record.card, request.grade, now);
    log::debug!(
        "{} {} S={:.2}d D={:.2} due={}",
        &request.card_hash.to_hex()[..8],
        request.grade,
        card.stability,
        card.difficulty,
        card.due.into_inner()
    );

    let staged = StagedReview {
        session_id: request.session_id,
        card_hash: request.card_hash,
        card: card.clone(),
        log,
        time_spent_ms: request.time_spent_ms,
    };
    store.commit_review(&staged)?;

    Ok(ReviewOutcome {
        due: card.due,
        scheduled_days: card.scheduled_days,
        stability: card.stability,
        difficulty: card.difficulty,
        state: card.state,
    })
}
