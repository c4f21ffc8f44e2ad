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

//! mnemo: a spaced repetition scheduling engine.
//!
//! This library provides:
//! - The FSRS scheduling algorithm (stability/difficulty memory model)
//! - Card memory state and its lifecycle state machine
//! - A transactional review pipeline: each review updates the card, appends
//!   to an audit log, and bumps the session totals as one atomic unit
//! - Study session tracking with per-grade totals
//!
//! Card content, rendering, and authentication live outside this crate:
//! callers hand the engine a card's prior state and a grade, and persist
//! what comes back.

pub mod config;
pub mod db;
pub mod error;
pub mod fsrs;
pub mod review;
pub mod scheduler;
pub mod types;

// Re-exports for convenience
pub use config::{SchedulerConfig, Weights};
pub use db::Database;
pub use error::{ErrorReport, Fallible};
pub use fsrs::Grade;
pub use review::{ReviewOutcome, ReviewRequest, ReviewStore, StagedReview, review_card_in_session};
pub use scheduler::{Preview, Scheduler, SchedulingInfo};
pub use types::card::{CardRecord, CardState, State};
pub use types::card_hash::CardHash;
pub use types::review::ReviewLogEntry;
pub use types::session::{
    SessionAggregate, SessionId, SessionRecord, SessionScope, SessionSummary,
};
pub use types::timestamp::Timestamp;
