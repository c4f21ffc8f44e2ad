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

//! End-to-end walkthrough: a learner registers cards, studies them across
//! several simulated days, and closes the session, against a database on
//! disk.

use chrono::DateTime;
use chrono::Utc;

use mnemo::CardHash;
use mnemo::Database;
use mnemo::ErrorReport;
use mnemo::Fallible;
use mnemo::Grade;
use mnemo::ReviewRequest;
use mnemo::Scheduler;
use mnemo::SchedulerConfig;
use mnemo::SessionScope;
use mnemo::State;
use mnemo::Timestamp;
use mnemo::review_card_in_session;

fn t0() -> Timestamp {
    Timestamp::new(
        DateTime::parse_from_rfc3339("2025-06-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc),
    )
}

fn hash(content: &str) -> CardHash {
    CardHash::of_content(content.as_bytes())
}

fn review(
    db: &Database,
    scheduler: &Scheduler,
    owner: &str,
    session_id: i64,
    card_hash: CardHash,
    grade: Grade,
    time_spent_ms: i64,
    now: Timestamp,
) -> Fallible<mnemo::ReviewOutcome> {
    let request = ReviewRequest {
        session_id,
        card_hash,
        grade,
        time_spent_ms,
    };
    review_card_in_session(db, scheduler, owner, &request, now)
}

#[test]
fn test_walkthrough() -> Fallible<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let directory = tempfile::tempdir().unwrap();
    let db_path = directory.path().join("db.sqlite3");
    let db_path = db_path.to_str().unwrap();
    let db = Database::new(db_path)?;
    let scheduler = Scheduler::new(SchedulerConfig::default())?;

    // Alice registers three cards, Bob one.
    let card_a = hash("ser: to be (essential)");
    let card_b = hash("estar: to be (state)");
    let card_c = hash("tener: to have");
    db.add_card("alice", card_a, t0())?;
    db.add_card("alice", card_b, t0())?;
    db.add_card("alice", card_c, t0())?;
    let card_bob = hash("bonjour: hello");
    db.add_card("bob", card_bob, t0())?;

    // New cards are due immediately, and owners only see their own.
    let due = db.due_cards("alice", t0())?;
    assert_eq!(due.len(), 3);
    assert!(!due.contains(&card_bob));

    // Day one: Alice studies everything that is due.
    let session_id = db.start_session("alice", SessionScope::Deck("spanish".to_string()), t0())?;
    let outcome_a = review(&db, &scheduler, "alice", session_id, card_a, Grade::Good, 6_000, t0())?;
    assert_eq!(outcome_a.state, State::Review);
    assert_eq!(outcome_a.due, t0().plus_days(outcome_a.scheduled_days));
    let outcome_b = review(&db, &scheduler, "alice", session_id, card_b, Grade::Forgot, 11_000, t0())?;
    assert_eq!(outcome_b.state, State::Relearning);
    assert_eq!(outcome_b.scheduled_days, 1);
    let outcome_c = review(&db, &scheduler, "alice", session_id, card_c, Grade::Easy, 3_000, t0())?;
    assert!(outcome_c.scheduled_days > outcome_a.scheduled_days);

    // The forgotten card lapsed.
    let record_b = db.card_record(card_b)?.unwrap();
    assert_eq!(record_b.card.lapses, 1);
    assert_eq!(record_b.card.reps, 1);

    // Two days later, the forgotten card and the `Good` card are both due
    // again, in due order.
    let day_three = t0().plus_days(2);
    let due = db.due_cards("alice", day_three)?;
    assert_eq!(due, vec![card_b, card_a]);

    let outcome = review(&db, &scheduler, "alice", session_id, card_b, Grade::Good, 5_000, day_three)?;
    assert_eq!(outcome.state, State::Review);
    let outcome = review(&db, &scheduler, "alice", session_id, card_a, Grade::Good, 4_000, day_three)?;
    assert_eq!(outcome.state, State::Review);
    let record_a = db.card_record(card_a)?.unwrap();
    assert_eq!(record_a.card.reps, 2);
    assert_eq!(record_a.card.elapsed_days, 2);
    assert!(record_a.card.stability > outcome_a.stability);

    // Every review left exactly one log entry.
    assert_eq!(db.review_count()?, 5);
    let log_a = db.reviews_for_card(card_a)?;
    assert_eq!(log_a.len(), 2);
    assert_eq!(log_a[0].state_before, State::New);
    assert_eq!(log_a[1].state_before, State::Review);
    assert_eq!(log_a[1].elapsed_days, 2);

    // Bob cannot review Alice's card through his own session, and the
    // failed attempt leaves no trace.
    let bob_session = db.start_session("bob", SessionScope::All, day_three)?;
    let result = review(&db, &scheduler, "bob", bob_session, card_a, Grade::Easy, 1_000, day_three);
    assert!(matches!(result, Err(ErrorReport::PermissionDenied(_))));
    assert_eq!(db.review_count()?, 5);
    assert_eq!(
        db.session_record(bob_session)?.unwrap().totals.cards_reviewed,
        0
    );

    // Alice closes her session: five reviews, one of them forgotten, four
    // successes.
    let summary = db.end_session(session_id, "alice", day_three.plus_seconds(600))?;
    assert_eq!(summary.cards_reviewed, 5);
    assert_eq!(summary.forgot_count, 1);
    assert_eq!(summary.good_count, 3);
    assert_eq!(summary.easy_count, 1);
    assert_eq!(summary.duration_ms, 29_000);
    assert_eq!(summary.success_rate, 0.8);

    // Closing again is harmless and reports the same numbers.
    let again = db.end_session(session_id, "alice", day_three.plus_seconds(1_200))?;
    assert_eq!(again, summary);

    // Everything survives reopening the database.
    drop(db);
    let db = Database::new(db_path)?;
    assert_eq!(db.review_count()?, 5);
    let record = db.card_record(card_a)?.unwrap();
    assert_eq!(record.card.reps, 2);
    assert_eq!(record.owner, "alice");
    Ok(())
}

#[test]
fn test_preview_matches_committed_review() -> Fallible<()> {
    let db = Database::in_memory()?;
    let scheduler = Scheduler::new(SchedulerConfig::default())?;
    let card_hash = hash("koan");
    db.add_card("alice", card_hash, t0())?;
    let session_id = db.start_session("alice", SessionScope::All, t0())?;

    // The caller previews all four outcomes, then the learner picks one;
    // the committed result is exactly the previewed one.
    let record = db.card_record(card_hash)?.unwrap();
    let preview = scheduler.repeat(&record.card, t0());
    let outcome = review(&db, &scheduler, "alice", session_id, card_hash, Grade::Hard, 2_000, t0())?;
    let previewed = &preview.get(Grade::Hard).card;
    assert_eq!(outcome.due, previewed.due);
    assert_eq!(outcome.scheduled_days, previewed.scheduled_days);
    assert_eq!(outcome.stability, previewed.stability);
    assert_eq!(outcome.difficulty, previewed.difficulty);
    assert_eq!(db.card_record(card_hash)?.unwrap().card, *previewed);
    Ok(())
}
