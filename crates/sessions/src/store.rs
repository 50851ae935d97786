//! In-memory conversation store.
//!
//! Each session id maps to a `SessionRecord` holding the ordered user and
//! assistant turns exchanged so far plus token counters. Nothing is written
//! to disk; records live until the process exits.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use cc_domain::message::{Turn, TurnRole};
use cc_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single conversation tracked by the store.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub turns: VecDeque<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl SessionRecord {
    fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_owned(),
            turns: VecDeque::new(),
            created_at: now,
            updated_at: now,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    /// Drop the oldest turns until at most `max_turns` remain. A leading
    /// assistant turn left behind by a drop goes too, so history always
    /// opens with a user turn. Returns the number of turns dropped.
    fn enforce_bound(&mut self, max_turns: usize) -> usize {
        if max_turns == 0 {
            return 0;
        }
        let mut dropped = 0;
        while self.turns.len() > max_turns {
            self.turns.pop_front();
            dropped += 1;
            while matches!(self.turns.front(), Some(t) if t.role == TurnRole::Assistant) {
                self.turns.pop_front();
                dropped += 1;
            }
        }
        dropped
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-wide, session-keyed conversation history.
pub struct ConversationStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    /// `0` = unbounded.
    max_turns: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Smallest bound that still holds one user/assistant pair.
pub const MIN_BOUNDED_TURNS: usize = 2;

impl ConversationStore {
    /// A non-zero `max_turns` below [`MIN_BOUNDED_TURNS`] is raised to it,
    /// so the exchange just appended is never trimmed away.
    pub fn new(max_turns: usize) -> Self {
        let max_turns = if max_turns == 0 {
            0
        } else {
            max_turns.max(MIN_BOUNDED_TURNS)
        };
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Return the session's record, creating an empty one on first use.
    pub fn get_or_create(&self, session_id: &str) -> SessionRecord {
        // Fast path: session already exists.
        {
            let sessions = self.sessions.read();
            if let Some(record) = sessions.get(session_id) {
                return record.clone();
            }
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| new_record(session_id))
            .clone()
    }

    /// Look up a session without creating it.
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Append one turn to the end of the session's history.
    pub fn append(&self, session_id: &str, turn: Turn) {
        self.mutate(session_id, |record| record.turns.push_back(turn));
    }

    /// Append a completed user/assistant pair under one lock, so readers
    /// never observe the user turn without its answer.
    pub fn append_exchange(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        self.mutate(session_id, |record| {
            record.turns.push_back(Turn::user(user_text));
            record.turns.push_back(Turn::assistant(assistant_text));
        });
    }

    /// Clear every turn of a session. Idempotent. Returns whether the
    /// session existed.
    pub fn reset(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write();
        let Some(record) = sessions.get_mut(session_id) else {
            return false;
        };

        let cleared_turns = record.turns.len();
        record.turns.clear();
        record.updated_at = Utc::now();

        TraceEvent::SessionReset {
            session_id: session_id.to_owned(),
            cleared_turns,
        }
        .emit();

        true
    }

    /// Copy of the session's turns, oldest first. Unknown sessions yield an
    /// empty history.
    pub fn snapshot(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .get(session_id)
            .map(|r| r.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Add token counters for a session.
    pub fn record_usage(&self, session_id: &str, input_tokens: u64, output_tokens: u64) {
        let mut sessions = self.sessions.write();
        if let Some(record) = sessions.get_mut(session_id) {
            record.input_tokens += input_tokens;
            record.output_tokens += output_tokens;
            record.updated_at = Utc::now();
        }
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn mutate(&self, session_id: &str, f: impl FnOnce(&mut SessionRecord)) {
        let mut sessions = self.sessions.write();
        let record = sessions
            .entry(session_id.to_owned())
            .or_insert_with(|| new_record(session_id));

        f(record);
        record.updated_at = Utc::now();

        let dropped_turns = record.enforce_bound(self.max_turns);
        if dropped_turns > 0 {
            TraceEvent::HistoryTruncated {
                session_id: session_id.to_owned(),
                dropped_turns,
            }
            .emit();
        }
    }
}

fn new_record(session_id: &str) -> SessionRecord {
    TraceEvent::SessionCreated {
        session_id: session_id.to_owned(),
    }
    .emit();
    SessionRecord::new(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_starts_empty() {
        let store = ConversationStore::default();
        let record = store.get_or_create("s1");
        assert_eq!(record.session_id, "s1");
        assert!(record.turns.is_empty());
        assert!(store.contains("s1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_or_create_returns_existing() {
        let store = ConversationStore::default();
        store.append("s1", Turn::user("hi"));
        let record = store.get_or_create("s1");
        assert_eq!(record.turns.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_exchange_adds_pair_in_order() {
        let store = ConversationStore::default();
        store.append_exchange("s1", "Hello", "Hi there");
        store.append_exchange("s1", "How are you?", "Fine");

        let turns = store.snapshot("s1");
        assert_eq!(
            turns,
            vec![
                Turn::user("Hello"),
                Turn::assistant("Hi there"),
                Turn::user("How are you?"),
                Turn::assistant("Fine"),
            ]
        );
    }

    #[test]
    fn snapshot_of_unknown_session_is_empty() {
        let store = ConversationStore::default();
        assert!(store.snapshot("nope").is_empty());
        assert!(!store.contains("nope"));
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = ConversationStore::default();
        store.append("s1", Turn::user("one"));
        let before = store.snapshot("s1");
        store.append("s1", Turn::assistant("two"));
        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot("s1").len(), 2);
    }

    #[test]
    fn reset_clears_all_turns_and_is_idempotent() {
        let store = ConversationStore::default();
        for i in 0..5 {
            store.append_exchange("s1", &format!("q{i}"), &format!("a{i}"));
        }
        assert!(store.reset("s1"));
        assert!(store.snapshot("s1").is_empty());
        assert!(store.reset("s1"));
        assert!(store.snapshot("s1").is_empty());
    }

    #[test]
    fn reset_unknown_session_reports_missing() {
        let store = ConversationStore::default();
        assert!(!store.reset("ghost"));
        assert!(store.is_empty());
    }

    #[test]
    fn reset_leaves_other_sessions_alone() {
        let store = ConversationStore::default();
        store.append_exchange("a", "q", "r");
        store.append_exchange("b", "q", "r");
        store.reset("a");
        assert_eq!(store.snapshot("b").len(), 2);
    }

    #[test]
    fn bounded_history_drops_oldest_pairs() {
        let store = ConversationStore::new(4);
        store.append_exchange("s1", "q1", "a1");
        store.append_exchange("s1", "q2", "a2");
        store.append_exchange("s1", "q3", "a3");

        let turns = store.snapshot("s1");
        assert_eq!(
            turns,
            vec![
                Turn::user("q2"),
                Turn::assistant("a2"),
                Turn::user("q3"),
                Turn::assistant("a3"),
            ]
        );
    }

    #[test]
    fn bounded_history_never_starts_with_assistant() {
        let store = ConversationStore::new(3);
        store.append_exchange("s1", "q1", "a1");
        store.append_exchange("s1", "q2", "a2");

        let turns = store.snapshot("s1");
        assert_eq!(turns.first().map(|t| t.role), Some(TurnRole::User));
        assert!(turns.len() <= 3);
    }

    #[test]
    fn single_turn_bound_keeps_latest_exchange() {
        let store = ConversationStore::new(1);
        store.append_exchange("s1", "q1", "a1");
        assert_eq!(store.snapshot("s1"), vec![Turn::user("q1"), Turn::assistant("a1")]);

        store.append_exchange("s1", "q2", "a2");
        assert_eq!(store.snapshot("s1"), vec![Turn::user("q2"), Turn::assistant("a2")]);
    }

    #[test]
    fn zero_bound_is_unbounded() {
        let store = ConversationStore::new(0);
        for i in 0..200 {
            store.append_exchange("s1", &format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(store.snapshot("s1").len(), 400);
    }

    #[test]
    fn record_usage_accumulates() {
        let store = ConversationStore::default();
        store.get_or_create("s1");
        store.record_usage("s1", 10, 5);
        store.record_usage("s1", 1, 2);
        let record = store.get("s1").unwrap();
        assert_eq!(record.input_tokens, 11);
        assert_eq!(record.output_tokens, 7);
    }

    #[test]
    fn record_serializes_turns() {
        let store = ConversationStore::default();
        store.append_exchange("s1", "Hello", "Hi");
        let json = serde_json::to_value(store.get("s1").unwrap()).unwrap();
        assert_eq!(json["turns"][0]["role"], "user");
        assert_eq!(json["turns"][1]["content"], "Hi");
    }
}
