//! Per-conversation history
//!
//! Each conversation id owns a slot guarded by an async mutex. The A2A
//! handler holds that lock for a whole turn, so messages on one id are
//! handled in order while different ids proceed in parallel.

use super::envelope::Role;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, time-ordered list of turns
#[derive(Debug)]
pub struct History {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl History {
    fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a turn, dropping the oldest beyond the cap.
    ///
    /// Timestamps never go backwards within one history even if the wall
    /// clock does.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = self.turns.back().map_or(now, |last| now.max(last.timestamp));

        self.turns.push_back(Turn {
            role,
            text: text.into(),
            timestamp,
        });
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
        timestamp
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

pub struct ConversationSlot {
    history: Mutex<History>,
    last_used: AtomicU64,
}

impl ConversationSlot {
    /// Exclusive access to the history for the duration of a turn
    pub async fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().await
    }
}

/// All live conversations, evicted least recently used first
pub struct ConversationStore {
    slots: DashMap<String, Arc<ConversationSlot>>,
    max_conversations: usize,
    max_turns: usize,
    clock: AtomicU64,
}

impl ConversationStore {
    pub fn new(max_conversations: usize, max_turns: usize) -> Self {
        Self {
            slots: DashMap::new(),
            max_conversations: max_conversations.max(1),
            max_turns: max_turns.max(1),
            clock: AtomicU64::new(0),
        }
    }

    /// Slot for `id`, created on first use.
    ///
    /// Marks the slot as most recently used and evicts idle slots while the
    /// store is over capacity. Slots that are checked out elsewhere are never
    /// evicted.
    pub fn checkout(&self, id: &str) -> Arc<ConversationSlot> {
        let slot = self
            .slots
            .entry(id.to_string())
            .or_insert_with(|| {
                Arc::new(ConversationSlot {
                    history: Mutex::new(History::new(self.max_turns)),
                    last_used: AtomicU64::new(0),
                })
            })
            .clone();

        let tick = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
        slot.last_used.store(tick, Ordering::Relaxed);

        self.evict_idle();
        slot
    }

    fn evict_idle(&self) {
        while self.slots.len() > self.max_conversations {
            let victim = self
                .slots
                .iter()
                .filter(|entry| Arc::strong_count(entry.value()) == 1)
                .min_by_key(|entry| entry.value().last_used.load(Ordering::Relaxed))
                .map(|entry| entry.key().clone());

            let Some(key) = victim else {
                break;
            };
            if self
                .slots
                .remove_if(&key, |_, slot| Arc::strong_count(slot) == 1)
                .is_some()
            {
                debug!(conversation_id = %key, "Evicted idle conversation");
            }
        }
    }

    /// Copy of the turns recorded for `id`
    pub async fn history(&self, id: &str) -> Vec<Turn> {
        let Some(slot) = self.slots.get(id).map(|entry| entry.value().clone()) else {
            return Vec::new();
        };
        let history = slot.lock().await;
        history.turns().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
