//! Per-conversation state and the store that owns it.
//!
//! A [`ChatSession`] is the only multi-turn state in the system: one
//! [`ConversationMemory`] plus the most recent attachment. The
//! [`SessionStore`] hands out one `Arc<Mutex<ChatSession>>` per key, so
//! turns of one session serialize on its mutex while different sessions
//! run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uuid::Uuid;

use switchboard_core::config::MemoryConfig;

use crate::error::ChatError;
use crate::memory::{ConversationMemory, Interaction};

// =============================================================================
// ChatSession
// =============================================================================

/// Most recent attachment seen by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttachmentSlot {
    #[default]
    Empty,
    Document {
        text: String,
        summary: String,
        pages: usize,
    },
    Image {
        bytes: Vec<u8>,
    },
}

/// One conversation: memory plus the attachment slot.
#[derive(Debug)]
pub struct ChatSession {
    key: String,
    memory: ConversationMemory,
    slot: AttachmentSlot,
}

impl ChatSession {
    pub fn new(key: impl Into<String>, config: &MemoryConfig) -> Self {
        Self {
            key: key.into(),
            memory: ConversationMemory::from_config(config),
            slot: AttachmentSlot::Empty,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ConversationMemory {
        &mut self.memory
    }

    pub fn slot(&self) -> &AttachmentSlot {
        &self.slot
    }

    /// Replace the slot with the latest attachment.
    pub fn set_slot(&mut self, slot: AttachmentSlot) {
        self.slot = slot;
    }

    /// Forget the conversation. The attachment slot is kept.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    pub fn summary(&self) -> String {
        self.memory.summary()
    }

    pub fn history(&self) -> Vec<Interaction> {
        self.memory.history().cloned().collect()
    }
}

// =============================================================================
// SessionStore
// =============================================================================

struct Entry {
    session: Arc<tokio::sync::Mutex<ChatSession>>,
    last_seen: Instant,
}

/// Key to session map with idle expiry.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle_timeout: Duration,
    memory: MemoryConfig,
}

impl SessionStore {
    pub fn new(memory: MemoryConfig) -> Self {
        let idle_timeout = Duration::from_secs(memory.session_timeout_minutes.saturating_mul(60));
        Self::with_idle_timeout(memory, idle_timeout)
    }

    pub fn with_idle_timeout(memory: MemoryConfig, idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
            memory,
        }
    }

    /// Session for `key`, created on first use. Expired sessions are
    /// dropped first, so a key idle past the timeout starts fresh.
    pub fn get_or_create(&self, key: &str) -> Result<Arc<tokio::sync::Mutex<ChatSession>>, ChatError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ChatError::EmptySessionKey);
        }
        let mut sessions = self.lock();
        Self::purge(&mut sessions, self.idle_timeout);

        let entry = sessions.entry(key.to_string()).or_insert_with(|| {
            info!(session = %key, "session created");
            Entry {
                session: Arc::new(tokio::sync::Mutex::new(ChatSession::new(key, &self.memory))),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        Ok(entry.session.clone())
    }

    /// New session under a generated key.
    pub fn create(&self) -> (String, Arc<tokio::sync::Mutex<ChatSession>>) {
        let key = Uuid::new_v4().to_string();
        let session = Arc::new(tokio::sync::Mutex::new(ChatSession::new(&key, &self.memory)));
        self.lock().insert(
            key.clone(),
            Entry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        info!(session = %key, "session created");
        (key, session)
    }

    /// Existing, unexpired session for `key`.
    pub fn get(&self, key: &str) -> Result<Arc<tokio::sync::Mutex<ChatSession>>, ChatError> {
        let mut sessions = self.lock();
        Self::purge(&mut sessions, self.idle_timeout);
        match sessions.get_mut(key) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                Ok(entry.session.clone())
            }
            None => Err(ChatError::SessionNotFound(key.to_string())),
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop sessions idle past the timeout; returns how many went.
    pub fn purge_expired(&self) -> usize {
        Self::purge(&mut self.lock(), self.idle_timeout)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn purge(sessions: &mut HashMap<String, Entry>, idle_timeout: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|key, entry| {
            let keep = entry.last_seen.elapsed() <= idle_timeout;
            if !keep {
                debug!(session = %key, "session expired");
            }
            keep
        });
        before - sessions.len()
    }
}
