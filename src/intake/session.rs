// src/intake/session.rs

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use super::Stage;
use crate::trip::PartialTripInput;

/// Intake state of a single chat
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub chat_id: String,
    pub stage: Stage,
    pub trip: PartialTripInput,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(chat_id: String) -> Self {
        Self {
            chat_id,
            stage: Stage::Idle,
            trip: PartialTripInput::default(),
            last_active: Utc::now(),
        }
    }

    pub fn mark_active(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_stale(&self, max_idle: Duration) -> bool {
        let elapsed = Utc::now() - self.last_active;
        elapsed.to_std().map(|e| e > max_idle).unwrap_or(false)
    }
}

pub type SessionHandle = Arc<Mutex<ConversationSession>>;

/// All live conversations, keyed by chat id.
///
/// Each session sits behind its own mutex. Holding it for the whole handling of
/// a message keeps one chat strictly sequential while other chats run in
/// parallel; tokio's mutex is fair, so waiting messages run in arrival order.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `chat_id`, creating it on first contact.
    pub async fn session(&self, chat_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(chat_id) {
            return handle.clone();
        }

        self.sessions
            .write()
            .await
            .entry(chat_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationSession::new(chat_id.to_string()))))
            .clone()
    }

    /// Copy of a session's current state, if it exists.
    pub async fn snapshot(&self, chat_id: &str) -> Option<ConversationSession> {
        let handle = self.sessions.read().await.get(chat_id).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle longer than `max_idle`. Sessions in use are kept.
    pub async fn evict_stale(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => !session.is_stale(max_idle),
                Err(_) => true,
            }
        });
        before - sessions.len()
    }
}
