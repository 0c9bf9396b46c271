//! Live view state and reducers.
//!
//! DESIGN
//! ======
//! Three independent slices (roster presence, message log, per-student
//! scenario map) plus a binary connection status, folded by one pure
//! function. `apply` takes the receipt timestamp as a parameter so a test
//! can feed a fixed event sequence and assert final contents with no clock
//! involved. No slice ever mutates another; ordering beyond "apply in
//! receipt order" carries no meaning.
//!
//! TRADE-OFFS
//! ==========
//! The message log is bounded (oldest dropped past [`MESSAGE_LOG_CAP`]).
//! The source of truth for the transcript is the backend; this cap only
//! bounds what one long-lived console session holds in memory.

use std::collections::HashMap;

use serde_json::Value;

use crate::event::{ChatMessage, Inbound, PresenceEntry, ScenarioFields};
use crate::model::SessionKind;

/// Upper bound on retained chat messages.
pub const MESSAGE_LOG_CAP: usize = 1000;

/// Connection status as reflected by the transport. No error detail is
/// carried; recovery is the transport's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

/// Accumulated view state for one bound session.
#[derive(Debug, Clone, Default)]
pub struct LiveView {
    pub status: ConnectionStatus,
    /// Presence roster. Replaced wholesale on every scoped broadcast.
    pub roster: Vec<PresenceEntry>,
    /// Ordered chat transcript, receipt order.
    pub messages: Vec<ChatMessage>,
    /// Per-student scenario state, keyed by student id.
    pub scenario: HashMap<String, ScenarioFields>,
}

impl LiveView {
    /// Fold one inbound event into the view.
    ///
    /// `pin` scopes roster broadcasts; `kind` gates the kind-specific
    /// events: a chat message in a fair session (or scenario state in a
    /// restaurant session) is ignored, never merged. `received_at` stamps
    /// chat messages whose payload carries no timestamp.
    pub fn apply(&mut self, event: &Inbound, pin: &str, kind: SessionKind, received_at: i64) {
        match event {
            Inbound::Connected => {
                self.status = ConnectionStatus::Connected;
            }
            Inbound::Disconnected => {
                // Presence is only meaningful while connected; transcript and
                // scenario state persist until explicit teardown.
                self.status = ConnectionStatus::Disconnected;
                self.roster.clear();
            }
            Inbound::System(_) => {}
            Inbound::Roster { experience_id, students } => {
                if experience_id == pin {
                    self.roster = students.clone();
                }
            }
            Inbound::Chat(message) => {
                if kind != SessionKind::Restaurant {
                    return;
                }
                let mut message = message.clone();
                if message.timestamp.is_none() {
                    message.timestamp = Some(received_at);
                }
                self.messages.push(message);
                if self.messages.len() > MESSAGE_LOG_CAP {
                    let excess = self.messages.len() - MESSAGE_LOG_CAP;
                    self.messages.drain(..excess);
                }
            }
            Inbound::ScenarioUpdate { student_id, state } => {
                if kind != SessionKind::Fair {
                    return;
                }
                let entry = self.scenario.entry(student_id.clone()).or_default();
                for (field, value) in state {
                    entry.insert(field.clone(), value.clone());
                }
            }
            Inbound::ScenarioSnapshot(states) => {
                if kind != SessionKind::Fair {
                    return;
                }
                let mut next = HashMap::with_capacity(states.len());
                for fields in states {
                    // Entries without a student id have no key to live under.
                    let Some(id) = fields.get("studentId").and_then(Value::as_str) else {
                        continue;
                    };
                    next.insert(id.to_owned(), fields.clone());
                }
                self.scenario = next;
            }
        }
    }

    /// Discard everything. Used on binding teardown.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a student (by id) currently appears in the presence roster.
    #[must_use]
    pub fn is_online(&self, student_id: &str) -> bool {
        self.roster.iter().any(|entry| entry.student_id == student_id)
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
