//! Wire event model for the live session channel.
//!
//! ARCHITECTURE
//! ============
//! Every push update is a JSON envelope `{"event": <name>, "data": <payload>}`
//! carried in a WebSocket text frame. Inbound envelopes decode into the
//! [`Inbound`] sum type and flow through a single dispatch path; outbound
//! notifications encode from [`Outbound`]. The connection lifecycle variants
//! (`Connected`, `Disconnected`) never appear on the wire; the transport
//! layer synthesizes them so consumers see one event stream.
//!
//! DESIGN
//! ======
//! - Scenario payloads stay flat `Map<String, Value>`: the per-student game
//!   state is free-form per scenario template, and the merge rule is
//!   per-field, so a typed struct would freeze a shape the backend does not
//!   promise.
//! - A payload that fails typed decode (including a scenario update missing
//!   its `studentId`) is an error here and gets dropped by the transport;
//!   it never produces a partial merge.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Role;

/// Flat per-student scenario payload. Keys mirror the backend's camelCase
/// field names (`points`, `customerOrder`, `lastTranscription`, ...).
pub type ScenarioFields = Map<String, Value>;

// =============================================================================
// PAYLOAD TYPES
// =============================================================================

/// A currently-connected participant as reported by the push server.
/// The whole roster is replaced on every broadcast; entries are never
/// patched individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub student_id: String,
    pub name: String,
    pub socket_id: String,
    pub user_type: Role,
}

/// One chat transcript entry. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub from: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// Milliseconds since the Unix epoch. Stamped at receipt when the
    /// payload carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// Everything the binding can receive, as one matchable sum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Inbound {
    /// Transport established. Synthesized by the channel, never on the wire.
    #[serde(skip)]
    Connected,
    /// Transport lost. Synthesized by the channel, never on the wire.
    #[serde(skip)]
    Disconnected,
    /// Free-text server notice. Logged, never merged into view state.
    #[serde(rename = "systemMessage")]
    System(String),
    /// Full roster broadcast scoped to one experience PIN.
    #[serde(rename = "roomUpdate", rename_all = "camelCase")]
    Roster {
        experience_id: String,
        students: Vec<PresenceEntry>,
    },
    /// Chat transcript entry (restaurant sessions).
    #[serde(rename = "chat:message")]
    Chat(ChatMessage),
    /// Partial per-student game state (fair sessions). Shallow-merged.
    #[serde(rename = "fair:stateUpdate", rename_all = "camelCase")]
    ScenarioUpdate {
        student_id: String,
        state: ScenarioFields,
    },
    /// Full-roster game state snapshot (fair sessions). Replaces the map.
    #[serde(rename = "teacher:studentsState")]
    ScenarioSnapshot(Vec<ScenarioFields>),
}

// =============================================================================
// OUTBOUND NOTIFICATIONS
// =============================================================================

/// Fire-and-forget notifications the console sends. No acknowledgement is
/// awaited for any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Outbound {
    /// Presence announcement, sent on bind open and on every reconnect.
    #[serde(rename = "joinExperience", rename_all = "camelCase")]
    Join {
        experience_id: String,
        student_id: String,
        name: String,
        user_type: Role,
    },
    /// Best-effort goodbye on teardown.
    #[serde(rename = "leaveExperience")]
    Leave,
    /// End the experience identified by this PIN.
    #[serde(rename = "endExperience")]
    End(String),
    #[serde(rename = "chat:studentMessage", rename_all = "camelCase")]
    StudentMessage {
        experience_id: String,
        student_id: String,
        text: String,
    },
    #[serde(rename = "chat:npcMessage", rename_all = "camelCase")]
    NpcMessage {
        experience_id: String,
        student_id: String,
        text: String,
    },
}

// =============================================================================
// CODEC
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to decode event envelope: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode event envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode one wire envelope. Unknown event names and malformed payloads are
/// errors; callers drop them without touching view state.
pub fn decode_inbound(text: &str) -> Result<Inbound, EventError> {
    serde_json::from_str(text).map_err(EventError::Decode)
}

/// Encode one outbound notification as a wire envelope.
pub fn encode_outbound(event: &Outbound) -> Result<String, EventError> {
    serde_json::to_string(event).map_err(EventError::Encode)
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
