//! Domain types mirrored from the Imersiva backend.
//!
//! DESIGN
//! ======
//! Everything here is a read-only cache of backend state: the console never
//! owns an experience, it only renders one. The two enums that gate client
//! behavior, `SessionKind` (which live event set applies) and
//! `ExperienceStatus` (monotonic lifecycle), are closed sets so dispatch
//! can match exhaustively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// SESSION KIND
// =============================================================================

/// Scenario template of an experience. Selects which inbound and outbound
/// live events are relevant; the two kinds are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Chat-driven scenario: the live view is an ordered message log.
    Restaurant,
    /// Game-driven scenario: the live view is per-student state snapshots.
    Fair,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown session kind: {0}")]
pub struct KindError(String);

impl SessionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restaurant => "restaurant",
            Self::Fair => "fair",
        }
    }
}

impl FromStr for SessionKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "restaurant" => Ok(Self::Restaurant),
            "fair" => Ok(Self::Fair),
            _ => Err(KindError(s.to_owned())),
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EXPERIENCE STATUS
// =============================================================================

/// Lifecycle of an experience. Transitions only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceStatus {
    /// Created, waiting for students to connect.
    #[default]
    Beginning,
    /// Scenario running.
    Ongoing,
    /// Scenario finished; the live channel is no longer relevant.
    Ended,
}

#[derive(Debug, thiserror::Error)]
#[error("cannot move experience status backward from {from} to {to}")]
pub struct StatusError {
    pub from: ExperienceStatus,
    pub to: ExperienceStatus,
}

impl ExperienceStatus {
    /// Advance to `next`, refusing reverse transitions. Advancing to the
    /// current status is a no-op.
    pub fn advance_to(self, next: ExperienceStatus) -> Result<ExperienceStatus, StatusError> {
        if next < self {
            return Err(StatusError { from: self, to: next });
        }
        Ok(next)
    }
}

impl fmt::Display for ExperienceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Beginning => "BEGINNING",
            Self::Ongoing => "ONGOING",
            Self::Ended => "ENDED",
        };
        f.write_str(label)
    }
}

// =============================================================================
// ROLES
// =============================================================================

/// Sender role on the live channel. `Npc` is the scenario narrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Npc,
    Teacher,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Npc => "npc",
            Self::Teacher => "teacher",
        }
    }
}

// =============================================================================
// ROSTER AND DASHBOARD ENTITIES
// =============================================================================

/// A student expected in an experience. Fetched once with the experience
/// metadata and immutable for the page's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub grade: i32,
}

/// A school with its class list. The backend nests classes under the
/// literal key `Class`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolWithClasses {
    pub id: Uuid,
    pub name: String,
    pub city_id: Uuid,
    #[serde(rename = "Class", default)]
    pub classes: Vec<Class>,
}

/// Teacher profile returned by the auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// =============================================================================
// EXPERIENCE
// =============================================================================

/// One scheduled, PIN-identified scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub name: String,
    pub class_id: Uuid,
    pub user_id: Uuid,
    pub pin: String,
    pub template_name: String,
    #[serde(default)]
    pub status: ExperienceStatus,
    #[serde(default)]
    pub students: Vec<Student>,
    pub created_at: String,
}

impl Experience {
    /// Derive the session kind from the scenario template name.
    pub fn kind(&self) -> Result<SessionKind, KindError> {
        self.template_name.parse()
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
