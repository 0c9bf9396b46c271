//! Lobby roster view: expected students against live presence.

use std::fmt::Write;

use crate::model::Student;
use crate::state::{ConnectionStatus, LiveView};

/// Render the roster: online count over the expected count, then one
/// marker line per expected student. Presence matches by student id.
#[must_use]
pub fn render_roster(expected: &[Student], view: &LiveView) -> String {
    let online = expected
        .iter()
        .filter(|student| view.is_online(&student.id.to_string()))
        .count();
    let channel = match view.status {
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Disconnected => "disconnected",
    };

    let mut out = String::new();
    let _ = writeln!(out, "Students {online}/{} - live channel {channel}", expected.len());

    if expected.is_empty() {
        let _ = writeln!(out, "  no students expected for this experience");
        return out;
    }

    for student in expected {
        let (marker, tag) = if view.is_online(&student.id.to_string()) {
            ("[*]", "in lobby")
        } else {
            ("[ ]", "offline")
        };
        let _ = writeln!(out, "  {marker} {} ({tag})", student.name);
    }
    out
}

#[cfg(test)]
#[path = "roster_test.rs"]
mod tests;
