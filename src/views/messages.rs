//! Chat transcript view for restaurant sessions.

use std::collections::HashMap;
use std::fmt::Write;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::state::LiveView;

/// Render the transcript in receipt order. `names` maps student ids to
/// display names for message attribution; unknown ids fall back to the id
/// itself.
#[must_use]
pub fn render_messages(view: &LiveView, names: &HashMap<String, String>) -> String {
    let mut out = String::new();

    if view.messages.is_empty() {
        let _ = writeln!(out, "No messages yet");
        return out;
    }

    for message in &view.messages {
        let who = match &message.student_id {
            Some(id) => {
                let name = names.get(id).map_or(id.as_str(), String::as_str);
                format!("{} {name}", message.from.as_str())
            }
            None => message.from.as_str().to_owned(),
        };

        match message.timestamp.and_then(clock) {
            Some(at) => {
                let _ = writeln!(out, "[{who}] {}  ({at})", message.text);
            }
            None => {
                let _ = writeln!(out, "[{who}] {}", message.text);
            }
        }
    }

    let _ = writeln!(out, "{} messages", view.messages.len());
    out
}

/// Wall-clock `HH:MM:SS` for an epoch-milliseconds timestamp.
fn clock(ms: i64) -> Option<String> {
    let instant = OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()?;
    instant
        .format(format_description!("[hour]:[minute]:[second]"))
        .ok()
}

#[cfg(test)]
#[path = "messages_test.rs"]
mod tests;
