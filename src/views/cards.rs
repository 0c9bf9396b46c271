//! Per-student scenario card view for fair sessions.

use std::fmt::Write;

use serde_json::Value;

use crate::event::ScenarioFields;
use crate::model::Student;
use crate::state::LiveView;

/// Render one card per expected student. Students the scenario has reported
/// on show their progress; the rest show a waiting note.
#[must_use]
pub fn render_cards(expected: &[Student], view: &LiveView) -> String {
    let mut out = String::new();

    if expected.is_empty() {
        let _ = writeln!(out, "No students expected for this experience");
        return out;
    }

    for student in expected {
        match view.scenario.get(&student.id.to_string()) {
            Some(fields) => render_card(&mut out, &student.name, fields),
            None => {
                let _ = writeln!(out, "{} - waiting for data", student.name);
            }
        }
    }
    out
}

fn render_card(out: &mut String, name: &str, fields: &ScenarioFields) {
    let verdict = if last_done_correct(fields) { "correct" } else { "wrong" };
    let _ = writeln!(out, "{name} - {} pts - last answer: {verdict}", points(fields));

    if let Some(order) = fruit_line(fields, "customerOrder") {
        let _ = writeln!(out, "  order: {order}");
    }
    if let Some(tent) = fruit_line(fields, "fruitsOnTent") {
        let _ = writeln!(out, "  tent: {tent}");
    }
    if let Some(heard) = fields.get("lastTranscription").and_then(Value::as_str) {
        let _ = writeln!(out, "  last heard: \"{heard}\"");
    }
}

// =============================================================================
// FIELD ACCESSORS
// =============================================================================

fn points(fields: &ScenarioFields) -> i64 {
    fields.get("points").and_then(Value::as_i64).unwrap_or(0)
}

fn last_done_correct(fields: &ScenarioFields) -> bool {
    fields
        .get("wasLastDoneCorrect")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Format a fruit list field (`customerOrder` or `fruitsOnTent`) as
/// `2x banana, 1x maca`. The backend shape is `{ list: [{ fruit: { name },
/// amount }] }`.
fn fruit_line(fields: &ScenarioFields, key: &str) -> Option<String> {
    let list = fields.get(key)?.get("list")?.as_array()?;
    let mut parts = Vec::with_capacity(list.len());
    for item in list {
        let name = item.get("fruit")?.get("name")?.as_str()?;
        let amount = item.get("amount").and_then(Value::as_i64).unwrap_or(0);
        parts.push(format!("{amount}x {name}"));
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(", "))
}

#[cfg(test)]
#[path = "cards_test.rs"]
mod tests;
