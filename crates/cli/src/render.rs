//! Terminal rendering of save status

use autosave::{SaveState, StatusLabel, Tone};
use owo_colors::OwoColorize;

/// Colored one-line form of a label
pub fn paint(label: &StatusLabel) -> String {
    let text = if label.text.is_empty() {
        "Not saved yet"
    } else {
        label.text.as_str()
    };

    match label.tone {
        Tone::Muted => text.dimmed().to_string(),
        Tone::Info => text.cyan().to_string(),
        Tone::Success => text.green().to_string(),
        Tone::Danger => text.red().to_string(),
    }
}

/// Print the state as `[status] label`
pub fn print_state(state: &SaveState) {
    println!("{} {}", format!("[{}]", state.status).bold(), paint(&state.label()));
}
