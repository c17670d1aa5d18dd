//! Save status and its presentation

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when a save failed without a usable message
pub const GENERIC_ERROR_LABEL: &str = "Save failed";

/// Where the coordinator is in its save cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing happening
    #[default]
    Idle,
    /// A persistence call is in flight
    Saving,
    /// The last save succeeded (shown briefly)
    Saved,
    /// The last save failed
    Error,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "idle",
            SaveStatus::Saving => "saving",
            SaveStatus::Saved => "saved",
            SaveStatus::Error => "error",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a UI needs to render save feedback
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SaveState {
    pub status: SaveStatus,
    /// Time of the last successful save
    pub last_saved: Option<DateTime<Utc>>,
    /// Message of the last failure; cleared when a new attempt begins
    pub error: Option<String>,
}

impl SaveState {
    /// Label for this state, with times shown in the local timezone
    pub fn label(&self) -> StatusLabel {
        let last_saved = self.last_saved.map(|ts| ts.with_timezone(&Local));
        describe(self.status, last_saved.as_ref(), self.error.as_deref())
    }
}

/// Severity of a status label, for picking a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Muted,
    Info,
    Success,
    Danger,
}

/// Short human-readable status text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    pub text: String,
    pub tone: Tone,
}

impl StatusLabel {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Map a status triple to a label
///
/// Pure: the same inputs always give the same label. The caller picks the
/// timezone `last_saved` is displayed in.
pub fn describe<Tz>(
    status: SaveStatus,
    last_saved: Option<&DateTime<Tz>>,
    error: Option<&str>,
) -> StatusLabel
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match status {
        SaveStatus::Saving => StatusLabel::new("Saving…", Tone::Info),
        SaveStatus::Saved => StatusLabel::new("Saved", Tone::Success),
        SaveStatus::Error => {
            let text = error
                .map(str::trim)
                .filter(|msg| !msg.is_empty())
                .unwrap_or(GENERIC_ERROR_LABEL);
            StatusLabel::new(text, Tone::Danger)
        }
        SaveStatus::Idle => match last_saved {
            Some(ts) => StatusLabel::new(format!("Last saved {}", ts.format("%H:%M")), Tone::Muted),
            None => StatusLabel::new("", Tone::Muted),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 30).unwrap()
    }

    #[test]
    fn test_saving_and_saved() {
        let saving = describe::<Utc>(SaveStatus::Saving, None, None);
        assert_eq!(saving.text, "Saving…");
        assert_eq!(saving.tone, Tone::Info);

        let saved = describe(SaveStatus::Saved, Some(&at(9, 5)), None);
        assert_eq!(saved.text, "Saved");
        assert_eq!(saved.tone, Tone::Success);
    }

    #[test]
    fn test_error_uses_message() {
        let label = describe::<Utc>(SaveStatus::Error, None, Some("network unreachable"));
        assert_eq!(label.text, "network unreachable");
        assert_eq!(label.tone, Tone::Danger);
    }

    #[test]
    fn test_error_without_message_uses_fallback() {
        assert_eq!(describe::<Utc>(SaveStatus::Error, None, None).text, GENERIC_ERROR_LABEL);
        assert_eq!(describe::<Utc>(SaveStatus::Error, None, Some("  ")).text, GENERIC_ERROR_LABEL);
    }

    #[test]
    fn test_idle_shows_last_saved_time() {
        let label = describe(SaveStatus::Idle, Some(&at(14, 7)), None);
        assert_eq!(label.text, "Last saved 14:07");
        assert_eq!(label.tone, Tone::Muted);
    }

    #[test]
    fn test_idle_respects_timezone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let ts = at(14, 7).with_timezone(&plus_two);
        assert_eq!(describe(SaveStatus::Idle, Some(&ts), None).text, "Last saved 16:07");
    }

    #[test]
    fn test_idle_never_saved_is_empty() {
        let label = describe::<Utc>(SaveStatus::Idle, None, None);
        assert!(label.text.is_empty());
    }

    #[test]
    fn test_same_inputs_same_label() {
        let ts = at(8, 0);
        let a = describe(SaveStatus::Idle, Some(&ts), Some("ignored"));
        let b = describe(SaveStatus::Idle, Some(&ts), Some("ignored"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SaveStatus::Saving).unwrap(), "\"saving\"");
        assert_eq!(SaveStatus::Error.to_string(), "error");
    }
}
