use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque entry identifier. Journals written by older versions used
/// millisecond timestamps as ids, so any string is accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn generate() -> Self {
        EntryId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        EntryId(value.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ReadingStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReadingStatus::NotStarted => "not started",
            ReadingStatus::InProgress => "in progress",
            ReadingStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntryId,
    pub surah_number: u16,
    pub ayahs_completed: u32,
    pub status: ReadingStatus,
    #[serde(default)]
    pub reflection: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFields {
    pub surah_number: u16,
    pub ayahs_completed: u32,
    pub status: ReadingStatus,
    pub reflection: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub surah_number: Option<u16>,
    pub ayahs_completed: Option<u32>,
    pub status: Option<ReadingStatus>,
    pub reflection: Option<String>,
}

impl JournalEntry {
    pub fn new(fields: EntryFields, now: DateTime<Utc>) -> Self {
        JournalEntry {
            id: EntryId::generate(),
            surah_number: fields.surah_number,
            ayahs_completed: fields.ayahs_completed,
            status: fields.status,
            reflection: fields.reflection,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the patch merged over it and `updated_at` replaced.
    pub fn patched(&self, patch: EntryPatch, now: DateTime<Utc>) -> Self {
        JournalEntry {
            id: self.id.clone(),
            surah_number: patch.surah_number.unwrap_or(self.surah_number),
            ayahs_completed: patch.ayahs_completed.unwrap_or(self.ayahs_completed),
            status: patch.status.unwrap_or(self.status),
            reflection: patch.reflection.unwrap_or_else(|| self.reflection.clone()),
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

impl From<EntryFields> for EntryPatch {
    fn from(fields: EntryFields) -> Self {
        EntryPatch {
            surah_number: Some(fields.surah_number),
            ayahs_completed: Some(fields.ayahs_completed),
            status: Some(fields.status),
            reflection: Some(fields.reflection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_records_written_by_the_desktop_app() {
        let raw = r#"{
            "id": "1712345678901",
            "surahNumber": 2,
            "ayahsCompleted": 286,
            "reflection": "",
            "status": "completed",
            "createdAt": "2024-04-05T19:34:38.901Z",
            "updatedAt": "2024-04-05T19:34:38.901Z"
        }"#;

        let entry: JournalEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.id.as_str(), "1712345678901");
        assert_eq!(entry.surah_number, 2);
        assert_eq!(entry.status, ReadingStatus::Completed);
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&ReadingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn missing_reflection_defaults_to_empty() {
        let raw = r#"{"id":"a","surahNumber":1,"ayahsCompleted":0,"status":"not-started",
            "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}"#;
        let entry: JournalEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.reflection.is_empty());
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let entry = JournalEntry::new(
            EntryFields {
                surah_number: 18,
                ayahs_completed: 40,
                status: ReadingStatus::InProgress,
                reflection: "first half".into(),
            },
            t0,
        );

        let patched = entry.patched(
            EntryPatch {
                reflection: Some("cave".into()),
                ..Default::default()
            },
            t1,
        );

        assert_eq!(patched.id, entry.id);
        assert_eq!(patched.surah_number, 18);
        assert_eq!(patched.ayahs_completed, 40);
        assert_eq!(patched.status, ReadingStatus::InProgress);
        assert_eq!(patched.reflection, "cave");
        assert_eq!(patched.created_at, t0);
        assert_eq!(patched.updated_at, t1);
    }
}
