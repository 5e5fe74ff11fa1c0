use crate::error::{JournalError, JournalResult};
use crate::journal_entry::{EntryFields, ReadingStatus};
use crate::progress::TOTAL_SURAHS;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub number: u16,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub number_of_ayahs: u32,
    pub revelation_type: RevelationType,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: u16,
    #[serde(default)]
    data: Option<Vec<Chapter>>,
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api answered with code {0}")]
    Api(u16),
}

pub struct ChapterClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChapterClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ChapterClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the chapter list, falling back to [`sample_chapters`] when the
    /// API can't be reached or answers with something unexpected.
    pub async fn fetch_chapters(&self) -> Vec<Chapter> {
        match self.try_fetch().await {
            Ok(chapters) => {
                info!(count = chapters.len(), "fetched chapter metadata");
                chapters
            }
            Err(e) => {
                warn!(error = %e, "chapter api unavailable, using built-in sample");
                sample_chapters()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<Chapter>, FetchError> {
        let envelope: ApiEnvelope = self
            .http
            .get(format!("{}/surah", self.base_url))
            .send()
            .await?
            .json()
            .await?;
        parse_envelope(envelope)
    }
}

fn parse_envelope(envelope: ApiEnvelope) -> Result<Vec<Chapter>, FetchError> {
    match envelope {
        ApiEnvelope {
            code: 200,
            data: Some(chapters),
        } => Ok(chapters),
        ApiEnvelope { code, .. } => Err(FetchError::Api(code)),
    }
}

pub fn find_chapter(chapters: &[Chapter], number: u16) -> Option<&Chapter> {
    chapters.iter().find(|c| c.number == number)
}

/// Case-insensitive match on any of the chapter's names.
pub fn filter_chapters<'a>(chapters: &'a [Chapter], query: &str) -> Vec<&'a Chapter> {
    let query = query.trim().to_lowercase();
    chapters
        .iter()
        .filter(|c| {
            query.is_empty()
                || c.english_name.to_lowercase().contains(&query)
                || c.name.to_lowercase().contains(&query)
                || c.english_name_translation.to_lowercase().contains(&query)
        })
        .collect()
}

pub fn status_for_ayahs(ayahs_completed: u32, total_ayahs: u32) -> ReadingStatus {
    if ayahs_completed == 0 {
        ReadingStatus::NotStarted
    } else if ayahs_completed == total_ayahs {
        ReadingStatus::Completed
    } else {
        ReadingStatus::InProgress
    }
}

/// Checks fields before they reach the store.
pub fn validate_fields(fields: &EntryFields, chapters: &[Chapter]) -> JournalResult<()> {
    validate_progress(fields.surah_number, fields.ayahs_completed, chapters)
}

/// A chapter missing from the metadata (e.g. only the sample list is
/// loaded) skips the ayah check.
pub fn validate_progress(
    surah_number: u16,
    ayahs_completed: u32,
    chapters: &[Chapter],
) -> JournalResult<()> {
    if surah_number == 0 || u32::from(surah_number) > TOTAL_SURAHS {
        return Err(JournalError::Validation(format!(
            "Please select a surah between 1 and {TOTAL_SURAHS}."
        )));
    }
    if let Some(chapter) = find_chapter(chapters, surah_number) {
        if ayahs_completed > chapter.number_of_ayahs {
            return Err(JournalError::Validation(format!(
                "Ayahs completed cannot exceed total ayahs ({})",
                chapter.number_of_ayahs
            )));
        }
    }
    Ok(())
}

pub fn sample_chapters() -> Vec<Chapter> {
    use RevelationType::{Meccan, Medinan};
    [
        (1, "الفاتحة", "Al-Fatiha", "The Opening", 7, Meccan),
        (2, "البقرة", "Al-Baqara", "The Cow", 286, Medinan),
        (3, "آل عمران", "Aal Imran", "Family of Imran", 200, Medinan),
        (4, "النساء", "An-Nisa", "The Women", 176, Medinan),
        (5, "المائدة", "Al-Ma'ida", "The Table", 120, Medinan),
        (6, "الأنعام", "Al-An'am", "The Cattle", 165, Meccan),
        (7, "الأعراف", "Al-A'raf", "The Heights", 206, Meccan),
        (8, "الأنفال", "Al-Anfal", "The Spoils of War", 75, Medinan),
        (9, "التوبة", "At-Tawba", "The Repentance", 129, Medinan),
        (10, "يونس", "Yunus", "Jonah", 109, Meccan),
    ]
    .into_iter()
    .map(
        |(number, name, english_name, translation, ayahs, revelation_type)| Chapter {
            number,
            name: name.to_string(),
            english_name: english_name.to_string(),
            english_name_translation: translation.to_string(),
            number_of_ayahs: ayahs,
            revelation_type,
        },
    )
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(surah_number: u16, ayahs_completed: u32) -> EntryFields {
        EntryFields {
            surah_number,
            ayahs_completed,
            status: ReadingStatus::InProgress,
            reflection: String::new(),
        }
    }

    #[test]
    fn parses_api_payload() {
        let raw = r#"{
            "code": 200,
            "status": "OK",
            "data": [{
                "number": 112,
                "name": "سُورَةُ الإِخۡلَاصِ",
                "englishName": "Al-Ikhlaas",
                "englishNameTranslation": "Sincerity",
                "numberOfAyahs": 4,
                "revelationType": "Meccan"
            }]
        }"#;
        let envelope: ApiEnvelope = serde_json::from_str(raw).unwrap();
        let chapters = parse_envelope(envelope).unwrap();

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].number, 112);
        assert_eq!(chapters[0].number_of_ayahs, 4);
        assert_eq!(chapters[0].revelation_type, RevelationType::Meccan);
    }

    #[test]
    fn non_200_code_is_an_error() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{ "code": 404 }"#).unwrap();
        assert!(matches!(parse_envelope(envelope), Err(FetchError::Api(404))));
    }

    #[test]
    fn sample_covers_first_ten_chapters() {
        let sample = sample_chapters();
        assert_eq!(sample.len(), 10);
        assert_eq!(sample[1].english_name, "Al-Baqara");
        assert_eq!(sample[1].number_of_ayahs, 286);
        assert!(sample.iter().zip(1..).all(|(c, n)| c.number == n));
    }

    #[test]
    fn filter_matches_any_name() {
        let sample = sample_chapters();
        assert_eq!(filter_chapters(&sample, "cow")[0].number, 2);
        assert_eq!(filter_chapters(&sample, "AL-AN")[0].number, 6);
        assert_eq!(filter_chapters(&sample, "يونس")[0].number, 10);
        assert_eq!(filter_chapters(&sample, "").len(), 10);
        assert!(filter_chapters(&sample, "zzz").is_empty());
    }

    #[test]
    fn status_from_ayah_count() {
        assert_eq!(status_for_ayahs(0, 7), ReadingStatus::NotStarted);
        assert_eq!(status_for_ayahs(3, 7), ReadingStatus::InProgress);
        assert_eq!(status_for_ayahs(7, 7), ReadingStatus::Completed);
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let sample = sample_chapters();
        assert!(validate_fields(&fields(2, 286), &sample).is_ok());
        assert!(matches!(
            validate_fields(&fields(2, 287), &sample),
            Err(JournalError::Validation(_))
        ));
        assert!(validate_fields(&fields(0, 1), &sample).is_err());
        assert!(validate_fields(&fields(115, 1), &sample).is_err());
    }

    #[test]
    fn unknown_chapter_skips_ayah_check() {
        let sample = sample_chapters();
        assert!(validate_fields(&fields(55, 10_000), &sample).is_ok());
    }
}
