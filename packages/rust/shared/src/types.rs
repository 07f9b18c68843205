//! Core domain types: jobs, reading blocks, and the per-day output record.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One unit of extraction work: a section folder and a page URL.
///
/// Serialized as a 2-element JSON array `[folder, url]`, which is the
/// Job Store file format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Job {
    /// Section folder label (already sanitized by the crawler).
    pub folder: String,
    /// Absolute page URL.
    pub url: String,
}

impl Job {
    pub fn new(folder: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            url: url.into(),
        }
    }
}

impl From<(String, String)> for Job {
    fn from((folder, url): (String, String)) -> Self {
        Self { folder, url }
    }
}

impl From<Job> for (String, String) {
    fn from(job: Job) -> Self {
        (job.folder, job.url)
    }
}

// ---------------------------------------------------------------------------
// FailureRecord
// ---------------------------------------------------------------------------

/// A job that could not be processed. Same wire shape as [`Job`], so the
/// error manifest can be fed back in as a Job Store for a manual re-run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct FailureRecord {
    pub folder: String,
    pub url: String,
}

impl From<&Job> for FailureRecord {
    fn from(job: &Job) -> Self {
        Self {
            folder: job.folder.clone(),
            url: job.url.clone(),
        }
    }
}

impl From<FailureRecord> for Job {
    fn from(record: FailureRecord) -> Self {
        Self {
            folder: record.folder,
            url: record.url,
        }
    }
}

impl From<(String, String)> for FailureRecord {
    fn from((folder, url): (String, String)) -> Self {
        Self { folder, url }
    }
}

impl From<FailureRecord> for (String, String) {
    fn from(record: FailureRecord) -> Self {
        (record.folder, record.url)
    }
}

// ---------------------------------------------------------------------------
// ReadingBlock
// ---------------------------------------------------------------------------

/// Canonical type of a consolidated responsorial psalm.
pub const PSALM_RESPONSORY: &str = "PSALM RESPONSORYJNY";

/// Canonical type of the Gospel acclamation.
pub const ACCLAMATION: &str = "AKLAMACJA";

/// One structured unit of liturgical text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingBlock {
    /// Reading type, e.g. `PIERWSZE CZYTANIE`, `PSALM RESPONSORYJNY`, `EWANGELIA`.
    pub typ: String,
    /// Biblical citation, e.g. `Rz 8, 31-39`.
    pub sigla: String,
    /// Short description shown under the title (usually italic in the source).
    pub opis: String,
    /// Body text.
    pub tekst: String,
}

impl ReadingBlock {
    /// Start an empty block with the given type.
    pub fn titled(typ: impl Into<String>) -> Self {
        Self {
            typ: typ.into(),
            ..Self::default()
        }
    }

    /// Psalm verse or refrain fragment (merged by the consolidator).
    pub fn is_psalm_part(&self) -> bool {
        let typ = self.typ.to_uppercase();
        typ.contains("PSALM") || typ.starts_with("REFREN")
    }

    /// Types whose body keeps its line structure.
    pub fn is_verse_like(&self) -> bool {
        let typ = self.typ.to_uppercase();
        ["PSALM", "REFREN", ACCLAMATION]
            .iter()
            .any(|k| typ.contains(k))
    }
}

// ---------------------------------------------------------------------------
// DaySet
// ---------------------------------------------------------------------------

/// The unit of output: one liturgical day or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySet {
    /// Source page URL (first page for multi-page events).
    pub url: String,
    /// Day/event title.
    pub tytul_dnia: String,
    /// Final, consolidated reading list.
    pub czytania: Vec<ReadingBlock>,
}

// ---------------------------------------------------------------------------
// SpecialCase
// ---------------------------------------------------------------------------

/// A liturgical event whose text spans several pages on the source site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCase {
    /// Substring identifying the event's page URLs.
    pub keyword: String,
    /// Display title used for the merged output.
    pub title: String,
}

impl SpecialCase {
    pub fn new(keyword: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            title: title.into(),
        }
    }

    /// First special case whose keyword occurs in `url`.
    pub fn find<'a>(cases: &'a [SpecialCase], url: &str) -> Option<&'a SpecialCase> {
        cases.iter().find(|c| url.contains(&c.keyword))
    }
}
