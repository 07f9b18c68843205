//! Output writer: one JSON file per day/event, plus the error manifest.
//!
//! Every file is written to a hidden temp sibling first and renamed into
//! place, so a crash never leaves a truncated output behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use lekcjonarz_shared::{DaySet, FailureRecord, LekcjonarzError, Result, sanitize_name};

/// Writes `DaySet`s under `<root>/<folder>/<title>.json`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target path for a day: both the folder and the title are sanitized.
    pub fn path_for(&self, folder: &str, day: &DaySet) -> PathBuf {
        self.root
            .join(sanitize_name(folder))
            .join(format!("{}.json", sanitize_name(&day.tytul_dnia)))
    }

    /// Persist one day. Same folder and title overwrite the previous file.
    #[instrument(skip_all, fields(folder = %folder, title = %day.tytul_dnia))]
    pub fn write_day(&self, folder: &str, day: &DaySet) -> Result<PathBuf> {
        let path = self.path_for(folder, day);
        write_json_atomic(&path, day)?;
        debug!(path = %path.display(), readings = day.czytania.len(), "day written");
        Ok(path)
    }
}

/// Serialize the failure list as `[[folder, url], ...]`.
#[instrument(skip_all, fields(path = %path.display(), failures = failures.len()))]
pub fn write_manifest(path: &Path, failures: &[FailureRecord]) -> Result<()> {
    write_json_atomic(path, &failures)?;
    info!(count = failures.len(), "error manifest written");
    Ok(())
}

/// Pretty-print `data` to `path` via temp file and rename, creating parents.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LekcjonarzError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LekcjonarzError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| LekcjonarzError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| LekcjonarzError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lekcjonarz_shared::ReadingBlock;

    fn day(title: &str) -> DaySet {
        DaySet {
            url: "https://liturgia.wiara.pl/doc/1".into(),
            tytul_dnia: title.into(),
            czytania: vec![ReadingBlock {
                typ: "EWANGELIA".into(),
                sigla: "J 1, 1-5".into(),
                opis: String::new(),
                tekst: "Na początku było Słowo.".into(),
            }],
        }
    }

    #[test]
    fn writes_sanitized_path() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(tmp.path());

        let path = writer
            .write_day("Adwent/Rok A", &day("I Niedziela Adwentu, rok A"))
            .unwrap();

        assert_eq!(
            path,
            tmp.path().join("Adwent_Rok_A").join("I_Niedziela_Adwentu_rok_A.json")
        );
        let written: DaySet =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, day("I Niedziela Adwentu, rok A"));
    }

    #[test]
    fn output_keeps_field_order_and_polish_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = OutputWriter::new(tmp.path()).write_day("A", &day("Dzień")).unwrap();
        let raw = std::fs::read_to_string(path).unwrap();

        let url = raw.find("\"url\"").unwrap();
        let title = raw.find("\"tytul_dnia\"").unwrap();
        let readings = raw.find("\"czytania\"").unwrap();
        assert!(url < title && title < readings);
        assert!(raw.contains("Na początku było Słowo."));
    }

    #[test]
    fn rewrite_overwrites_and_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(tmp.path());
        let mut second = day("Dzień");
        second.url = "https://liturgia.wiara.pl/doc/2".into();

        writer.write_day("A", &day("Dzień")).unwrap();
        let path = writer.write_day("A", &second).unwrap();

        let written: DaySet =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.url, "https://liturgia.wiara.pl/doc/2");

        let entries: Vec<_> = std::fs::read_dir(tmp.path().join("A")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn manifest_is_list_of_pairs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("errors.json");
        let failures = vec![FailureRecord {
            folder: "Adwent".into(),
            url: "https://liturgia.wiara.pl/doc/9".into(),
        }];

        write_manifest(&path, &failures).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([["Adwent", "https://liturgia.wiara.pl/doc/9"]])
        );
    }
}
