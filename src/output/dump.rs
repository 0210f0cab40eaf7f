//! JSON persistence for scraped documents and URL lists
//!
//! The dump file carries state between runs: new scrapes are merged into it
//! by natural key instead of replacing it.

use crate::output::csv_writer::{clear_destination, destination_error};
use crate::output::result_set::ResultSet;
use crate::output::traits::{Keyed, WriteError, WriteResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Loads a prior dump; a missing file is an empty dump
///
/// A dump that exists but cannot be read or decoded is an error, so the
/// caller never overwrites it with a partial merge.
pub fn load_dump<T: DeserializeOwned>(path: &Path) -> WriteResult<Vec<T>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No prior dump found");
        return Ok(Vec::new());
    }

    read_json(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Prior dump is unreadable");
        e
    })
}

/// Reads a JSON document, failing on a missing or malformed file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> WriteResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| WriteError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Writes a pretty-printed JSON document, replacing any existing file
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> WriteResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    clear_destination(path)?;
    std::fs::write(path, content).map_err(|e| destination_error(path, e))
}

/// Merges freshly scraped items into the prior dump
///
/// Existing items come first and win every key collision; fresh items are
/// appended in scrape order.
pub fn merge_dump<T: Keyed>(existing: Vec<T>, fresh: Vec<T>) -> ResultSet<T> {
    let merged = ResultSet::first_wins(existing.into_iter().chain(fresh));
    if merged.collisions() > 0 {
        tracing::debug!(kept = merged.collisions(), "Existing records kept over rescraped ones");
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Site {
        website: Option<String>,
        note: String,
    }

    impl Keyed for Site {
        fn natural_key(&self) -> String {
            self.website.clone().unwrap_or_default()
        }
    }

    fn site(website: Option<&str>, note: &str) -> Site {
        Site {
            website: website.map(str::to_string),
            note: note.to_string(),
        }
    }

    #[test]
    fn test_missing_dump_is_empty() {
        let dir = tempdir().unwrap();
        let items: Vec<Site> = load_dump(&dir.path().join("absent.json")).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_corrupt_dump_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: WriteResult<Vec<Site>> = load_dump(&path);
        assert!(matches!(result, Err(WriteError::Json(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.json");
        let items = vec![site(Some("https://a.io"), "a"), site(None, "nameless")];

        save_json(&path, &items).unwrap();
        let loaded: Vec<Site> = load_dump(&path).unwrap();

        assert_eq!(loaded, items);
    }

    #[test]
    fn test_merge_keeps_existing_and_appends_new() {
        let existing = vec![site(Some("https://a.io"), "old")];
        let fresh = vec![
            site(Some("https://a.io"), "new"),
            site(Some("https://b.io"), "b"),
            site(None, "no site"),
        ];

        let merged = merge_dump(existing, fresh);
        assert_eq!(merged.collisions(), 1);

        let merged = merged.into_records();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].note, "old");
        assert_eq!(merged[1].note, "b");
        assert_eq!(merged[2].note, "no site");
    }

    #[test]
    fn test_read_json_requires_file() {
        let dir = tempdir().unwrap();
        let result: WriteResult<Vec<String>> = read_json(&dir.path().join("urls.json"));
        assert!(matches!(result, Err(WriteError::Io { .. })));
    }
}
