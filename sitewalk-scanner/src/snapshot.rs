//! Crawl state checkpoints.
//!
//! A snapshot is a JSON document with three members: `visited_pages` (list of
//! page URLs), `pages_data` (page URL to status and per-page link list) and
//! `links_data` (link URL to registry entry, referring pages as a list).
//! Restoring a snapshot yields a [`CrawlState`] a crawler can continue from.

use crate::error::Result;
use crate::state::CrawlState;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Rewritten every `progress_interval` pages during the traversal.
pub const ROLLING_SNAPSHOT: &str = "progress.json";
/// Written once, after the traversal and the internal status backfill.
pub const FINAL_SNAPSHOT: &str = "progress_final.json";

/// Serializes the state into the snapshot document.
pub fn snapshot(state: &CrawlState) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(state)?)
}

/// Rebuilds crawl state from a snapshot document.
pub fn restore(document: &[u8]) -> Result<CrawlState> {
    Ok(serde_json::from_slice(document)?)
}

/// Writes a snapshot to `path`.
///
/// The document is written to a sibling `.tmp` file first and then renamed
/// over `path`, so readers never observe a half-written checkpoint.
pub fn save_snapshot(path: &Path, state: &CrawlState) -> Result<()> {
    debug!("Saving snapshot to {}", path.display());

    let document = snapshot(state)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, document)?;
    fs::rename(&tmp_path, path)?;

    info!(
        "Snapshot saved to {} ({} pages, {} links)",
        path.display(),
        state.pages.len(),
        state.links.len()
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<CrawlState> {
    let document = fs::read(path)?;
    let state = restore(&document)?;
    info!(
        "Restored snapshot {} ({} visited, {} links)",
        path.display(),
        state.visited.len(),
        state.links.len()
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::state::{LinkObservation, PageRecord, Status, TransportFailure};
    use tempfile::TempDir;

    fn sample_state() -> CrawlState {
        let mut state = CrawlState::new();
        let internal = LinkObservation {
            url: "http://ex.com/about".to_string(),
            is_absolute: false,
            opens_new_window: false,
            scheme: "http".to_string(),
            nofollow: false,
            external: false,
            status_code: None,
        };
        let external = LinkObservation {
            url: "http://other.com/".to_string(),
            is_absolute: true,
            opens_new_window: true,
            scheme: "http".to_string(),
            nofollow: true,
            external: true,
            status_code: Some(Status::Code(404)),
        };

        state.visited.insert("http://ex.com/".to_string());
        state.visited.insert("http://ex.com/about".to_string());
        state.pages.insert(
            "http://ex.com/".to_string(),
            PageRecord::with_links(Status::Code(200), vec![internal.clone(), external.clone()]),
        );
        state.pages.insert(
            "http://ex.com/about".to_string(),
            PageRecord::dead_end(Status::Failed(TransportFailure::Timeout)),
        );
        state.links.upsert(&internal, "http://ex.com/");
        state.links.upsert(&external, "http://ex.com/");
        state.links.upsert(&external, "http://ex.com/about");
        state
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let state = sample_state();
        let restored = restore(&snapshot(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_document_layout() {
        let value: serde_json::Value =
            serde_json::from_slice(&snapshot(&sample_state()).unwrap()).unwrap();

        assert_eq!(
            value["visited_pages"],
            serde_json::json!(["http://ex.com/", "http://ex.com/about"])
        );
        assert_eq!(value["pages_data"]["http://ex.com/"]["status_code"], 200);
        assert_eq!(value["pages_data"]["http://ex.com/about"]["status_code"], "timeout");
        assert_eq!(
            value["pages_data"]["http://ex.com/"]["links"][1]["opens_new_window"],
            true
        );

        let external = &value["links_data"]["http://other.com/"];
        assert_eq!(external["external"], true);
        assert_eq!(external["status_code"], 404);
        assert_eq!(
            external["pages"],
            serde_json::json!(["http://ex.com/", "http://ex.com/about"])
        );
        assert_eq!(
            value["links_data"]["http://ex.com/about"]["status_code"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_restore_collapses_duplicate_referrers() {
        let document = br#"{
            "visited_pages": ["http://ex.com/"],
            "pages_data": {"http://ex.com/": {"status_code": null, "links": []}},
            "links_data": {
                "http://b.com/": {
                    "is_absolute": true, "opens_new_window": false, "scheme": "http",
                    "nofollow": false, "external": true, "status_code": "error",
                    "pages": ["http://ex.com/", "http://ex.com/", "http://ex.com/x"]
                }
            }
        }"#;

        let state = restore(document).unwrap();
        let entry = state.links.get("http://b.com/").unwrap();
        assert_eq!(entry.page_count(), 2);
        assert_eq!(entry.status_code, Some(Status::Failed(TransportFailure::Error)));
        assert_eq!(state.pages["http://ex.com/"].status_code, None);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(matches!(restore(b"{not json"), Err(ScanError::SnapshotError(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ROLLING_SNAPSHOT);
        let state = sample_state();

        save_snapshot(&path, &state).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ROLLING_SNAPSHOT);

        save_snapshot(&path, &CrawlState::new()).unwrap();
        save_snapshot(&path, &sample_state()).unwrap();

        assert_eq!(load_snapshot(&path).unwrap().pages.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = load_snapshot(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ScanError::IoError(_))));
    }
}
