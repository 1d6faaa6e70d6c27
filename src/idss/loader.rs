//! Reading and writing of the two JSON documents.

use super::archive::HistoricalDataArchive;
use super::reconciliation::OperationalDocument;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize the historical archive")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub operational: PathBuf,
    pub historical: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocuments {
    pub operational: OperationalDocument,
    pub archive: HistoricalDataArchive,
}

/// Loads both documents concurrently. Either failure fails the whole load.
pub async fn load_documents(paths: &DocumentPaths) -> Result<LoadedDocuments, LoadError> {
    let (operational, archive) = tokio::try_join!(
        read_json::<OperationalDocument>(&paths.operational),
        read_json::<HistoricalDataArchive>(&paths.historical),
    )?;

    tracing::info!(
        operational = %paths.operational.display(),
        historical = %paths.historical.display(),
        archived_indicators = archive.indicator_historical_data.len(),
        "loaded idss documents"
    );

    Ok(LoadedDocuments {
        operational,
        archive,
    })
}

/// Writes the archive as pretty-printed JSON, replacing the file.
pub async fn save_archive(path: &Path, archive: &HistoricalDataArchive) -> Result<(), LoadError> {
    let bytes = serde_json::to_vec_pretty(archive).map_err(LoadError::Serialize)?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| LoadError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(path = %path.display(), "saved historical archive");
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idss::archive::HistoricalIdssScore;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("idss-loader-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("scratch dir created");
        dir
    }

    #[tokio::test]
    async fn loads_both_documents() {
        let dir = scratch_dir("both");
        let paths = DocumentPaths {
            operational: dir.join("idss_data.json"),
            historical: dir.join("historical_data.json"),
        };
        std::fs::write(&paths.operational, r#"{"dimensions": []}"#).expect("write operational");
        std::fs::write(&paths.historical, r#"{"idssHistoricalScores": []}"#).expect("write archive");

        let loaded = load_documents(&paths).await.expect("documents load");
        assert!(loaded.operational.dimensions.is_empty());
        assert_eq!(loaded.archive, HistoricalDataArchive::default());
    }

    #[tokio::test]
    async fn one_bad_document_fails_the_load() {
        let dir = scratch_dir("bad");
        let paths = DocumentPaths {
            operational: dir.join("idss_data.json"),
            historical: dir.join("missing.json"),
        };
        std::fs::write(&paths.operational, "{}").expect("write operational");

        let err = load_documents(&paths).await.expect_err("missing archive fails");
        assert!(matches!(err, LoadError::Read { .. }));

        std::fs::write(&paths.historical, "{not json").expect("write broken archive");
        let err = load_documents(&paths).await.expect_err("broken archive fails");
        assert!(matches!(err, LoadError::Parse { ref path, .. } if path.ends_with("missing.json")));
    }

    #[tokio::test]
    async fn saved_archive_reloads_identically() {
        let dir = scratch_dir("save");
        let path = dir.join("historical_data.json");
        let archive = HistoricalDataArchive {
            idss_historical_scores: vec![HistoricalIdssScore::manual(2023, Some(0.8123))],
            ..HistoricalDataArchive::default()
        };

        save_archive(&path, &archive).await.expect("archive saved");
        let written = std::fs::read_to_string(&path).expect("archive readable");
        assert!(written.contains("\n  \"idssHistoricalScores\""));

        let reread: HistoricalDataArchive = read_json(&path).await.expect("archive reloads");
        assert_eq!(reread, archive);
    }
}
