//! Append-only JSONL corpus store.

use std::path::{Path, PathBuf};

use assetwright_core::Domain;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::CorpusError;
use crate::record::InteractionRecord;

/// Per-domain training corpora under one directory.
///
/// Appends are serialized through a single lock and each record is written
/// as one complete line, so concurrent sessions never interleave partial
/// records.
pub struct CorpusStore {
    dir: PathBuf,
    append_lock: Mutex<()>,
}

impl CorpusStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `training_data_<domain>.jsonl`
    pub fn corpus_path(&self, domain: Domain) -> PathBuf {
        self.dir.join(format!("training_data_{domain}.jsonl"))
    }

    /// `filtered_training_data_<domain>.jsonl`
    pub fn curated_path(&self, domain: Domain) -> PathBuf {
        self.dir.join(format!("filtered_training_data_{domain}.jsonl"))
    }

    /// Append one record to the domain's corpus.
    pub async fn append(&self, domain: Domain, record: &InteractionRecord) -> Result<(), CorpusError> {
        let line = record.to_line()?;
        let path = self.corpus_path(domain);

        let _guard = self.append_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(%domain, path = %path.display(), score = record.score, "Appended interaction record");
        Ok(())
    }

    /// Read every record of the domain's corpus.
    ///
    /// A missing file is an empty corpus. Lines that fail to decode are
    /// skipped with a warning.
    pub async fn read_all(&self, domain: Domain) -> Result<Vec<InteractionRecord>, CorpusError> {
        let path = self.corpus_path(domain);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<InteractionRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%domain, line = n + 1, error = %e, "Skipping corrupted corpus record");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn file_layout() {
        let store = CorpusStore::new("/data/corpus");
        assert_eq!(
            store.corpus_path(Domain::PaymentStream),
            PathBuf::from("/data/corpus/training_data_payment-stream.jsonl")
        );
        assert_eq!(
            store.curated_path(Domain::TokenVault),
            PathBuf::from("/data/corpus/filtered_training_data_token-vault.jsonl")
        );
    }

    #[tokio::test]
    async fn missing_corpus_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(tmp.path().join("not-yet-created"));
        assert!(store.read_all(Domain::TokenCreation).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(tmp.path().join("corpus"));
        store
            .append(Domain::TokenVault, &InteractionRecord::new("a", "{}", 0.7))
            .await
            .unwrap();
        store
            .append(Domain::TokenVault, &InteractionRecord::new("b", "{}", 0.4))
            .await
            .unwrap();

        let records = store.read_all(Domain::TokenVault).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].messages[0].content, "a");
        assert_eq!(records[1].messages[0].content, "b");
        assert!(store.read_all(Domain::PaymentStream).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(tmp.path());
        store
            .append(Domain::PaymentStream, &InteractionRecord::new("ok", "{}", 0.9))
            .await
            .unwrap();
        let path = store.corpus_path(Domain::PaymentStream);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{\"messages\": [trunc\n\n");
        std::fs::write(&path, content).unwrap();
        store
            .append(Domain::PaymentStream, &InteractionRecord::new("ok again", "{}", 0.9))
            .await
            .unwrap();

        let records = store.read_all(Domain::PaymentStream).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_all_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(CorpusStore::new(tmp.path()));

        let tasks = (0..50).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let text = format!("turn {i} {}", "x".repeat(i * 97));
                store
                    .append(Domain::TokenCreation, &InteractionRecord::new(text, "{}", 0.7))
                    .await
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let records = store.read_all(Domain::TokenCreation).await.unwrap();
        assert_eq!(records.len(), 50);
        let raw = std::fs::read_to_string(store.corpus_path(Domain::TokenCreation)).unwrap();
        assert_eq!(raw.lines().count(), 50);
    }
}
