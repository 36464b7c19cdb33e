//! Persistent perspective index
//!
//! Every mutation is appended to a JSON-lines log. Opening the index
//! replays the log into an [`InMemoryPerspectiveIndex`], which then serves
//! all reads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use evees_core::{
    ContentAddress, ContentStore, Perspective, PerspectiveIndex, PerspectiveRecord, SearchFilter,
    StoreError,
};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::memory::InMemoryPerspectiveIndex;

const LOG_FILE: &str = "perspectives.log";

/// Entry type in the append-only log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum LogEntry {
    /// A perspective was created with its initial head
    Create { record: PerspectiveRecord },
    /// A perspective's head was reassigned
    SetHead {
        id: ContentAddress,
        head: ContentAddress,
    },
}

/// File-backed implementation of [`PerspectiveIndex`]
pub struct PersistentPerspectiveIndex {
    storage_path: PathBuf,
    index: InMemoryPerspectiveIndex,
    /// Serializes mutations so the log order matches the applied order
    writer: Mutex<BufWriter<File>>,
    sync_writes: bool,
}

impl std::fmt::Debug for PersistentPerspectiveIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentPerspectiveIndex")
            .field("storage_path", &self.storage_path)
            .field("index", &self.index)
            .finish()
    }
}

impl PersistentPerspectiveIndex {
    /// Open the index stored under `storage_path`
    pub async fn open(storage_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(storage_path, InMemoryPerspectiveIndex::new(), true).await
    }

    /// Open the index, matching search text against `content`
    pub async fn open_with_content(
        storage_path: impl AsRef<Path>,
        content: Arc<dyn ContentStore>,
    ) -> Result<Self, StoreError> {
        Self::open_with(
            storage_path,
            InMemoryPerspectiveIndex::with_content(content),
            true,
        )
        .await
    }

    async fn open_with(
        storage_path: impl AsRef<Path>,
        index: InMemoryPerspectiveIndex,
        sync_writes: bool,
    ) -> Result<Self, StoreError> {
        let storage_path = storage_path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&storage_path).await?;

        let log_path = storage_path.join(LOG_FILE);
        replay(&log_path, &index).await?;

        let writer = open_writer(&log_path).await?;

        Ok(Self {
            storage_path,
            index,
            writer: Mutex::new(writer),
            sync_writes,
        })
    }

    fn log_path(&self) -> PathBuf {
        self.storage_path.join(LOG_FILE)
    }

    /// Register a perspective pointing at `head`
    ///
    /// Re-creating a known perspective is a no-op that returns its id. The
    /// log entry is written before the record becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Integrity`] if the perspective id does not match
    /// its fields, or the log error if the append fails.
    pub async fn create(
        &self,
        perspective: Perspective,
        head: ContentAddress,
    ) -> Result<ContentAddress, StoreError> {
        if !perspective.verify() {
            return Err(StoreError::Integrity {
                expected: perspective.expected_id().to_string(),
                actual: perspective.id.to_string(),
            });
        }

        let mut writer = self.writer.lock().await;
        if self.index.contains(&perspective.id) {
            return Ok(perspective.id);
        }

        let record = PerspectiveRecord::new(perspective, head);
        self.append(&mut writer, &LogEntry::Create {
            record: record.clone(),
        })
        .await?;
        let id = record.perspective.id.clone();
        debug!(perspective = %id.short(), head = %record.head.short(), "Created perspective");
        self.index.insert_record(record);
        Ok(id)
    }

    /// Point an existing perspective at a new head (last writer wins)
    ///
    /// The head only changes once the log entry is written.
    pub async fn set_head(
        &self,
        id: &ContentAddress,
        head: ContentAddress,
    ) -> Result<(), StoreError> {
        let mut writer = self.writer.lock().await;
        if !self.index.contains(id) {
            return Err(StoreError::not_found(id.as_str()));
        }

        self.append(
            &mut writer,
            &LogEntry::SetHead {
                id: id.clone(),
                head: head.clone(),
            },
        )
        .await?;
        self.index.set_head(id, head)
    }

    /// Number of known perspectives
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rewrite the log so it holds one `create` entry per perspective
    pub async fn compact(&self) -> Result<(), StoreError> {
        let mut writer = self.writer.lock().await;
        writer.flush().await?;

        let log_path = self.log_path();
        let temp_path = log_path.with_extension("log.tmp");

        info!("Compacting perspective log");

        let mut records = self.index.records();
        records.sort_by(|a, b| {
            (a.perspective.timestamp, a.id()).cmp(&(b.perspective.timestamp, b.id()))
        });
        {
            let file = File::create(&temp_path).await?;
            let mut temp = BufWriter::new(file);
            for record in &records {
                write_line(&mut temp, &LogEntry::Create {
                    record: record.clone(),
                })
                .await?;
            }
            temp.flush().await?;
            temp.get_ref().sync_all().await?;
        }

        tokio::fs::rename(&temp_path, &log_path).await?;
        *writer = open_writer(&log_path).await?;

        info!(perspectives = records.len(), "Log compaction complete");
        Ok(())
    }

    async fn append(
        &self,
        writer: &mut BufWriter<File>,
        entry: &LogEntry,
    ) -> Result<(), StoreError> {
        write_line(writer, entry).await?;
        writer.flush().await?;
        if self.sync_writes {
            writer.get_ref().sync_data().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PerspectiveIndex for PersistentPerspectiveIndex {
    async fn get_head(&self, id: &ContentAddress) -> Result<PerspectiveRecord, StoreError> {
        self.index.get_head(id).await
    }

    async fn search(
        &self,
        filter: &SearchFilter,
        caller: Option<&str>,
    ) -> Result<Vec<PerspectiveRecord>, StoreError> {
        self.index.search(filter, caller).await
    }
}

async fn write_line(writer: &mut BufWriter<File>, entry: &LogEntry) -> Result<(), StoreError> {
    let line = serde_json::to_string(entry).map_err(|e| StoreError::serialization(e.to_string()))?;
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

async fn open_writer(log_path: &Path) -> Result<BufWriter<File>, StoreError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .await?;
    debug!(path = ?log_path, "Opened log file for writing");
    Ok(BufWriter::new(file))
}

/// Replay existing log entries into `index`
async fn replay(log_path: &Path, index: &InMemoryPerspectiveIndex) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(log_path).await? {
        debug!(path = ?log_path, "No existing log file, starting fresh");
        return Ok(());
    }

    info!(path = ?log_path, "Loading perspectives from log");

    let file = File::open(log_path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut loaded_count = 0;
    let mut error_count = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(LogEntry::Create { record }) => {
                index.insert_record(record);
                loaded_count += 1;
            }
            Ok(LogEntry::SetHead { id, head }) => {
                if let Err(e) = index.set_head(&id, head) {
                    error_count += 1;
                    warn!(error = %e, "Head update for unknown perspective, skipping");
                } else {
                    loaded_count += 1;
                }
            }
            Err(e) => {
                error_count += 1;
                warn!(error = %e, "Failed to parse log entry, skipping");
            }
        }
    }

    info!(
        loaded = loaded_count,
        errors = error_count,
        perspectives = index.len(),
        "Finished loading perspectives"
    );

    Ok(())
}
