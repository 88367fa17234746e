use crate::domain::model::{DocumentContext, ManualEntry};
use crate::domain::ports::{DocumentStore, ManualEntryStore};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const DOCUMENT_FILE: &str = "document.json";
const ENTRIES_FILE: &str = "manual_entries.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    saved_at: DateTime<Utc>,
    document: DocumentContext,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntries {
    saved_at: Option<DateTime<Utc>>,
    entries: Vec<ManualEntry>,
}

/// JSON files under a data directory: one for the document slot, one for the ordered entries.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn path(&self, file: &str) -> PathBuf {
        Path::new(&self.base_path).join(file)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let full_path = self.path(file);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // write-then-rename so a crash never leaves a truncated file behind
        let tmp_path = full_path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp_path, &full_path)?;
        Ok(())
    }

    fn read_entries(&self) -> Result<StoredEntries> {
        let full_path = self.path(ENTRIES_FILE);
        if !full_path.exists() {
            return Ok(StoredEntries::default());
        }
        Ok(serde_json::from_slice(&fs::read(full_path)?)?)
    }

    fn write_entries(&self, entries: Vec<ManualEntry>) -> Result<()> {
        self.write_json(
            ENTRIES_FILE,
            &StoredEntries {
                saved_at: Some(Utc::now()),
                entries,
            },
        )
    }
}

impl DocumentStore for LocalStorage {
    async fn load_document(&self) -> Result<Option<DocumentContext>> {
        let full_path = self.path(DOCUMENT_FILE);
        if !full_path.exists() {
            return Ok(None);
        }
        let stored: StoredDocument = serde_json::from_slice(&fs::read(full_path)?)?;
        tracing::debug!("Loaded reference document saved at {}", stored.saved_at);
        Ok(Some(stored.document))
    }

    async fn persist_document(&self, document: &DocumentContext) -> Result<()> {
        self.write_json(
            DOCUMENT_FILE,
            &StoredDocument {
                saved_at: Utc::now(),
                document: document.clone(),
            },
        )
    }

    async fn clear_document(&self) -> Result<()> {
        let full_path = self.path(DOCUMENT_FILE);
        if full_path.exists() {
            fs::remove_file(full_path)?;
        }
        Ok(())
    }
}

impl ManualEntryStore for LocalStorage {
    async fn load_all_entries(&self) -> Result<Vec<ManualEntry>> {
        Ok(self.read_entries()?.entries)
    }

    async fn persist_entry(&self, entry: &ManualEntry) -> Result<()> {
        let mut entries = self.read_entries()?.entries;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        self.write_entries(entries)
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        let mut entries = self.read_entries()?.entries;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(());
        }
        self.write_entries(entries)
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    document: Arc<Mutex<Option<DocumentContext>>>,
    entries: Arc<Mutex<Vec<ManualEntry>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStorage {
    async fn load_document(&self) -> Result<Option<DocumentContext>> {
        Ok(self.document.lock().await.clone())
    }

    async fn persist_document(&self, document: &DocumentContext) -> Result<()> {
        *self.document.lock().await = Some(document.clone());
        Ok(())
    }

    async fn clear_document(&self) -> Result<()> {
        *self.document.lock().await = None;
        Ok(())
    }
}

impl ManualEntryStore for MemoryStorage {
    async fn load_all_entries(&self) -> Result<Vec<ManualEntry>> {
        Ok(self.entries.lock().await.clone())
    }

    async fn persist_entry(&self, entry: &ManualEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }
        Ok(())
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        self.entries.lock().await.retain(|e| e.id != id);
        Ok(())
    }
}
