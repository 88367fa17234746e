use crate::core::readiness;
use crate::domain::model::{DocumentContext, Heading, ManualEntry};
use crate::domain::ports::{DocumentStore, ManualEntryStore};
use crate::utils::error::{AnalyzerError, Result};
use crate::utils::validation::Validate;
use uuid::Uuid;

/// Result of `ReferenceStore::add_manual_entry`. The id is assigned even when saving failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedEntry {
    pub id: String,
    pub saved: bool,
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Document,
    Entries,
}

/// Owns the document slot and the manual entry collection.
///
/// Every mutator writes through to its backing store exactly once. A failed write
/// still updates the in-memory copy and marks that source dirty; `resync` pushes
/// dirty sources again. A source that failed to load is never written over by
/// `resync` unless it was changed in this session.
pub struct ReferenceStore<D: DocumentStore, E: ManualEntryStore> {
    document_store: D,
    entry_store: E,
    document: Option<DocumentContext>,
    entries: Vec<ManualEntry>,
    document_loaded: bool,
    entries_loaded: bool,
    document_dirty: bool,
    entries_dirty: bool,
    // Deletions made while the persisted entries are unknown.
    deleted_ids: Vec<String>,
}

impl<D: DocumentStore, E: ManualEntryStore> ReferenceStore<D, E> {
    /// Loads persisted reference material. Load failures are logged and leave that source empty.
    pub async fn open(document_store: D, entry_store: E) -> Self {
        let (document, document_loaded) = match document_store.load_document().await {
            Ok(document) => (document, true),
            Err(e) => {
                tracing::warn!("Failed to load saved reference document: {}", e);
                (None, false)
            }
        };

        let (entries, entries_loaded) = match entry_store.load_all_entries().await {
            Ok(entries) => (entries, true),
            Err(e) => {
                tracing::warn!("Failed to load saved manual entries: {}", e);
                (Vec::new(), false)
            }
        };

        tracing::debug!(
            "Reference store opened (document: {}, manual entries: {})",
            document.is_some(),
            entries.len()
        );

        Self {
            document_store,
            entry_store,
            document,
            entries,
            document_loaded,
            entries_loaded,
            document_dirty: false,
            entries_dirty: false,
            deleted_ids: Vec::new(),
        }
    }

    pub fn document(&self) -> Option<&DocumentContext> {
        self.document.as_ref()
    }

    pub fn manual_entries(&self) -> &[ManualEntry] {
        &self.entries
    }

    pub fn manual_entry(&self, id: &str) -> Option<&ManualEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn is_ready(&self) -> bool {
        readiness::is_ready(self.document.as_ref(), &self.entries)
    }

    /// True when both sources loaded and no write-through is outstanding.
    pub fn is_synced(&self) -> bool {
        self.document_loaded && self.entries_loaded && !self.document_dirty && !self.entries_dirty
    }

    /// Replaces the document wholesale; `None` clears it.
    pub async fn set_document(&mut self, document: Option<DocumentContext>) -> Result<()> {
        let persisted = match &document {
            Some(doc) => self.document_store.persist_document(doc).await,
            None => self.document_store.clear_document().await,
        };

        match &document {
            Some(doc) => tracing::info!("Reference document set: {}", doc.display_name),
            None => tracing::info!("Reference document cleared"),
        }
        self.document = document;
        self.document_loaded = true;
        self.commit(persisted, Source::Document, "document")
    }

    /// Appends a manual entry.
    ///
    /// A fresh id is assigned when the entry has none or its id is already taken.
    /// A failed write keeps the entry in memory and reports `saved: false`.
    pub async fn add_manual_entry(&mut self, mut entry: ManualEntry) -> Result<AddedEntry> {
        entry.validate()?;

        if entry.id.is_empty() || self.manual_entry(&entry.id).is_some() {
            entry.id = self.fresh_id();
        }
        let id = entry.id.clone();

        let persisted = self.entry_store.persist_entry(&entry).await;
        tracing::info!("Manual entry added: {} ({})", entry.code, id);
        self.entries.push(entry);
        let saved = self.commit(persisted, Source::Entries, "manual entry").is_ok();
        Ok(AddedEntry { id, saved })
    }

    /// Replaces an existing entry in place, keeping its id and position.
    pub async fn update_manual_entry(&mut self, entry: ManualEntry) -> Result<()> {
        entry.validate()?;

        let position = self
            .entries
            .iter()
            .position(|e| e.id == entry.id)
            .ok_or_else(|| AnalyzerError::UnknownEntry {
                id: entry.id.clone(),
            })?;

        let persisted = self.entry_store.persist_entry(&entry).await;
        tracing::info!("Manual entry updated: {} ({})", entry.code, entry.id);
        self.entries[position] = entry;
        self.commit(persisted, Source::Entries, "manual entry")
    }

    /// Removes the entry with `id`. Returns whether anything was removed; unknown ids are a no-op.
    pub async fn delete_manual_entry(&mut self, id: &str) -> Result<bool> {
        let persisted = self.entry_store.delete_entry(id).await;

        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            tracing::info!("Manual entry deleted: {}", id);
        }
        if !self.entries_loaded {
            self.deleted_ids.push(id.to_string());
        }

        self.commit(persisted, Source::Entries, "manual entry deletion")?;
        Ok(removed)
    }

    pub async fn set_extracted_headings(&mut self, headings: Vec<Heading>) -> Result<()> {
        let mut document = self.document.clone().ok_or(AnalyzerError::NoDocument)?;
        document.extracted_headings = Some(headings);

        let persisted = self.document_store.persist_document(&document).await;
        self.document = Some(document);
        self.commit(persisted, Source::Document, "extracted headings")
    }

    /// Brings memory and storage back in line.
    ///
    /// Dirty sources are pushed from memory. Sources that failed to load are re-read;
    /// unloaded entries are merged with what was added or deleted since.
    pub async fn resync(&mut self) -> Result<()> {
        self.resync_document().await?;
        self.resync_entries().await?;
        tracing::info!("Reference material re-synchronised with storage");
        Ok(())
    }

    async fn resync_document(&mut self) -> Result<()> {
        if self.document_dirty {
            let persisted = match &self.document {
                Some(doc) => self.document_store.persist_document(doc).await,
                None => self.document_store.clear_document().await,
            };
            persisted.map_err(AnalyzerError::persistence)?;
            self.document_dirty = false;
        } else if !self.document_loaded {
            self.document = self
                .document_store
                .load_document()
                .await
                .map_err(AnalyzerError::persistence)?;
            self.document_loaded = true;
            tracing::info!("Saved reference document reloaded");
        }
        Ok(())
    }

    async fn resync_entries(&mut self) -> Result<()> {
        if !self.entries_loaded {
            let stored = self
                .entry_store
                .load_all_entries()
                .await
                .map_err(AnalyzerError::persistence)?;

            let mut merged: Vec<ManualEntry> = stored
                .into_iter()
                .filter(|s| !self.deleted_ids.contains(&s.id))
                .map(|s| self.manual_entry(&s.id).cloned().unwrap_or(s))
                .collect();
            for entry in &self.entries {
                if !merged.iter().any(|m| m.id == entry.id) {
                    merged.push(entry.clone());
                }
            }

            tracing::info!("Saved manual entries reloaded ({} total)", merged.len());
            self.entries = merged;
            self.entries_loaded = true;
            self.deleted_ids.clear();
        }

        if self.entries_dirty {
            let stored = self
                .entry_store
                .load_all_entries()
                .await
                .map_err(AnalyzerError::persistence)?;
            for stale in stored.iter().filter(|s| self.manual_entry(&s.id).is_none()) {
                self.entry_store
                    .delete_entry(&stale.id)
                    .await
                    .map_err(AnalyzerError::persistence)?;
            }
            for entry in &self.entries {
                self.entry_store
                    .persist_entry(entry)
                    .await
                    .map_err(AnalyzerError::persistence)?;
            }
            self.entries_dirty = false;
        }
        Ok(())
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.manual_entry(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(&mut self, persisted: Result<()>, source: Source, what: &str) -> Result<()> {
        match persisted {
            Ok(()) => {
                if let Source::Document = source {
                    self.document_dirty = false;
                }
                Ok(())
            }
            Err(e) => {
                match source {
                    Source::Document => self.document_dirty = true,
                    Source::Entries => self.entries_dirty = true,
                }
                tracing::warn!("Failed to persist {}: {} (kept in memory)", what, e);
                Err(AnalyzerError::persistence(e))
            }
        }
    }
}
