use std::sync::Arc;

use cefr_core::document::{FormatError, ProgressDocument, ProgressDocumentDraft};
use storage::repository::ProgressSnapshotRepository;

use crate::Clock;
use crate::error::ProgressError;

/// Exports the whole progress store as a versioned document and imports one back.
#[derive(Clone)]
pub struct ProgressSerializer {
    clock: Clock,
    snapshots: Arc<dyn ProgressSnapshotRepository>,
}

impl ProgressSerializer {
    #[must_use]
    pub fn new(clock: Clock, snapshots: Arc<dyn ProgressSnapshotRepository>) -> Self {
        Self { clock, snapshots }
    }

    /// Snapshot every word score and grammar read, stamped with the export time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be read.
    pub async fn export(&self) -> Result<ProgressDocument, ProgressError> {
        let snapshot = self.snapshots.snapshot().await?;
        let doc = ProgressDocument::from_snapshot(snapshot, self.clock.now());
        log::info!(
            "exported {} word score(s) and {} grammar read(s)",
            doc.word_score_count(),
            doc.grammar_read_count()
        );
        Ok(doc)
    }

    /// [`export`](Self::export) rendered as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the store cannot be read, or
    /// `ProgressError::Format` if rendering fails.
    pub async fn export_json(&self) -> Result<String, ProgressError> {
        let doc = self.export().await?;
        serde_json::to_string_pretty(&doc)
            .map_err(|e| FormatError::Malformed(e.to_string()).into())
    }

    /// Replace the store's contents with a validated document. No merge.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the replacement is not committed;
    /// the previous contents are kept in that case.
    pub async fn import(&self, doc: &ProgressDocument) -> Result<(), ProgressError> {
        self.snapshots.replace_all(doc.snapshot()).await?;
        log::info!(
            "imported {} word score(s) and {} grammar read(s)",
            doc.word_score_count(),
            doc.grammar_read_count()
        );
        Ok(())
    }

    /// Parse, validate and import a JSON document.
    ///
    /// Validation finishes before the store is touched, so a rejected document
    /// leaves the store exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Format` for malformed JSON, a missing
    /// `word_scores`/`grammar_reads` section, an unsupported version, or any
    /// invalid key or entry. Returns `ProgressError::Storage` if the
    /// replacement is not committed.
    pub async fn import_json(&self, json: &str) -> Result<ProgressDocument, ProgressError> {
        let doc =
            parse_document(json).inspect_err(|e| log::warn!("rejected progress import: {e}"))?;
        self.import(&doc).await?;
        Ok(doc)
    }
}

/// Parse and validate a JSON progress document without touching any store.
///
/// # Errors
///
/// Returns `FormatError` if the text is not a valid progress document.
pub fn parse_document(json: &str) -> Result<ProgressDocument, FormatError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| FormatError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(FormatError::Malformed(
            "progress document must be a JSON object".into(),
        ));
    }
    let draft: ProgressDocumentDraft =
        serde_json::from_value(value).map_err(|e| FormatError::Malformed(e.to_string()))?;
    draft.validate()
}
