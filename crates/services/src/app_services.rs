use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_serializer::ProgressSerializer;
use crate::progress_service::ProgressService;
use crate::question_selector::QuestionSelector;
use crate::score_aggregator::ScoreAggregator;

/// Assembles the progress services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    aggregator: Arc<ScoreAggregator>,
    selector: Arc<QuestionSelector>,
    serializer: Arc<ProgressSerializer>,
}

impl AppServices {
    /// Build services backed by durable `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        log::info!("progress store opened at {db_url}");
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over a volatile store that lives as long as the returned value.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let aggregator = ScoreAggregator::new(Arc::clone(&storage.word_scores));
        let selector = Arc::new(QuestionSelector::new(aggregator.clone()));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.word_scores),
            Arc::clone(&storage.grammar_reads),
        ));
        let serializer = Arc::new(ProgressSerializer::new(
            clock,
            Arc::clone(&storage.snapshots),
        ));

        Self {
            progress,
            aggregator: Arc::new(aggregator),
            selector,
            serializer,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn aggregator(&self) -> Arc<ScoreAggregator> {
        Arc::clone(&self.aggregator)
    }

    #[must_use]
    pub fn selector(&self) -> Arc<QuestionSelector> {
        Arc::clone(&self.selector)
    }

    #[must_use]
    pub fn serializer(&self) -> Arc<ProgressSerializer> {
        Arc::clone(&self.serializer)
    }
}
