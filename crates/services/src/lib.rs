#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_serializer;
pub mod progress_service;
pub mod question_selector;
pub mod score_aggregator;

pub use cefr_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, PreconditionError, ProgressError};
pub use progress_serializer::ProgressSerializer;
pub use progress_service::ProgressService;
pub use question_selector::QuestionSelector;
pub use score_aggregator::ScoreAggregator;
