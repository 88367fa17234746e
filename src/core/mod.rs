pub mod history;
pub mod query;
pub mod ranking;
pub mod readiness;
pub mod reference_store;
pub mod session;

pub use crate::domain::model::{AnalysisResult, ClassificationRequest, DocumentContext, ManualEntry};
pub use crate::domain::ports::{
    Classifier, ConfigProvider, DocumentStore, HeadingExtractor, ManualEntryStore,
};
pub use crate::utils::error::Result;
