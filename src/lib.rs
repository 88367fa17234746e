pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::TomlConfig;

pub use crate::adapters::{GeminiClient, LocalStorage, MemoryStorage};
pub use crate::core::{
    reference_store::{AddedEntry, ReferenceStore},
    session::AnalysisSession,
};
pub use crate::domain::model::{
    AnalysisResult, Confidence, DerivativeMatch, DocumentContext, HistoryEntry, ManualEntry,
    MetalType,
};
pub use crate::utils::error::{AnalyzerError, Result};
