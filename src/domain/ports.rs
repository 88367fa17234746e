use crate::domain::model::{
    AnalysisResult, ClassificationRequest, DocumentContext, Heading, ManualEntry,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Durable slot holding at most one reference document.
pub trait DocumentStore: Send + Sync {
    fn load_document(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<DocumentContext>>> + Send;
    fn persist_document(
        &self,
        document: &DocumentContext,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn clear_document(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Durable, id-keyed collection of manual entries. `load_all_entries` returns insertion order.
pub trait ManualEntryStore: Send + Sync {
    fn load_all_entries(&self)
        -> impl std::future::Future<Output = Result<Vec<ManualEntry>>> + Send;
    fn persist_entry(
        &self,
        entry: &ManualEntry,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn delete_entry(&self, id: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn classifier_endpoint(&self) -> &str;
    fn model(&self) -> &str;
    fn api_key(&self) -> &str;
    fn timeout_seconds(&self) -> Option<u64>;
    fn data_dir(&self) -> &str;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<AnalysisResult>;
}

#[async_trait]
pub trait HeadingExtractor: Send + Sync {
    async fn extract_headings(&self, document: &DocumentContext) -> Result<Vec<Heading>>;
}
