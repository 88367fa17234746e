use crate::core::history::HistoryTracker;
use crate::core::query::compose_request;
use crate::core::ranking::{self, Verdict};
use crate::core::reference_store::ReferenceStore;
use crate::domain::model::{AnalysisResult, Heading};
use crate::domain::ports::{Classifier, DocumentStore, HeadingExtractor, ManualEntryStore};
use crate::utils::error::{AnalyzerError, Result};

/// Ranked outcome of one check.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub code: String,
    pub result: AnalysisResult,
    pub verdict: Verdict,
}

/// One user session: reference material, the classifier and the recent-checks log.
///
/// `check` takes `&mut self`, so a second classification cannot start while one is in flight.
pub struct AnalysisSession<D: DocumentStore, E: ManualEntryStore, C: Classifier> {
    reference: ReferenceStore<D, E>,
    classifier: C,
    history: HistoryTracker,
}

impl<D: DocumentStore, E: ManualEntryStore, C: Classifier> AnalysisSession<D, E, C> {
    pub fn new(reference: ReferenceStore<D, E>, classifier: C) -> Self {
        Self {
            reference,
            classifier,
            history: HistoryTracker::new(),
        }
    }

    pub fn reference(&self) -> &ReferenceStore<D, E> {
        &self.reference
    }

    pub fn reference_mut(&mut self) -> &mut ReferenceStore<D, E> {
        &mut self.reference
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn is_ready(&self) -> bool {
        self.reference.is_ready()
    }

    pub async fn check(&mut self, raw_code: &str) -> Result<Analysis> {
        let request = compose_request(
            self.reference.document(),
            self.reference.manual_entries(),
            raw_code,
        )?;

        tracing::info!("Checking HTS code {}", request.code);
        let raw = self.classifier.classify(&request).await.map_err(|e| {
            tracing::error!("Classification of {} failed: {}", request.code, e);
            AnalyzerError::classification()
        })?;

        let result = ranking::rank(raw);
        let verdict = ranking::verdict(&result);
        self.history.record(request.code.clone(), result.found);

        Ok(Analysis {
            code: request.code,
            result,
            verdict,
        })
    }

    /// Lists the headings the current document covers and stores them on it.
    ///
    /// Extraction failures leave the document untouched.
    pub async fn scan_headings<X: HeadingExtractor>(
        &mut self,
        extractor: &X,
    ) -> Result<Vec<Heading>> {
        let document = self
            .reference
            .document()
            .ok_or(AnalyzerError::NoDocument)?;

        tracing::info!("Scanning headings of {}", document.display_name);
        let headings = extractor.extract_headings(document).await.map_err(|e| {
            tracing::error!("Heading extraction failed: {}", e);
            AnalyzerError::heading_extraction()
        })?;

        self.reference
            .set_extracted_headings(headings.clone())
            .await?;
        Ok(headings)
    }
}
