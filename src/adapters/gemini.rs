use crate::domain::model::{
    AnalysisResult, ClassificationRequest, DocumentContext, DocumentSource, Heading,
    ManualEntry,
};
use crate::domain::ports::{Classifier, ConfigProvider, HeadingExtractor};
use crate::utils::error::{AnalyzerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// `generateContent` client serving as both classifier and heading extractor.
///
/// PDFs travel as inline data, pasted text as a text part. Responses are
/// constrained to JSON by a response schema.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_seconds() {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.classifier_endpoint().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key: config.api_key().to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    async fn generate<T: DeserializeOwned>(&self, parts: Vec<Value>, schema: Value) -> Result<T> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "temperature": 0.1,
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        tracing::debug!("Calling Gemini model {}", self.model);
        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Gemini response status: {}", status);
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::BackendError {
                status: Some(status.as_u16()),
                message,
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = payload
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>();

        if text.trim().is_empty() {
            return Err(AnalyzerError::BackendError {
                status: Some(status.as_u16()),
                message: "response contained no text candidates".to_string(),
            });
        }

        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(&self, request: &ClassificationRequest) -> Result<AnalysisResult> {
        let mut parts = Vec::new();
        if let Some(document) = &request.document {
            parts.push(document_part(document));
        }
        parts.push(json!({ "text": classification_prompt(request) }));

        self.generate(parts, analysis_schema()).await
    }
}

#[async_trait]
impl HeadingExtractor for GeminiClient {
    async fn extract_headings(&self, document: &DocumentContext) -> Result<Vec<Heading>> {
        let parts = vec![
            document_part(document),
            json!({ "text": HEADING_PROMPT }),
        ];

        self.generate(parts, headings_schema()).await
    }
}

const HEADING_PROMPT: &str = "List every HTS heading or subheading that the reference \
document above identifies as an aluminum or steel derivative product. For each one give \
the heading number exactly as written and a short description of the covered goods. \
Keep the order in which they appear in the document.";

fn document_part(document: &DocumentContext) -> Value {
    match &document.source {
        DocumentSource::File { media_type } => json!({
            "inlineData": { "mimeType": media_type, "data": document.content }
        }),
        DocumentSource::Text => json!({
            "text": format!(
                "REFERENCE DOCUMENT ({}):\n{}",
                document.display_name, document.content
            )
        }),
    }
}

fn render_manual_entries(entries: &[ManualEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "- Code: {} | Category: {} | Metal: {} | Rule: {}",
                e.code, e.category, e.metal_type, e.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn classification_prompt(request: &ClassificationRequest) -> String {
    let mut prompt = String::from(
        "You are a U.S. customs compliance analyst. Decide whether the HTS code below is an \
aluminum or steel derivative product according to the reference material provided.\n\n",
    );

    if request.document.is_some() {
        prompt.push_str("Use the attached reference document as the primary source.\n");
    }

    if !request.manual_entries.is_empty() {
        prompt.push_str(
            "\nMANUAL ENTRIES (these override or supplement the reference document; where they \
conflict, the manual entry wins):\n",
        );
        prompt.push_str(&render_manual_entries(&request.manual_entries));
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nHTS CODE TO CHECK: {}\n\n\
Match on the full code or any parent heading/subheading prefix. Set `found` to false when \
the code is not a derivative. Return one match per derivative category, citing the \
headings, subheadings or notes that apply in `matchDetail`, and rate each match High, \
Medium or Low confidence. Always explain the decision in `reasoning`.",
        request.code
    ));

    prompt
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "found": { "type": "BOOLEAN" },
            "matches": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "derivativeCategory": { "type": "STRING" },
                        "metalType": { "type": "STRING", "enum": ["Aluminum", "Steel", "Both"] },
                        "confidence": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                        "matchDetail": { "type": "STRING" }
                    },
                    "required": ["derivativeCategory", "metalType", "confidence", "matchDetail"]
                }
            },
            "reasoning": { "type": "STRING" }
        },
        "required": ["found", "matches", "reasoning"]
    })
}

fn headings_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "heading": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["heading", "description"]
        }
    })
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
