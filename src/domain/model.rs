use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const PASTED_TEXT_NAME: &str = "Pasted Text Content";

/// Where a reference document came from. Only uploaded files carry a media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentSource {
    File {
        #[serde(rename = "mimeType")]
        media_type: String,
    },
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub heading: String,
    pub description: String,
}

/// The single reference document. `content` is base64 for files and literal text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContext {
    #[serde(flatten)]
    pub source: DocumentSource,
    pub content: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_headings: Option<Vec<Heading>>,
}

impl DocumentContext {
    pub fn from_file(display_name: impl Into<String>, media_type: &str, bytes: &[u8]) -> Self {
        Self {
            source: DocumentSource::File {
                media_type: media_type.to_string(),
            },
            content: STANDARD.encode(bytes),
            display_name: display_name.into(),
            extracted_headings: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: DocumentSource::Text,
            content: text.into(),
            display_name: PASTED_TEXT_NAME.to_string(),
            extracted_headings: None,
        }
    }

    pub fn media_type(&self) -> Option<&str> {
        match &self.source {
            DocumentSource::File { media_type } => Some(media_type),
            DocumentSource::Text => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.source, DocumentSource::File { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetalType {
    #[serde(alias = "ALUMINUM", alias = "aluminum")]
    Aluminum,
    #[serde(alias = "STEEL", alias = "steel")]
    Steel,
    #[serde(alias = "BOTH", alias = "both")]
    Both,
}

impl MetalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetalType::Aluminum => "Aluminum",
            MetalType::Steel => "Steel",
            MetalType::Both => "Both",
        }
    }

    pub fn covers_aluminum(&self) -> bool {
        matches!(self, MetalType::Aluminum | MetalType::Both)
    }

    pub fn covers_steel(&self) -> bool {
        matches!(self, MetalType::Steel | MetalType::Both)
    }
}

impl fmt::Display for MetalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetalType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aluminum" | "aluminium" => Ok(MetalType::Aluminum),
            "steel" => Ok(MetalType::Steel),
            "both" => Ok(MetalType::Both),
            other => Err(format!(
                "unknown metal type '{}', expected Aluminum, Steel or Both",
                other
            )),
        }
    }
}

/// Classifier-reported certainty. Anything outside High/Medium/Low, including
/// `null` and non-string values, maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Confidence {
    pub fn rank(&self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
            Confidence::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Unknown => "Unknown",
        }
    }
}

impl From<&str> for Confidence {
    fn from(value: &str) -> Self {
        match value {
            "High" => Confidence::High,
            "Medium" => Confidence::Medium,
            "Low" => Confidence::Low,
            _ => Confidence::Unknown,
        }
    }
}

impl From<serde_json::Value> for Confidence {
    fn from(value: serde_json::Value) -> Self {
        value.as_str().map_or(Confidence::Unknown, Confidence::from)
    }
}

impl From<Confidence> for String {
    fn from(value: Confidence) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrator-curated rule that overrides or supplements the document.
///
/// An empty `id` means "not yet assigned"; the reference store fills it in on add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    #[serde(default)]
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub category: String,
    pub description: String,
    pub metal_type: MetalType,
}

impl ManualEntry {
    pub fn draft(
        code: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        metal_type: MetalType,
    ) -> Self {
        Self {
            id: String::new(),
            code: code.into(),
            category: category.into(),
            description: description.into(),
            metal_type,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl crate::utils::validation::Validate for ManualEntry {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::validate_non_empty_string;

        validate_non_empty_string("code", &self.code)?;
        validate_non_empty_string("description", &self.description)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivativeMatch {
    pub derivative_category: String,
    pub metal_type: MetalType,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub match_detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub found: bool,
    #[serde(default)]
    pub matches: Vec<DerivativeMatch>,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub code: String,
    pub found: bool,
}

/// Everything the classifier receives for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub document: Option<DocumentContext>,
    pub manual_entries: Vec<ManualEntry>,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_document_is_base64_encoded() {
        let doc = DocumentContext::from_file("rules.pdf", PDF_MEDIA_TYPE, b"%PDF-1.4");
        assert_eq!(doc.content, "JVBERi0xLjQ=");
        assert_eq!(doc.media_type(), Some(PDF_MEDIA_TYPE));
        assert!(doc.is_file());
    }

    #[test]
    fn test_text_document_has_no_media_type() {
        let doc = DocumentContext::from_text("Chapter 76 aluminum");
        assert_eq!(doc.media_type(), None);
        assert_eq!(doc.display_name, PASTED_TEXT_NAME);
    }

    #[test]
    fn test_document_serializes_with_source_tag() {
        let doc = DocumentContext::from_file("rules.pdf", PDF_MEDIA_TYPE, b"x");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["mimeType"], PDF_MEDIA_TYPE);
        assert_eq!(json["name"], "rules.pdf");
        assert!(json.get("extractedHeadings").is_none());

        let back: DocumentContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_unrecognized_confidence_falls_back_to_unknown() {
        let m: DerivativeMatch = serde_json::from_value(serde_json::json!({
            "derivativeCategory": "Aluminum Wire",
            "metalType": "Aluminum",
            "confidence": "Very High",
            "matchDetail": "Heading 7605"
        }))
        .unwrap();
        assert_eq!(m.confidence, Confidence::Unknown);
        assert_eq!(m.confidence.rank(), 0);
    }

    #[test]
    fn test_missing_confidence_and_matches_default() {
        let result: AnalysisResult = serde_json::from_value(serde_json::json!({
            "found": false,
            "reasoning": "Not listed"
        }))
        .unwrap();
        assert!(result.matches.is_empty());

        let m: DerivativeMatch = serde_json::from_value(serde_json::json!({
            "derivativeCategory": "Steel Nails",
            "metalType": "STEEL"
        }))
        .unwrap();
        assert_eq!(m.metal_type, MetalType::Steel);
        assert_eq!(m.confidence, Confidence::Unknown);
    }

    #[test]
    fn test_null_or_non_string_confidence_ranks_unknown() {
        let result: AnalysisResult = serde_json::from_value(serde_json::json!({
            "found": true,
            "matches": [
                { "derivativeCategory": "Bars", "metalType": "Aluminum", "confidence": null },
                { "derivativeCategory": "Wire", "metalType": "Steel", "confidence": 0.9 },
                { "derivativeCategory": "Nails", "metalType": "Steel", "confidence": "Certain" },
                { "derivativeCategory": "Tubes", "metalType": "Steel", "confidence": "High" }
            ]
        }))
        .unwrap();

        let confidences: Vec<Confidence> = result.matches.iter().map(|m| m.confidence).collect();
        assert_eq!(
            confidences,
            vec![
                Confidence::Unknown,
                Confidence::Unknown,
                Confidence::Unknown,
                Confidence::High
            ]
        );
        assert_eq!(result.matches[0].confidence.rank(), 0);
    }

    #[test]
    fn test_metal_type_from_str() {
        assert_eq!("aluminium".parse::<MetalType>().unwrap(), MetalType::Aluminum);
        assert_eq!("Both".parse::<MetalType>().unwrap(), MetalType::Both);
        assert!("copper".parse::<MetalType>().is_err());
    }
}
