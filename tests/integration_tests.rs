use hts_derivative::core::ranking::{MetalBanner, Verdict};
use hts_derivative::core::ConfigProvider;
use hts_derivative::{
    AnalysisSession, AnalyzerError, Confidence, DocumentContext, GeminiClient, LocalStorage,
    ManualEntry, MetalType, ReferenceStore, TomlConfig,
};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn config_for(server: &MockServer, data_dir: &str) -> TomlConfig {
    TomlConfig::from_toml_str(&format!(
        r#"
[classifier]
endpoint = "{}"
model = "gemini-test"
api_key = "integration-key"
timeout_seconds = 10

[storage]
data_dir = "{}"
"#,
        server.base_url(),
        data_dir
    ))
    .unwrap()
}

fn gemini_reply(payload: serde_json::Value) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": payload.to_string() }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_end_to_end_check_with_persisted_reference() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start_async().await;
    let config = config_for(&server, &data_dir);

    // Administrator session: load reference material.
    {
        let storage = LocalStorage::new(config.data_dir().to_string());
        let mut reference = ReferenceStore::open(storage.clone(), storage).await;
        reference
            .set_document(Some(DocumentContext::from_file(
                "annex-i.pdf",
                "application/pdf",
                b"%PDF-1.7 annex",
            )))
            .await
            .unwrap();
        reference
            .add_manual_entry(ManualEntry::draft(
                "7308",
                "Structures",
                "Steel structures are derivatives",
                MetalType::Steel,
            ))
            .await
            .unwrap();
        assert!(reference.is_synced());
    }

    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("x-goog-api-key", "integration-key")
                .body_contains("inlineData")
                .body_contains("Steel structures are derivatives")
                .body_contains("7308.90.30");
            then.status(200).json_body(gemini_reply(json!({
                "found": true,
                "matches": [
                    {
                        "derivativeCategory": "Structures",
                        "metalType": "Steel",
                        "confidence": "Medium",
                        "matchDetail": "Manual entry for heading 7308"
                    },
                    {
                        "derivativeCategory": "Aluminum structures",
                        "metalType": "Aluminum",
                        "confidence": "Low",
                        "matchDetail": "Heading 7610 by analogy"
                    },
                    {
                        "derivativeCategory": "Iron or steel structures",
                        "metalType": "Steel",
                        "confidence": "High",
                        "matchDetail": "Subheading 7308.90 listed in Annex I"
                    }
                ],
                "reasoning": "Heading 7308 is covered."
            })));
        })
        .await;

    // User session: reload from disk and check a code.
    let storage = LocalStorage::new(config.data_dir().to_string());
    let reference = ReferenceStore::open(storage.clone(), storage).await;
    assert_eq!(reference.document().unwrap().display_name, "annex-i.pdf");
    assert_eq!(reference.manual_entries().len(), 1);

    let mut session = AnalysisSession::new(reference, GeminiClient::new(&config).unwrap());
    let analysis = session.check("7308.90.30").await.unwrap();

    api_mock.assert_async().await;
    let ordered: Vec<(&str, Confidence)> = analysis
        .result
        .matches
        .iter()
        .map(|m| (m.derivative_category.as_str(), m.confidence))
        .collect();
    assert_eq!(
        ordered,
        vec![
            ("Iron or steel structures", Confidence::High),
            ("Structures", Confidence::Medium),
            ("Aluminum structures", Confidence::Low),
        ]
    );
    assert_eq!(
        analysis.verdict,
        Verdict::Derivative {
            banner: MetalBanner::Both
        }
    );
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_backend_failure_keeps_session_state() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let config = config_for(&server, temp_dir.path().to_str().unwrap());

    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(500).body("internal stack trace");
        })
        .await;

    let storage = LocalStorage::new(config.data_dir().to_string());
    let mut reference = ReferenceStore::open(storage.clone(), storage).await;
    reference
        .set_document(Some(DocumentContext::from_text("Chapter 76 aluminum")))
        .await
        .unwrap();

    let mut session = AnalysisSession::new(reference, GeminiClient::new(&config).unwrap());
    let err = session.check("7604.10").await.unwrap_err();

    api_mock.assert_async().await;
    assert!(matches!(err, AnalyzerError::Classification { .. }));
    assert!(!err.user_friendly_message().contains("stack trace"));
    assert!(session.history().is_empty());
    assert!(session.reference().document().is_some());
}

#[tokio::test]
async fn test_history_keeps_five_most_recent_checks() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let config = config_for(&server, temp_dir.path().to_str().unwrap());

    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200).json_body(gemini_reply(json!({
                "found": false,
                "matches": [],
                "reasoning": "Not listed."
            })));
        })
        .await;

    let storage = LocalStorage::new(config.data_dir().to_string());
    let mut reference = ReferenceStore::open(storage.clone(), storage).await;
    reference
        .add_manual_entry(ManualEntry::draft(
            "7604",
            "Bars",
            "Aluminum bars",
            MetalType::Aluminum,
        ))
        .await
        .unwrap();

    let mut session = AnalysisSession::new(reference, GeminiClient::new(&config).unwrap());
    for code in ["0101", "0202", "0303", "0404", "0505", "0606"] {
        let analysis = session.check(code).await.unwrap();
        assert_eq!(analysis.verdict, Verdict::NotDerivative);
    }

    let codes: Vec<&str> = session
        .history()
        .entries()
        .map(|e| e.code.as_str())
        .collect();
    assert_eq!(codes, vec!["0606", "0505", "0404", "0303", "0202"]);
}

#[tokio::test]
async fn test_not_ready_without_reference_material() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let config = config_for(&server, temp_dir.path().to_str().unwrap());

    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let storage = LocalStorage::new(config.data_dir().to_string());
    let reference = ReferenceStore::open(storage.clone(), storage).await;
    let mut session = AnalysisSession::new(reference, GeminiClient::new(&config).unwrap());

    assert!(!session.is_ready());
    assert!(matches!(
        session.check("7604").await,
        Err(AnalyzerError::NotReady)
    ));
    api_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_resync_never_deletes_unreadable_document() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_str().unwrap().to_string();
    let document_path = temp_dir.path().join("document.json");

    {
        let storage = LocalStorage::new(data_dir.clone());
        let mut reference = ReferenceStore::open(storage.clone(), storage).await;
        reference
            .set_document(Some(DocumentContext::from_text("Chapter 73 steel")))
            .await
            .unwrap();
    }
    let saved = std::fs::read(&document_path).unwrap();
    std::fs::write(&document_path, b"{ truncated").unwrap();

    let storage = LocalStorage::new(data_dir);
    let mut reference = ReferenceStore::open(storage.clone(), storage).await;
    assert!(reference.document().is_none());
    assert!(!reference.is_synced());

    assert!(matches!(
        reference.resync().await,
        Err(AnalyzerError::Persistence { .. })
    ));
    assert_eq!(std::fs::read(&document_path).unwrap(), b"{ truncated");

    std::fs::write(&document_path, &saved).unwrap();
    reference.resync().await.unwrap();

    assert!(document_path.exists());
    assert_eq!(reference.document().unwrap().content, "Chapter 73 steel");
    assert!(reference.is_synced());
}
