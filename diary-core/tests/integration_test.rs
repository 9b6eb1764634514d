//! Integration tests for the mood diary client
//!
//! These tests run the editor end-to-end against a mock backend:
//! - Debounced analysis through the real request client
//! - Error classification and notices
//! - Sequential image insertion

use mood_diary::app::AppState;
use mood_diary::config::ClientConfig;
use mood_diary::error::{AppError, ClassifiedError};
use mood_diary::http::{ChannelNotifier, Notice};
use mood_diary::models::{AnalysisRequestState, AnalysisView, Sentiment};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create app state pointed at a mock server with a short debounce
fn create_test_state(
    server: &MockServer,
    config: ClientConfig,
) -> (AppState, UnboundedReceiver<Notice>) {
    let (notifier, rx) = ChannelNotifier::new();
    let config = config
        .with_base_url(server.uri())
        .with_debounce_delay(Duration::from_millis(50));
    let state = AppState::new(config, Arc::new(notifier)).unwrap();
    (state, rx)
}

/// Wait until the analysis view settles into a terminal state
async fn wait_settled(rx: &mut watch::Receiver<AnalysisView>) -> AnalysisView {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let view = rx.borrow_and_update();
                if matches!(
                    view.state,
                    AnalysisRequestState::Resolved(_) | AnalysisRequestState::Failed
                ) {
                    return view.clone();
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("analysis did not settle")
}

#[tokio::test]
async fn test_editor_analyzes_after_pause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-diary"))
        .and(body_json(json!({ "content": "Finished the marathon, exhausted but proud!" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sentiment": "positive",
            "confidence": 0.93,
            "keywords": ["marathon", "proud"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (state, mut notices) = create_test_state(&server, ClientConfig::default());
    let mut editor = state.editor();
    let mut views = editor.subscribe();

    editor.on_input("Finished the");
    editor.on_input("Finished the marathon");
    editor.on_input("Finished the marathon, exhausted but proud!");
    assert_eq!(editor.hint().as_deref(), Some("Analyzing..."));

    let view = wait_settled(&mut views).await;
    let analysis = view.analysis.unwrap();
    assert_eq!(analysis.sentiment, Sentiment::Positive);
    assert_eq!(analysis.confidence_percent(), 93);
    assert_eq!(analysis.keywords, vec!["marathon", "proud"]);
    assert_eq!(view.char_count, 43);
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_editor_settle_returns_final_analysis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-diary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "sentiment": "negative",
                    "confidence": 0.71,
                    "keywords": ["deadline"]
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (state, _notices) = create_test_state(&server, ClientConfig::default());
    let mut editor = state.editor();
    let mut views = editor.subscribe();

    editor.append("Missed the deadline again\n");
    let view = tokio::time::timeout(Duration::from_secs(5), editor.settle())
        .await
        .expect("editor did not settle");

    assert!(!editor.has_pending());
    assert!(!view.is_loading());
    assert_eq!(view.analysis.unwrap().sentiment, Sentiment::Negative);

    // a subscriber that wakes after settling still sees the final view
    drop(editor);
    let last = tokio::time::timeout(Duration::from_secs(5), async {
        let mut last = None;
        while views.changed().await.is_ok() {
            last = Some(views.borrow_and_update().clone());
        }
        last
    })
    .await
    .expect("view channel never closed");
    assert!(matches!(
        last.map(|view| view.state),
        Some(AnalysisRequestState::Resolved(_))
    ));
}

#[tokio::test]
async fn test_editor_short_content_never_hits_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (state, _notices) = create_test_state(&server, ClientConfig::default());
    let mut editor = state.editor();

    editor.on_input("  hi there ");
    assert_eq!(
        editor.hint().as_deref(),
        Some("2 more characters to start analysis")
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(editor.view().state, AnalysisRequestState::Idle);
}

#[tokio::test]
async fn test_editor_validation_failure_notifies_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-diary"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "detail": [{ "msg": "too short" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (state, mut notices) = create_test_state(&server, ClientConfig::default());
    let mut editor = state.editor();
    let mut views = editor.subscribe();

    editor.on_input("Rainy day, nothing much happened.");

    let view = wait_settled(&mut views).await;
    assert_eq!(view.state, AnalysisRequestState::Failed);
    assert!(view.analysis.is_none());

    assert_eq!(notices.recv().await.unwrap().message, "too short");
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_analysis_network_error_notifies_once() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let (notifier, mut notices) = ChannelNotifier::new();
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .with_debounce_delay(Duration::from_millis(10));
    let state = AppState::new(config, Arc::new(notifier)).unwrap();
    let mut editor = state.editor();
    let mut views = editor.subscribe();

    editor.on_input("An entry for a server that is not there");

    let view = wait_settled(&mut views).await;
    assert_eq!(view.state, AnalysisRequestState::Failed);
    assert!(notices.recv().await.unwrap().message.starts_with("Network error"));
    assert!(notices.try_recv().is_err());
}

#[tokio::test]
async fn test_batch_insert_skips_failed_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "/uploads/sunset.jpg" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let too_big = temp_dir.path().join("too-big.png");
    std::fs::write(&too_big, vec![0u8; 64]).unwrap();
    let sunset = temp_dir.path().join("sunset.jpg");
    std::fs::write(&sunset, b"jpeg bytes").unwrap();

    let (state, mut notices) =
        create_test_state(&server, ClientConfig::default().with_max_upload_bytes(32));
    let mut editor = state.editor();
    editor.on_input("Walk");

    let report = editor.insert_files(&[too_big.clone(), sunset]).await;

    let expected = format!("![sunset.jpg]({}/uploads/sunset.jpg)", server.uri());
    assert_eq!(report.inserted, vec![expected.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, too_big);
    assert!(matches!(report.failed[0].1, AppError::FileTooLarge { size: 64, limit: 32 }));

    assert_eq!(editor.content(), format!("Walk\n{}\n", expected));
    assert!(!editor.subscribe_uploads().borrow().uploading);
    assert!(notices.try_recv().unwrap().message.starts_with("File is too large"));
}

#[tokio::test]
async fn test_batch_insert_server_failure_leaves_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "detail": "unsupported file type" })),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("notes.exe");
    std::fs::write(&file, b"MZ").unwrap();

    let (state, mut notices) = create_test_state(&server, ClientConfig::default());
    let mut editor = state.editor();
    editor.on_input("Keep it");

    let report = editor.insert_files(&[file]).await;

    assert!(report.inserted.is_empty());
    assert!(matches!(
        report.failed[0].1.classified(),
        Some(ClassifiedError::HttpError { status: 400, .. })
    ));
    assert_eq!(editor.content(), "Keep it");
    assert_eq!(notices.try_recv().unwrap().message, "unsupported file type");
}
