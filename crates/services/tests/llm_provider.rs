use std::sync::Arc;
use std::time::Duration;

use services::ai::StructuredClient;
use services::{GameLoopService, LlmProblemProvider, ProblemProvider, ProviderError};
use study_core::game::{GameConfig, GamePhase, GameSession};
use study_core::model::{AiSettingsDraft, Category};
use tokio::net::TcpListener;

fn provider_at(base_url: String) -> LlmProblemProvider {
    let settings = AiSettingsDraft {
        api_key: Some("test-key".into()),
        api_model: Some("test-model".into()),
        api_base_url: Some(base_url),
    }
    .validate()
    .unwrap();
    LlmProblemProvider::new(StructuredClient::new(Some(settings))).without_shuffle()
}

fn provider_for(server: &mockito::Server) -> LlmProblemProvider {
    provider_at(server.url())
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

#[tokio::test]
async fn parses_generated_problem() {
    let mut server = mockito::Server::new_async().await;
    let content = r#"```json
{"statement": "Two dice are rolled. P(sum = 7)?", "options": ["1/6", "1/36", "1/12", "5/36"], "correctAnswer": "1/6"}
```"#;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(content))
        .create_async()
        .await;

    let draft = provider_for(&server)
        .fetch_problem(4, Category::DiceProbability)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(draft.correct_answer, "1/6");
    assert_eq!(draft.options, vec!["1/6", "1/36", "1/12", "5/36"]);
    assert!(draft.validate(4, 10).is_ok());
}

#[tokio::test]
async fn server_error_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .create_async()
        .await;

    let err = provider_for(&server)
        .fetch_problem(1, Category::Bodmas)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::HttpStatus(status) if status.as_u16() == 500));
}

#[tokio::test]
async fn non_json_content_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body("Sure! Here is a riddle for you."))
        .create_async()
        .await;

    let err = provider_for(&server)
        .fetch_problem(1, Category::LogicRiddle)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[tokio::test]
async fn empty_content_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body("   "))
        .create_async()
        .await;

    let err = provider_for(&server)
        .fetch_problem(1, Category::WordProblem)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResponse));
}

#[tokio::test]
async fn silent_endpoint_falls_back_instead_of_hanging() {
    // Accepts connections and never writes a byte back.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let held = tokio::spawn(async move {
        let mut sockets = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            sockets.push(socket);
        }
    });

    let provider: Arc<dyn ProblemProvider> = Arc::new(provider_at(format!("http://{addr}")));
    let game_loop = GameLoopService::new(provider).with_fetch_timeout(Duration::from_millis(300));
    let mut session = GameSession::new(GameConfig::for_category(Category::Bodmas));

    let report = tokio::time::timeout(Duration::from_secs(5), game_loop.start(&mut session))
        .await
        .expect("start should give up on the silent endpoint")
        .unwrap();

    assert_eq!(report.snapshot.phase, GamePhase::AwaitingAnswer);
    assert!(report.snapshot.used_fallback);
    assert!(report.notice.is_some());
    held.abort();
}
