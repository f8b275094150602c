use anyhow::Result;
use mockito::Server;

use learnpath::llm::anthropic::AnthropicGateway;
use learnpath::llm::openai::OpenAiGateway;
use learnpath::llm::{GatewayError, LlmGateway};

fn anthropic(server: &Server) -> AnthropicGateway {
    AnthropicGateway::new(
        "test-key".to_string(),
        "claude-3-haiku-20240307".to_string(),
        1024,
        Some(server.url()),
        5,
    )
}

#[tokio::test]
async fn test_anthropic_invoke_returns_text() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "msg_123",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Month one: fundamentals."}],
                "stop_reason": "end_turn"
            }"#,
        )
        .create_async()
        .await;

    let gateway = anthropic(&server);
    let text = gateway.invoke("plan something", 0.7).await.expect("invoke ok");

    assert_eq!(text, "Month one: fundamentals.");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_anthropic_non_success_is_a_call_error() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body("overloaded")
        .create_async()
        .await;

    let gateway = anthropic(&server);
    let err = gateway.invoke("plan something", 0.7).await.unwrap_err();

    assert!(matches!(err, GatewayError::Call(_)));
    assert!(err.to_string().contains("529"));
    Ok(())
}

#[tokio::test]
async fn test_invoke_structured_strips_fences_from_model_output() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "content": [{"type": "text",
                             "text": "```json\n{\"title\": \"Plan\"}\n```"}]
            }"#,
        )
        .create_async()
        .await;

    let gateway = anthropic(&server);
    let value = gateway
        .invoke_structured("give me a concise title", 0.7)
        .await
        .expect("structured ok");

    assert_eq!(value["title"], "Plan");
    Ok(())
}

#[tokio::test]
async fn test_invoke_structured_reports_parse_error_distinctly() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"content": [{"type": "text", "text": "Sorry, I cannot produce JSON today."}]}"#,
        )
        .create_async()
        .await;

    let gateway = anthropic(&server);
    let err = gateway
        .invoke_structured("give me a concise title", 0.7)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Parse(_)));
    Ok(())
}

#[tokio::test]
async fn test_openai_invoke_returns_first_choice() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "chatcmpl-1",
                "choices": [{"index": 0,
                             "message": {"role": "assistant", "content": "Weekly focus: basics."},
                             "finish_reason": "stop"}]
            }"#,
        )
        .create_async()
        .await;

    let gateway = OpenAiGateway::new(
        "test-key".to_string(),
        "gpt-4o".to_string(),
        1024,
        Some(server.url()),
        5,
    );
    let text = gateway.invoke("plan something", 0.5).await.expect("invoke ok");

    assert_eq!(text, "Weekly focus: basics.");
    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_openai_empty_choices_is_a_call_error() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "chatcmpl-2", "choices": []}"#)
        .create_async()
        .await;

    let gateway = OpenAiGateway::new(
        "test-key".to_string(),
        "gpt-4o".to_string(),
        1024,
        Some(server.url()),
        5,
    );
    let err = gateway.invoke("plan something", 0.5).await.unwrap_err();

    assert!(matches!(err, GatewayError::Call(_)));
    Ok(())
}
