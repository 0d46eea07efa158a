//! Vertex client tests against a local mock server.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use comicsmith_core::GeneratedImage;
use comicsmith_error::SynthesisErrorKind;
use comicsmith_interface::ImageSynthesizer;
use comicsmith_models::{AspectRatio, SynthesisConfig, VertexImageClient};
use mockito::Matcher;
use serde_json::json;

const PATH: &str = "/v1/projects/test-project/locations/us-central1/publishers/google/models/test-model:generateContent";

fn client_for(server: &mockito::ServerGuard, max_retries: usize) -> VertexImageClient {
    let config = SynthesisConfig::builder()
        .project("test-project")
        .location("us-central1")
        .model("test-model")
        .access_token("test-token")
        .aspect_ratio(AspectRatio::Wide)
        .max_retries(max_retries)
        .api_base(Some(server.url()))
        .build()
        .expect("valid config");
    VertexImageClient::new(config).expect("client")
}

fn image_body(bytes: &[u8]) -> String {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(bytes) } }]
            },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_generate_decodes_image() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": "16:9" }
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(image_body(&[7, 8, 9]))
        .create_async()
        .await;

    let client = client_for(&server, 0);
    let image = client.generate("a lighthouse at dusk").await.unwrap();

    assert_eq!(image.bytes(), &vec![7u8, 8, 9]);
    assert_eq!(image.mime(), "image/png");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_edit_sends_base_image_before_prompt() {
    let mut server = mockito::Server::new_async().await;
    let base = GeneratedImage::png(vec![1, 2, 3]);
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode([1u8, 2, 3]) } },
                    { "text": "add rain" }
                ]
            }]
        })))
        .with_status(200)
        .with_body(image_body(&[4, 5]))
        .create_async()
        .await;

    let client = client_for(&server, 0);
    let image = client.edit("add rain", &base).await.unwrap();

    assert_eq!(image.bytes(), &vec![4u8, 5]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_safety_block_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, 3);
    let err = client.generate("something forbidden").await.unwrap_err();

    assert_eq!(err.kind, SynthesisErrorKind::Rejected("SAFETY".to_string()));
}

#[tokio::test]
async fn test_text_only_answer_is_no_result() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "no image for you" }] },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, 3);
    let err = client.generate("a cat").await.unwrap_err();

    assert!(matches!(err.kind, SynthesisErrorKind::NoResult(_)));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(400)
        .with_body("bad request")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 3);
    let err = client.generate("a cat").await.unwrap_err();

    assert_eq!(
        err.kind,
        SynthesisErrorKind::TransportError {
            status_code: Some(400),
            message: "bad request".to_string(),
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried_within_budget() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(500)
        .with_body("internal")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server, 1);
    let err = client.generate("a cat").await.unwrap_err();

    assert!(matches!(
        err.kind,
        SynthesisErrorKind::TransportError {
            status_code: Some(500),
            ..
        }
    ));
    mock.assert_async().await;
}
