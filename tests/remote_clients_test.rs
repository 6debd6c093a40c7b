use reqwest::Client;
use serde_json::json;
use tile_design_studio::context_manager::Turn;
use std::time::Duration;
use tile_design_studio::errors::{PipelineError, RemoteCallError};
use tile_design_studio::image_diffusion::{ImageJobClient, LeonardoClient};
use tile_design_studio::job_poller::{poll_until_complete, PollPolicy};
use tile_design_studio::llm_client::{GeminiClient, TextGenerator};
use tile_design_studio::models::{GenerationRequest, ImageConfig, JobHandle, JobStatus};
use wiremock::matchers::{body_json, header, method, path};
use tokio_util::sync::CancellationToken;
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_ID: &str = "6bef9f1b-29cb-40c7-b9df-32b51c1f67d3";

fn leonardo(server: &MockServer, key: Option<&str>) -> LeonardoClient {
    LeonardoClient::new(Client::new(), key.map(str::to_string), &server.uri(), MODEL_ID, 1536)
}

async fn status(client: &LeonardoClient, id: &str) -> JobStatus {
    client.query_status(&JobHandle::new(id)).await.unwrap()
}

#[tokio::test]
async fn submission_posts_prompt_and_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generations"))
        .and(header("authorization", "Bearer leo-key"))
        .and(body_json(json!({
            "prompt": "seamless blue hexagon tile",
            "modelId": MODEL_ID,
            "width": 1024,
            "height": 1024,
            "num_images": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sdGenerationJob": { "generationId": "gen-123", "apiCreditCost": 8 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("leo-key"));
    let request = GenerationRequest::new("seamless blue hexagon tile", ImageConfig::default());
    let handle = client.submit(&request).await.unwrap();

    assert_eq!(handle.id, "gen-123");
}

#[tokio::test]
async fn submission_without_job_id_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sdGenerationJob": {} })))
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("leo-key"));
    let request = GenerationRequest::new("tile", ImageConfig::default());
    let result = client.submit(&request).await;

    assert!(matches!(result, Err(RemoteCallError::Malformed(_))));
}

#[tokio::test]
async fn submission_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("bad-key"));
    let request = GenerationRequest::new("tile", ImageConfig::default());
    let result = client.submit(&request).await;

    assert!(matches!(result, Err(RemoteCallError::Status { status: 401, .. })));
}

#[tokio::test]
async fn missing_key_never_calls_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = leonardo(&server, None);
    let request = GenerationRequest::new("tile", ImageConfig::default());
    let result = client.submit(&request).await;

    assert!(matches!(result, Err(RemoteCallError::MissingApiKey("LEONARDO_API_KEY"))));
}

#[tokio::test]
async fn status_vocabulary_maps_to_job_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generations/done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": {
                "status": "COMPLETE",
                "generated_images": [
                    { "url": "https://cdn.leonardo.ai/first.png", "id": "img-1" },
                    { "url": "https://cdn.leonardo.ai/second.png", "id": "img-2" }
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generations/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "COMPLETE", "generated_images": [] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generations/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "FAILED", "generated_images": [] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generations/queued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": { "status": "PENDING" }
        })))
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("leo-key"));

    assert_eq!(
        status(&client, "done").await,
        JobStatus::Complete("https://cdn.leonardo.ai/first.png".to_string())
    );
    assert_eq!(status(&client, "empty").await, JobStatus::Pending);
    assert!(matches!(status(&client, "broken").await, JobStatus::Failed(_)));
    assert_eq!(status(&client, "queued").await, JobStatus::Pending);
}

fn quick_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(10),
        max_attempts: 15,
    }
}

#[tokio::test]
async fn html_status_reply_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>bad gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("leo-key"));
    let result = poll_until_complete(&client, &JobHandle::new("gen-1"), quick_policy(), &CancellationToken::new()).await;

    assert!(matches!(result, Err(PipelineError::StatusCheck(_))), "{:?}", result);
}

#[tokio::test]
async fn status_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generations/gen-2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generations/gen-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "generations_by_pk": {
                "status": "COMPLETE",
                "generated_images": [{ "url": "https://cdn.leonardo.ai/retry.png" }]
            }
        })))
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("leo-key"));
    let url = poll_until_complete(&client, &JobHandle::new("gen-2"), quick_policy(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.leonardo.ai/retry.png");
}

#[tokio::test]
async fn rejected_key_on_status_check_is_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generations/gen-3"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = leonardo(&server, Some("stale-key"));
    let result = poll_until_complete(&client, &JobHandle::new("gen-3"), quick_policy(), &CancellationToken::new()).await;

    assert!(matches!(result, Err(PipelineError::Unauthorized(401))), "{:?}", result);
}

#[tokio::test]
async fn gemini_completion_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "gem-key"))
        .and(body_json(json!({
            "contents": [
                { "role": "model", "parts": [{ "text": "Which room?" }] },
                { "role": "user", "parts": [{ "text": "Bathroom" }] }
            ],
            "systemInstruction": { "parts": [{ "text": "tile consultant" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Nice, " }, { "text": "30x30 cm?" }] }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(Client::new(), Some("gem-key".to_string()), &server.uri(), "test-model");
    let turns = vec![Turn::assistant("Which room?"), Turn::user("Bathroom")];
    let reply = client.complete(&turns, "tile consultant").await.unwrap();

    assert_eq!(reply, "Nice, 30x30 cm?");
}

#[tokio::test]
async fn gemini_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(Client::new(), Some("gem-key".to_string()), &server.uri(), "test-model");
    let result = client.complete(&[Turn::user("hi")], "tile consultant").await;

    assert!(matches!(result, Err(RemoteCallError::Status { status: 500, .. })));
}
