// llm_client.rs
use crate::context_manager::{Role, Turn};
use crate::errors::RemoteCallError;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

/// Produces one assistant completion for a conversation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, turns: &[Turn], system_instruction: &str) -> Result<String, RemoteCallError>;
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request<'a>(turns: &'a [Turn], system_instruction: &'a str) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: turns
            .iter()
            .map(|turn| Content {
                role: gemini_role(turn.role),
                parts: vec![Part { text: &turn.text }],
            })
            .collect(),
        system_instruction: SystemInstruction {
            parts: vec![Part { text: system_instruction }],
        },
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    tokenizer: Option<CoreBPE>,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: Option<String>, api_base: &str, model: &str) -> Self {
        let tokenizer = tiktoken_rs::cl100k_base()
            .map_err(|e| warn!("Token estimator unavailable: {}", e))
            .ok();
        GeminiClient {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            tokenizer,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn estimate_tokens(&self, turns: &[Turn], system_instruction: &str) -> Option<usize> {
        let bpe = self.tokenizer.as_ref()?;
        let context_tokens: usize = turns
            .iter()
            .map(|turn| bpe.encode_with_special_tokens(&turn.text).len())
            .sum();
        Some(context_tokens + bpe.encode_with_special_tokens(system_instruction).len())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn complete(&self, turns: &[Turn], system_instruction: &str) -> Result<String, RemoteCallError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RemoteCallError::MissingApiKey("GEMINI_API_KEY"))?;

        let request = build_request(turns, system_instruction);
        if let Some(estimate) = self.estimate_tokens(turns, system_instruction) {
            debug!("Sending {} turns to {} (~{} tokens)", turns.len(), self.model, estimate);
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Gemini response status {}: {}", status, body);

        if !status.is_success() {
            error!("Gemini API error {}: {}", status, body);
            return Err(RemoteCallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        if let Some(usage) = &parsed.usage_metadata {
            info!(
                "Token usage - Prompt tokens: {}, Completion tokens: {}, Total tokens: {}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
                usage.total_token_count.unwrap_or(0)
            );
        }

        let text: String = parsed
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().filter_map(|part| part.text.as_deref()).collect())
            .unwrap_or_default();
        Ok(text)
    }
}
