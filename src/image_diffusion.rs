// image_diffusion.rs
use crate::errors::RemoteCallError;
use crate::models::{GenerationRequest, JobHandle, JobStatus};

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Remote image job service: submit once, then ask for status by id.
#[async_trait]
pub trait ImageJobClient: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, RemoteCallError>;

    async fn query_status(&self, handle: &JobHandle) -> Result<JobStatus, RemoteCallError>;
}

#[derive(Serialize, Debug)]
struct CreateGenerationRequest<'a> {
    prompt: &'a str,
    #[serde(rename = "modelId")]
    model_id: &'a str,
    width: u32,
    height: u32,
    num_images: u32,
}

#[derive(Deserialize, Debug)]
struct CreateGenerationResponse {
    #[serde(rename = "sdGenerationJob")]
    sd_generation_job: Option<GenerationJob>,
}

#[derive(Deserialize, Debug)]
struct GenerationJob {
    #[serde(rename = "generationId")]
    generation_id: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GenerationStatusResponse {
    generations_by_pk: Option<GenerationInfo>,
}

#[derive(Deserialize, Debug)]
struct GenerationInfo {
    status: Option<String>,
    #[serde(default)]
    generated_images: Vec<GeneratedImageInfo>,
}

#[derive(Deserialize, Debug)]
struct GeneratedImageInfo {
    url: Option<String>,
}

fn map_status(info: Option<GenerationInfo>) -> JobStatus {
    let Some(info) = info else {
        return JobStatus::Pending;
    };
    match info.status.as_deref() {
        Some("FAILED") => JobStatus::Failed("provider reported FAILED".to_string()),
        Some("COMPLETE") => match info.generated_images.first().and_then(|image| image.url.clone()) {
            Some(url) => JobStatus::Complete(url),
            // Complete with nothing produced yet: keep waiting.
            None => JobStatus::Pending,
        },
        _ => JobStatus::Pending,
    }
}

/// Leonardo REST client (`/generations`).
pub struct LeonardoClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    model_id: String,
    max_dimension: u32,
}

impl LeonardoClient {
    pub fn new(client: Client, api_key: Option<String>, api_base: &str, model_id: &str, max_dimension: u32) -> Self {
        LeonardoClient {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            max_dimension,
        }
    }

    fn api_key(&self) -> Result<&str, RemoteCallError> {
        self.api_key
            .as_deref()
            .ok_or(RemoteCallError::MissingApiKey("LEONARDO_API_KEY"))
    }

    async fn read_body(response: reqwest::Response, what: &str) -> Result<String, RemoteCallError> {
        let status = response.status();
        let body = response.text().await?;
        debug!("Leonardo {} response status {}: {}", what, status, body);
        if !status.is_success() {
            error!("Leonardo {} error {}: {}", what, status, body);
            return Err(RemoteCallError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageJobClient for LeonardoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, RemoteCallError> {
        let api_key = self.api_key()?;
        let (width, height) = request.dimensions(self.max_dimension);
        let payload = CreateGenerationRequest {
            prompt: &request.prompt,
            model_id: &self.model_id,
            width,
            height,
            num_images: 1,
        };
        debug!("Sending generation request: {:?}", payload);

        let response = self
            .client
            .post(format!("{}/generations", self.api_base))
            .header("accept", "application/json")
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_body(response, "submission").await?;

        let parsed: CreateGenerationResponse = serde_json::from_str(&body)?;
        let generation_id = parsed
            .sd_generation_job
            .and_then(|job| job.generation_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RemoteCallError::Malformed("response has no sdGenerationJob.generationId".to_string()))?;

        info!("Leonardo job {} queued ({}x{})", generation_id, width, height);
        Ok(JobHandle::new(generation_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobStatus, RemoteCallError> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/generations/{}", self.api_base, handle.id))
            .header("accept", "application/json")
            .bearer_auth(api_key)
            .send()
            .await?;
        let body = Self::read_body(response, "status").await?;

        let parsed: GenerationStatusResponse = serde_json::from_str(&body)?;
        Ok(map_status(parsed.generations_by_pk))
    }
}
