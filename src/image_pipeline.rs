// image_pipeline.rs
use crate::errors::PipelineError;
use crate::image_diffusion::ImageJobClient;
use crate::job_poller::{poll_until_complete, PollPolicy};
use crate::models::{GeneratedImage, GenerationRequest};

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct PipelineInner {
    active: bool,
    // Newest first.
    images: Vec<GeneratedImage>,
}

fn lock(inner: &Mutex<PipelineInner>) -> MutexGuard<'_, PipelineInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Proof that the caller owns the single run slot. Dropping it frees the slot.
pub struct RunGuard {
    inner: Arc<Mutex<PipelineInner>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.inner).active = false;
    }
}

/// Submit-and-wait orchestration for one session, one run at a time.
pub struct ImagePipeline {
    client: Arc<dyn ImageJobClient>,
    policy: PollPolicy,
    inner: Arc<Mutex<PipelineInner>>,
    cancel: CancellationToken,
}

impl ImagePipeline {
    pub fn new(client: Arc<dyn ImageJobClient>, policy: PollPolicy) -> Self {
        ImagePipeline {
            client,
            policy,
            inner: Arc::new(Mutex::new(PipelineInner::default())),
            cancel: CancellationToken::new(),
        }
    }

    /// Claims the run slot, or `ReentrancyRejected` if a run is active.
    pub fn begin(&self) -> Result<RunGuard, PipelineError> {
        let mut inner = lock(&self.inner);
        if inner.active {
            info!("Image run already active; dropping new trigger");
            return Err(PipelineError::ReentrancyRejected);
        }
        inner.active = true;
        Ok(RunGuard {
            inner: Arc::clone(&self.inner),
        })
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage, PipelineError> {
        let guard = self.begin()?;
        self.run(guard, request).await
    }

    /// Submits `request`, polls it to completion and records the image.
    ///
    /// `guard` must come from this pipeline's `begin`. The image metadata comes
    /// from `request`, so later changes to the session's live settings never
    /// touch a run that is already in flight.
    pub async fn run(&self, guard: RunGuard, request: GenerationRequest) -> Result<GeneratedImage, PipelineError> {
        if !Arc::ptr_eq(&guard.inner, &self.inner) {
            warn!("Run slot belongs to another pipeline; refusing run");
            return Err(PipelineError::ReentrancyRejected);
        }
        info!(
            "Submitting image job ({} {}): {}",
            request.aspect_ratio, request.resolution_tier, request.prompt
        );

        let submitted = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
            submitted = self.client.submit(&request) => submitted,
        };
        let handle = submitted.map_err(|e| {
            error!("Image job submission failed: {}", e);
            PipelineError::from(e)
        })?;

        let url = poll_until_complete(self.client.as_ref(), &handle, self.policy, &self.cancel).await?;

        let image = GeneratedImage {
            url,
            prompt: request.prompt,
            timestamp: Utc::now(),
            aspect_ratio: request.aspect_ratio,
            resolution_tier: request.resolution_tier,
        };
        lock(&self.inner).images.insert(0, image.clone());
        info!("Image for job {} ready: {}", handle.id, image.url);
        drop(guard);
        Ok(image)
    }

    pub fn state(&self) -> PipelineState {
        if lock(&self.inner).active {
            PipelineState::Running
        } else {
            PipelineState::Idle
        }
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        lock(&self.inner).images.clone()
    }

    /// Aborts any in-flight submission or poll. The pipeline stays unusable afterwards.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
