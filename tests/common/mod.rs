// Scripted stand-ins for the remote services.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tile_design_studio::context_manager::Turn;
use tile_design_studio::errors::RemoteCallError;
use tile_design_studio::image_diffusion::ImageJobClient;
use tile_design_studio::image_pipeline::ImagePipeline;
use tile_design_studio::job_poller::PollPolicy;
use tile_design_studio::llm_client::TextGenerator;
use tile_design_studio::models::{GenerationRequest, JobHandle, JobStatus};
use tile_design_studio::session::ChatSession;
use tokio::sync::Notify;
use uuid::Uuid;

pub const IMAGE_URL: &str = "https://cdn.leonardo.ai/users/demo/generations/tile-0.png";

pub fn default_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(2000),
        max_attempts: 15,
    }
}

/// Replies from a queue; `Err(())` entries become remote failures.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ()>>>,
    pub calls: Mutex<Vec<Vec<Turn>>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<&str, ()>>) -> Self {
        ScriptedModel {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Each completion waits for one `notify_one` on the returned handle.
    pub fn gated(replies: Vec<Result<&str, ()>>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut model = ScriptedModel::new(replies);
        model.gate = Some(Arc::clone(&gate));
        (model, gate)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    async fn complete(&self, turns: &[Turn], _system_instruction: &str) -> Result<String, RemoteCallError> {
        self.calls.lock().unwrap().push(turns.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) | None => Err(RemoteCallError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

/// Image service that answers status checks from a queue (then `Pending`).
#[derive(Default)]
pub struct ScriptedJobs {
    statuses: Mutex<VecDeque<Result<JobStatus, RemoteCallError>>>,
    submission_error: Mutex<Option<RemoteCallError>>,
    pub submissions: Mutex<Vec<GenerationRequest>>,
    queries: AtomicUsize,
}

impl ScriptedJobs {
    pub fn with_statuses(statuses: Vec<JobStatus>) -> Self {
        ScriptedJobs::with_replies(statuses.into_iter().map(Ok).collect())
    }

    /// Status replies that may include query errors.
    pub fn with_replies(replies: Vec<Result<JobStatus, RemoteCallError>>) -> Self {
        ScriptedJobs {
            statuses: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn pending_then_complete(pending: usize) -> Self {
        let mut statuses = vec![JobStatus::Pending; pending];
        statuses.push(JobStatus::Complete(IMAGE_URL.to_string()));
        ScriptedJobs::with_statuses(statuses)
    }

    pub fn rejecting_submissions() -> Self {
        ScriptedJobs::rejecting_submissions_with(RemoteCallError::Malformed(
            "response has no sdGenerationJob.generationId".to_string(),
        ))
    }

    /// The first submission fails with `error`.
    pub fn rejecting_submissions_with(error: RemoteCallError) -> Self {
        ScriptedJobs {
            submission_error: Mutex::new(Some(error)),
            ..Default::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageJobClient for ScriptedJobs {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, RemoteCallError> {
        self.submissions.lock().unwrap().push(request.clone());
        if let Some(error) = self.submission_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(JobHandle::new(format!("job-{}", self.submission_count())))
    }

    async fn query_status(&self, _handle: &JobHandle) -> Result<JobStatus, RemoteCallError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(JobStatus::Pending))
    }
}

pub fn session_with(model: Arc<ScriptedModel>, jobs: Arc<ScriptedJobs>) -> Arc<ChatSession> {
    let pipeline = ImagePipeline::new(jobs, default_policy());
    Arc::new(ChatSession::new(Uuid::new_v4(), model, pipeline))
}
