// session.rs
use crate::context_manager::{ContextManager, Role, Turn};
use crate::errors::SessionError;
use crate::image_pipeline::{ImagePipeline, PipelineState};
use crate::llm_client::TextGenerator;
use crate::models::{GeneratedImage, ImageConfig};
use crate::system_prompt::{EMPTY_COMPLETION_REPLY, GREETING, REMOTE_FAILURE_REPLY, SYSTEM_INSTRUCTION};
use crate::trigger_handler::{handle_trigger, TriggerDispatch};
use crate::triggers::{display_text, extract_prompt};

use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    Idle,
    AwaitingCompletion,
}

/// Result of one accepted user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// Assistant reply with trigger lines removed.
    pub reply: String,
    pub trigger: TriggerDispatch,
    /// True when the remote call failed and the fallback reply was used.
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnView {
    pub role: Role,
    pub text: String,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: ChatPhase,
    pub pipeline: PipelineState,
    pub image_config: ImageConfig,
    pub turns: Vec<TurnView>,
    pub images: Vec<GeneratedImage>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Puts the phase back to Idle however the completion ends, including when
// the caller drops the future mid-request. Held notices are flushed first.
struct AwaitingGuard<'a> {
    phase: &'a Mutex<ChatPhase>,
    context: &'a Mutex<ContextManager>,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        lock(self.context).release();
        *lock(self.phase) = ChatPhase::Idle;
    }
}

/// One consultation: turn log, live image settings and the image pipeline.
pub struct ChatSession {
    id: Uuid,
    llm: Arc<dyn TextGenerator>,
    pipeline: Arc<ImagePipeline>,
    context: Arc<Mutex<ContextManager>>,
    phase: Mutex<ChatPhase>,
    image_config: Mutex<ImageConfig>,
    pipeline_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(id: Uuid, llm: Arc<dyn TextGenerator>, pipeline: ImagePipeline) -> Self {
        ChatSession {
            id,
            llm,
            pipeline: Arc::new(pipeline),
            context: Arc::new(Mutex::new(ContextManager::with_greeting(GREETING))),
            phase: Mutex::new(ChatPhase::Idle),
            image_config: Mutex::new(ImageConfig::default()),
            pipeline_task: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn enter_awaiting(&self) -> Result<AwaitingGuard<'_>, SessionError> {
        let mut phase = lock(&self.phase);
        if *phase == ChatPhase::AwaitingCompletion {
            return Err(SessionError::AwaitingCompletion);
        }
        *phase = ChatPhase::AwaitingCompletion;
        Ok(AwaitingGuard {
            phase: &self.phase,
            context: &self.context,
        })
    }

    /// Appends the user's turn, asks the model for a reply and starts an
    /// image run if the reply carries a generation prompt.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty input for session {}", self.id);
            return Err(SessionError::EmptyInput);
        }
        let awaiting = match self.enter_awaiting() {
            Ok(guard) => guard,
            Err(e) => {
                debug!("Ignoring input for session {}: {}", self.id, e);
                return Err(e);
            }
        };

        let turns = {
            let mut context = lock(&self.context);
            context.add_turn(Turn::user(text));
            context.hold();
            context.get_context()
        };
        info!("Session {}: processing user input ({} turns)", self.id, turns.len());

        let completion = match self.llm.complete(&turns, SYSTEM_INSTRUCTION).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Session {}: chat request failed: {}", self.id, e);
                lock(&self.context).add_turn(Turn::assistant(REMOTE_FAILURE_REPLY));
                drop(awaiting);
                return Ok(TurnOutcome {
                    reply: REMOTE_FAILURE_REPLY.to_string(),
                    trigger: TriggerDispatch::None,
                    degraded: true,
                });
            }
        };

        let completion = if completion.trim().is_empty() {
            warn!("Session {}: empty completion, using fallback text", self.id);
            EMPTY_COMPLETION_REPLY.to_string()
        } else {
            completion
        };
        lock(&self.context).add_turn(Turn::assistant(completion.clone()));
        drop(awaiting);
        debug!("Session {}: assistant reply appended", self.id);

        let trigger = match extract_prompt(&completion) {
            Some(prompt) => self.dispatch_trigger(prompt),
            None => TriggerDispatch::None,
        };

        Ok(TurnOutcome {
            reply: display_text(&completion),
            trigger,
            degraded: false,
        })
    }

    fn dispatch_trigger(&self, prompt: String) -> TriggerDispatch {
        let config = *lock(&self.image_config);
        let (dispatch, task) = handle_trigger(prompt, config, &self.pipeline, &self.context);
        if let Some(task) = task {
            *lock(&self.pipeline_task) = Some(task);
        }
        dispatch
    }

    /// Waits for the background image run started by the last trigger, if any.
    pub async fn wait_for_image_run(&self) {
        let task = lock(&self.pipeline_task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Session {}: image task ended abnormally: {}", self.id, e);
            }
        }
    }

    pub fn set_image_config(&self, config: ImageConfig) {
        info!(
            "Session {}: image settings {} {}",
            self.id, config.aspect_ratio, config.resolution_tier
        );
        *lock(&self.image_config) = config;
    }

    pub fn image_config(&self) -> ImageConfig {
        *lock(&self.image_config)
    }

    pub fn turns(&self) -> Vec<Turn> {
        lock(&self.context).get_context()
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.pipeline.images()
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn phase(&self) -> ChatPhase {
        *lock(&self.phase)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase(),
            pipeline: self.pipeline_state(),
            image_config: self.image_config(),
            turns: self
                .turns()
                .into_iter()
                .map(|turn| TurnView {
                    display: turn.display_text(),
                    role: turn.role,
                    text: turn.text,
                })
                .collect(),
            images: self.images(),
        }
    }

    /// Cancels any in-flight image run.
    pub fn teardown(&self) {
        info!("Session {}: teardown", self.id);
        self.pipeline.shutdown();
    }
}
