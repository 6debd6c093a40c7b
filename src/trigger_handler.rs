// trigger_handler.rs
use crate::context_manager::{ContextManager, Turn};
use crate::image_pipeline::ImagePipeline;
use crate::models::{GenerationRequest, ImageConfig};

use log::{info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// What happened to the trigger carried by an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerDispatch {
    None,
    Started { prompt: String },
    Rejected { reason: String },
}

/// Starts a background image run for `prompt` with the settings in `config`.
///
/// The run slot is claimed before returning, so a second trigger arriving
/// while this run is active is rejected rather than queued.
pub fn handle_trigger(
    prompt: String,
    config: ImageConfig,
    pipeline: &Arc<ImagePipeline>,
    context: &Arc<Mutex<ContextManager>>,
) -> (TriggerDispatch, Option<JoinHandle<()>>) {
    let guard = match pipeline.begin() {
        Ok(guard) => guard,
        Err(e) => {
            info!("Trigger dropped ({}): {}", e.reason_code(), prompt);
            return (
                TriggerDispatch::Rejected {
                    reason: e.reason_code().to_string(),
                },
                None,
            );
        }
    };

    info!("Trigger detected. Generating image for prompt: {}", prompt);
    let request = GenerationRequest::new(prompt.clone(), config);
    let pipeline = Arc::clone(pipeline);
    let context = Arc::clone(context);
    let task = tokio::spawn(async move {
        match pipeline.run(guard, request).await {
            Ok(image) => info!("Image generated. URL: {}", image.url),
            Err(e) => {
                warn!("Image generation ended without an image ({}): {}", e.reason_code(), e);
                if let Some(message) = e.user_message() {
                    context
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .add_notice(Turn::assistant(message));
                }
            }
        }
    });

    (TriggerDispatch::Started { prompt }, Some(task))
}
