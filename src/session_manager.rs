// session_manager.rs
use crate::image_diffusion::ImageJobClient;
use crate::image_pipeline::ImagePipeline;
use crate::job_poller::PollPolicy;
use crate::llm_client::TextGenerator;
use crate::session::ChatSession;

use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// In-memory registry of chat sessions.
pub struct SessionManager {
    llm: Arc<dyn TextGenerator>,
    image_client: Arc<dyn ImageJobClient>,
    poll_policy: PollPolicy,
    sessions: Mutex<HashMap<Uuid, Arc<ChatSession>>>,
}

impl SessionManager {
    pub fn new(llm: Arc<dyn TextGenerator>, image_client: Arc<dyn ImageJobClient>, poll_policy: PollPolicy) -> Self {
        SessionManager {
            llm,
            image_client,
            poll_policy,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<ChatSession>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_session(&self) -> Arc<ChatSession> {
        let session_id = Uuid::new_v4();
        let pipeline = ImagePipeline::new(Arc::clone(&self.image_client), self.poll_policy);
        let session = Arc::new(ChatSession::new(session_id, Arc::clone(&self.llm), pipeline));
        self.sessions().insert(session_id, Arc::clone(&session));
        info!("Created session {}", session_id);
        session
    }

    pub fn get_session(&self, session_id: &Uuid) -> Option<Arc<ChatSession>> {
        self.sessions().get(session_id).cloned()
    }

    /// Removes the session and cancels its image run. Returns false if unknown.
    pub fn remove_session(&self, session_id: &Uuid) -> bool {
        let removed = self.sessions().remove(session_id);
        match removed {
            Some(session) => {
                session.teardown();
                info!("Removed session {}", session_id);
                true
            }
            None => false,
        }
    }

    pub fn shutdown(&self) {
        let sessions: Vec<Arc<ChatSession>> = self.sessions().drain().map(|(_, session)| session).collect();
        for session in sessions {
            session.teardown();
        }
    }
}
