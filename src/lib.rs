pub mod api_routes;
pub mod config;
pub mod context_manager;
pub mod errors;
pub mod image_diffusion;
pub mod image_pipeline;
pub mod interactive_mode;
pub mod job_poller;
pub mod llm_client;
pub mod logging;
pub mod models;
pub mod session;
pub mod session_manager;
pub mod system_prompt;
pub mod trigger_handler;
pub mod triggers;
