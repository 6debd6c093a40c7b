// main.rs
use tile_design_studio::api_routes;
use tile_design_studio::config::AppConfig;
use tile_design_studio::image_diffusion::LeonardoClient;
use tile_design_studio::interactive_mode::run_interactive_mode;
use tile_design_studio::llm_client::GeminiClient;
use tile_design_studio::logging;
use tile_design_studio::session_manager::SessionManager;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::{error, info};
use reqwest::Client;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    logging::init(&config.log_config).context("failed to initialize logging")?;
    config.warn_missing_keys();

    info!("Starting tile design studio on {}", config.bind_addr);

    let client = Client::new();
    let llm = GeminiClient::new(
        client.clone(),
        config.gemini_api_key.clone(),
        &config.gemini_api_base,
        &config.chat_model,
    );
    let images = LeonardoClient::new(
        client,
        config.leonardo_api_key.clone(),
        &config.leonardo_api_base,
        &config.leonardo_model_id,
        config.leonardo_max_dimension,
    );
    let sessions = Arc::new(SessionManager::new(Arc::new(llm), Arc::new(images), config.poll_policy));

    if config.interactive {
        let console_sessions = Arc::clone(&sessions);
        // Spawn a new thread for the interactive console mode
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Could not start console runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                if let Err(e) = run_interactive_mode(console_sessions).await {
                    error!("Error in interactive mode: {}", e);
                }
            });
        });
    }

    let data = web::Data::from(Arc::clone(&sessions));
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(data.clone())
            .configure(api_routes::configure)
    })
    .bind(config.bind_addr.as_str())
    .with_context(|| format!("failed to bind {}", config.bind_addr))?
    .run()
    .await?;

    sessions.shutdown();
    info!("Server stopped");
    Ok(())
}
