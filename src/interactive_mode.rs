// interactive_mode.rs
use crate::errors::SessionError;
use crate::models::{AspectRatio, ImageConfig, ResolutionTier};
use crate::session::ChatSession;
use crate::session_manager::SessionManager;
use crate::trigger_handler::TriggerDispatch;

use log::{error, info};
use std::io::{self, Write};
use std::sync::Arc;

const HELP: &str = "Commands: /ratio <1:1|2:3|3:2|3:4|4:3|9:16|16:9|21:9>, /size <1K|2K|4K>, /images, /status, exit";

fn handle_command(session: &ChatSession, line: &str) -> String {
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().unwrap_or_default().trim();

    match command {
        "/ratio" => match argument.parse::<AspectRatio>() {
            Ok(aspect_ratio) => {
                let config = ImageConfig {
                    aspect_ratio,
                    ..session.image_config()
                };
                session.set_image_config(config);
                format!("Aspect ratio set to {}", aspect_ratio)
            }
            Err(e) => e,
        },
        "/size" => match argument.parse::<ResolutionTier>() {
            Ok(resolution_tier) => {
                let config = ImageConfig {
                    resolution_tier,
                    ..session.image_config()
                };
                session.set_image_config(config);
                format!("Resolution set to {}", resolution_tier)
            }
            Err(e) => e,
        },
        "/images" => {
            let images = session.images();
            if images.is_empty() {
                "No images yet.".to_string()
            } else {
                images
                    .iter()
                    .map(|image| format!("[{} {}] {}\n  {}", image.aspect_ratio, image.resolution_tier, image.prompt, image.url))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        "/status" => {
            let config = session.image_config();
            format!(
                "Image pipeline: {:?}, settings: {} {}",
                session.pipeline_state(),
                config.aspect_ratio,
                config.resolution_tier
            )
        }
        _ => HELP.to_string(),
    }
}

/// Console chat on its own session. Returns when the user types `exit`.
pub async fn run_interactive_mode(sessions: Arc<SessionManager>) -> anyhow::Result<()> {
    let session = sessions.create_session();
    if let Some(greeting) = session.turns().first() {
        println!("\nConsultant:\n{}", greeting.display_text());
    }
    println!("{}", HELP);

    loop {
        print!("\nYou:\n");
        io::stdout().flush()?;
        let mut user_input = String::new();
        if io::stdin().read_line(&mut user_input)? == 0 {
            info!("Console input closed");
            break;
        }
        let user_input = user_input.trim().to_string();

        if user_input.eq_ignore_ascii_case("exit") {
            info!("User requested exit");
            break;
        }
        if user_input.starts_with('/') {
            println!("{}", handle_command(&session, &user_input));
            continue;
        }

        match session.submit_turn(&user_input).await {
            Ok(outcome) => {
                println!("\nConsultant:\n{}", outcome.reply);
                match outcome.trigger {
                    TriggerDispatch::Started { prompt } => {
                        println!("\n(Generating a preview image for: {} - check /images)", prompt)
                    }
                    TriggerDispatch::Rejected { .. } => {
                        println!("\n(An image is already being generated.)")
                    }
                    TriggerDispatch::None => {}
                }
            }
            Err(SessionError::EmptyInput) => {}
            Err(e) => error!("Error processing user input: {}", e),
        }
    }

    sessions.remove_session(&session.id());
    Ok(())
}
