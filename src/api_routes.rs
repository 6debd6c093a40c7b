// api_routes.rs
use crate::errors::SessionError;
use crate::models::ImageConfig;
use crate::session_manager::SessionManager;

use actix_web::{web, HttpResponse, Responder};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
struct InteractRequest {
    message: String,
}

// Set API Routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/sessions", web::post().to(create_session_route))
            .route("/sessions/{session_id}", web::get().to(get_session_route))
            .route("/sessions/{session_id}", web::delete().to(delete_session_route))
            .route("/sessions/{session_id}/turns", web::post().to(interact_route))
            .route("/sessions/{session_id}/image-config", web::put().to(image_config_route)),
    );
}

fn session_not_found(session_id: &Uuid) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": format!("session {} not found", session_id) }))
}

async fn create_session_route(sessions: web::Data<SessionManager>) -> impl Responder {
    let session = sessions.create_session();
    HttpResponse::Created().json(json!({ "session_id": session.id() }))
}

async fn get_session_route(sessions: web::Data<SessionManager>, session_id: web::Path<Uuid>) -> HttpResponse {
    match sessions.get_session(&session_id) {
        Some(session) => HttpResponse::Ok().json(session.snapshot()),
        None => session_not_found(&session_id),
    }
}

async fn delete_session_route(sessions: web::Data<SessionManager>, session_id: web::Path<Uuid>) -> HttpResponse {
    if sessions.remove_session(&session_id) {
        HttpResponse::NoContent().finish()
    } else {
        session_not_found(&session_id)
    }
}

async fn interact_route(
    sessions: web::Data<SessionManager>,
    session_id: web::Path<Uuid>,
    interact_req: web::Json<InteractRequest>,
) -> HttpResponse {
    let Some(session) = sessions.get_session(&session_id) else {
        return session_not_found(&session_id);
    };
    info!("Received turn for session {}", session_id);

    match session.submit_turn(&interact_req.message).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(SessionError::EmptyInput) => HttpResponse::NoContent().finish(),
        Err(e @ SessionError::AwaitingCompletion) => {
            debug!("Rejected turn for session {}: {}", session_id, e);
            HttpResponse::Conflict().json(json!({ "error": e.to_string() }))
        }
    }
}

async fn image_config_route(
    sessions: web::Data<SessionManager>,
    session_id: web::Path<Uuid>,
    config: web::Json<ImageConfig>,
) -> HttpResponse {
    match sessions.get_session(&session_id) {
        Some(session) => {
            session.set_image_config(config.into_inner());
            HttpResponse::Ok().json(session.image_config())
        }
        None => session_not_found(&session_id),
    }
}
