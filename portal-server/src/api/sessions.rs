// portal-server/src/api/sessions.rs
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::state::AppState;

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Registry Console Gateway API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// Cached identity for the caller's session; never contacts the backend
#[get("/session")]
pub async fn get_session(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let session = state.session_for(&req);
    HttpResponse::Ok().json(session.snapshot())
}
