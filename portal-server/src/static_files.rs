// portal-server/src/static_files.rs
use actix_files::{Files, NamedFile};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpRequest, HttpResponse, Result};
use common::StaticFilesConfig;
use std::path::Path;

use crate::router::NavigationOutcome;
use crate::state::AppState;

// Serve the SPA entry point with the configured cache policy
fn serve_index(req: &HttpRequest, config: &StaticFilesConfig, status: StatusCode) -> Result<HttpResponse, Error> {
    let index_path = Path::new(&config.path).join(&config.index);
    let file = NamedFile::open(index_path)?.set_status_code(status);
    let mut response = file.into_response(req);

    if let Ok(value) = HeaderValue::from_str(&config.cache.header_value()) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    Ok(response)
}

/// Console page handler: guard the route, then hand out the SPA.
pub async fn console_page(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());

    let (outcome, _notices) = state.load_page(&req, &target).await;
    match outcome {
        NavigationOutcome::Redirected(redirect) => {
            tracing::debug!("Redirecting {} to {}", target, redirect.location());
            Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, redirect.location()))
                .finish())
        },
        NavigationOutcome::Activated { .. } => serve_index(&req, &state.static_files, StatusCode::OK),
        // The SPA renders its own not-found page
        NavigationOutcome::NotFound => serve_index(&req, &state.static_files, StatusCode::NOT_FOUND),
        // Not produced by page loads
        NavigationOutcome::Superseded => Ok(HttpResponse::Conflict().finish()),
    }
}

// Configure static file serving with guarded SPA routes
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    cfg.service(
        web::resource(["/", "/reset_password", "/harbor", "/harbor/{tail:.*}"])
            .route(web::get().to(console_page))
    )
    .service(
        Files::new("/", &config.path)
            .prefer_utf8(true)
            .use_etag(true)
            .use_last_modified(true)
    );
}
