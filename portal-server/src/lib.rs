// portal-server/src/lib.rs
pub mod api;
pub mod backend;
pub mod guards;
pub mod router;
pub mod session;
pub mod session_registry;
pub mod state;
pub mod static_files;
pub mod utils;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use state::AppState;

/// Register the JSON API and the guarded console routes.
///
/// The API scope must come first; the console routes end in a catch-all.
pub fn configure(cfg: &mut actix_web::web::ServiceConfig, static_files: &common::StaticFilesConfig) {
    api::configure(cfg);
    static_files::configure(cfg, static_files);
}
