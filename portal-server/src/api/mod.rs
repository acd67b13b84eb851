// portal-server/src/api/mod.rs
pub mod navigation;
pub mod sessions;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(
        actix_web::web::scope("/api")
            .service(sessions::api_index)
            .service(sessions::get_session)
            .service(navigation::evaluate_navigation)
    );
}
