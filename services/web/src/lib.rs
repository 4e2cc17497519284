//! HTTP surface of the dispatch form: the page itself and the JSON actions
//! it calls.

use axum::{
    routing::{get, post},
    Router,
};
use domain::dispatches::Services;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod routes;

pub use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::form_page))
        .route("/api/form", get(routes::initial_form))
        .route("/api/form/rows", post(routes::add_row))
        .route("/api/form/rows/remove", post(routes::remove_row))
        .route("/api/form/save", post(routes::save))
        .route("/api/form/pdf", post(routes::generate_pdf))
        .route("/api/products", get(routes::list_products))
        .route("/api/products/:code", get(routes::get_product))
        .route("/pdf/:file", get(routes::download_pdf))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
