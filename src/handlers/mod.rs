pub mod catalog;
pub mod employees;
pub mod error;
pub mod extract;
pub mod sheets;
pub mod stays;

pub use catalog::*;
pub use employees::*;
pub use sheets::*;
pub use stays::*;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Every route of the service, with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Patients and stays
        .route("/pacientes", post(create_patient))
        .route("/pacientes/:id", get(get_patient))
        .route("/estancias", post(create_stay))
        .route("/estancias/:id", get(get_stay))
        .route("/estancias/:id/hojasenfermerias", post(create_sheet))
        // Nursing sheets
        .route(
            "/hojasenfermerias/:id",
            get(get_sheet_editor).put(update_sheet),
        )
        .route("/hojasenfermerias/:id/signos", post(add_vital_signs))
        .route("/hojasenfermerias/:id/medicamentos", post(add_medication))
        .route("/hojasenfermerias/:id/terapia-iv", post(add_iv_therapy))
        .route("/hojasenfermerias/:id/sondas", post(add_catheter))
        // Price list
        .route(
            "/productoservicios",
            post(create_product).get(list_products),
        )
        .route("/productoservicios/:id", get(get_product))
        // Employees
        .route("/users", post(create_employee))
        .route("/users/:id", get(get_employee))
        .route("/users/:id/subordinados", get(list_subordinates))
        .route("/users/:id/responsable", put(assign_responsible))
        .route(
            "/users/:id/credenciales",
            post(add_credential).get(list_credentials),
        )
        // Health check
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
