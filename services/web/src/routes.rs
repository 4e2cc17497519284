use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use domain::{
    dispatches::{
        form,
        inputs::{RemoveRowInput, RowsInput},
        is_dispatch_pdf, FormState, Office,
    },
    Error, Product,
};
use serde::Serialize;
use ulid::Ulid;

use crate::AppState;

type HandlerError = (StatusCode, String);

#[derive(Serialize)]
struct FormView {
    #[serde(flatten)]
    form: FormState,
    offices: Vec<&'static str>,
}

fn to_response(err: Error) -> HandlerError {
    let status = match &err {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::StaleGuideNumber { .. } => StatusCode::CONFLICT,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

pub async fn form_page() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

// Initial form state
pub async fn initial_form(State(state): State<AppState>) -> impl IntoResponse {
    let today = chrono::Local::now().date_naive();
    let form = state.services.initial_form(today).await;

    Json(FormView {
        form,
        offices: Office::ALL.iter().map(|o| o.name()).collect(),
    })
}

// Add row
pub async fn add_row(Json(input): Json<RowsInput>) -> impl IntoResponse {
    Json(RowsInput {
        rows: form::add_row(input.rows),
    })
}

// Remove row
pub async fn remove_row(Json(input): Json<RemoveRowInput>) -> impl IntoResponse {
    Json(RowsInput {
        rows: form::remove_row(input.rows, input.index),
    })
}

// Save dispatch
pub async fn save(
    State(state): State<AppState>,
    Json(input): Json<FormState>,
) -> Result<impl IntoResponse, HandlerError> {
    let action_id = Ulid::new().to_string();

    let outcome = state.services.save(&input).await.map_err(|e| {
        tracing::warn!(action_id = %action_id, "Save of guide {} failed: {}", input.guide_number, e);
        to_response(e)
    })?;

    tracing::info!(
        action_id = %action_id,
        "Guide {} saved for {}",
        input.guide_number,
        input.office
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

// Generate PDF
pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(input): Json<FormState>,
) -> Result<impl IntoResponse, HandlerError> {
    let action_id = Ulid::new().to_string();

    let outcome = state.services.generate_pdf(&input).await.map_err(|e| {
        tracing::warn!(action_id = %action_id, "PDF for guide {} failed: {}", input.guide_number, e);
        to_response(e)
    })?;

    tracing::info!(action_id = %action_id, "Generated {}", outcome.file);
    Ok(Json(outcome))
}

// Download PDF
pub async fn download_pdf(
    Path(file): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, HandlerError> {
    if !is_dispatch_pdf(&file) {
        return Err((StatusCode::NOT_FOUND, "Not found".to_string()));
    }

    let bytes = tokio::fs::read(state.services.pdf_dir().join(&file))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            _ => {
                tracing::error!("Could not read {}: {}", file, e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

// List products
pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.services.catalog().products().collect::<Vec<Product>>())
}

// Get product
pub async fn get_product(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, HandlerError> {
    let description = state
        .services
        .catalog()
        .description(&code)
        .ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))?;

    Ok(Json(Product {
        code: code.trim().to_string(),
        description: description.to_string(),
    }))
}
