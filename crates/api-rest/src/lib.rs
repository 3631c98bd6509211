//! # API REST
//!
//! REST API implementation for PMS.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS)
//!
//! Every handler delegates to [`PatientService`]; this crate only translates between HTTP and
//! the core operations.

#![warn(rust_2018_idioms)]

mod error;
mod extract;

pub use error::ApiError;
pub use extract::{ApiJson, ApiQuery};

use api_shared::{ErrorRes, HealthRes, HealthService, MessageRes};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use pms_core::{
    FieldIssue, PatientDraft, PatientError, PatientService, PatientUpdate, PatientView,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub patient_service: PatientService,
}

impl AppState {
    pub fn new(patient_service: PatientService) -> Self {
        Self { patient_service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        home,
        about,
        health,
        view_patients,
        view_patient,
        sort_patients,
        create_patient,
        update_patient,
        delete_patient,
    ),
    components(schemas(
        HealthRes,
        MessageRes,
        ErrorRes,
        FieldIssue,
        PatientView,
        PatientDraft,
        PatientUpdate,
        pms_core::Gender,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/health", get(health))
        .route("/view", get(view_patients))
        .route("/patient/:id", get(view_patient))
        .route("/sort", get(sort_patients))
        .route("/create", post(create_patient))
        .route("/edit/:id", put(update_patient))
        .route("/delete/:id", delete(delete_patient))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = MessageRes))
)]
async fn home() -> Json<MessageRes> {
    Json(MessageRes::new("patient management system."))
}

#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "Service description", body = MessageRes))
)]
async fn about() -> Json<MessageRes> {
    Json(MessageRes::new(
        "A patient management service for storing records and computing BMI.",
    ))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; does not read patient data.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/view",
    responses(
        (status = 200, description = "All patients keyed by id", body = HashMap<String, PatientView>),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// List all patients keyed by id, in stored order.
#[axum::debug_handler]
async fn view_patients(
    State(state): State<AppState>,
) -> Result<Json<pms_core::PatientIndex>, ApiError> {
    let patients = state.patient_service.fetch_all()?;
    Ok(Json(patients))
}

#[utoipa::path(
    get,
    path = "/patient/{id}",
    params(("id" = String, Path, description = "Id of the patient", example = "p001")),
    responses(
        (status = 200, description = "Patient record", body = PatientView),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// Fetch a single patient by id.
#[axum::debug_handler]
async fn view_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientView>, ApiError> {
    let patient = state.patient_service.fetch_one(&id)?;
    Ok(Json(patient))
}

/// Query parameters for `/sort`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SortParams {
    /// Field to sort on; only `age` is supported. Required.
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    pub order: Option<String>,
}

#[utoipa::path(
    get,
    path = "/sort",
    params(SortParams),
    responses(
        (status = 200, description = "Patients ordered by the requested field", body = [PatientView]),
        (status = 400, description = "Invalid sort field or order", body = ErrorRes),
        (status = 422, description = "`sort_by` missing", body = ErrorRes),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// Patients ordered by a sortable field, without their ids.
#[axum::debug_handler]
async fn sort_patients(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SortParams>,
) -> Result<Json<Vec<PatientView>>, ApiError> {
    let sort_by = params.sort_by.ok_or_else(|| {
        PatientError::Validation(vec![FieldIssue::new("sort_by", "field required")])
    })?;
    let patients = state
        .patient_service
        .sorted(&sort_by, params.order.as_deref())?;
    Ok(Json(patients))
}

#[utoipa::path(
    post,
    path = "/create",
    request_body = PatientDraft,
    responses(
        (status = 201, description = "Patient created", body = MessageRes),
        (status = 400, description = "Patient id already exists or body is not JSON", body = ErrorRes),
        (status = 422, description = "Validation failure", body = ErrorRes),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// Create a new patient record
///
/// The body must carry every field including `id`. BMI is derived and never accepted from the
/// caller.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let draft = PatientDraft::from_json(body)?;
    state.patient_service.create(draft)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageRes::new("Patient created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/edit/{id}",
    params(("id" = String, Path, description = "Id of the patient", example = "p001")),
    request_body = PatientUpdate,
    responses(
        (status = 200, description = "Patient updated", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 422, description = "Merged record failed validation", body = ErrorRes),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
/// Partially update a patient
///
/// Only fields present in the body change; `null` clears a field, which fails validation for
/// required fields. BMI is recomputed from the merged weight and height.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<MessageRes>, ApiError> {
    let update = PatientUpdate::from_json(body)?;
    state.patient_service.update(&id, update)?;
    Ok(Json(MessageRes::new(
        "Patient information updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/delete/{id}",
    params(("id" = String, Path, description = "Id of the patient", example = "p001")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Patient not found", body = ErrorRes),
        (status = 503, description = "Patient data unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageRes>, ApiError> {
    state.patient_service.delete(&id)?;
    Ok(Json(MessageRes::new(
        "Patient information deleted successfully",
    )))
}
