use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State, rejection::JsonRejection},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post, put},
};
use critiscan_core::{ClinicalRecord, Interpretation, interpret};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    config::ServiceConfig,
    flow::{
        ExecutionResult, FlowError, FlowRunner, InMemorySessionStorage, Session, SessionStorage,
        Stage,
    },
    models::{
        CreateSessionRequest, ExtractionRecord, ExtractionSource, PendingUpload, SessionResponse,
        UploadImageRequest,
    },
    recognition::{
        FixedValueRecognizer, ReadingKind, ReadingRecognizer, RecognitionError,
        decode_image_base64, detect_image_format,
    },
    tasks::session_keys,
    workflow::{create_flow_runner, create_intake_session},
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn unprocessable_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// Body extraction failures (bad JSON, wrong content type, over the body limit) as JSON.
fn json_rejection_error(rejection: JsonRejection) -> ApiError {
    let status = rejection.status();
    warn!(status = %status, error = %rejection.body_text(), "Rejected request body");
    (
        status,
        Json(json!({
            "error": "Request body rejected",
            "details": rejection.body_text()
        })),
    )
}

fn flow_error(session_id: &str, err: FlowError) -> ApiError {
    match err {
        FlowError::SessionNotFound(_) => not_found_error("Session not found", session_id),
        FlowError::InvalidClinicalData(e) => {
            unprocessable_error("Invalid clinical data", &e.to_string())
        }
        FlowError::Recognition(RecognitionError::InvalidReading(e)) => {
            unprocessable_error("Recognised values are not usable", &e.to_string())
        }
        FlowError::Recognition(e @ RecognitionError::UnsupportedImage) => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "error": e.to_string() })),
        ),
        FlowError::Recognition(e @ RecognitionError::EmptyUpload) => {
            bad_request_error(&e.to_string())
        }
        FlowError::Recognition(e @ RecognitionError::Backend(_)) => {
            error!(session_id = %session_id, error = %e, "Recognition backend failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "Recognition backend failed",
                    "details": e.to_string()
                })),
            )
        }
        e => {
            error!(session_id = %session_id, error = %e, "Workflow execution failed");
            internal_error("Workflow execution failed", &e.to_string())
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub config: Arc<ServiceConfig>,
    /// One lock per created session; mutating requests hold it until the workflow run returns.
    session_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    pub fn new(config: ServiceConfig, recognizer: Arc<dyn ReadingRecognizer>) -> Self {
        let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let flow_runner = create_flow_runner(
            session_storage.clone(),
            recognizer,
            config.analysis.clone(),
        );

        Self {
            session_storage,
            flow_runner,
            config: Arc::new(config),
            session_locks: Arc::new(DashMap::new()),
        }
    }

    async fn lock_session(&self, session_id: &str) -> Result<OwnedMutexGuard<()>, ApiError> {
        let lock = self
            .session_locks
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found_error("Session not found", session_id))?;
        Ok(lock.lock_owned().await)
    }
}

pub fn create_app(config: ServiceConfig) -> Router {
    build_router(AppState::new(config, Arc::new(FixedValueRecognizer)))
}

pub fn build_router(app_state: AppState) -> Router {
    // Uploads arrive base64-encoded inside JSON.
    let body_limit = app_state.config.max_upload_bytes / 3 * 4 + 64 * 1024;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/icu/interpret", post(interpret_record))
        .route("/icu/sessions", post(create_session))
        .route("/icu/sessions/{session_id}", get(get_session_status))
        .route("/icu/sessions/{session_id}/uploads", post(upload_image))
        .route("/icu/sessions/{session_id}/readings", put(submit_readings))
        .route("/icu/sessions/{session_id}/analyze", post(request_analysis))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Tags each request with a fresh correlation id and runs it inside an `http_request` span.
async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert("x-correlation-id", value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "CritiScan ICU Interpretation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Rule-based interpretation of ABG, ventilator and lab data with treatment planning",
        "endpoints": {
            "POST /icu/interpret": "Interpret a clinical record without a session",
            "POST /icu/sessions": "Start an intake session",
            "GET /icu/sessions/{session_id}": "Get session record, interpretation and plan",
            "POST /icu/sessions/{session_id}/uploads": "Upload a report photograph (base64)",
            "PUT /icu/sessions/{session_id}/readings": "Enter or correct readings manually",
            "POST /icu/sessions/{session_id}/analyze": "Request analysis of the captured data",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn interpret_record(
    State(state): State<AppState>,
    payload: Result<Json<ClinicalRecord>, JsonRejection>,
) -> ApiResult<Interpretation> {
    let Json(record) = payload.map_err(json_rejection_error)?;
    let interpretation = interpret(&record, &state.config.analysis).map_err(|e| {
        warn!(error = %e, "Rejected clinical record");
        unprocessable_error("Invalid clinical data", &e.to_string())
    })?;

    info!(
        critical_findings = interpretation.critical_findings,
        "Stateless interpretation complete"
    );
    Ok(Json(interpretation))
}

async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(request) = payload.map_err(json_rejection_error)?;
    let session = create_intake_session(request.patient_id)
        .await
        .map_err(|e| internal_error("Failed to create intake session", &e.to_string()))?;
    let session_id = session.id.clone();
    state
        .session_locks
        .insert(session_id.clone(), Arc::new(Mutex::new(())));
    info!(session_id = %session_id, "Intake session created");

    let response = rewind_and_run(&state, session).await?;
    Ok((StatusCode::CREATED, response))
}

async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = load_session(&state, &session_id).await?;
    Ok(Json(build_session_response(&session, None).await))
}

async fn upload_image(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> ApiResult<SessionResponse> {
    let Json(request) = payload.map_err(json_rejection_error)?;
    let image = decode_image_base64(&request.image_base64)
        .map_err(|_| bad_request_error("image_base64 is not valid base64"))?;

    if image.len() > state.config.max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": "Image exceeds the upload limit",
                "max_bytes": state.config.max_upload_bytes
            })),
        ));
    }

    let format = detect_image_format(&image).map_err(|e| match e {
        RecognitionError::EmptyUpload => bad_request_error(&e.to_string()),
        _ => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "error": e.to_string() })),
        ),
    })?;

    let _guard = state.lock_session(&session_id).await?;
    let session = load_session(&state, &session_id).await?;
    info!(
        session_id = %session_id,
        kind = ?request.kind,
        format = ?format,
        bytes = image.len(),
        "Image upload accepted"
    );

    let mut pending: Vec<PendingUpload> = session
        .context
        .get(session_keys::PENDING_UPLOADS)
        .await
        .unwrap_or_default();
    pending.push(PendingUpload {
        kind: request.kind,
        image_base64: request.image_base64,
    });
    session
        .context
        .set(session_keys::PENDING_UPLOADS, pending)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    rewind_and_run(&state, session).await
}

async fn submit_readings(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<ClinicalRecord>, JsonRejection>,
) -> ApiResult<SessionResponse> {
    let Json(readings) = payload.map_err(json_rejection_error)?;
    if readings.is_empty() {
        return Err(bad_request_error(
            "At least one of abg, ventilator or labs is required",
        ));
    }
    readings
        .validate()
        .map_err(|e| unprocessable_error("Invalid clinical data", &e.to_string()))?;

    let _guard = state.lock_session(&session_id).await?;
    let session = load_session(&state, &session_id).await?;

    let entered: Vec<ReadingKind> = [
        (ReadingKind::Abg, readings.abg.is_some()),
        (ReadingKind::Ventilator, readings.ventilator.is_some()),
        (ReadingKind::Labs, readings.labs.is_some()),
    ]
    .into_iter()
    .filter_map(|(kind, present)| present.then_some(kind))
    .collect();
    info!(session_id = %session_id, entered = ?entered, "Manual readings received");

    let mut record: ClinicalRecord = session
        .context
        .get(session_keys::CLINICAL_RECORD)
        .await
        .unwrap_or_default();
    record.merge(readings);

    let mut extractions: Vec<ExtractionRecord> = session
        .context
        .get(session_keys::EXTRACTIONS)
        .await
        .unwrap_or_default();
    extractions.extend(
        entered
            .into_iter()
            .map(|kind| ExtractionRecord::now(kind, ExtractionSource::ManualEntry)),
    );

    let context = &session.context;
    context
        .set(session_keys::CLINICAL_RECORD, &record)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    context
        .set(session_keys::EXTRACTIONS, &extractions)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    rewind_and_run(&state, session).await
}

async fn request_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    let _guard = state.lock_session(&session_id).await?;
    let session = load_session(&state, &session_id).await?;
    info!(session_id = %session_id, "Analysis requested");

    session
        .context
        .set(session_keys::ANALYSIS_REQUESTED, true)
        .await
        .map_err(|e| flow_error(&session_id, e))?;

    rewind_and_run(&state, session).await
}

async fn load_session(state: &AppState, session_id: &str) -> Result<Session, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => {
            info!(session_id = %session_id, "Session not found");
            Err(not_found_error("Session not found", session_id))
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to get session");
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

/// Send the session back to intake so new or corrected data is re-evaluated, then run it.
async fn rewind_and_run(state: &AppState, mut session: Session) -> ApiResult<SessionResponse> {
    let session_id = session.id.clone();
    session.current_stage = state
        .flow_runner
        .workflow()
        .start_stage()
        .unwrap_or(Stage::Intake);

    state.session_storage.save(session).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Failed to save session");
        internal_error("Failed to save session", &e.to_string())
    })?;

    let ExecutionResult { response, status } = state
        .flow_runner
        .run(&session_id)
        .await
        .map_err(|e| flow_error(&session_id, e))?;
    info!(session_id = %session_id, status = ?status, "Workflow step finished");

    let session = load_session(state, &session_id).await?;
    Ok(Json(build_session_response(&session, response).await))
}

async fn build_session_response(session: &Session, message: Option<String>) -> SessionResponse {
    let context = &session.context;
    let completed: bool = context
        .get(session_keys::WORKFLOW_COMPLETED)
        .await
        .unwrap_or(false);

    SessionResponse {
        session_id: session.id.clone(),
        patient_id: session.patient_id.clone(),
        status: if completed { "completed" } else { "awaiting_input" }.to_string(),
        current_stage: session.current_stage.to_string(),
        status_message: session.status_message.clone(),
        message,
        record: context
            .get(session_keys::CLINICAL_RECORD)
            .await
            .unwrap_or_default(),
        extractions: context
            .get(session_keys::EXTRACTIONS)
            .await
            .unwrap_or_default(),
        interpretation: context.get(session_keys::INTERPRETATION).await,
        treatment_plan: context.get(session_keys::TREATMENT_PLAN).await,
        clinical_note: context.get(session_keys::CLINICAL_NOTE).await,
        waiting_for_input: !completed,
    }
}
