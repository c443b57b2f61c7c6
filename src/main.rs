use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{AuthError, HealthRes, HealthService};
use bridge_core::constants::DEFAULT_CONVERSION_DATA_DIR;
use bridge_core::{
    Access, ConversionOutcome, ConversionRequest, ConversionService, CoreConfig,
    FhirResourceRecord,
};
use bridge_ingestion::{ExtractionResult, ExtractionService, OcrService};
use intake_types::ResourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum accepted upload size for document ingestion (10 MiB).
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Upload extensions accepted for OCR.
const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// Application state shared across REST API handlers
///
/// Holds the conversion pipeline plus the ingestion collaborators consumed by the
/// document endpoint.
#[derive(Clone)]
struct AppState {
    conversion: ConversionService,
    ocr: OcrService,
    extraction: ExtractionService,
}

/// Conversion request body: the target resource type plus the raw intake payload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ConvertToFhirReq {
    /// Target resource type: name or numeric code (Patient=1, Practitioner=2,
    /// Organization=3).
    #[schema(value_type = String)]
    resource_type: ResourceType,
    /// Raw intake payload; validated and typed by the pipeline.
    #[schema(value_type = Object)]
    data: Value,
}

/// Document ingestion response: OCR text plus the heuristic extraction result.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct IngestDocumentRes {
    message: String,
    #[schema(value_type = String)]
    resource_type: ResourceType,
    extracted_text: String,
    extraction: ExtractionResult,
}

/// Uniform error envelope for non-2xx responses.
#[derive(Debug, Serialize, ToSchema)]
struct ErrorRes {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ErrorRes {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            message: "An unexpected error occurred".to_string(),
            error: Some(error.to_string()),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorRes>);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        convert_to_fhir,
        get_fhir_resource,
        get_conversion_request,
        get_conversion_history,
        rerun_conversion,
        ingest_document
    ),
    components(schemas(
        HealthRes,
        ConvertToFhirReq,
        ConversionOutcome,
        ConversionRequest,
        FhirResourceRecord,
        bridge_core::ConversionStatus,
        IngestDocumentRes,
        ExtractionResult,
        ErrorRes
    ))
)]
struct ApiDoc;

/// Main entry point for the fhir-bridge application
///
/// Starts the REST server with the conversion pipeline and document ingestion wired in.
///
/// # Environment Variables
/// - `BRIDGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `BRIDGE_DATA_DIR`: Directory for conversion data storage (default: "conversion_data")
/// - `API_KEYS`: Comma-separated `key=caller` pairs for caller identity
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fhir_bridge=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("BRIDGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("BRIDGE_DATA_DIR")
        .unwrap_or_else(|_| DEFAULT_CONVERSION_DATA_DIR.into());

    tracing::info!("++ Starting fhir-bridge REST on {}", rest_addr);
    tracing::info!("++ Conversion data directory: {}", data_dir);

    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir)));
    let state = AppState {
        conversion: ConversionService::new(cfg),
        ocr: OcrService::new(),
        extraction: ExtractionService::new(),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/fhir/convert", post(convert_to_fhir))
        .route("/api/fhir/history", get(get_conversion_history))
        .route("/api/fhir/request/:id", get(get_conversion_request))
        .route("/api/fhir/rerun/:id", post(rerun_conversion))
        .route("/api/fhir/:conversion_request_id", get(get_fhir_resource))
        .route("/api/ingestion/document", post(ingest_document))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 16 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Resolves the optional caller identity from the `x-api-key` header.
///
/// No header means an anonymous caller; an unknown key is rejected with 401.
fn caller_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get("x-api-key") else {
        return Ok(None);
    };

    let provided = value.to_str().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorRes::new("Invalid API key")),
        )
    })?;

    match api_shared::caller_for_api_key(provided) {
        Ok(caller) => Ok(Some(caller)),
        Err(AuthError::NotConfigured) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorRes::internal("API_KEYS not set in environment")),
        )),
        Err(AuthError::InvalidKey) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorRes::new("Invalid API key")),
        )),
    }
}

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("store failure: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::internal(err)),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/fhir/convert",
    request_body = ConvertToFhirReq,
    responses(
        (status = 200, description = "Conversion completed", body = ConversionOutcome),
        (status = 400, description = "Rejected input or failed conversion", body = ConversionOutcome),
        (status = 401, description = "Invalid API key", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Converts custom healthcare intake data to a FHIR-compliant resource
///
/// Validates the payload, persists the conversion request, maps it to FHIR JSON,
/// validates the generated resource, and records the outcome. Failed attempts are
/// reported in the outcome body with a 400 status; only store faults yield 500.
async fn convert_to_fhir(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ConvertToFhirReq>,
) -> Result<(StatusCode, Json<ConversionOutcome>), ApiError> {
    let caller = caller_from_headers(&headers)?;

    let outcome = state
        .conversion
        .convert(req.resource_type, &req.data, caller.as_deref())
        .map_err(internal_error)?;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/fhir/{conversion_request_id}",
    params(
        ("conversion_request_id" = String, Path, description = "Conversion request id")
    ),
    responses(
        (status = 200, description = "Generated FHIR resource", body = FhirResourceRecord),
        (status = 403, description = "Owned by another caller", body = ErrorRes),
        (status = 404, description = "No resource for this id", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Gets the FHIR resource generated for a conversion request
async fn get_fhir_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(conversion_request_id): AxumPath<String>,
) -> Result<Json<FhirResourceRecord>, ApiError> {
    let caller = caller_from_headers(&headers)?;

    match state
        .conversion
        .get_fhir_resource(&conversion_request_id, caller.as_deref())
        .map_err(internal_error)?
    {
        Access::Found(record) => Ok(Json(record)),
        Access::Forbidden => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorRes::new("Conversion request belongs to another caller")),
        )),
        Access::NotFound => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorRes::new(format!(
                "FHIR resource not found for conversion request ID: {conversion_request_id}"
            ))),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/fhir/request/{id}",
    params(
        ("id" = String, Path, description = "Conversion request id")
    ),
    responses(
        (status = 200, description = "Conversion request metadata", body = ConversionRequest),
        (status = 403, description = "Owned by another caller", body = ErrorRes),
        (status = 404, description = "No request with this id", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Gets conversion request metadata by id
async fn get_conversion_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ConversionRequest>, ApiError> {
    let caller = caller_from_headers(&headers)?;

    match state
        .conversion
        .get_request(&id, caller.as_deref())
        .map_err(internal_error)?
    {
        Access::Found(request) => Ok(Json(request)),
        Access::Forbidden => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorRes::new("Conversion request belongs to another caller")),
        )),
        Access::NotFound => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorRes::new(format!(
                "Conversion request not found with ID: {id}"
            ))),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/fhir/history",
    responses(
        (status = 200, description = "Conversion requests visible to the caller", body = [ConversionRequest]),
        (status = 401, description = "Invalid API key", body = ErrorRes)
    )
)]
/// Lists the conversion history visible to the caller, newest first
async fn get_conversion_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversionRequest>>, ApiError> {
    let caller = caller_from_headers(&headers)?;
    Ok(Json(state.conversion.history(caller.as_deref())))
}

#[utoipa::path(
    post,
    path = "/api/fhir/rerun/{id}",
    params(
        ("id" = String, Path, description = "Conversion request id")
    ),
    responses(
        (status = 200, description = "Re-run completed", body = ConversionOutcome),
        (status = 400, description = "Re-run failed", body = ConversionOutcome),
        (status = 403, description = "Owned by another caller", body = ErrorRes),
        (status = 404, description = "No request with this id", body = ErrorRes),
        (status = 500, description = "Store failure", body = ErrorRes)
    )
)]
/// Replays a stored conversion request from its input snapshot
async fn rerun_conversion(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<(StatusCode, Json<ConversionOutcome>), ApiError> {
    let caller = caller_from_headers(&headers)?;

    // Existence is checked independently of ownership so 403 and 404 stay distinct.
    match state
        .conversion
        .get_request(&id, caller.as_deref())
        .map_err(internal_error)?
    {
        Access::NotFound => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorRes::new("Conversion request not found")),
            ));
        }
        Access::Forbidden => {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorRes::new("Conversion request belongs to another caller")),
            ));
        }
        Access::Found(_) => {}
    }

    let outcome = state
        .conversion
        .rerun(&id, caller.as_deref())
        .map_err(internal_error)?;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/ingestion/document",
    responses(
        (status = 200, description = "Document processed", body = IngestDocumentRes),
        (status = 400, description = "Rejected upload or failed extraction", body = ErrorRes),
        (status = 401, description = "Invalid API key", body = ErrorRes)
    )
)]
/// Ingests a scanned document: OCR text extraction plus heuristic field extraction
///
/// Accepts a multipart form with a `file` part (.pdf/.png/.jpg/.jpeg, at most 10 MiB)
/// and a `resourceType` part (name or numeric code). The extracted intake data and
/// per-field confidences are returned for the caller to review before conversion.
async fn ingest_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestDocumentRes>, ApiError> {
    let _caller = caller_from_headers(&headers)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut resource_type: Option<ResourceType> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new(format!("Invalid multipart payload: {e}"))),
        )
    })? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorRes::new(format!("Failed to read file: {e}"))),
                    )
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("resourceType") => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorRes::new(format!("Failed to read resourceType: {e}"))),
                    )
                })?;
                resource_type = Some(parse_resource_type(&text).ok_or_else(|| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorRes::new("Invalid resource type")),
                    )
                })?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new("File is required")),
        )
    })?;
    let resource_type = resource_type.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new("Resource type is required")),
        )
    })?;

    if bytes.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new("File is required")),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new(format!(
                "File size exceeds maximum limit of {}MB",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            ))),
        ));
    }

    let extension = Path::new(&file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::new(format!(
                "File type not supported. Allowed types: {}",
                ALLOWED_UPLOAD_EXTENSIONS.join(", ")
            ))),
        ));
    }

    // Unique temp name so concurrent uploads never collide.
    let temp_path =
        std::env::temp_dir().join(format!("{}.{extension}", uuid::Uuid::new_v4().simple()));
    std::fs::write(&temp_path, &bytes)
        .map_err(|e| internal_error(format!("failed to stage upload: {e}")))?;

    let result: Result<IngestDocumentRes, ApiError> = (|| {
        let extracted_text = state
            .ocr
            .extract_text(&temp_path)
            .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorRes::new(e.to_string()))))?;

        let extraction = state
            .extraction
            .extract(&extracted_text, resource_type)
            .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorRes::new(e.to_string()))))?;

        Ok(IngestDocumentRes {
            message: format!(
                "Document '{}' processed successfully for {}. Extracted {} characters with {:.0}% confidence.",
                file_name,
                resource_type,
                extracted_text.len(),
                extraction.overall_confidence * 100.0
            ),
            resource_type,
            extracted_text,
            extraction,
        })
    })();

    if let Err(e) = std::fs::remove_file(&temp_path) {
        tracing::warn!("failed to clean up temp file {}: {e}", temp_path.display());
    }

    result.map(Json)
}

/// Accepts a resource type as its numeric wire code or its name.
fn parse_resource_type(text: &str) -> Option<ResourceType> {
    let trimmed = text.trim();
    trimmed
        .parse::<u64>()
        .ok()
        .and_then(ResourceType::from_code)
        .or_else(|| trimmed.parse::<ResourceType>().ok())
}
