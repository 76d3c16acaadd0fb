// 🌐 HTTP API (REST with Axum)
//
// Every endpoint answers with the `{ success, data, error? }` envelope.
// The connection is shared behind a mutex; handlers never hold the lock
// across an await.

use crate::classification::{infer_education_levels, recommended_initial_kit, EducationLevel, Kit};
use crate::details::{get_establishment, get_establishment_details, EstablishmentDetails};
use crate::entities::establishment::{
    CONNECTION_LISTING_OPTIONS, EDUCATION_LEVEL_OPTIONS, INFRASTRUCTURE_PLAN_OPTIONS,
    LINK_PLAN_OPTIONS, MODALITY_OPTIONS,
};
use crate::entities::{
    parse_programs, BusinessCode, ConnectivityRecord, Contact, Equipment, Establishment,
    EstablishmentId, EstablishmentPatch, NewEstablishment, Program, ProgramEnrollment,
};
use crate::error::RegistryError;
use crate::programs::{get_programs, set_programs};
use crate::search::{search_connectivity, search_establishments};
use crate::statistics::{
    connectivity_statistics, dashboard_summary, program_statistics, ConnectivityStatistics,
    DashboardSummary, ProgramStatistics,
};
use crate::updates::{
    create_establishment, delete_establishment, patch_establishment, save_establishment,
    upsert_contact, upsert_equipment, SaveRequest,
};
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Error carried to the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Registry(RegistryError),
    /// Request could not be extracted (bad JSON, path or query).
    Rejected { status: StatusCode, message: String },
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError::Registry(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Registry(RegistryError::DuplicateCode(_)) => StatusCode::CONFLICT,
            ApiError::Registry(RegistryError::UnknownProgram(_) | RegistryError::Invalid { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Registry(err) => {
                if status.is_server_error() {
                    log::error!("request failed: {:?}", err);
                } else {
                    log::debug!("request rejected ({}): {}", status, err);
                }
                err.to_string()
            }
            ApiError::Rejected { message, .. } => {
                log::debug!("bad request ({}): {}", status, message);
                message
            }
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

// ============================================================================
// Extractors answering with the envelope on rejection
// ============================================================================

/// JSON body
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Path parameters
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// Query string
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/establishments?q= - Search establishments
async fn list_establishments(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Vec<Establishment>> {
    ok(search_establishments(&state.conn(), &params.q)?)
}

/// POST /api/establishments - Create an establishment
async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewEstablishment>,
) -> Result<(StatusCode, Json<ApiResponse<Establishment>>), ApiError> {
    let created = create_establishment(&state.conn(), &new)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// GET /api/establishments/:id - Establishment with contact and equipment
async fn details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<EstablishmentDetails> {
    ok(get_establishment_details(&state.conn(), &EstablishmentId::from(id))?)
}

/// PUT /api/establishments/:id - Save the detail form (establishment, contact, equipment)
async fn save(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(mut request): ApiJson<SaveRequest>,
) -> ApiResult<EstablishmentDetails> {
    let conn = state.conn();
    request.establishment.id = EstablishmentId::from(id);
    let saved = save_establishment(&conn, &request)?;
    ok(get_establishment_details(&conn, &saved.id)?)
}

/// PATCH /api/establishments/:id - Partial update
async fn patch(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(patch): ApiJson<EstablishmentPatch>,
) -> ApiResult<Establishment> {
    ok(patch_establishment(&state.conn(), &EstablishmentId::from(id), &patch)?)
}

/// DELETE /api/establishments/:id - Delete with related rows
async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<String>) -> ApiResult<()> {
    ok(delete_establishment(&state.conn(), &EstablishmentId::from(id))?)
}

/// PUT /api/establishments/:id/contact
async fn put_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(mut contact): ApiJson<Contact>,
) -> ApiResult<Contact> {
    let conn = state.conn();
    let establishment = get_establishment(&conn, &EstablishmentId::from(id))?;
    contact.code = establishment.code;
    ok(upsert_contact(&conn, &contact)?)
}

/// PUT /api/establishments/:id/equipment
async fn put_equipment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(mut equipment): ApiJson<Equipment>,
) -> ApiResult<Equipment> {
    equipment.establishment_id = EstablishmentId::from(id);
    ok(upsert_equipment(&state.conn(), &equipment)?)
}

/// GET /api/connectivity?q= - Search the connectivity view
async fn list_connectivity(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Vec<ConnectivityRecord>> {
    ok(search_connectivity(&state.conn(), &params.q)?)
}

/// GET /api/programs/catalog
async fn program_catalog() -> ApiResult<Vec<&'static str>> {
    ok(Program::ALL.iter().map(Program::as_str).collect())
}

/// GET /api/programs/:code
async fn list_programs(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<i64>,
) -> ApiResult<Vec<ProgramEnrollment>> {
    ok(get_programs(&state.conn(), BusinessCode(code))?)
}

#[derive(Debug, Deserialize)]
struct ProgramsBody {
    programs: Vec<String>,
}

/// PUT /api/programs/:code - Replace the program set
async fn replace_programs(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<i64>,
    ApiJson(body): ApiJson<ProgramsBody>,
) -> ApiResult<Vec<ProgramEnrollment>> {
    let programs = parse_programs(&body.programs)?;
    let conn = state.conn();
    set_programs(&conn, BusinessCode(code), &programs)?;
    ok(get_programs(&conn, BusinessCode(code))?)
}

/// GET /api/stats - Dashboard tiles
async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<DashboardSummary>> {
    Json(ApiResponse::ok(dashboard_summary(&state.conn())))
}

/// GET /api/stats/connectivity
async fn get_connectivity_stats(
    State(state): State<AppState>,
) -> Json<ApiResponse<ConnectivityStatistics>> {
    Json(ApiResponse::ok(connectivity_statistics(&state.conn())))
}

/// GET /api/stats/programs
async fn get_program_stats(State(state): State<AppState>) -> Json<ApiResponse<ProgramStatistics>> {
    Json(ApiResponse::ok(program_statistics(&state.conn())))
}

#[derive(Debug, Default, Deserialize)]
struct LevelParams {
    text: Option<String>,
}

/// GET /api/classification/levels?text=
async fn classify_levels(ApiQuery(params): ApiQuery<LevelParams>) -> Json<ApiResponse<Vec<EducationLevel>>> {
    Json(ApiResponse::ok(infer_education_levels(params.text.as_deref())))
}

/// GET /api/classification/kit/:sections
async fn classify_kit(ApiPath(sections): ApiPath<i64>) -> Json<ApiResponse<Option<&'static Kit>>> {
    Json(ApiResponse::ok(recommended_initial_kit(Some(sections))))
}

/// Values offered by the form selects
#[derive(Debug, Serialize)]
struct FormOptions {
    connection_listings: &'static [&'static str],
    link_plans: &'static [&'static str],
    infrastructure_plans: &'static [&'static str],
    education_levels: &'static [&'static str],
    modalities: &'static [&'static str],
    programs: Vec<&'static str>,
}

/// GET /api/options
async fn form_options() -> Json<ApiResponse<FormOptions>> {
    Json(ApiResponse::ok(FormOptions {
        connection_listings: &CONNECTION_LISTING_OPTIONS,
        link_plans: &LINK_PLAN_OPTIONS,
        infrastructure_plans: &INFRASTRUCTURE_PLAN_OPTIONS,
        education_levels: &EDUCATION_LEVEL_OPTIONS,
        modalities: &MODALITY_OPTIONS,
        programs: Program::ALL.iter().map(Program::as_str).collect(),
    }))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

/// Routes under `/api` only.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/establishments", get(list_establishments).post(create))
        .route(
            "/establishments/:id",
            get(details).put(save).patch(patch).delete(delete),
        )
        .route("/establishments/:id/contact", put(put_contact))
        .route("/establishments/:id/equipment", put(put_equipment))
        .route("/connectivity", get(list_connectivity))
        .route("/programs/catalog", get(program_catalog))
        .route("/programs/:code", get(list_programs).put(replace_programs))
        .route("/stats", get(get_stats))
        .route("/stats/connectivity", get(get_connectivity_stats))
        .route("/stats/programs", get(get_program_stats))
        .route("/classification/levels", get(classify_levels))
        .route("/classification/kit/:sections", get(classify_kit))
        .route("/options", get(form_options))
        .with_state(state)
}

/// Full application: landing page, static files and the API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_router(state))
        .nest_service("/static", ServeDir::new("web"))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(AppState::new(open_in_memory().unwrap()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn school(code: i64, name: &str) -> Value {
        json!({
            "cue": code,
            "nombre": name,
            "distrito": "La Plata",
            "ciudad": "Tolosa",
            "direccion": "Calle 7 123",
            "nivel": "Inicial y Primario"
        })
    }

    async fn create_school(app: &Router, code: i64, name: &str) -> Value {
        let (status, body) = send(app, "POST", "/api/establishments", Some(school(code, name))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let app = test_app();
        let created = create_school(&app, 6100001, "Escuela N° 1").await;
        assert_eq!(created["code"], 6100001);

        let (status, body) = send(&app, "POST", "/api/establishments", Some(school(6100001, "Otra"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("6100001"));
    }

    #[tokio::test]
    async fn test_invalid_create_is_422() {
        let app = test_app();
        let mut body = school(5, "Escuela 5");
        body["direccion"] = json!("   ");
        let (status, _) = send(&app, "POST", "/api/establishments", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_establishment_is_404() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/establishments/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, "DELETE", "/api/establishments/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_and_details() {
        let app = test_app();
        let created = create_school(&app, 42, "Escuela Primaria 42").await;
        create_school(&app, 43, "Jardín 43").await;

        let (status, body) = send(&app, "GET", "/api/establishments?q=jard%C3%ADn", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let uri = format!("/api/establishments/{}", created["id"].as_str().unwrap());
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["establishment"]["code"], 42);
        assert!(body["data"]["contact"].is_null());
        assert!(body["data"]["equipment"].is_null());
    }

    #[tokio::test]
    async fn test_patch_contact_and_equipment() {
        let app = test_app();
        let created = create_school(&app, 77, "Escuela 77").await;
        let base = format!("/api/establishments/{}", created["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "PATCH",
            &base,
            Some(json!({ "city": null, "internet_connection": "Sin conectividad" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["city"].is_null());
        assert_eq!(body["data"]["district"], "La Plata");

        let (status, body) = send(
            &app,
            "PUT",
            &format!("{}/contact", base),
            Some(json!({ "first_name": "Laura", "role": "Directora" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["code"], 77);

        let (status, body) = send(
            &app,
            "PUT",
            &format!("{}/equipment", base),
            Some(json!({ "laptops": 12, "initial": { "tablets": 10 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["initial"]["tablets"], 10);
        assert_eq!(body["data"]["initial"]["robotitas"], 0);
        assert!(body["data"]["primary"].is_null());

        let (_, body) = send(&app, "GET", "/api/connectivity?q=77", None).await;
        assert_eq!(body["data"][0]["category"], "SIN_CONECTIVIDAD");
    }

    #[tokio::test]
    async fn test_programs_round_trip_and_validation() {
        let app = test_app();
        create_school(&app, 88, "Escuela 88").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/programs/88",
            Some(json!({ "programs": ["Juana Manso", "Conectar Igualdad"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["program"], "Conectar Igualdad");
        assert_eq!(body["data"][1]["program"], "Juana Manso");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/programs/88",
            Some(json!({ "programs": ["Plan Ceibal"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = send(&app, "GET", "/api/programs/88", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2, "rejected list must not write");

        let (status, _) = send(&app, "PUT", "/api/programs/99", Some(json!({ "programs": [] }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_and_classification() {
        let app = test_app();
        create_school(&app, 1, "Escuela 1").await;

        let (status, body) = send(&app, "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["general"]["total_establishments"], 1);
        assert_eq!(body["data"]["general"]["without_equipment"], 1);
        assert_eq!(body["data"]["district_count"], 1);

        let (_, body) = send(&app, "GET", "/api/classification/kit/11", None).await;
        assert_eq!(body["data"]["code"], "D");

        let (_, body) = send(&app, "GET", "/api/classification/kit/0", None).await;
        assert!(body["data"].is_null());

        let (_, body) = send(&app, "GET", "/api/classification/levels?text=Inicial%20y%20Primario", None).await;
        assert_eq!(body["data"], json!(["initial", "primary"]));

        let (_, body) = send(&app, "GET", "/api/options", None).await;
        assert_eq!(body["data"]["programs"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_delete() {
        let app = test_app();
        let created = create_school(&app, 55, "Escuela 55").await;
        let uri = format!("/api/establishments/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_save_detail_form() {
        let app = test_app();
        let created = create_school(&app, 9, "Escuela 9").await;
        let uri = format!("/api/establishments/{}", created["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(json!({
                "establishment": { "code": 9, "name": "E9 renamed", "sections": 4 },
                "contact": { "first_name": "Ana" },
                "equipment": { "tablets": 5, "initial": { "tablets": 20 } }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["establishment"]["id"], created["id"]);

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["establishment"]["name"], "E9 renamed");
        assert_eq!(data["establishment"]["sections"], 4);
        assert_eq!(data["establishment"]["created_at"], created["created_at"]);
        assert_eq!(data["contact"]["first_name"], "Ana");
        assert_eq!(data["contact"]["code"], 9);
        assert_eq!(data["equipment"]["tablets"], 5);
        assert_eq!(data["equipment"]["initial"]["tablets"], 20);
    }

    #[tokio::test]
    async fn test_save_unknown_id_is_404() {
        let app = test_app();
        let (status, body) = send(
            &app,
            "PUT",
            "/api/establishments/nope",
            Some(json!({ "establishment": { "code": 3 } })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/establishments")
            .header("content-type", "application/json")
            .body(Body::from("{\"cue\": "))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_shape_and_bad_path_use_envelope() {
        let app = test_app();

        let (status, body) = send(&app, "POST", "/api/establishments", Some(json!({ "cue": "x" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "GET", "/api/programs/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}
