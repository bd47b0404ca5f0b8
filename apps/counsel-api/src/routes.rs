use axum::{
	Json, Router,
	extract::{Path, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use counsel_domain::cases::{self, CaseContext, CaseSummary};
use counsel_service::{CompareRequest, Comparison, Error, RunRequest, Trace};

#[derive(Debug, Serialize)]
pub struct ModeSummary {
	pub name: String,
	pub label: String,
	pub model: String,
	pub dimensions: u32,
	pub collection: String,
}

#[derive(Debug, Serialize)]
pub struct ModesResponse {
	pub modes: Vec<ModeSummary>,
	pub compare: [String; 2],
}

#[derive(Debug, Serialize)]
pub struct CasesResponse {
	pub cases: Vec<CaseSummary>,
	pub default_case: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/modes", get(modes))
		.route("/v1/cases", get(list_cases))
		.route("/v1/cases/{case_id}", get(get_case))
		.route("/v1/pipeline/run", post(run))
		.route("/v1/pipeline/compare", post(compare))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn modes(State(state): State<AppState>) -> Json<ModesResponse> {
	let cfg = &state.service.cfg;
	let modes = cfg
		.modes
		.iter()
		.map(|(name, mode)| ModeSummary {
			name: name.clone(),
			label: mode.label.clone(),
			model: mode.model.clone(),
			dimensions: mode.dimensions,
			collection: counsel_config::collection_for(cfg, mode).to_string(),
		})
		.collect();

	Json(ModesResponse {
		modes,
		compare: [cfg.compare.mode_a.clone(), cfg.compare.mode_b.clone()],
	})
}

async fn list_cases(State(state): State<AppState>) -> Json<CasesResponse> {
	Json(CasesResponse {
		cases: cases::summaries(),
		default_case: state.service.cfg.pipeline.default_case.clone(),
	})
}

async fn get_case(Path(case_id): Path<String>) -> Result<Json<CaseContext>, ApiError> {
	let case = cases::get(&case_id);

	if !case.is_known() {
		return Err(json_error(
			StatusCode::NOT_FOUND,
			"case_not_found",
			format!("Unknown case {case_id:?}."),
			Some(vec!["case_id".to_string()]),
		));
	}

	Ok(Json(case))
}

async fn run(
	State(state): State<AppState>,
	payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<Trace>, ApiError> {
	let Json(payload) = payload?;
	let trace = state.service.run(&payload).await?;

	Ok(Json(trace))
}

async fn compare(
	State(state): State<AppState>,
	payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Comparison>, ApiError> {
	let Json(payload) = payload?;
	let comparison = match payload.session_id.as_deref().map(str::trim) {
		Some(session_id) if !session_id.is_empty() =>
			state.run_in_session(session_id, state.service.compare(&payload)).await?,
		_ => state.service.compare(&payload).await?,
	};

	Ok(Json(comparison))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::UnknownMode { .. } => json_error(
				StatusCode::BAD_REQUEST,
				"unknown_mode",
				err.to_string(),
				Some(vec!["mode".to_string()]),
			),
			Error::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", err.to_string(), None),
			Error::Superseded =>
				json_error(StatusCode::CONFLICT, "superseded", err.to_string(), None),
			Error::CollectionNotFound { .. } => json_error(
				StatusCode::SERVICE_UNAVAILABLE,
				"collection_not_found",
				err.to_string(),
				None,
			),
			Error::EmbeddingUnavailable { .. }
			| Error::SearchUnavailable { .. }
			| Error::Timeout { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable", err.to_string(), None),
			Error::Configuration { .. } => {
				tracing::error!(error = %err, "Configuration error while serving a request.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", err.to_string(), None)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text(), None)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
