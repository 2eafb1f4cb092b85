use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path as UrlPath, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::browser::{self, DirectoryListing, FilePreview};
use crate::error::GonkError;
use crate::scheduler::{Dispatcher, Job, JobId, JobStatus};

#[derive(Clone)]
pub struct DashboardState {
    pub dispatcher: Dispatcher,
    pub base_dir: Arc<PathBuf>,
    pub preview_max_bytes: u64,
}

#[derive(Deserialize)]
struct BrowseQuery {
    path: Option<String>,
}

#[derive(Deserialize)]
struct PreviewQuery {
    path: Option<String>,
}

#[derive(Deserialize)]
struct JobsQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct RunRequest {
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    args: Option<String>,
}

#[derive(Serialize)]
struct RunResponse {
    job_id: String,
    status: JobStatus,
}

#[derive(Serialize)]
struct JobsResponse {
    jobs: Vec<Job>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Maps crate errors onto HTTP responses with a `{"error": ...}` body.
struct ApiError(GonkError);

impl From<GonkError> for ApiError {
    fn from(e: GonkError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GonkError::InvalidSubmission(_)
            | GonkError::InvalidRequest(_)
            | GonkError::InvalidArguments(_)
            | GonkError::MissingPath
            | GonkError::NotADirectory(_)
            | GonkError::NotAFile(_) => StatusCode::BAD_REQUEST,
            GonkError::JobNotFound(_) | GonkError::PathNotFound(_) => StatusCode::NOT_FOUND,
            GonkError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GonkError::JobAlreadyFinished(_) => StatusCode::CONFLICT,
            GonkError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the HTTP router over the given state.
pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/browse", get(browse_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/run", post(run_handler))
        .route("/api/jobs", get(list_jobs_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the dashboard until `shutdown` is cancelled.
pub async fn run_dashboard(
    addr: SocketAddr,
    state: DashboardState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind dashboard server");
            return Err(e);
        }
    };

    tracing::info!(addr = %listener.local_addr()?, "Dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Dashboard server failed"))
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn browse_handler(
    State(state): State<DashboardState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<DirectoryListing>, ApiError> {
    let target = browser::browse_target(query.path.as_deref(), &state.base_dir);
    let listing = browser::list_directory(&target).await?;
    Ok(Json(listing))
}

async fn preview_handler(
    State(state): State<DashboardState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<FilePreview>, ApiError> {
    let path = query
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or(GonkError::MissingPath)?;
    let preview = browser::preview_file(Path::new(&path), state.preview_max_bytes).await?;
    Ok(Json(preview))
}

async fn run_handler(
    State(state): State<DashboardState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| GonkError::InvalidRequest(e.body_text()))?;
    let script = payload.script.unwrap_or_default();
    let args = payload.args.unwrap_or_default();
    let job = state.dispatcher.submit_job(&script, &args).await?;

    Ok(Json(RunResponse {
        job_id: job.id.to_string(),
        status: job.status,
    }))
}

async fn list_jobs_handler(
    State(state): State<DashboardState>,
    Query(query): Query<JobsQuery>,
) -> impl IntoResponse {
    let mut jobs = state.dispatcher.store().snapshot().await;
    if let Some(limit) = query.limit {
        jobs.truncate(limit);
    }
    Json(JobsResponse { jobs })
}

async fn get_job_handler(
    State(state): State<DashboardState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Job>, ApiError> {
    let id = JobId::from(id);
    state
        .dispatcher
        .store()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| GonkError::JobNotFound(id.to_string()).into())
}
