//! HTTP server implementation with range request support

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mediatree::{Directory, TopLevelMount, TreeNode};
use progress::ProgressStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::listing::{DirectoryListing, MountInfo, ProgressView, VideoInfo};
use crate::state::ServerState;
use crate::stream::serve_file;

/// File server API for managing the HTTP server
#[derive(Clone)]
pub struct FileServerApi {
    state: ServerState,
}

impl FileServerApi {
    /// Create a new file server API
    ///
    /// # Arguments
    /// * `tree` - Root of the indexed mounts
    /// * `progress` - Opened playback progress store
    /// * `mounts` - Mount configuration the tree was built from
    pub fn new(tree: Directory, progress: ProgressStore, mounts: Vec<TopLevelMount>) -> Self {
        let state = ServerState::new(tree, progress, mounts);
        Self { state }
    }

    /// Get the server state
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Create the axum router with all routes configured
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(root_listing))
            .route("/browse", get(root_listing))
            .route("/browse/*path", get(browse))
            .route("/video/*path", get(video_info))
            .route("/stream/*path", get(stream_video))
            .route("/progress", get(list_progress).post(save_progress))
            .route("/progress/*path", get(load_progress).delete(remove_progress))
            .route("/api/mounts", get(mount_statuses))
            .route("/health", get(health_check))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the file server
    ///
    /// Runs until Ctrl+C is received.
    ///
    /// # Arguments
    /// * `host` - Host to bind to (e.g., "0.0.0.0")
    /// * `port` - Port to bind to (e.g., 3001)
    pub async fn serve(self, host: &str, port: u16) -> crate::Result<()> {
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Video streaming server listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Wildcard captures come without their leading slash
fn content_path(path: &str) -> String {
    format!("/{}", path)
}

/// Health check endpoint
async fn health_check(State(state): State<ServerState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!(
            "Video server running. Indexed videos: {}",
            state.tree().video_count
        ),
    )
}

/// Listing of the configured mounts
async fn root_listing(State(state): State<ServerState>) -> Json<DirectoryListing> {
    Json(DirectoryListing::new(state.tree(), state.progress()))
}

/// Immediate children of a directory
async fn browse(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Json<DirectoryListing>, AppError> {
    let content_path = content_path(&path);

    let dir = match state.find_directory(&content_path) {
        Some(dir) => dir,
        None if state.find(&content_path).is_some() => {
            return Err(AppError::InvalidPath("Path is not a directory".to_string()));
        }
        None => return Err(AppError::NotFound("Directory not found".to_string())),
    };

    Ok(Json(DirectoryListing::new(dir, state.progress())))
}

/// Player metadata for a video
async fn video_info(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<Json<VideoInfo>, AppError> {
    match state.find(&content_path(&path)) {
        Some(TreeNode::File(file)) => Ok(Json(VideoInfo::new(file, state.progress()))),
        Some(TreeNode::Directory(_)) | None => {
            Err(AppError::NotFound("Video not found".to_string()))
        }
    }
}

/// Stream video handler with range request support
async fn stream_video(
    State(state): State<ServerState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let file = match state.find(&content_path(&path)) {
        Some(TreeNode::File(file)) => file,
        Some(TreeNode::Directory(_)) | None => {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
    };

    serve_file(&file.system_path, headers.get(header::RANGE)).await
}

/// Every stored playback position
async fn list_progress(State(state): State<ServerState>) -> Json<Vec<ProgressView>> {
    let entries = state
        .progress()
        .all()
        .into_iter()
        .map(|(video_path, last_playback_position)| ProgressView {
            video_path,
            last_playback_position,
        })
        .collect();
    Json(entries)
}

/// Stored playback position of one video, zero if none
async fn load_progress(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Json<ProgressView> {
    let video_path = content_path(&path);
    let last_playback_position = state.progress().get(&video_path);
    Json(ProgressView {
        video_path,
        last_playback_position,
    })
}

/// Upsert the playback position of a video
async fn save_progress(
    State(state): State<ServerState>,
    payload: Result<Json<ProgressView>, JsonRejection>,
) -> Result<Json<ProgressView>, AppError> {
    let Json(view) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let store = state.progress_handle();
    let request = view.clone();
    tokio::task::spawn_blocking(move || {
        store.set(&request.video_path, request.last_playback_position)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Progress task failed: {}", e)))??;

    Ok(Json(view))
}

/// Forget the playback position of a video
async fn remove_progress(
    State(state): State<ServerState>,
    Path(path): Path<String>,
) -> Result<StatusCode, AppError> {
    let video_path = content_path(&path);

    let store = state.progress_handle();
    tokio::task::spawn_blocking(move || store.delete(&video_path))
        .await
        .map_err(|e| AppError::Internal(format!("Progress task failed: {}", e)))??;

    Ok(StatusCode::NO_CONTENT)
}

/// Accessibility and indexed video count of every configured mount
async fn mount_statuses(State(state): State<ServerState>) -> Result<Json<Vec<MountInfo>>, AppError> {
    // stat and read_dir can hang on a drive that went away
    let mounts = state.mounts_handle();
    let statuses = tokio::task::spawn_blocking(move || {
        mounts
            .iter()
            .map(|mount| mediatree::check_mount_status(&mount.system_path))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(format!("Mount check failed: {}", e)))?;

    let infos = state
        .mounts()
        .iter()
        .zip(&statuses)
        .map(|(mount, status)| {
            let video_count = state.mount_video_count(&mount.mount_point).unwrap_or(0);
            MountInfo::new(mount, status, video_count)
        })
        .collect();
    Ok(Json(infos))
}
