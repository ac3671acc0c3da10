use crate::engine::store::{Segment, VideoMetadata};
use crate::models::{
    AdminStats, AdminToken, ApiError, ChannelResponse, IngestVideoRequest, IngestVideoResponse,
    RegisterChannelRequest, StatusResponse,
};
use crate::services::channel_service;
use crate::services::ingest_service::IngestStatus;
use crate::AppState;
use log::{error, info};
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

#[post("/channel", data = "<request>")]
pub async fn register_channel(
    _token: AdminToken,
    state: &State<AppState>,
    request: Json<RegisterChannelRequest>,
) -> Result<Json<ChannelResponse>, ApiError> {
    match channel_service::register_channel(&state.store, &state.coordinator, request.into_inner())
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Channel registration failed: {e}");
            Err(ApiError::from(e))
        }
    }
}

#[post("/video", data = "<request>")]
pub async fn ingest_video(
    _token: AdminToken,
    state: &State<AppState>,
    request: Json<IngestVideoRequest>,
) -> Result<Json<IngestVideoResponse>, ApiError> {
    let request = request.into_inner();
    let video_id = request.video_id.clone();
    let metadata = VideoMetadata {
        video_id: request.video_id,
        channel_id: request.channel_id,
        title: request.title,
        description: request.description,
        published_at: request.published_at,
        thumbnail_url: request.thumbnail_url,
        duration_seconds: request.duration_seconds,
        views: request.views,
    };
    let segments: Vec<Segment> = request
        .segments
        .into_iter()
        .map(|s| Segment {
            start: s.start,
            duration: s.duration,
            text: s.text,
        })
        .collect();

    match state.coordinator.ingest_video(metadata, segments) {
        Ok(segment_count) => Ok(Json(IngestVideoResponse {
            success: true,
            message: format!("Indexed {segment_count} segments"),
            video_id,
            segment_count,
        })),
        Err(e) => {
            error!("Ingestion of video {video_id} failed: {e}");
            Err(ApiError::from(e))
        }
    }
}

#[delete("/video/<id>")]
pub async fn delete_video(
    _token: AdminToken,
    state: &State<AppState>,
    id: &str,
) -> Result<Json<StatusResponse>, ApiError> {
    match state.coordinator.remove_video(id) {
        Ok(true) => {
            info!("Video deleted successfully: {id}");
            Ok(Json(StatusResponse {
                success: true,
                message: "Video removed from archive".to_string(),
            }))
        }
        Ok(false) => Err(ApiError::not_found(format!("video '{id}' is not archived"))),
        Err(e) => {
            error!("Failed to delete video {id}: {e}");
            Err(ApiError::from(e))
        }
    }
}

#[post("/video/<id>/abort")]
pub async fn abort_ingest(
    _token: AdminToken,
    state: &State<AppState>,
    id: &str,
) -> Result<Json<StatusResponse>, ApiError> {
    if state.coordinator.abort(id) {
        Ok(Json(StatusResponse {
            success: true,
            message: "Abort requested".to_string(),
        }))
    } else {
        Err(ApiError::not_found(format!(
            "no ingestion in flight for video '{id}'"
        )))
    }
}

#[get("/video/<id>/status")]
pub async fn ingest_status(
    _token: AdminToken,
    state: &State<AppState>,
    id: &str,
) -> Result<Json<IngestStatus>, ApiError> {
    state
        .coordinator
        .status(id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("video '{id}' has never been ingested")))
}

#[get("/stats")]
pub async fn admin_stats(_token: AdminToken, state: &State<AppState>) -> Json<AdminStats> {
    Json(state.coordinator.stats())
}
