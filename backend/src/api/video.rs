use crate::models::{ApiError, VideoResponse};
use crate::services::video_service;
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/")]
pub async fn list_videos(state: &State<AppState>) -> Json<Vec<String>> {
    let video_ids = video_service::list_all_videos(&state.store);
    info!("Found {} archived videos.", video_ids.len());
    Json(video_ids)
}

#[get("/<id>")]
pub async fn get_video(
    state: &State<AppState>,
    id: &str,
) -> Result<Json<VideoResponse>, ApiError> {
    video_service::get_video(&state.store, id)
        .map(Json)
        .map_err(ApiError::from)
}
