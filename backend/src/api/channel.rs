use crate::models::{ApiError, ChannelResponse};
use crate::services::channel_service;
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{get, State};

#[get("/?<url>")]
pub async fn get_channel(
    url: String,
    state: &State<AppState>,
) -> Result<Json<ChannelResponse>, ApiError> {
    match channel_service::resolve_channel(&state.store, &url) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Channel lookup for '{url}' failed: {e}");
            Err(ApiError::from(e))
        }
    }
}
