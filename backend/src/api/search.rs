use crate::models::{ApiError, SearchResponse};
use crate::services::search_service;
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{get, State};

static PAGE_SIZE: i64 = 10;

#[get("/?<q>&<limit>&<offset>&<channel_id>")]
pub async fn search_transcripts(
    q: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    channel_id: Option<String>,
    state: &State<AppState>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = q.unwrap_or_default();
    let limit = limit.unwrap_or(PAGE_SIZE);

    match search_service::search_transcripts(&state.executor, query, channel_id, limit, offset) {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Search failed: {e}");
            Err(ApiError::from(e))
        }
    }
}
