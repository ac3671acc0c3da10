use crate::engine::error::EngineError;
use crate::engine::query::SearchHit;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::{response, Response};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminToken(pub String);

/// JSON error payload with the HTTP status matching the engine taxonomy.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub error: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::InvalidInput(_) => Status::BadRequest,
            EngineError::NotFound(_) => Status::NotFound,
            EngineError::Ingestion(_) => Status::InternalServerError,
            EngineError::ResourceExhausted(_) => Status::InsufficientStorage,
        };
        ApiError {
            status,
            error: e.to_string(),
        }
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError {
            status: Status::NotFound,
            error: message.into(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&ErrorBody { error: self.error }).unwrap();
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
    #[serde(rename = "videoCount")]
    pub video_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoResponse {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub thumbnail_url: String,
    pub duration_seconds: Option<i64>,
    pub views: Option<i64>,
    pub has_transcript: bool,
    pub segment_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterChannelRequest {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPayload {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestVideoRequest {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub views: Option<i64>,
    pub segments: Vec<SegmentPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestVideoResponse {
    pub success: bool,
    pub message: String,
    pub video_id: String,
    pub segment_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_channels: i64,
    pub total_videos: i64,
    pub total_segments: i64,
    pub distinct_terms: i64,
    pub total_postings: i64,
}
