//! Channel registration and URL-based lookup.

use crate::engine::error::EngineError;
use crate::engine::store::{ChannelRecord, SegmentStore};
use crate::models::{ChannelResponse, RegisterChannelRequest};
use crate::utils::extract_channel_id;
use log::info;

/// Resolve a channel URL to its registered record. The URL must carry the
/// channel id directly (`/channel/<id>`); anything else is invalid input.
pub fn resolve_channel(store: &SegmentStore, url: &str) -> Result<ChannelResponse, EngineError> {
    let channel_id = extract_channel_id(url)
        .ok_or_else(|| EngineError::InvalidInput(format!("unrecognized channel URL '{url}'")))?;

    let record = store
        .channel(&channel_id)
        .ok_or_else(|| EngineError::NotFound(format!("channel '{channel_id}' is not registered")))?;

    Ok(channel_response(store, record))
}

pub fn get_channel(store: &SegmentStore, channel_id: &str) -> Result<ChannelResponse, EngineError> {
    let record = store
        .channel(channel_id)
        .ok_or_else(|| EngineError::NotFound(format!("channel '{channel_id}' is not registered")))?;
    Ok(channel_response(store, record))
}

/// Create or update a channel record from the admin request.
pub fn register_channel(
    store: &SegmentStore,
    coordinator: &crate::services::ingest_service::IngestCoordinator,
    request: RegisterChannelRequest,
) -> Result<ChannelResponse, EngineError> {
    let record = ChannelRecord {
        channel_id: request.channel_id,
        title: request.title,
        description: request.description,
        thumbnail_url: request.thumbnail_url,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    coordinator.register_channel(record.clone())?;
    info!("Channel {} registered", record.channel_id);
    Ok(channel_response(store, record))
}

fn channel_response(store: &SegmentStore, record: ChannelRecord) -> ChannelResponse {
    let video_count = store.video_count_for_channel(&record.channel_id);
    ChannelResponse {
        id: record.channel_id,
        title: record.title,
        description: record.description,
        thumbnail_url: record.thumbnail_url,
        video_count,
    }
}
