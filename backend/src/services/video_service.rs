//! Read-only video metadata lookups.

use crate::engine::error::EngineError;
use crate::engine::store::SegmentStore;
use crate::models::VideoResponse;

pub fn list_all_videos(store: &SegmentStore) -> Vec<String> {
    let mut ids = store.video_ids();
    ids.sort();
    ids
}

pub fn get_video(store: &SegmentStore, video_id: &str) -> Result<VideoResponse, EngineError> {
    let record = store
        .video(video_id)
        .ok_or_else(|| EngineError::NotFound(format!("video '{video_id}' is not archived")))?;

    let meta = &record.metadata;
    Ok(VideoResponse {
        video_id: meta.video_id.clone(),
        channel_id: meta.channel_id.clone(),
        title: meta.title.clone(),
        description: meta.description.clone(),
        published_at: meta.published_at.clone(),
        thumbnail_url: meta.thumbnail_url.clone(),
        duration_seconds: meta.duration_seconds,
        views: meta.views,
        has_transcript: record.has_transcript,
        segment_count: record.segments.len(),
    })
}
