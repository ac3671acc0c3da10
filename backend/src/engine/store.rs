//! Durable store for channels, videos and their transcript segments.
//!
//! Videos live in a concurrent map of `Arc<VideoRecord>`; replacing the Arc
//! is the publication point for a re-ingestion, so readers hold a consistent
//! snapshot of metadata + segments + generation for the duration of a query.
//! Records are persisted as one JSON file per video under
//! `<data_dir>/videos/`, channels as a single `channels.json`; the inverted
//! index is rebuilt from these records on startup.

use crate::engine::error::EngineError;
use crate::engine::index::InvertedIndex;
use crate::utils::parse_iso8601_to_timestamp;
use dashmap::DashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds from the beginning of the video.
    pub start: f64,
    /// Length of the spoken slice in seconds.
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 publish date as supplied by the ingestion caller.
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub views: Option<i64>,
}

/// A published, searchable video: metadata plus its current segment set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub metadata: VideoMetadata,
    pub segments: Vec<Segment>,
    /// Segment-set generation; postings stamped with a different generation
    /// are invisible for this video.
    pub generation: u64,
    pub has_transcript: bool,
    /// Unix timestamp parsed from `published_at`, 0 when unparsable. Kept
    /// denormalized so ranking tie-breaks don't re-parse dates.
    pub published_ts: i64,
}

impl VideoRecord {
    pub fn new(metadata: VideoMetadata, segments: Vec<Segment>, generation: u64) -> Self {
        let published_ts = parse_iso8601_to_timestamp(&metadata.published_at);
        let has_transcript = !segments.is_empty();
        VideoRecord {
            metadata,
            segments,
            generation,
            has_transcript,
            published_ts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
    pub created_at: String,
}

pub struct SegmentStore {
    videos: DashMap<String, Arc<VideoRecord>>,
    channels: DashMap<String, ChannelRecord>,
    data_dir: PathBuf,
}

impl SegmentStore {
    /// Open the store rooted at `data_dir`, loading any persisted channels
    /// and video records. Unreadable record files are skipped with a warning
    /// so one corrupt video cannot take the whole archive down.
    pub fn open(data_dir: &Path) -> Result<Self, EngineError> {
        fs::create_dir_all(data_dir.join("videos"))?;

        let store = SegmentStore {
            videos: DashMap::new(),
            channels: DashMap::new(),
            data_dir: data_dir.to_path_buf(),
        };

        let channels_path = store.channels_path();
        if channels_path.exists() {
            let raw = fs::read_to_string(&channels_path)?;
            let channels: Vec<ChannelRecord> = serde_json::from_str(&raw)?;
            for ch in channels {
                store.channels.insert(ch.channel_id.clone(), ch);
            }
        }

        for entry in fs::read_dir(store.videos_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(EngineError::from)
                .and_then(|raw| serde_json::from_str::<VideoRecord>(&raw).map_err(EngineError::from))
            {
                Ok(record) => {
                    store
                        .videos
                        .insert(record.metadata.video_id.clone(), Arc::new(record));
                }
                Err(e) => warn!("Skipping unreadable video record {}: {e}", path.display()),
            }
        }

        info!(
            "Segment store opened: {} videos, {} channels",
            store.videos.len(),
            store.channels.len()
        );
        Ok(store)
    }

    fn videos_dir(&self) -> PathBuf {
        self.data_dir.join("videos")
    }

    fn channels_path(&self) -> PathBuf {
        self.data_dir.join("channels.json")
    }

    fn video_path(&self, video_id: &str) -> PathBuf {
        self.videos_dir().join(format!("{video_id}.json"))
    }

    /// Persist and publish a video record. The in-memory insert happens only
    /// after the file write succeeded, so a storage failure leaves the
    /// previously published record (if any) in place.
    pub fn publish_video(&self, record: VideoRecord) -> Result<Arc<VideoRecord>, EngineError> {
        let video_id = record.metadata.video_id.clone();
        write_json_atomic(&self.video_path(&video_id), &record)?;
        let record = Arc::new(record);
        self.videos.insert(video_id, record.clone());
        Ok(record)
    }

    /// Remove a video record and its file. Returns false when the video was
    /// not present.
    pub fn remove_video(&self, video_id: &str) -> Result<bool, EngineError> {
        let existed = self.videos.remove(video_id).is_some();
        let path = self.video_path(video_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(existed)
    }

    pub fn video(&self, video_id: &str) -> Option<Arc<VideoRecord>> {
        self.videos.get(video_id).map(|r| r.clone())
    }

    /// Currently published generation, 0 when the video is absent.
    pub fn published_generation(&self, video_id: &str) -> u64 {
        self.video(video_id).map(|r| r.generation).unwrap_or(0)
    }

    pub fn upsert_channel(&self, channel: ChannelRecord) -> Result<(), EngineError> {
        self.channels.insert(channel.channel_id.clone(), channel);
        let all: Vec<ChannelRecord> = self.channels.iter().map(|r| r.clone()).collect();
        write_json_atomic(&self.channels_path(), &all)
    }

    pub fn channel(&self, channel_id: &str) -> Option<ChannelRecord> {
        self.channels.get(channel_id).map(|r| r.clone())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Derived video count for a channel, recomputed by scanning the store.
    pub fn video_count_for_channel(&self, channel_id: &str) -> usize {
        self.videos
            .iter()
            .filter(|r| r.metadata.channel_id == channel_id)
            .count()
    }

    pub fn segment_count(&self) -> usize {
        self.videos.iter().map(|r| r.segments.len()).sum()
    }

    /// Rebuild the inverted index from every published record. Used at
    /// startup; the index is derived data and is not persisted.
    pub fn reindex_into(&self, index: &InvertedIndex) {
        let mut segments = 0usize;
        for record in self.videos.iter() {
            for (ordinal, segment) in record.segments.iter().enumerate() {
                index.index_segment(
                    &record.metadata.video_id,
                    record.generation,
                    ordinal as u32,
                    &segment.text,
                );
                segments += 1;
            }
        }
        info!(
            "Rebuilt inverted index: {} segments, {} distinct terms",
            segments,
            index.distinct_terms()
        );
    }

    /// Video ids currently published. Snapshot, not a live view.
    pub fn video_ids(&self) -> Vec<String> {
        self.videos.iter().map(|r| r.key().clone()).collect()
    }
}

/// Write-then-rename so readers of the file never observe a half-written
/// record after a crash.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), EngineError> {
    let tmp = path.with_extension("json.tmp");
    let raw = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
