//! Ingestion coordinator: the single write path into the segment store and
//! inverted index.
//!
//! Writes to one video are serialized through a per-video lock arena while
//! unrelated videos ingest fully in parallel. New segment sets are indexed
//! under an unpublished generation and become visible atomically when the
//! store record is swapped; failure or abort discards the staged generation
//! and leaves the previously published state intact.

use crate::config::MAX_SEGMENTS_PER_VIDEO;
use crate::engine::error::EngineError;
use crate::engine::index::InvertedIndex;
use crate::engine::store::{ChannelRecord, Segment, SegmentStore, VideoMetadata, VideoRecord};
use crate::models::AdminStats;
use crate::utils::is_valid_external_id;
use dashmap::DashMap;
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestState {
    Ingesting,
    Available,
    Failed,
}

/// Diagnostic record of a video's trip through the ingest state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStatus {
    pub video_id: String,
    pub state: IngestState,
    pub message: Option<String>,
    pub updated_at: String,
}

impl IngestStatus {
    fn new(video_id: &str, state: IngestState, message: Option<String>) -> Self {
        IngestStatus {
            video_id: video_id.to_string(),
            state,
            message,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

pub struct IngestCoordinator {
    store: Arc<SegmentStore>,
    index: Arc<InvertedIndex>,
    /// Arena of per-video write locks; cross-video ingests run in parallel.
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Abort flags for in-flight ingestions.
    inflight: DashMap<String, Arc<AtomicBool>>,
    statuses: DashMap<String, IngestStatus>,
}

impl IngestCoordinator {
    pub fn new(store: Arc<SegmentStore>, index: Arc<InvertedIndex>) -> Self {
        let coordinator = IngestCoordinator {
            store,
            index,
            locks: DashMap::new(),
            inflight: DashMap::new(),
            statuses: DashMap::new(),
        };
        // Everything loaded from disk was published, so it is available.
        for video_id in coordinator.store.video_ids() {
            coordinator.statuses.insert(
                video_id.clone(),
                IngestStatus::new(&video_id, IngestState::Available, None),
            );
        }
        coordinator
    }

    /// Create or update a channel record. Does not touch any video.
    pub fn register_channel(&self, channel: ChannelRecord) -> Result<(), EngineError> {
        if !is_valid_external_id(&channel.channel_id) {
            return Err(EngineError::InvalidInput(format!(
                "invalid channel id '{}'",
                channel.channel_id
            )));
        }
        info!("Registering channel {} ({})", channel.title, channel.channel_id);
        self.store.upsert_channel(channel)
    }

    /// Ingest (or fully re-ingest) one video. Returns the number of indexed
    /// segments. Idempotent: a new ingestion always replaces prior state for
    /// the video id.
    pub fn ingest_video(
        &self,
        metadata: VideoMetadata,
        segments: Vec<Segment>,
    ) -> Result<usize, EngineError> {
        let flag = Arc::new(AtomicBool::new(false));
        self.ingest_with_flag(metadata, segments, flag)
    }

    pub(crate) fn ingest_with_flag(
        &self,
        metadata: VideoMetadata,
        segments: Vec<Segment>,
        abort: Arc<AtomicBool>,
    ) -> Result<usize, EngineError> {
        validate_metadata(&metadata)?;
        validate_segments(&segments)?;
        let video_id = metadata.video_id.clone();

        let lock = self
            .locks
            .entry(video_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        self.inflight.insert(video_id.clone(), abort.clone());
        self.statuses.insert(
            video_id.clone(),
            IngestStatus::new(&video_id, IngestState::Ingesting, None),
        );

        // Only the published generation is reachable by readers; stale staged
        // generations from earlier failed runs go first.
        let published = self.store.published_generation(&video_id);
        self.index.prune_except(&video_id, published);
        let generation = published + 1;

        for (ordinal, segment) in segments.iter().enumerate() {
            if abort.load(Ordering::Acquire) {
                return self.fail(&video_id, generation, "ingestion aborted by caller");
            }
            self.index
                .index_segment(&video_id, generation, ordinal as u32, &segment.text);
        }

        let segment_count = segments.len();
        let record = VideoRecord::new(metadata, segments, generation);
        if let Err(e) = self.store.publish_video(record) {
            return self.fail(&video_id, generation, &e.to_string());
        }

        self.inflight.remove(&video_id);
        self.statuses.insert(
            video_id.clone(),
            IngestStatus::new(&video_id, IngestState::Available, None),
        );
        info!("Ingested video {video_id}: {segment_count} segments, generation {generation}");
        Ok(segment_count)
    }

    /// Discard the staged generation and mark the video failed. Previously
    /// published state stays untouched and searchable.
    fn fail(
        &self,
        video_id: &str,
        generation: u64,
        message: &str,
    ) -> Result<usize, EngineError> {
        self.index.discard_generation(video_id, generation);
        self.inflight.remove(video_id);
        self.statuses.insert(
            video_id.to_string(),
            IngestStatus::new(video_id, IngestState::Failed, Some(message.to_string())),
        );
        warn!("Ingestion of video {video_id} failed: {message}");
        Err(EngineError::Ingestion(message.to_string()))
    }

    /// Request abort of an in-flight ingestion. Returns false when no
    /// ingestion for this video is currently running.
    pub fn abort(&self, video_id: &str) -> bool {
        match self.inflight.get(video_id) {
            Some(flag) => {
                flag.store(true, Ordering::Release);
                info!("Abort requested for video {video_id}");
                true
            }
            None => false,
        }
    }

    /// Delete a video's record, segments and postings. Returns false when
    /// the video was not present.
    pub fn remove_video(&self, video_id: &str) -> Result<bool, EngineError> {
        let lock = self
            .locks
            .entry(video_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock();

        let existed = self.store.remove_video(video_id)?;
        self.index.remove_video(video_id);
        self.statuses.remove(video_id);
        if existed {
            info!("Removed video {video_id}");
        }
        Ok(existed)
    }

    pub fn status(&self, video_id: &str) -> Option<IngestStatus> {
        self.statuses.get(video_id).map(|s| s.clone())
    }

    pub fn stats(&self) -> AdminStats {
        AdminStats {
            total_channels: self.store.channel_count() as i64,
            total_videos: self.store.video_count() as i64,
            total_segments: self.store.segment_count() as i64,
            distinct_terms: self.index.distinct_terms() as i64,
            total_postings: self.index.posting_count() as i64,
        }
    }
}

fn validate_metadata(metadata: &VideoMetadata) -> Result<(), EngineError> {
    if !is_valid_external_id(&metadata.video_id) {
        return Err(EngineError::InvalidInput(format!(
            "invalid video id '{}'",
            metadata.video_id
        )));
    }
    if !is_valid_external_id(&metadata.channel_id) {
        return Err(EngineError::InvalidInput(format!(
            "invalid channel id '{}'",
            metadata.channel_id
        )));
    }
    Ok(())
}

fn validate_segments(segments: &[Segment]) -> Result<(), EngineError> {
    if segments.len() > *MAX_SEGMENTS_PER_VIDEO {
        return Err(EngineError::ResourceExhausted(format!(
            "segment count {} exceeds limit {}",
            segments.len(),
            *MAX_SEGMENTS_PER_VIDEO
        )));
    }
    let mut prev_start = f64::NEG_INFINITY;
    for (i, segment) in segments.iter().enumerate() {
        if !segment.start.is_finite() || segment.start < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "segment {i}: start offset must be non-negative"
            )));
        }
        if !segment.duration.is_finite() || segment.duration <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "segment {i}: duration must be positive"
            )));
        }
        if segment.start <= prev_start {
            return Err(EngineError::InvalidInput(format!(
                "segment {i}: start offsets must be strictly increasing"
            )));
        }
        prev_start = segment.start;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::query::{QueryExecutor, SearchRequest};
    use tempfile::tempdir;

    fn setup() -> (
        tempfile::TempDir,
        Arc<SegmentStore>,
        Arc<InvertedIndex>,
        IngestCoordinator,
    ) {
        let dir = tempdir().unwrap();
        let store = Arc::new(SegmentStore::open(dir.path()).unwrap());
        let index = Arc::new(InvertedIndex::new());
        let coordinator = IngestCoordinator::new(store.clone(), index.clone());
        (dir, store, index, coordinator)
    }

    fn meta(video_id: &str, channel_id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: video_id.to_string(),
            channel_id: channel_id.to_string(),
            title: format!("Video {video_id}"),
            description: String::new(),
            published_at: "2023-05-01T12:00:00Z".to_string(),
            thumbnail_url: String::new(),
            duration_seconds: None,
            views: None,
        }
    }

    fn segs(texts: &[&str]) -> Vec<Segment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Segment {
                start: i as f64 * 30.0,
                duration: 5.0,
                text: t.to_string(),
            })
            .collect()
    }

    fn search(store: &Arc<SegmentStore>, index: &Arc<InvertedIndex>, q: &str) -> Vec<String> {
        let executor = QueryExecutor::new(store.clone(), index.clone());
        executor
            .search(&SearchRequest {
                query: q.to_string(),
                channel_id: None,
                limit: 100,
                offset: 0,
            })
            .unwrap()
            .hits
            .into_iter()
            .map(|h| format!("{}@{}", h.video_id, h.timestamp))
            .collect()
    }

    #[test]
    fn ingest_makes_video_searchable() {
        let (_dir, store, index, coordinator) = setup();
        let n = coordinator
            .ingest_video(meta("v1", "c1"), segs(&["hello world", "world peace now"]))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(search(&store, &index, "peace"), vec!["v1@30"]);
        assert_eq!(
            coordinator.status("v1").unwrap().state,
            IngestState::Available
        );
    }

    #[test]
    fn reingest_identical_segments_is_idempotent() {
        let (_dir, store, index, coordinator) = setup();
        let segments = segs(&["hello world", "world peace now"]);

        coordinator
            .ingest_video(meta("v1", "c1"), segments.clone())
            .unwrap();
        let first = search(&store, &index, "world");
        let postings_after_first = index.posting_count();

        coordinator.ingest_video(meta("v1", "c1"), segments).unwrap();
        assert_eq!(search(&store, &index, "world"), first);
        assert_eq!(index.posting_count(), postings_after_first);
    }

    #[test]
    fn reingest_replaces_old_segment_set() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["obsolete phrasing"]))
            .unwrap();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["fresh wording"]))
            .unwrap();

        assert!(search(&store, &index, "obsolete").is_empty());
        assert_eq!(search(&store, &index, "fresh"), vec!["v1@0"]);
        assert_eq!(store.video("v1").unwrap().generation, 2);
    }

    #[test]
    fn invalid_segments_change_nothing() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["good text"]))
            .unwrap();

        let mut bad = segs(&["a later", "b earlier"]);
        bad[1].start = 10.0;
        bad[0].start = 20.0;
        let err = coordinator.ingest_video(meta("v1", "c1"), bad).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = coordinator
            .ingest_video(
                meta("v1", "c1"),
                vec![Segment {
                    start: 0.0,
                    duration: 0.0,
                    text: "zero length".to_string(),
                }],
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        // Prior state untouched.
        assert_eq!(search(&store, &index, "good"), vec!["v1@0"]);
        assert_eq!(store.video("v1").unwrap().generation, 1);
    }

    #[test]
    fn invalid_ids_are_rejected() {
        let (_dir, _store, _index, coordinator) = setup();
        let err = coordinator
            .ingest_video(meta("../escape", "c1"), segs(&["text"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));

        let err = coordinator
            .register_channel(ChannelRecord {
                channel_id: "bad id".to_string(),
                title: "Bad".to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                created_at: chrono::Utc::now().to_rfc3339(),
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn oversized_segment_set_is_resource_exhaustion() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["survivor"]))
            .unwrap();

        let many: Vec<Segment> = (0..*MAX_SEGMENTS_PER_VIDEO + 1)
            .map(|i| Segment {
                start: i as f64,
                duration: 1.0,
                text: "x".to_string(),
            })
            .collect();
        let err = coordinator.ingest_video(meta("v1", "c1"), many).unwrap_err();
        assert!(matches!(err, EngineError::ResourceExhausted(_)));

        // Other state (here: the video's own prior generation) is intact.
        assert_eq!(search(&store, &index, "survivor"), vec!["v1@0"]);
    }

    #[test]
    fn aborted_ingestion_keeps_prior_state() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["keep me around"]))
            .unwrap();

        let flag = Arc::new(AtomicBool::new(true));
        let err = coordinator
            .ingest_with_flag(meta("v1", "c1"), segs(&["never published"]), flag)
            .unwrap_err();
        assert!(matches!(err, EngineError::Ingestion(_)));

        assert_eq!(coordinator.status("v1").unwrap().state, IngestState::Failed);
        assert!(search(&store, &index, "never").is_empty());
        assert_eq!(search(&store, &index, "keep"), vec!["v1@0"]);
        assert_eq!(store.video("v1").unwrap().generation, 1);

        // Retry after abort fully replaces state again.
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["second attempt"]))
            .unwrap();
        assert_eq!(search(&store, &index, "second"), vec!["v1@0"]);
        assert!(search(&store, &index, "keep").is_empty());
    }

    #[test]
    fn abort_without_inflight_ingestion_is_refused() {
        let (_dir, _store, _index, coordinator) = setup();
        assert!(!coordinator.abort("v1"));
    }

    #[test]
    fn publish_failure_marks_failed_and_preserves_old_generation() {
        let (dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["stable content"]))
            .unwrap();

        // Make the record file unwritable by replacing the videos directory
        // with a plain file.
        let videos_dir = dir.path().join("videos");
        std::fs::remove_dir_all(&videos_dir).unwrap();
        std::fs::write(&videos_dir, b"not a directory").unwrap();

        let err = coordinator
            .ingest_video(meta("v1", "c1"), segs(&["doomed content"]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Ingestion(_)));
        assert_eq!(coordinator.status("v1").unwrap().state, IngestState::Failed);

        // The staged generation never became visible.
        assert!(search(&store, &index, "doomed").is_empty());
        assert_eq!(search(&store, &index, "stable"), vec!["v1@0"]);
    }

    #[test]
    fn remove_video_purges_everything() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["temporary words"]))
            .unwrap();

        assert!(coordinator.remove_video("v1").unwrap());
        assert!(search(&store, &index, "temporary").is_empty());
        assert!(coordinator.status("v1").is_none());
        assert!(!coordinator.remove_video("v1").unwrap());
    }

    #[test]
    fn failure_is_isolated_per_video() {
        let (_dir, store, index, coordinator) = setup();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["healthy video"]))
            .unwrap();

        let flag = Arc::new(AtomicBool::new(true));
        coordinator
            .ingest_with_flag(meta("v2", "c1"), segs(&["broken video"]), flag)
            .unwrap_err();

        assert_eq!(search(&store, &index, "healthy"), vec!["v1@0"]);
        assert!(search(&store, &index, "broken").is_empty());
    }

    #[test]
    fn stats_reflect_store_and_index() {
        let (_dir, _store, _index, coordinator) = setup();
        coordinator
            .register_channel(ChannelRecord {
                channel_id: "c1".to_string(),
                title: "Channel".to_string(),
                description: String::new(),
                thumbnail_url: String::new(),
                created_at: chrono::Utc::now().to_rfc3339(),
            })
            .unwrap();
        coordinator
            .ingest_video(meta("v1", "c1"), segs(&["alpha beta", "beta gamma"]))
            .unwrap();

        let stats = coordinator.stats();
        assert_eq!(stats.total_channels, 1);
        assert_eq!(stats.total_videos, 1);
        assert_eq!(stats.total_segments, 2);
        assert_eq!(stats.distinct_terms, 3);
    }
}
