//! Query execution: term lookup, candidate scoring, deterministic ordering
//! and pagination against the segment store and inverted index.

use crate::engine::error::EngineError;
use crate::engine::index::InvertedIndex;
use crate::engine::store::{SegmentStore, VideoRecord};
use crate::engine::tokenizer::tokenize_unique;
use crate::utils::watch_url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Hard cap on the page size a caller may request.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub channel_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// One ranked result joined with video and channel metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub video_title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_date: String,
    pub thumbnail_url: String,
    /// Raw text of the matched segment.
    pub text: String,
    /// Segment start offset in seconds.
    pub timestamp: f64,
    /// Deep link of the form `https://www.youtube.com/watch?v=<id>&t=<secs>`.
    pub timestamp_url: String,
}

#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    /// Size of the full ranked candidate set before offset/limit truncation.
    pub total: usize,
}

/// Matching is OR across query terms: any segment containing at least one
/// term is a candidate, and segments matching more terms accumulate a higher
/// score. Score per segment = sum over matched terms of tf / segment length.
pub struct QueryExecutor {
    store: Arc<SegmentStore>,
    index: Arc<InvertedIndex>,
}

struct Candidate {
    record: Arc<VideoRecord>,
    segment: u32,
    score: f32,
}

impl QueryExecutor {
    pub fn new(store: Arc<SegmentStore>, index: Arc<InvertedIndex>) -> Self {
        QueryExecutor { store, index }
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, EngineError> {
        if request.limit == 0 || request.limit > MAX_LIMIT {
            return Err(EngineError::InvalidInput(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        let terms = tokenize_unique(&request.query);
        if terms.is_empty() {
            return Ok(SearchOutcome {
                hits: vec![],
                total: 0,
            });
        }

        // One record snapshot per video for the whole query, so every term's
        // postings are validated against the same generation.
        let mut records: HashMap<String, Option<Arc<VideoRecord>>> = HashMap::new();
        let mut scores: HashMap<(String, u32), f32> = HashMap::new();

        for term in &terms {
            let Some(list) = self.index.lookup(term) else {
                continue;
            };
            for posting in &list.entries {
                let record = records
                    .entry(posting.video_id.clone())
                    .or_insert_with(|| self.store.video(&posting.video_id));
                let Some(record) = record else { continue };
                if posting.generation != record.generation || !record.has_transcript {
                    continue;
                }
                if let Some(channel_id) = &request.channel_id {
                    if &record.metadata.channel_id != channel_id {
                        continue;
                    }
                }
                let score = posting.tf as f32 / posting.segment_len.max(1) as f32;
                *scores
                    .entry((posting.video_id.clone(), posting.segment))
                    .or_insert(0.0) += score;
            }
        }

        let mut candidates: Vec<Candidate> = scores
            .into_iter()
            .filter_map(|((video_id, segment), score)| {
                let record = records.get(&video_id)?.clone()?;
                // Defensive bound: a posting's ordinal is only meaningful for
                // its own generation, which the filter above guarantees.
                if segment as usize >= record.segments.len() {
                    return None;
                }
                Some(Candidate {
                    record,
                    segment,
                    score,
                })
            })
            .collect();

        candidates.sort_unstable_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.record.published_ts.cmp(&a.record.published_ts))
                .then_with(|| a.record.metadata.video_id.cmp(&b.record.metadata.video_id))
                .then_with(|| a.segment.cmp(&b.segment))
        });

        let total = candidates.len();
        let hits = candidates
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|c| self.to_hit(&c))
            .collect();

        Ok(SearchOutcome { hits, total })
    }

    fn to_hit(&self, candidate: &Candidate) -> SearchHit {
        let meta = &candidate.record.metadata;
        let segment = &candidate.record.segments[candidate.segment as usize];
        let channel_title = self
            .store
            .channel(&meta.channel_id)
            .map(|c| c.title)
            .unwrap_or_default();

        SearchHit {
            video_id: meta.video_id.clone(),
            video_title: meta.title.clone(),
            channel_id: meta.channel_id.clone(),
            channel_title,
            published_date: meta.published_at.clone(),
            thumbnail_url: meta.thumbnail_url.clone(),
            text: segment.text.clone(),
            timestamp: segment.start,
            timestamp_url: watch_url(&meta.video_id, segment.start),
        }
    }
}
