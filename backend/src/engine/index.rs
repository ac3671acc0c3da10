//! In-memory inverted index over transcript segments.
//!
//! Postings are stamped with the generation of the video's segment set they
//! were built from. A generation becomes visible to search only once the
//! segment store publishes a video record carrying that generation, so a
//! query observes either the fully-old or the fully-new posting set for a
//! video, never a mix. The index is derived data: it is rebuilt from the
//! segment store on startup and never persisted itself.

use crate::engine::tokenizer::tokenize;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One (token -> segment occurrence) entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub video_id: String,
    /// Segment-set generation this posting was built from.
    pub generation: u64,
    /// Ordinal of the segment within the video's segment list.
    pub segment: u32,
    /// Term frequency within the segment.
    pub tf: u32,
    /// Total token count of the segment, for TF normalization.
    pub segment_len: u32,
}

/// All postings for one term.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub entries: Vec<Posting>,
}

impl PostingList {
    fn retain(&mut self, keep: impl FnMut(&Posting) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(keep);
        before - self.entries.len()
    }
}

/// Term -> posting list map, safe for concurrent readers and writers.
///
/// The index does not deduplicate: indexing the same (video, generation,
/// segment) twice produces duplicate postings. Callers replace a video's
/// postings by indexing under a fresh generation and pruning the old one.
pub struct InvertedIndex {
    postings: DashMap<String, PostingList>,
    posting_count: AtomicUsize,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            postings: DashMap::new(),
            posting_count: AtomicUsize::new(0),
        }
    }

    /// Index one segment's text under the given generation. Returns the
    /// segment's token count.
    pub fn index_segment(&self, video_id: &str, generation: u64, segment: u32, text: &str) -> u32 {
        let toks = tokenize(text);
        let segment_len = toks.len() as u32;

        let mut tf_map: HashMap<String, u32> = HashMap::new();
        for term in toks {
            *tf_map.entry(term).or_insert(0) += 1;
        }

        let unique_terms = tf_map.len();
        for (term, tf) in tf_map {
            self.postings.entry(term).or_default().entries.push(Posting {
                video_id: video_id.to_string(),
                generation,
                segment,
                tf,
                segment_len,
            });
        }
        self.posting_count.fetch_add(unique_terms, Ordering::Relaxed);

        segment_len
    }

    /// Exact-term lookup. Returns a snapshot of the posting list; callers
    /// filter by the published generation of each video.
    pub fn lookup(&self, term: &str) -> Option<PostingList> {
        self.postings.get(term).map(|r| r.clone())
    }

    /// Remove every posting for a video, across all generations. Removing an
    /// absent video is a no-op.
    pub fn remove_video(&self, video_id: &str) {
        self.retain_postings(|p| p.video_id != video_id);
    }

    /// Drop the postings of one specific generation, e.g. after a failed or
    /// aborted ingestion that never published.
    pub fn discard_generation(&self, video_id: &str, generation: u64) {
        self.retain_postings(|p| p.video_id != video_id || p.generation != generation);
    }

    /// Drop every posting for a video except the given generation. Called at
    /// the start of a re-ingestion: only the published generation is
    /// reachable by readers at that point, so this is invisible to search.
    pub fn prune_except(&self, video_id: &str, generation: u64) {
        self.retain_postings(|p| p.video_id != video_id || p.generation == generation);
    }

    fn retain_postings(&self, mut keep: impl FnMut(&Posting) -> bool) {
        let mut removed = 0usize;
        self.postings.retain(|_, list| {
            removed += list.retain(&mut keep);
            !list.entries.is_empty()
        });
        self.posting_count.fetch_sub(removed, Ordering::Relaxed);
    }

    /// Number of distinct indexed terms.
    pub fn distinct_terms(&self) -> usize {
        self.postings.len()
    }

    /// Total number of postings across all terms.
    pub fn posting_count(&self) -> usize {
        self.posting_count.load(Ordering::Relaxed)
    }
}
