//! Bridges HTTP search parameters to the query executor.

use crate::engine::error::EngineError;
use crate::engine::query::{QueryExecutor, SearchRequest};
use crate::models::SearchResponse;
use log::debug;

/// Validate pagination parameters, run the query and assemble the response
/// envelope. `total` always reflects the full ranked candidate set, so the
/// caller can compute page counts.
pub fn search_transcripts(
    executor: &QueryExecutor,
    query: String,
    channel_id: Option<String>,
    limit: i64,
    offset: Option<i64>,
) -> Result<SearchResponse, EngineError> {
    if limit < 1 {
        return Err(EngineError::InvalidInput(
            "limit must be positive".to_string(),
        ));
    }
    let limit = limit as usize;
    let offset = match offset {
        None => 0,
        Some(o) if o < 0 => {
            return Err(EngineError::InvalidInput(
                "offset must be non-negative".to_string(),
            ))
        }
        Some(o) => o as usize,
    };

    let request = SearchRequest {
        query,
        channel_id,
        limit,
        offset,
    };
    let outcome = executor.search(&request)?;
    debug!(
        "Search '{}' matched {} segments, returning {}",
        request.query,
        outcome.total,
        outcome.hits.len()
    );

    Ok(SearchResponse {
        query: request.query,
        total: outcome.total,
        limit,
        offset,
        results: outcome.hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::index::InvertedIndex;
    use crate::engine::store::SegmentStore;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn negative_offset_is_invalid_input() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SegmentStore::open(dir.path()).unwrap());
        let index = Arc::new(InvertedIndex::new());
        let executor = QueryExecutor::new(store, index);

        let err =
            search_transcripts(&executor, "hello".to_string(), None, 10, Some(-1)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn non_positive_limit_is_invalid_input() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SegmentStore::open(dir.path()).unwrap());
        let index = Arc::new(InvertedIndex::new());
        let executor = QueryExecutor::new(store, index);

        for limit in [0, -3] {
            let err = search_transcripts(&executor, "hello".to_string(), None, limit, None)
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidInput(_)));
        }
    }

    #[test]
    fn response_echoes_query_and_pagination() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SegmentStore::open(dir.path()).unwrap());
        let index = Arc::new(InvertedIndex::new());
        let executor = QueryExecutor::new(store, index);

        let response =
            search_transcripts(&executor, "anything".to_string(), None, 25, Some(5)).unwrap();
        assert_eq!(response.query, "anything");
        assert_eq!(response.limit, 25);
        assert_eq!(response.offset, 5);
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
    }
}
