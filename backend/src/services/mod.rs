pub mod channel_service;
pub mod ingest_service;
pub mod search_service;
pub mod video_service;
