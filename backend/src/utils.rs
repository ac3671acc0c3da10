/// Parse ISO8601 date string to Unix timestamp for sorting
pub fn parse_iso8601_to_timestamp(date_str: &str) -> i64 {
    if date_str.is_empty() {
        return 0;
    }

    use chrono::{DateTime, Utc};
    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return dt.timestamp();
    }

    0
}

/// Extract the channel id from a YouTube channel URL.
///
/// Only the canonical `/channel/<id>` form carries the id directly; handle
/// (`/@name`) and custom (`/c/name`) URLs need the YouTube Data API to
/// resolve and are rejected here.
pub fn extract_channel_id(input: &str) -> Option<String> {
    use url::Url;

    let parsed_url = Url::parse(input).ok()?;
    let host = parsed_url.host_str()?;

    match host {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
            let mut segments = parsed_url.path_segments()?;
            if segments.next() != Some("channel") {
                return None;
            }
            segments
                .next()
                .filter(|id| is_valid_external_id(id))
                .map(|id| id.to_string())
        }
        _ => None,
    }
}

/// Channel and video ids double as file names in the segment store, so the
/// alphabet is restricted to what YouTube actually uses.
pub fn is_valid_external_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Deep link into a video at a given offset, whole seconds.
pub fn watch_url(video_id: &str, start: f64) -> String {
    format!(
        "https://www.youtube.com/watch?v={video_id}&t={}",
        start.max(0.0).floor() as u64
    )
}
