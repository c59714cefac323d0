// Video helpers
//
// Extracts YouTube video ids from the URLs users paste and builds watch links that
// start playback at a given offset, used when jumping to a transcript segment.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YOUTUBE_ID: Regex = Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#
    )
    .expect("YouTube id pattern is valid");
}

/// Returns the 11-character YouTube id contained in `url`, if any
pub fn extract_video_id(url: &str) -> Option<String> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Watch URL that starts playback at `seconds` (rounded down)
pub fn watch_url(video_id: &str, seconds: f64) -> String {
    let offset = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("https://www.youtube.com/watch?v={}&t={}s", video_id, offset)
}
