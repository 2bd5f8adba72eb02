use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::types::Video;

/// Ephemeral per-video playback state. One entry exists for every video of
/// the loaded session; entries are created on demand for titles the store has
/// not seen yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub is_playing: bool,
    pub current_time: f64,
    /// 0 until the media surface reports metadata, then fixed.
    pub duration: f64,
    pub draft_comment: String,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            draft_comment: String::new(),
        }
    }
}

/// Clamp a playback position into `[0, duration]`. A duration of 0 means the
/// media has not reported one yet, so only the lower bound applies.
pub fn clamp_timestamp(seconds: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        seconds.clamp(0.0, duration)
    } else {
        seconds.max(0.0)
    }
}

/// Whether a consumer should push the store's position into the media
/// surface. Natural playback keeps the two within a fraction of a second of
/// each other; seeking on every sample would fight the surface and stutter,
/// so only a drift beyond the threshold triggers an external seek.
pub fn needs_external_seek(store_time: f64, surface_time: f64, threshold_secs: f64) -> bool {
    (store_time - surface_time).abs() > threshold_secs
}

/// The single source of truth for playback state across every rendered video
/// surface. Cheap to clone; all clones share the same entries.
#[derive(Clone, Default)]
pub struct PlaybackStateStore {
    inner: Arc<Mutex<HashMap<String, PlayerState>>>,
}

impl PlaybackStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with exactly one entry per session video, durations included
    /// when the aggregate already knows them.
    pub fn init_for_videos(videos: &[Video]) -> Self {
        let entries = videos
            .iter()
            .map(|v| {
                (
                    v.title.clone(),
                    PlayerState {
                        duration: v.duration.max(0.0),
                        ..PlayerState::default()
                    },
                )
            })
            .collect();
        Self {
            inner: Arc::new(Mutex::new(entries)),
        }
    }

    fn with_entry<R>(&self, title: &str, f: impl FnOnce(&mut PlayerState) -> R) -> R {
        let mut entries = self.inner.lock().expect("playback store poisoned");
        f(entries.entry(title.to_string()).or_default())
    }

    pub fn set_playing(&self, title: &str, playing: bool) {
        self.with_entry(title, |state| state.is_playing = playing);
    }

    pub fn set_time(&self, title: &str, seconds: f64) {
        self.with_entry(title, |state| {
            state.current_time = clamp_timestamp(seconds, state.duration);
        });
    }

    /// Record the duration reported by the media surface. Only the first
    /// concrete value sticks; the current position is re-clamped against it.
    pub fn set_duration(&self, title: &str, duration: f64) {
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        self.with_entry(title, |state| {
            if state.duration == 0.0 {
                state.duration = duration;
                state.current_time = clamp_timestamp(state.current_time, duration);
            }
        });
    }

    pub fn set_draft(&self, title: &str, text: &str) {
        self.with_entry(title, |state| state.draft_comment = text.to_string());
    }

    /// Append dictated text to the draft without replacing what the reviewer
    /// already typed.
    pub fn append_draft(&self, title: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.with_entry(title, |state| {
            if !state.draft_comment.is_empty() && !state.draft_comment.ends_with(char::is_whitespace)
            {
                state.draft_comment.push(' ');
            }
            state.draft_comment.push_str(text);
        });
    }

    pub fn get(&self, title: &str) -> Option<PlayerState> {
        self.inner
            .lock()
            .expect("playback store poisoned")
            .get(title)
            .cloned()
    }

    pub fn current_time(&self, title: &str) -> f64 {
        self.get(title).map(|s| s.current_time).unwrap_or(0.0)
    }

    pub fn is_playing(&self, title: &str) -> bool {
        self.get(title).map(|s| s.is_playing).unwrap_or(false)
    }

    pub fn draft(&self, title: &str) -> String {
        self.get(title).map(|s| s.draft_comment).unwrap_or_default()
    }

    pub fn titles(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("playback store poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("playback store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_title_gets_default_entry() {
        let store = PlaybackStateStore::new();
        store.set_time("unknown-video", 5.0);

        assert_eq!(store.len(), 1);
        let state = store.get("unknown-video").unwrap();
        assert_eq!(state.current_time, 5.0);
        assert!(!state.is_playing);
        assert_eq!(state.draft_comment, "");
    }

    #[test]
    fn init_creates_one_entry_per_video() {
        let videos = vec![
            Video {
                title: "Intro".to_string(),
                description: String::new(),
                video_file: "/files/a.mp4".to_string(),
                duration: 120.0,
            },
            Video {
                title: "Closure".to_string(),
                description: String::new(),
                video_file: "/files/b.mp4".to_string(),
                duration: 0.0,
            },
        ];
        let store = PlaybackStateStore::init_for_videos(&videos);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("Intro").unwrap().duration, 120.0);
    }

    #[test]
    fn set_time_clamps_to_known_duration() {
        let store = PlaybackStateStore::new();
        store.set_duration("Intro", 120.0);
        store.set_time("Intro", 500.0);
        assert_eq!(store.current_time("Intro"), 120.0);
        store.set_time("Intro", -3.0);
        assert_eq!(store.current_time("Intro"), 0.0);
    }

    #[test]
    fn set_time_without_duration_only_floors_at_zero() {
        let store = PlaybackStateStore::new();
        store.set_time("Intro", 500.0);
        assert_eq!(store.current_time("Intro"), 500.0);
        store.set_time("Intro", -1.0);
        assert_eq!(store.current_time("Intro"), 0.0);
    }

    #[test]
    fn duration_transitions_only_once() {
        let store = PlaybackStateStore::new();
        store.set_time("Intro", 200.0);
        store.set_duration("Intro", 120.0);
        assert_eq!(store.current_time("Intro"), 120.0);

        store.set_duration("Intro", 999.0);
        assert_eq!(store.get("Intro").unwrap().duration, 120.0);
    }

    #[test]
    fn non_finite_duration_ignored() {
        let store = PlaybackStateStore::new();
        store.set_duration("Intro", f64::INFINITY);
        store.set_duration("Intro", f64::NAN);
        assert!(store.get("Intro").is_none());
    }

    #[test]
    fn append_draft_spaces_between_chunks() {
        let store = PlaybackStateStore::new();
        store.set_draft("Intro", "check the");
        store.append_draft("Intro", "suture line");
        assert_eq!(store.draft("Intro"), "check the suture line");
    }

    #[test]
    fn append_draft_to_empty_has_no_leading_space() {
        let store = PlaybackStateStore::new();
        store.append_draft("Intro", "bleeding here");
        assert_eq!(store.draft("Intro"), "bleeding here");
    }

    #[test]
    fn external_seek_fires_only_beyond_threshold() {
        assert!(!needs_external_seek(10.0, 10.3, 0.5));
        assert!(!needs_external_seek(10.0, 10.5, 0.5));
        assert!(needs_external_seek(10.0, 10.6, 0.5));
        assert!(needs_external_seek(10.6, 10.0, 0.5));
    }
}
