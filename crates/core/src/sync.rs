use log::debug;

use crate::{
    error::{CoreError, Result},
    store::PlaybackStateStore,
    types::Video,
};

/// How the session's videos are laid out on screen. The layout decides which
/// videos participate in a sync: none when a single player is shown, the
/// first two side by side, all of them in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Single,
    SideBySide,
    Grid,
}

impl Layout {
    pub fn active_titles(&self, videos: &[Video]) -> Vec<String> {
        match self {
            Layout::Single => Vec::new(),
            Layout::SideBySide => videos.iter().take(2).map(|v| v.title.clone()).collect(),
            Layout::Grid => videos.iter().map(|v| v.title.clone()).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::SideBySide => "side-by-side",
            Layout::Grid => "grid",
        }
    }
}

/// One-shot seek of every active video to the reference video's current
/// position. Returns how many videos were moved so the caller can report it.
/// This is a snapshot sync: nothing corrects for playback-rate drift
/// afterwards. Fewer than two active videos is an error, not a panic.
pub fn sync_to_reference(
    store: &PlaybackStateStore,
    reference_title: &str,
    active_titles: &[String],
) -> Result<usize> {
    if active_titles.len() < 2 {
        return Err(CoreError::SyncUnavailable {
            active: active_titles.len(),
        });
    }

    let reference_time = store.current_time(reference_title);
    let mut synced = 0;
    for title in active_titles {
        if title != reference_title {
            store.set_time(title, reference_time);
            synced += 1;
        }
    }

    debug!("synced {synced} videos to {reference_title:?} at {reference_time:.2}s");
    Ok(synced)
}
