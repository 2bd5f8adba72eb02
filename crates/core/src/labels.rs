use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::{CoreError, Result};

/// An annotation being recorded in start/end mode: the reviewer has marked
/// where it begins but not yet where it ends.
#[derive(Debug, Clone)]
pub struct ActiveLabel {
    pub id: Uuid,
    pub video_title: String,
    pub start_time: f64,
    pub comment_type: String,
    pub opened_at: Instant,
}

/// What a closed label turns into: the payload of a duration-bearing comment.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedLabel {
    pub video_title: String,
    pub timestamp: f64,
    pub duration: f64,
    pub comment_type: String,
}

/// Tracks in-progress start/end labels. At most one label can be open per
/// video; an open label either finishes into a [`FinishedLabel`], is
/// abandoned explicitly, or expires.
#[derive(Debug, Default)]
pub struct LabelTracker {
    open: Vec<ActiveLabel>,
}

impl LabelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, video_title: &str, start_time: f64, comment_type: &str) -> Result<Uuid> {
        if self.open_for(video_title).is_some() {
            return Err(CoreError::Validation(format!(
                "a label is already open for video {video_title:?}"
            )));
        }
        let label = ActiveLabel {
            id: Uuid::new_v4(),
            video_title: video_title.to_string(),
            start_time: start_time.max(0.0),
            comment_type: comment_type.to_string(),
            opened_at: Instant::now(),
        };
        let id = label.id;
        self.open.push(label);
        Ok(id)
    }

    pub fn finish(&mut self, id: Uuid, end_time: f64) -> Result<FinishedLabel> {
        let index = self
            .open
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::Validation(format!("no open label with id {id}")))?;

        if end_time <= self.open[index].start_time {
            return Err(CoreError::Validation(format!(
                "label end {end_time:.2}s must come after its start {:.2}s",
                self.open[index].start_time
            )));
        }

        let label = self.open.swap_remove(index);
        Ok(FinishedLabel {
            video_title: label.video_title,
            timestamp: label.start_time,
            duration: end_time - label.start_time,
            comment_type: label.comment_type,
        })
    }

    pub fn abandon(&mut self, id: Uuid) -> bool {
        let before = self.open.len();
        self.open.retain(|l| l.id != id);
        self.open.len() != before
    }

    pub fn open_for(&self, video_title: &str) -> Option<&ActiveLabel> {
        self.open.iter().find(|l| l.video_title == video_title)
    }

    /// Drop labels left open longer than `max_age`; returns how many expired.
    pub fn expire_older_than(&mut self, max_age: Duration) -> usize {
        let before = self.open.len();
        self.open.retain(|l| l.opened_at.elapsed() < max_age);
        before - self.open.len()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
