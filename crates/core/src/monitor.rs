use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, broadcast};

use crate::{
    annotations, config::ReviewConfig, controller::SharedComments, store::PlaybackStateStore,
    types::Comment,
};

/// One observation of the followed video: its sampled position and whichever
/// comment is active there, if any.
#[derive(Debug, Clone)]
pub struct ActiveSample {
    pub video_title: String,
    pub position: f64,
    pub comment: Option<Comment>,
}

/// Latest-value slot for the monitor's output. A consumer always observes the
/// most recent sample; intermediate ones are overwritten, never queued, so a
/// slow reader can never make the monitor fall behind playback.
#[derive(Default)]
pub struct ActiveCommentSlot {
    slot: Mutex<Option<ActiveSample>>,
    notify: Notify,
}

impl ActiveCommentSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn publish(&self, sample: ActiveSample) {
        *self.slot.lock().expect("active slot poisoned") = Some(sample);
        self.notify.notify_one();
    }

    pub fn take(&self) -> Option<ActiveSample> {
        self.slot.lock().expect("active slot poisoned").take()
    }

    /// Wait for the next published sample.
    pub async fn next(&self) -> ActiveSample {
        loop {
            if let Some(sample) = self.take() {
                return sample;
            }
            self.notify.notified().await;
        }
    }
}

/// Samples the followed video's playback position on a fixed interval and
/// looks up the comment active at that position. Polling, not a media event
/// subscription: the store is the source of truth and the monitor never
/// writes to it.
pub struct ActiveCommentMonitor {
    store: PlaybackStateStore,
    comments: SharedComments,
    video_title: String,
    config: ReviewConfig,
    output: Arc<ActiveCommentSlot>,
}

impl ActiveCommentMonitor {
    pub fn new(
        store: PlaybackStateStore,
        comments: SharedComments,
        video_title: impl Into<String>,
        config: ReviewConfig,
        output: Arc<ActiveCommentSlot>,
    ) -> Self {
        Self {
            store,
            comments,
            video_title: video_title.into(),
            config,
            output,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let mut ticks = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                _ = ticks.tick() => {
                    // Ticks while paused carry no new information.
                    if !self.store.is_playing(&self.video_title) {
                        continue;
                    }
                    let position = self.store.current_time(&self.video_title);
                    let active = {
                        let comments = self.comments.lock().expect("comment list poisoned");
                        let for_video: Vec<Comment> = comments
                            .iter()
                            .filter(|c| c.video_title == self.video_title)
                            .cloned()
                            .collect();
                        annotations::active_comment_at(
                            &for_video,
                            position,
                            self.config.active_tolerance_secs,
                        )
                        .cloned()
                    };
                    self.output.publish(ActiveSample {
                        video_title: self.video_title.clone(),
                        position,
                        comment: active,
                    });
                }
            }
        }
    }
}
