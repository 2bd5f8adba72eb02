use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use log::debug;
use tokio::sync::{Notify, broadcast};

use crate::store::PlaybackStateStore;

/// One increment from a dictation stream. Interim chunks are provisional and
/// may be superseded; only final chunks land in the draft.
#[derive(Debug, Clone)]
pub struct TranscriptChunk {
    pub text: String,
    pub is_final: bool,
}

/// Bounded transcript inbox. Producers never block: on overflow the oldest
/// chunk is dropped, so dictation keeps up with the speaker even when the
/// consumer stalls. Drops are counted for diagnostics.
pub struct TranscriptQueue {
    buf: Mutex<VecDeque<TranscriptChunk>>,
    capacity: usize,
    notify: Notify,
    dropped_total: AtomicU64,
}

impl TranscriptQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        assert!(capacity > 0);
        Arc::new(Self {
            buf: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
            dropped_total: AtomicU64::new(0),
        })
    }

    pub fn push_overwrite(&self, chunk: TranscriptChunk) {
        let mut buf = self.buf.lock().expect("transcript queue poisoned");
        if buf.len() >= self.capacity {
            let _ = buf.pop_front();
            self.dropped_total.fetch_add(1, Ordering::Relaxed);
        }
        buf.push_back(chunk);
        drop(buf);
        self.notify.notify_one();
    }

    pub fn try_recv(&self) -> Option<TranscriptChunk> {
        self.buf.lock().expect("transcript queue poisoned").pop_front()
    }

    /// Wait for the next queued chunk.
    pub async fn next(&self) -> TranscriptChunk {
        loop {
            if let Some(chunk) = self.try_recv() {
                return chunk;
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.buf.lock().expect("transcript queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drains a [`TranscriptQueue`] into one video's draft comment. Dictated
/// text is always appended to what the reviewer typed, never a replacement,
/// and the stream is independent of playback ticks.
pub struct TranscriptAppender {
    queue: Arc<TranscriptQueue>,
    store: PlaybackStateStore,
    video_title: String,
}

impl TranscriptAppender {
    pub fn new(
        queue: Arc<TranscriptQueue>,
        store: PlaybackStateStore,
        video_title: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            store,
            video_title: video_title.into(),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                chunk = self.queue.next() => {
                    if !chunk.is_final {
                        debug!("skipping interim transcript chunk: {:?}", chunk.text);
                        continue;
                    }
                    self.store.append_draft(&self.video_title, &chunk.text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn chunk(text: &str, is_final: bool) -> TranscriptChunk {
        TranscriptChunk {
            text: text.to_string(),
            is_final,
        }
    }

    #[test]
    fn overflow_drops_oldest_chunk() {
        let queue = TranscriptQueue::new(2);
        queue.push_overwrite(chunk("one", true));
        queue.push_overwrite(chunk("two", true));
        queue.push_overwrite(chunk("three", true));

        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.try_recv().unwrap().text, "two");
        assert_eq!(queue.try_recv().unwrap().text, "three");
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn final_chunks_append_to_draft_in_order() {
        let store = PlaybackStateStore::new();
        store.set_draft("Intro", "typed note");
        let queue = TranscriptQueue::new(8);
        queue.push_overwrite(chunk("dictated first", true));
        queue.push_overwrite(chunk("ignore me", false));
        queue.push_overwrite(chunk("then second", true));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let appender = TranscriptAppender::new(Arc::clone(&queue), store.clone(), "Intro");
        let handle = tokio::spawn(appender.run(shutdown_rx));

        // queue drains quickly; give the task a few polls
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        tokio::time::timeout(Duration::from_secs(1), async {
            while store.draft("Intro") != "typed note dictated first then second" {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
