use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use log::debug;

use crate::{
    api::{NewComment, SessionApi},
    error::{CoreError, Result},
    evaluation::{Evaluation, truncate_comment},
    labels::FinishedLabel,
    store::{PlaybackStateStore, clamp_timestamp},
    types::{Comment, SessionData},
};

/// The session's comment list as last reported by the server. Replaced
/// wholesale on every refetch; the last refetch to complete wins.
pub type SharedComments = Arc<Mutex<Vec<Comment>>>;

#[derive(Default)]
struct InFlight {
    /// Comment names with a mutation on the wire.
    comments: HashSet<String>,
    /// Video titles with an add on the wire.
    adds: HashSet<String>,
}

enum FlightKey {
    Comment(String),
    Add(String),
}

/// Releases the in-flight reservation on every exit path.
struct FlightGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    key: FlightKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        match &self.key {
            FlightKey::Comment(name) => {
                in_flight.comments.remove(name);
            }
            FlightKey::Add(title) => {
                in_flight.adds.remove(title);
            }
        }
    }
}

/// Orchestrates comment mutations against the platform.
///
/// Every mutation follows the same discipline: pause the video, submit,
/// refetch the whole session aggregate, then restore the playback position
/// captured before the round trip. The refetch is a full reload, and without
/// the explicit restore it would snap playback to wherever the media surface
/// drifted while the request was in flight.
///
/// Deleting is exposed without any confirmation step; asking the user is the
/// calling surface's precondition, not this type's.
pub struct CommentController {
    api: Arc<dyn SessionApi>,
    session_name: String,
    store: PlaybackStateStore,
    comments: SharedComments,
    in_flight: Mutex<InFlight>,
}

impl CommentController {
    pub fn new(
        api: Arc<dyn SessionApi>,
        session_name: impl Into<String>,
        store: PlaybackStateStore,
        comments: SharedComments,
    ) -> Self {
        Self {
            api,
            session_name: session_name.into(),
            store,
            comments,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    /// Fetch the session aggregate and build a controller around it, with one
    /// store entry per loaded video.
    pub async fn connect(
        api: Arc<dyn SessionApi>,
        session_name: impl Into<String>,
    ) -> Result<(SessionData, Self)> {
        let session_name = session_name.into();
        let data = api.get_session_details(&session_name).await?;
        let store = PlaybackStateStore::init_for_videos(&data.videos);
        let comments = Arc::new(Mutex::new(data.comments.clone()));
        let controller = Self::new(api, session_name, store, comments);
        Ok((data, controller))
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn store(&self) -> &PlaybackStateStore {
        &self.store
    }

    pub fn comments(&self) -> SharedComments {
        Arc::clone(&self.comments)
    }

    fn begin_add(&self, video_title: &str) -> Result<FlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        if !in_flight.adds.insert(video_title.to_string()) {
            return Err(CoreError::MutationInFlight {
                subject: format!("video {video_title:?}"),
            });
        }
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            key: FlightKey::Add(video_title.to_string()),
        })
    }

    fn begin_mutation(&self, comment_name: &str) -> Result<FlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        if !in_flight.comments.insert(comment_name.to_string()) {
            return Err(CoreError::MutationInFlight {
                subject: format!("comment {comment_name:?}"),
            });
        }
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            key: FlightKey::Comment(comment_name.to_string()),
        })
    }

    fn find_comment(&self, comment_name: &str) -> Result<Comment> {
        self.comments
            .lock()
            .expect("comment list poisoned")
            .iter()
            .find(|c| c.name == comment_name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownComment {
                name: comment_name.to_string(),
            })
    }

    /// Refetch the session aggregate and replace the comment list.
    pub async fn refresh(&self) -> Result<SessionData> {
        let data = self.api.get_session_details(&self.session_name).await?;
        *self.comments.lock().expect("comment list poisoned") = data.comments.clone();
        debug!("session {:?} refreshed: {} comments", self.session_name, data.comments.len());
        Ok(data)
    }

    /// Submit the draft comment for `video_title` at the video's current
    /// position. An empty draft is a local no-op: `Ok(None)`, no network
    /// call. On success the draft is cleared and the pre-submission position
    /// restored; on failure the draft and position are left untouched.
    pub async fn add_comment(&self, video_title: &str) -> Result<Option<f64>> {
        let state = self.store.get(video_title).unwrap_or_default();
        let text = state.draft_comment.trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }

        let _guard = self.begin_add(video_title)?;
        let captured = clamp_timestamp(state.current_time, state.duration);
        self.store.set_playing(video_title, false);

        let comment = NewComment {
            video_title: video_title.to_string(),
            timestamp: captured,
            comment_text: truncate_comment(text),
            duration: None,
            comment_type: None,
        };
        self.api.add_comment(&self.session_name, &comment).await?;

        self.store.set_draft(video_title, "");
        let refreshed = self.refresh().await;
        self.store.set_time(video_title, captured);
        refreshed?;
        Ok(Some(captured))
    }

    /// Submit a comment produced by a closed start/end label. The label's
    /// own text is passed in; the typed draft is not consumed.
    pub async fn add_labelled_comment(&self, label: &FinishedLabel, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation(
                "label comment text cannot be empty".to_string(),
            ));
        }

        let _guard = self.begin_add(&label.video_title)?;
        let state = self.store.get(&label.video_title).unwrap_or_default();
        let captured = state.current_time;
        self.store.set_playing(&label.video_title, false);

        let comment = NewComment {
            video_title: label.video_title.clone(),
            timestamp: clamp_timestamp(label.timestamp, state.duration),
            comment_text: truncate_comment(text.to_string()),
            duration: Some(label.duration),
            comment_type: Some(label.comment_type.clone()),
        };
        self.api.add_comment(&self.session_name, &comment).await?;

        let refreshed = self.refresh().await;
        self.store.set_time(&label.video_title, captured);
        refreshed.map(|_| ())
    }

    /// Encode and submit a structured evaluation as a marked comment.
    /// Validation (at least one rating or a note) happens before any network
    /// traffic.
    pub async fn add_evaluation(
        &self,
        video_title: &str,
        timestamp: f64,
        evaluation: &Evaluation,
    ) -> Result<()> {
        let encoded = evaluation.encode()?;

        let _guard = self.begin_add(video_title)?;
        let state = self.store.get(video_title).unwrap_or_default();
        let captured = state.current_time;
        self.store.set_playing(video_title, false);

        let comment = NewComment {
            video_title: video_title.to_string(),
            timestamp: clamp_timestamp(timestamp, state.duration),
            comment_text: encoded,
            duration: None,
            comment_type: None,
        };
        self.api.add_comment(&self.session_name, &comment).await?;

        let refreshed = self.refresh().await;
        self.store.set_time(video_title, captured);
        refreshed.map(|_| ())
    }

    /// Replace a comment's text. Text and duration edits are deliberately
    /// separate server calls; this one never touches the duration.
    pub async fn update_comment_text(&self, comment_name: &str, new_text: &str) -> Result<()> {
        let text = new_text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation(
                "comment text cannot be empty".to_string(),
            ));
        }

        let video_title = self.find_comment(comment_name)?.video_title;
        let _guard = self.begin_mutation(comment_name)?;
        let captured = self.store.current_time(&video_title);
        self.store.set_playing(&video_title, false);

        self.api
            .update_comment_text(comment_name, &truncate_comment(text.to_string()))
            .await?;

        let refreshed = self.refresh().await;
        self.store.set_time(&video_title, captured);
        refreshed.map(|_| ())
    }

    /// Change a comment's annotation span without touching its text.
    pub async fn update_comment_duration(&self, comment_name: &str, duration: f64) -> Result<()> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CoreError::Validation(format!(
                "annotation duration must be positive, got {duration}"
            )));
        }

        let video_title = self.find_comment(comment_name)?.video_title;
        let _guard = self.begin_mutation(comment_name)?;
        let captured = self.store.current_time(&video_title);
        self.store.set_playing(&video_title, false);

        self.api
            .update_comment_duration(comment_name, duration)
            .await?;

        let refreshed = self.refresh().await;
        self.store.set_time(&video_title, captured);
        refreshed.map(|_| ())
    }

    pub async fn delete_comment(&self, comment_name: &str) -> Result<()> {
        let video_title = self.find_comment(comment_name)?.video_title;
        let _guard = self.begin_mutation(comment_name)?;
        let captured = self.store.current_time(&video_title);
        self.store.set_playing(&video_title, false);

        self.api.delete_comment(comment_name).await?;

        let refreshed = self.refresh().await;
        self.store.set_time(&video_title, captured);
        refreshed.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::types::{SessionInfo, Video};

    fn base_session() -> SessionData {
        SessionData {
            session: SessionInfo {
                name: "SES-001".to_string(),
                title: "Laparoscopy training".to_string(),
                description: String::new(),
                session_date: "2025-06-01".to_string(),
                status: "Active".to_string(),
            },
            videos: vec![Video {
                title: "Intro".to_string(),
                description: String::new(),
                video_file: "/files/intro.mp4".to_string(),
                duration: 120.0,
            }],
            comments: vec![Comment {
                name: "C-1".to_string(),
                doctor: "DOC-001".to_string(),
                doctor_name: Some("Dr. Osei".to_string()),
                video_title: "Intro".to_string(),
                timestamp: 10.0,
                duration: None,
                comment_type: None,
                comment_text: "watch the trocar angle".to_string(),
                created_at: String::new(),
            }],
        }
    }

    /// In-memory [`SessionApi`] that records calls and can fail, stall, or
    /// simulate media-surface drift during the refetch.
    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<&'static str>>,
        fail_add: AtomicBool,
        gate: Option<Arc<Notify>>,
        /// When set, session fetches shove this position into the store
        /// first, as a drifting media element would during a re-render.
        drift: Mutex<Option<(PlaybackStateStore, String, f64)>>,
    }

    impl MockApi {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        async fn wait_at_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl SessionApi for MockApi {
        async fn get_session_details(&self, _session_name: &str) -> Result<SessionData> {
            self.record("get_session_details");
            if let Some((store, title, position)) = self.drift.lock().unwrap().clone() {
                store.set_time(&title, position);
            }
            Ok(base_session())
        }

        async fn add_comment(&self, _session_name: &str, _comment: &NewComment) -> Result<()> {
            self.record("add_comment");
            self.wait_at_gate().await;
            if self.fail_add.load(Ordering::SeqCst) {
                return Err(CoreError::Api {
                    method: "add_comment",
                    reason: "server rejected".to_string(),
                });
            }
            Ok(())
        }

        async fn update_comment_text(&self, _name: &str, _text: &str) -> Result<()> {
            self.record("update_comment_text");
            self.wait_at_gate().await;
            Ok(())
        }

        async fn update_comment_duration(&self, _name: &str, _duration: f64) -> Result<()> {
            self.record("update_comment_duration");
            self.wait_at_gate().await;
            Ok(())
        }

        async fn delete_comment(&self, _name: &str) -> Result<()> {
            self.record("delete_comment");
            self.wait_at_gate().await;
            Ok(())
        }
    }

    async fn connected(api: Arc<MockApi>) -> CommentController {
        let (_, controller) = CommentController::connect(api, "SES-001").await.unwrap();
        controller
    }

    #[tokio::test]
    async fn add_restores_position_despite_drift() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;
        let store = controller.store().clone();

        store.set_time("Intro", 42.0);
        store.set_draft("Intro", "good exposure here");
        *api.drift.lock().unwrap() = Some((store.clone(), "Intro".to_string(), 99.0));

        let submitted = controller.add_comment("Intro").await.unwrap();
        assert_eq!(submitted, Some(42.0));
        assert_eq!(store.current_time("Intro"), 42.0);
        assert_eq!(store.draft("Intro"), "");
        assert!(!store.is_playing("Intro"));
    }

    #[tokio::test]
    async fn add_pauses_then_submits_then_refetches() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        controller.store().set_playing("Intro", true);
        controller.store().set_draft("Intro", "nice dissection");
        controller.add_comment("Intro").await.unwrap();

        assert_eq!(
            api.calls(),
            vec!["get_session_details", "add_comment", "get_session_details"]
        );
        assert!(!controller.store().is_playing("Intro"));
    }

    #[tokio::test]
    async fn empty_draft_is_a_local_no_op() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        controller.store().set_draft("Intro", "   ");
        let submitted = controller.add_comment("Intro").await.unwrap();

        assert_eq!(submitted, None);
        // only the connect-time fetch, nothing from the add
        assert_eq!(api.calls(), vec!["get_session_details"]);
    }

    #[tokio::test]
    async fn failed_add_keeps_draft_and_position() {
        let api = Arc::new(MockApi::default());
        api.fail_add.store(true, Ordering::SeqCst);
        let controller = connected(Arc::clone(&api)).await;
        let store = controller.store().clone();

        store.set_time("Intro", 42.0);
        store.set_draft("Intro", "possible bleed");

        assert!(controller.add_comment("Intro").await.is_err());
        assert_eq!(store.draft("Intro"), "possible bleed");
        assert_eq!(store.current_time("Intro"), 42.0);
        assert!(!store.is_playing("Intro"));
        // no refetch after a failed mutation
        assert_eq!(api.calls(), vec!["get_session_details", "add_comment"]);
    }

    #[tokio::test]
    async fn text_and_duration_edits_are_separate_calls() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;
        controller.store().set_time("Intro", 17.0);

        controller
            .update_comment_text("C-1", "watch the trocar angle closely")
            .await
            .unwrap();
        controller.update_comment_duration("C-1", 45.0).await.unwrap();

        let calls = api.calls();
        assert!(calls.contains(&"update_comment_text"));
        assert!(calls.contains(&"update_comment_duration"));
        assert_eq!(controller.store().current_time("Intro"), 17.0);
    }

    #[tokio::test]
    async fn invalid_duration_rejected_locally() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        assert!(controller.update_comment_duration("C-1", 0.0).await.is_err());
        assert!(controller.update_comment_duration("C-1", f64::NAN).await.is_err());
        assert_eq!(api.calls(), vec!["get_session_details"]);
    }

    #[tokio::test]
    async fn unknown_comment_rejected_before_network() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        let err = controller.delete_comment("C-404").await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownComment { .. }));
        assert_eq!(api.calls(), vec!["get_session_details"]);
    }

    #[tokio::test]
    async fn concurrent_mutations_on_one_comment_rejected() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            gate: Some(Arc::clone(&gate)),
            ..MockApi::default()
        });
        let controller = Arc::new(connected(Arc::clone(&api)).await);

        let update_controller = Arc::clone(&controller);
        let update = tokio::spawn(async move {
            update_controller
                .update_comment_text("C-1", "revised wording")
                .await
        });
        tokio::task::yield_now().await;

        let err = controller.delete_comment("C-1").await.unwrap_err();
        assert!(matches!(err, CoreError::MutationInFlight { .. }));

        gate.notify_waiters();
        update.await.unwrap().unwrap();

        // released after completion: the delete goes through now
        gate.notify_waiters();
        let delete = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.delete_comment("C-1").await })
        };
        tokio::task::yield_now().await;
        gate.notify_waiters();
        delete.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn evaluation_submits_encoded_text() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        let evaluation = Evaluation {
            identification: Some(3),
            notes: "clear introduction".to_string(),
            ..Evaluation::default()
        };
        controller
            .add_evaluation("Intro", 5.0, &evaluation)
            .await
            .unwrap();
        assert!(api.calls().contains(&"add_comment"));
    }

    #[tokio::test]
    async fn invalid_evaluation_rejected_before_network() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        let err = controller
            .add_evaluation("Intro", 5.0, &Evaluation::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(api.calls(), vec!["get_session_details"]);
    }

    #[tokio::test]
    async fn labelled_comment_carries_span_and_type() {
        let api = Arc::new(MockApi::default());
        let controller = connected(Arc::clone(&api)).await;

        let label = FinishedLabel {
            video_title: "Intro".to_string(),
            timestamp: 20.0,
            duration: 14.0,
            comment_type: "situation".to_string(),
        };
        controller
            .add_labelled_comment(&label, "handover starts here")
            .await
            .unwrap();
        assert!(api.calls().contains(&"add_comment"));

        let err = controller.add_labelled_comment(&label, "  ").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
