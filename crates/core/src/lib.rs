pub mod annotations;
pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod controller;
#[cfg(feature = "dictation")]
pub mod dictation;
pub mod error;
pub mod evaluation;
pub mod format;
pub mod labels;
pub mod monitor;
pub mod speech;
pub mod store;
pub mod sync;
pub mod types;

pub use annotations::{
    active_comment_at, comment_spans, comments_for_video, group_by_video, position_of,
};
pub use api::{ApiContext, NewComment, PlatformClient, SessionApi, unwrap_envelope};
pub use classify::{CommentCategory, classify_comment};
pub use config::ReviewConfig;
pub use controller::{CommentController, SharedComments};
pub use error::{CoreError, Result};
pub use evaluation::{Evaluation, EvaluationCategory, display_text, is_evaluation_comment};
pub use format::{format_session_readable, format_timestamp, render_timeline};
pub use labels::{ActiveLabel, FinishedLabel, LabelTracker};
pub use monitor::{ActiveCommentMonitor, ActiveCommentSlot, ActiveSample};
pub use speech::{TranscriptAppender, TranscriptChunk, TranscriptQueue};
pub use store::{PlaybackStateStore, PlayerState, clamp_timestamp, needs_external_seek};
pub use sync::{Layout, sync_to_reference};
pub use types::{Comment, SessionData, SessionInfo, Video};
