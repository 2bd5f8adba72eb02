use serde::{Deserialize, Serialize};

/// A training video inside a session. `duration` starts at 0 (unknown) and is
/// filled in once the playback surface reports media metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video_file: String,
    #[serde(default)]
    pub duration: f64,
}

/// A timestamped annotation attached to one video of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub name: String,
    pub doctor: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub video_title: String,
    pub timestamp: f64,
    /// Display length of the annotation span in seconds; server may omit it.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub comment_type: Option<String>,
    pub comment_text: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub session_date: String,
    #[serde(default)]
    pub status: String,
}

/// The aggregate the platform returns for one session: comments reference
/// videos by title only, and a comment whose title matches no loaded video
/// must be tolerated, not rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub session: SessionInfo,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl SessionData {
    pub fn video(&self, title: &str) -> Option<&Video> {
        self.videos.iter().find(|v| v.title == title)
    }
}
