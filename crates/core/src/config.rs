use std::time::Duration;

/// Tunables for the review loop. The defaults match the behavior observed in
/// production; tests inject smaller values and a synthetic clock.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Sampling period of the playback-position monitor.
    pub tick_interval: Duration,
    /// Window around a comment's timestamp within which it counts as active.
    pub active_tolerance_secs: f64,
    /// Minimum drift between the store and the media surface before an
    /// external seek is pushed to the surface.
    pub seek_threshold_secs: f64,
    /// Age after which an unfinished start/end label is considered abandoned.
    pub label_timeout: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            active_tolerance_secs: 2.0,
            seek_threshold_secs: 0.5,
            label_timeout: Duration::from_secs(300),
        }
    }
}
