use std::collections::HashMap;

use log::debug;

use crate::types::{Comment, Video};

/// Display length of an annotation whose comment carries no duration.
pub const DEFAULT_ANNOTATION_SECS: f64 = 30.0;

/// Horizontal position of a timestamp on a timeline, in percent. Returns
/// `None` for an unknown (zero or negative) duration; the caller decides what
/// an empty timeline looks like. Out-of-range timestamps are clamped before
/// the divide, so the result always lands in `[0, 100]`.
pub fn position_of(timestamp: f64, duration: f64) -> Option<f64> {
    if duration <= 0.0 {
        return None;
    }
    Some((timestamp / duration).clamp(0.0, 1.0) * 100.0)
}

/// The comment considered active at `current_time`: the first one (in input
/// order) whose timestamp falls within the tolerance window. At most one
/// comment is surfaced even when several qualify.
pub fn active_comment_at(
    comments: &[Comment],
    current_time: f64,
    tolerance_secs: f64,
) -> Option<&Comment> {
    comments
        .iter()
        .find(|c| (c.timestamp - current_time).abs() < tolerance_secs)
}

/// Comments attached to one video, sorted ascending by timestamp. A title no
/// comment references simply yields an empty list.
pub fn comments_for_video<'a>(comments: &'a [Comment], video_title: &str) -> Vec<&'a Comment> {
    let mut matched: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.video_title == video_title)
        .collect();
    matched.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    matched
}

/// Group a session's comments under its loaded videos. Comments referencing a
/// video title that is not loaded are dropped from the result and logged; the
/// platform does not enforce the reference, so they do occur.
pub fn group_by_video<'a>(
    comments: &'a [Comment],
    videos: &[Video],
) -> HashMap<String, Vec<&'a Comment>> {
    let mut grouped: HashMap<String, Vec<&Comment>> = videos
        .iter()
        .map(|v| (v.title.clone(), Vec::new()))
        .collect();

    for comment in comments {
        match grouped.get_mut(&comment.video_title) {
            Some(bucket) => bucket.push(comment),
            None => debug!(
                "comment {} references unknown video {:?}, skipping",
                comment.name, comment.video_title
            ),
        }
    }

    for bucket in grouped.values_mut() {
        bucket.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
    grouped
}

/// A comment's display span on the timeline.
#[derive(Debug, Clone)]
pub struct CommentSpan<'a> {
    pub comment: &'a Comment,
    pub start: f64,
    pub end: f64,
}

impl CommentSpan<'_> {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Duration spans for a video's comments, sorted by start time. Spans may
/// overlap; each one runs from the comment's timestamp for its own duration
/// (default 30 s), cut off at the end of the video.
pub fn comment_spans<'a>(comments: &'a [Comment], video_duration: f64) -> Vec<CommentSpan<'a>> {
    let mut sorted: Vec<&Comment> = comments.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    sorted
        .into_iter()
        .map(|comment| {
            let start = comment.timestamp;
            let mut end = start + comment.duration.unwrap_or(DEFAULT_ANNOTATION_SECS);
            // clip at the end of the video once its duration is known
            if video_duration > 0.0 {
                end = end.min(video_duration.max(start));
            }
            CommentSpan { comment, start, end }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, video_title: &str, timestamp: f64) -> Comment {
        Comment {
            name: name.to_string(),
            doctor: "DOC-001".to_string(),
            doctor_name: None,
            video_title: video_title.to_string(),
            timestamp,
            duration: None,
            comment_type: None,
            comment_text: "check this".to_string(),
            created_at: String::new(),
        }
    }

    #[test]
    fn position_stays_in_range_for_out_of_range_timestamps() {
        assert_eq!(position_of(-5.0, 120.0), Some(0.0));
        assert_eq!(position_of(500.0, 120.0), Some(100.0));
        let mid = position_of(60.0, 120.0).unwrap();
        assert!((mid - 50.0).abs() < 1e-9);
    }

    #[test]
    fn position_undefined_for_unknown_duration() {
        assert_eq!(position_of(10.0, 0.0), None);
        assert_eq!(position_of(10.0, -1.0), None);
    }

    #[test]
    fn active_comment_first_match_wins() {
        let comments = vec![
            comment("C-1", "Intro", 10.0),
            comment("C-2", "Intro", 11.0),
        ];
        let active = active_comment_at(&comments, 10.5, 2.0).unwrap();
        assert_eq!(active.name, "C-1");
    }

    #[test]
    fn active_comment_none_outside_tolerance() {
        let comments = vec![comment("C-1", "Intro", 10.0)];
        assert!(active_comment_at(&comments, 60.0, 2.0).is_none());
    }

    #[test]
    fn tolerance_boundary_is_exclusive() {
        let comments = vec![comment("C-1", "Intro", 10.0)];
        assert!(active_comment_at(&comments, 12.0, 2.0).is_none());
        assert!(active_comment_at(&comments, 11.999, 2.0).is_some());
    }

    #[test]
    fn comments_for_unknown_video_is_empty() {
        let comments = vec![comment("C-1", "Intro", 10.0)];
        assert!(comments_for_video(&comments, "Video X").is_empty());
    }

    #[test]
    fn comments_sorted_by_timestamp() {
        let comments = vec![
            comment("C-2", "Intro", 90.0),
            comment("C-1", "Intro", 10.0),
            comment("C-3", "Other", 5.0),
        ];
        let sorted = comments_for_video(&comments, "Intro");
        assert_eq!(
            sorted.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["C-1", "C-2"]
        );
    }

    #[test]
    fn grouping_tolerates_dangling_references() {
        let videos = vec![Video {
            title: "Intro".to_string(),
            description: String::new(),
            video_file: "/files/intro.mp4".to_string(),
            duration: 120.0,
        }];
        let comments = vec![
            comment("C-1", "Intro", 10.0),
            comment("C-2", "Removed Video", 20.0),
        ];
        let grouped = group_by_video(&comments, &videos);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["Intro"].len(), 1);
    }

    #[test]
    fn spans_default_to_thirty_seconds() {
        let comments = vec![comment("C-1", "Intro", 10.0)];
        let spans = comment_spans(&comments, 120.0);
        assert_eq!(spans[0].start, 10.0);
        assert_eq!(spans[0].end, 40.0);
        assert!(spans[0].contains(25.0));
        assert!(!spans[0].contains(41.0));
    }

    #[test]
    fn spans_clip_at_video_end() {
        let mut late = comment("C-1", "Intro", 110.0);
        late.duration = Some(60.0);
        let binding = [late];
        let spans = comment_spans(&binding, 120.0);
        assert_eq!(spans[0].end, 120.0);
    }

    #[test]
    fn spans_allow_overlap_and_sort_by_start() {
        let comments = vec![
            comment("C-2", "Intro", 20.0),
            comment("C-1", "Intro", 10.0),
        ];
        let spans = comment_spans(&comments, 120.0);
        assert_eq!(spans[0].comment.name, "C-1");
        assert_eq!(spans[1].comment.name, "C-2");
        assert!(spans[0].end > spans[1].start);
    }
}
