use crate::{
    annotations::{comment_spans, comments_for_video, position_of},
    classify::classify_comment,
    evaluation::{display_text, is_evaluation_comment},
    types::{Comment, SessionData},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// One text row of timeline: each comment drops its category glyph at its
/// proportional position. Returns a plain dashed bar when the duration is
/// still unknown.
pub fn render_timeline(comments: &[&Comment], duration: f64, width: usize) -> String {
    let width = width.max(2);
    let mut bar: Vec<char> = vec!['-'; width];
    for comment in comments {
        if let Some(percent) = position_of(comment.timestamp, duration) {
            let index = ((percent / 100.0) * (width - 1) as f64).round() as usize;
            bar[index.min(width - 1)] = classify_comment(&comment.comment_text).glyph();
        }
    }
    bar.into_iter().collect()
}

pub fn format_session_readable(data: &SessionData) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", data.session.title));
    output.push_str(&format!(
        "**Date:** {} | **Status:** {} | **Videos:** {}\n\n",
        data.session.session_date,
        data.session.status,
        data.videos.len()
    ));
    if !data.session.description.is_empty() {
        output.push_str(&data.session.description);
        output.push_str("\n\n");
    }

    for video in &data.videos {
        let comments = comments_for_video(&data.comments, &video.title);
        let (notes, evaluations): (Vec<&Comment>, Vec<&Comment>) = comments
            .into_iter()
            .partition(|c| !is_evaluation_comment(&c.comment_text));

        output.push_str(&format!("## {}\n\n", video.title));
        if !video.description.is_empty() {
            output.push_str(&format!("{}\n\n", video.description));
        }

        if video.duration > 0.0 {
            output.push_str(&format!(
                "|{}| {}\n\n",
                render_timeline(&notes, video.duration, 60),
                format_timestamp(video.duration)
            ));
        }

        if notes.is_empty() {
            output.push_str("No comments yet.\n\n");
        } else {
            let owned: Vec<Comment> = notes.iter().map(|c| (*c).clone()).collect();
            for span in comment_spans(&owned, video.duration) {
                let comment = span.comment;
                output.push_str(&format!(
                    "* [{}\u{2013}{}] {} \u{2014} {}: {}\n",
                    format_timestamp(span.start),
                    format_timestamp(span.end),
                    classify_comment(&comment.comment_text).label(),
                    comment.doctor_name.as_deref().unwrap_or(&comment.doctor),
                    comment.comment_text.trim()
                ));
            }
            output.push('\n');
        }

        for evaluation in &evaluations {
            output.push_str(&format!(
                "### Evaluation by {}\n\n{}\n\n",
                evaluation
                    .doctor_name
                    .as_deref()
                    .unwrap_or(&evaluation.doctor),
                display_text(&evaluation.comment_text).trim()
            ));
        }
    }

    output
}
