//! Structured ISBAR evaluations ride inside ordinary comments: the scores are
//! rendered to text, prefixed with a marker for type discrimination, and
//! capped at the platform's comment length. The encoding is deliberately
//! lossy; display just strips the marker and shows the text verbatim.

use crate::error::{CoreError, Result};

pub const EVALUATION_MARKER: &str = "[EVALUATION]";
pub const MAX_COMMENT_LEN: usize = 2000;
pub const TRUNCATION_SUFFIX: &str = "... [TRUNCATED]";
/// Characters held back from the content so the suffix always fits.
const TRUNCATION_RESERVE: usize = 50;

pub const MAX_RATING: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationCategory {
    Identification,
    Situation,
    History,
    Examination,
    Assessment,
    Recommendation,
    GlobalRating,
}

impl EvaluationCategory {
    pub const ALL: [EvaluationCategory; 7] = [
        EvaluationCategory::Identification,
        EvaluationCategory::Situation,
        EvaluationCategory::History,
        EvaluationCategory::Examination,
        EvaluationCategory::Assessment,
        EvaluationCategory::Recommendation,
        EvaluationCategory::GlobalRating,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EvaluationCategory::Identification => "Identification",
            EvaluationCategory::Situation => "Situation",
            EvaluationCategory::History => "History",
            EvaluationCategory::Examination => "Examination",
            EvaluationCategory::Assessment => "Assessment",
            EvaluationCategory::Recommendation => "Recommendation",
            EvaluationCategory::GlobalRating => "Global Rating",
        }
    }

    /// Rubric wording for a 0-3 rating in this category.
    pub fn rating_label(&self, value: u8) -> &'static str {
        match self {
            EvaluationCategory::Identification => match value {
                0 => "Not demonstrated",
                1 => "Basic identification",
                2 => "Good identification",
                3 => "Excellent identification",
                _ => "Not selected",
            },
            EvaluationCategory::Situation => match value {
                0 => "Not demonstrated",
                1 => "Basic situation awareness",
                2 => "Good situation awareness",
                3 => "Excellent situation awareness",
                _ => "Not selected",
            },
            EvaluationCategory::History => match value {
                0 => "Not demonstrated",
                1 => "Minimal history taking",
                2 => "Adequate history taking",
                3 => "Comprehensive history",
                _ => "Not selected",
            },
            EvaluationCategory::Examination => match value {
                0 => "Not demonstrated",
                1 => "Limited examination",
                2 => "Systematic examination",
                3 => "Thorough examination",
                _ => "Not selected",
            },
            EvaluationCategory::Assessment => match value {
                0 => "Not demonstrated",
                1 => "Basic assessment",
                2 => "Good assessment",
                3 => "Excellent assessment",
                _ => "Not selected",
            },
            EvaluationCategory::Recommendation => match value {
                0 => "Not demonstrated",
                1 => "Basic recommendation",
                2 => "Good recommendation",
                3 => "Excellent recommendation",
                _ => "Not selected",
            },
            EvaluationCategory::GlobalRating => match value {
                0 => "Extensive questioning",
                1 => "Moderate questioning",
                2 => "Some questioning",
                3 => "Little/no questioning",
                _ => "Not selected",
            },
        }
    }
}

/// A seven-category Likert assessment plus free-text notes. Unrated
/// categories stay `None` and are excluded from the score rather than being
/// counted as zero.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub identification: Option<u8>,
    pub situation: Option<u8>,
    pub history: Option<u8>,
    pub examination: Option<u8>,
    pub assessment: Option<u8>,
    pub recommendation: Option<u8>,
    pub global_rating: Option<u8>,
    pub notes: String,
}

impl Evaluation {
    pub fn rating(&self, category: EvaluationCategory) -> Option<u8> {
        match category {
            EvaluationCategory::Identification => self.identification,
            EvaluationCategory::Situation => self.situation,
            EvaluationCategory::History => self.history,
            EvaluationCategory::Examination => self.examination,
            EvaluationCategory::Assessment => self.assessment,
            EvaluationCategory::Recommendation => self.recommendation,
            EvaluationCategory::GlobalRating => self.global_rating,
        }
    }

    pub fn rated_count(&self) -> usize {
        EvaluationCategory::ALL
            .iter()
            .filter(|c| self.rating(**c).is_some())
            .count()
    }

    /// Partial score `(total, max)` over the categories actually rated.
    pub fn partial_score(&self) -> (u32, u32) {
        let mut total = 0u32;
        let mut max = 0u32;
        for category in EvaluationCategory::ALL {
            if let Some(value) = self.rating(category) {
                total += u32::from(value);
                max += u32::from(MAX_RATING);
            }
        }
        (total, max)
    }

    /// Render the evaluation into comment text: marker, header, one line per
    /// rated category, the partial score, then notes. The result never
    /// exceeds [`MAX_COMMENT_LEN`] characters.
    pub fn encode(&self) -> Result<String> {
        if self.rated_count() == 0 && self.notes.trim().is_empty() {
            return Err(CoreError::Validation(
                "evaluation needs at least one rated category or a note".to_string(),
            ));
        }
        for category in EvaluationCategory::ALL {
            if let Some(value) = self.rating(category) {
                if value > MAX_RATING {
                    return Err(CoreError::Validation(format!(
                        "{} rating {value} is out of range 0-{MAX_RATING}",
                        category.label()
                    )));
                }
            }
        }

        let mut text = String::new();
        text.push_str(EVALUATION_MARKER);
        text.push_str(" Session Evaluation\n");

        for category in EvaluationCategory::ALL {
            if let Some(value) = self.rating(category) {
                text.push_str(&format!(
                    "{}: {value}/{MAX_RATING} ({})\n",
                    category.label(),
                    category.rating_label(value)
                ));
            }
        }

        let (total, max) = self.partial_score();
        text.push_str(&format!(
            "Score: {total}/{max} ({} of {} rated)\n",
            self.rated_count(),
            EvaluationCategory::ALL.len()
        ));

        let notes = self.notes.trim();
        if !notes.is_empty() {
            text.push_str("Notes: ");
            text.push_str(notes);
        }

        Ok(truncate_comment(text))
    }
}

/// Cap comment text at the platform limit, marking the cut. Counts are in
/// characters, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate_comment(text: String) -> String {
    if text.chars().count() <= MAX_COMMENT_LEN {
        return text;
    }
    let keep = MAX_COMMENT_LEN - TRUNCATION_RESERVE;
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

pub fn is_evaluation_comment(text: &str) -> bool {
    text.starts_with(EVALUATION_MARKER)
}

/// Text to show for a comment that may carry the evaluation marker.
pub fn display_text(text: &str) -> &str {
    text.strip_prefix(EVALUATION_MARKER)
        .map(str::trim_start)
        .unwrap_or(text)
}
