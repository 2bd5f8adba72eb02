/// Heuristic category of a comment, derived from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentCategory {
    Critical,
    Attention,
    Positive,
    Teaching,
    General,
}

impl CommentCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CommentCategory::Critical => "Critical",
            CommentCategory::Attention => "Attention",
            CommentCategory::Positive => "Positive",
            CommentCategory::Teaching => "Teaching",
            CommentCategory::General => "General",
        }
    }

    /// Single-character marker used on rendered timelines.
    pub fn glyph(&self) -> char {
        match self {
            CommentCategory::Critical => '!',
            CommentCategory::Attention => '?',
            CommentCategory::Positive => '+',
            CommentCategory::Teaching => '*',
            CommentCategory::General => 'o',
        }
    }
}

/// Keyword table checked top to bottom; the first category with any substring
/// hit wins. Safety-relevant categories sit above praise so a sentence mixing
/// both ("good catch, but this is dangerous") never classifies as positive.
const CATEGORY_KEYWORDS: &[(CommentCategory, &[&str])] = &[
    (
        CommentCategory::Critical,
        &[
            "critical",
            "dangerous",
            "danger",
            "severe",
            "urgent",
            "emergency",
            "fatal",
            "unsafe",
            "risk",
            "error",
            "mistake",
            "wrong",
            "incorrect",
            "\u{274c}",
        ],
    ),
    (
        CommentCategory::Attention,
        &[
            "attention",
            "warning",
            "caution",
            "careful",
            "watch",
            "monitor",
            "concern",
            "issue",
            "problem",
            "improve",
            "adjust",
            "\u{26a0}",
        ],
    ),
    (
        CommentCategory::Positive,
        &[
            "excellent",
            "good",
            "great",
            "perfect",
            "well done",
            "correct",
            "nice",
            "smooth",
            "effective",
            "proper",
            "\u{1f44d}",
            "\u{2713}",
        ],
    ),
    (
        CommentCategory::Teaching,
        &[
            "teaching",
            "learning",
            "technique",
            "method",
            "approach",
            "skill",
            "remember",
            "important",
            "note",
            "\u{1f4da}",
        ],
    ),
];

/// Classify free-text comment content into one category. This is a heuristic,
/// not an NLP pass: the only guarantee is the priority order of the table.
pub fn classify_comment(text: &str) -> CommentCategory {
    let text = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| text.contains(keyword)) {
            return *category;
        }
    }
    CommentCategory::General
}
