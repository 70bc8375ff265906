//! Subject mastery: free-text topics and course titles folded into fixed
//! categories
//!
//! The category table is ordered; the first pattern that matches wins and
//! anything unmatched lands in "General Study".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Course, TutoringSession};

pub const FALLBACK_CATEGORY: &str = "General Study";
pub const FULL_MARK: u32 = 100;
pub const MAX_SUBJECTS: usize = 6;

/// Contribution of a session that has no rating
const UNRATED_SESSION_SCORE: f64 = 50.0;
/// Multiplier turning a 1-5 rating into a 0-100 score
const RATING_WEIGHT: f64 = 20.0;
const COMPLETED_COURSE_SCORE: f64 = 90.0;
const OPEN_COURSE_SCORE: f64 = 50.0;

/// Shown instead of an empty chart when there is nothing to score
const PLACEHOLDER_SUBJECTS: [&str; 3] = ["Study", "Practice", "Review"];

pub struct CategoryRule {
    pub category: &'static str,
    pub pattern: Regex,
}

/// Keyword table in priority order
const CATEGORY_PATTERNS: &[(&str, &str)] = &[
    (
        "Mathematics",
        r"(?i)math|algebra|calculus|geometry|statistic|trigonometry|equation|arithmetic",
    ),
    (
        "Programming",
        r"(?i)programming|coding|\bcode|python|javascript|typescript|\bjava\b|\brust\b|software|algorithm|computer|web dev",
    ),
    (
        "History",
        r"(?i)histor|\bwar\b|civilization|ancient|revolution|empire|medieval",
    ),
    (
        "Science",
        r"(?i)science|physics|chemistry|biology|ecology|astronomy|genetics|\blab\b",
    ),
    (
        "Creative Arts",
        r"(?i)\bart\b|\barts\b|music|drawing|painting|design|creative|photography",
    ),
    (
        "Language",
        r"(?i)language|english|spanish|french|german|grammar|vocabulary|literature|writing",
    ),
    (
        "Business",
        r"(?i)business|marketing|finance|economics|accounting|management|entrepreneur",
    ),
    (
        "Health",
        r"(?i)health|medicine|medical|anatomy|nutrition|fitness|psychology|wellness",
    ),
];

/// Compiled [`CATEGORY_PATTERNS`]; a pattern that fails to compile is logged
/// and left out
pub static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    CATEGORY_PATTERNS
        .iter()
        .filter_map(|&(category, pattern)| match Regex::new(pattern) {
            Ok(pattern) => Some(CategoryRule { category, pattern }),
            Err(e) => {
                tracing::warn!(category, error = %e, "Skipping invalid category pattern");
                None
            }
        })
        .collect()
});

/// Map free text to its category, falling back to "General Study"
pub fn categorize(text: &str) -> &'static str {
    CATEGORY_RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.category)
        .unwrap_or(FALLBACK_CATEGORY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMastery {
    pub subject: String,
    pub score: u32,
    pub full_mark: u32,
}

#[derive(Default)]
struct Accumulator {
    total: f64,
    count: u32,
}

/// Score each category from sessions and courses, best six first
pub fn compute_subject_mastery(
    sessions: &[TutoringSession],
    courses: &[Course],
) -> Vec<SubjectMastery> {
    // Insertion order keeps equal scores in a stable order
    let mut order: Vec<&'static str> = Vec::new();
    let mut totals: HashMap<&'static str, Accumulator> = HashMap::new();

    let mut add = |category: &'static str, score: f64| {
        let acc = totals.entry(category).or_insert_with(|| {
            order.push(category);
            Accumulator::default()
        });
        acc.total += score;
        acc.count += 1;
    };

    for session in sessions {
        let score = session
            .quality_rating
            .map_or(UNRATED_SESSION_SCORE, |r| r * RATING_WEIGHT);
        add(categorize(&session.topic), score);
    }

    for course in courses {
        let score = if course.status.is_completed() {
            COMPLETED_COURSE_SCORE
        } else {
            OPEN_COURSE_SCORE
        };
        add(categorize(&course.title), score);
    }

    if order.is_empty() {
        return PLACEHOLDER_SUBJECTS
            .iter()
            .map(|subject| SubjectMastery {
                subject: subject.to_string(),
                score: 0,
                full_mark: FULL_MARK,
            })
            .collect();
    }

    let mut subjects: Vec<SubjectMastery> = order
        .into_iter()
        .filter_map(|category| {
            let acc = totals.get(category)?;
            Some(SubjectMastery {
                subject: category.to_string(),
                score: (acc.total / f64::from(acc.count)).round().max(0.0) as u32,
                full_mark: FULL_MARK,
            })
        })
        .collect();

    subjects.sort_by(|a, b| b.score.cmp(&a.score));
    subjects.truncate(MAX_SUBJECTS);
    subjects
}
