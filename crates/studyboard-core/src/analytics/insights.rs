//! Templated study insights
//!
//! Rule-based messages evaluated in a fixed order. Every rule whose guard
//! passes contributes one line; the list is cut to the first six. Tiered
//! rules (streak, trend, level, focus) are split into rules with mutually
//! exclusive guards so the table reads top to bottom.

use super::activity::DailyActivity;
use super::sessions::TopicCount;
use crate::models::TutoringSession;

pub const MAX_INSIGHTS: usize = 6;

/// Sessions looked at for the recent-trend rule
const TREND_WINDOW: usize = 3;
/// Rated sessions needed inside the trend window
const TREND_MIN_RATED: usize = 2;
/// Flashcards needed before the volume callout appears
const FLASHCARD_CALLOUT: usize = 20;

/// Inputs the insight rules read
#[derive(Debug, Clone, Default)]
pub struct InsightContext {
    pub current_streak: i64,
    /// Label and minutes of the busiest day in the activity series
    pub best_day: Option<(String, i64)>,
    /// Mean rating of the newest sessions, when enough of them are rated
    pub recent_rating: Option<f64>,
    pub top_topic: Option<TopicCount>,
    pub level: u32,
    pub level_title: String,
    pub total_xp: i64,
    pub focus_score: u32,
    pub total_cards: usize,
}

impl InsightContext {
    /// Busiest day by study minutes; the earliest day wins ties
    pub fn best_day(activity: &[DailyActivity]) -> Option<(String, i64)> {
        activity
            .iter()
            .fold(None::<&DailyActivity>, |best, day| match best {
                Some(b) if b.study_minutes >= day.study_minutes => Some(b),
                _ => Some(day),
            })
            .map(|day| (day.name.clone(), day.study_minutes))
    }

    /// Mean rating over the three newest sessions
    ///
    /// `None` unless there are at least three sessions and two of the newest
    /// three carry a rating.
    pub fn recent_rating(sessions: &[TutoringSession]) -> Option<f64> {
        if sessions.len() < TREND_WINDOW {
            return None;
        }
        let ratings: Vec<f64> = sessions
            .iter()
            .take(TREND_WINDOW)
            .filter_map(|s| s.quality_rating)
            .collect();
        if ratings.len() < TREND_MIN_RATED {
            return None;
        }
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}

/// One row of the insight table
pub struct InsightRule {
    pub name: &'static str,
    pub guard: fn(&InsightContext) -> bool,
    pub format: fn(&InsightContext) -> String,
}

/// Insight rules in output priority order
pub static INSIGHT_RULES: &[InsightRule] = &[
    InsightRule {
        name: "streak_incredible",
        guard: |c| c.current_streak >= 7,
        format: |c| {
            format!(
                "🔥 Incredible! You're on a {}-day study streak. Your consistency is paying off.",
                c.current_streak
            )
        },
    },
    InsightRule {
        name: "streak_keep_pushing",
        guard: |c| (3..7).contains(&c.current_streak),
        format: |c| {
            format!(
                "💪 {}-day streak! Keep pushing to reach a full week.",
                c.current_streak
            )
        },
    },
    InsightRule {
        name: "streak_start",
        guard: |c| c.current_streak == 0,
        format: |_| "📚 Start a study session today to begin building your streak.".to_string(),
    },
    InsightRule {
        name: "best_day",
        guard: |c| matches!(c.best_day, Some((_, minutes)) if minutes > 0),
        format: |c| {
            let (label, minutes) = c.best_day.clone().unwrap_or_default();
            format!(
                "📈 Your most productive day was {} with {} minutes of study.",
                label, minutes
            )
        },
    },
    InsightRule {
        name: "trend_excellent",
        guard: |c| c.recent_rating.is_some_and(|r| r >= 4.0),
        format: |c| {
            format!(
                "⭐ Excellent work! Your recent sessions average {:.1}/5.",
                c.recent_rating.unwrap_or_default()
            )
        },
    },
    InsightRule {
        name: "trend_solid",
        guard: |c| c.recent_rating.is_some_and(|r| (3.0..4.0).contains(&r)),
        format: |c| {
            format!(
                "👍 Solid progress. Your recent sessions average {:.1}/5.",
                c.recent_rating.unwrap_or_default()
            )
        },
    },
    InsightRule {
        name: "top_topic",
        guard: |c| c.top_topic.is_some(),
        format: |c| match &c.top_topic {
            Some(t) => format!(
                "🎯 Your most studied topic is \"{}\" with {} session{}.",
                t.topic,
                t.count,
                if t.count == 1 { "" } else { "s" }
            ),
            None => String::new(),
        },
    },
    InsightRule {
        name: "level_veteran",
        guard: |c| c.level >= 10,
        format: |c| {
            format!(
                "🏆 Level {} {}! You've earned {} XP so far.",
                c.level, c.level_title, c.total_xp
            )
        },
    },
    InsightRule {
        name: "level_rising",
        guard: |c| (5..10).contains(&c.level),
        format: |c| {
            format!(
                "🚀 You've reached level {}. Keep studying to unlock new titles.",
                c.level
            )
        },
    },
    InsightRule {
        name: "focus_high",
        guard: |c| c.focus_score >= 80,
        format: |c| {
            format!(
                "🧠 Outstanding focus score of {}! You're in the zone.",
                c.focus_score
            )
        },
    },
    InsightRule {
        name: "focus_medium",
        guard: |c| (50..80).contains(&c.focus_score),
        format: |c| {
            format!(
                "⚡ Your focus score is {}. Steadier sessions will push it higher.",
                c.focus_score
            )
        },
    },
    InsightRule {
        name: "focus_building",
        guard: |c| c.focus_score < 50,
        format: |c| {
            format!(
                "🌱 Your focus score is {}. You're still building your study habits.",
                c.focus_score
            )
        },
    },
    InsightRule {
        name: "flashcards",
        guard: |c| c.total_cards > FLASHCARD_CALLOUT,
        format: |c| {
            format!(
                "🃏 You've created {} flashcards. Regular review boosts retention.",
                c.total_cards
            )
        },
    },
];

/// Evaluate the rule table against `ctx`, keeping the first six matches
pub fn generate_insights(ctx: &InsightContext) -> Vec<String> {
    evaluate(INSIGHT_RULES, ctx)
}

/// Evaluate an arbitrary rule table, in order
pub fn evaluate(rules: &[InsightRule], ctx: &InsightContext) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.guard)(ctx))
        .map(|rule| {
            tracing::trace!(rule = rule.name, "Insight rule matched");
            (rule.format)(ctx)
        })
        .take(MAX_INSIGHTS)
        .collect()
}
