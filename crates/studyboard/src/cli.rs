//! Terminal rendering for `studyboard report`

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use studyboard_core::analytics::{DailyActivity, SubjectMastery};
use studyboard_core::{AnalyticsReport, TimeRange};

/// Render a report as pretty JSON or as summary tables
pub fn format_report(
    report: &AnalyticsReport,
    range: TimeRange,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    }

    let mut out = Vec::new();
    out.push(format_stats(report, no_color));
    out.push(format!("\nActivity ({} days)", range.days()));
    out.push(format_activity(&report.activity_data, no_color));
    out.push("\nSubject mastery".to_string());
    out.push(format_mastery(&report.subject_mastery_data, no_color));

    if !report.top_topics.is_empty() {
        let topics: Vec<String> = report
            .top_topics
            .iter()
            .map(|t| format!("{} ({})", t.topic, t.count))
            .collect();
        out.push(format!("\nTop topics: {}", topics.join(", ")));
    }

    out.push("\nInsights".to_string());
    for insight in &report.ai_insights {
        out.push(format!("  • {}", insight));
    }

    if !report.recent_achievements.is_empty() {
        out.push("\nRecent achievements".to_string());
        for a in &report.recent_achievements {
            out.push(format!(
                "  {} {} (+{} XP, {})",
                a.icon,
                a.title,
                a.xp_reward,
                a.unlocked_at.format("%Y-%m-%d")
            ));
        }
    }

    out.join("\n")
}

fn header(labels: &[&str], no_color: bool) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| {
            let cell = Cell::new(l);
            if no_color {
                cell
            } else {
                cell.fg(Color::Cyan)
            }
        })
        .collect()
}

fn format_stats(report: &AnalyticsReport, no_color: bool) -> String {
    let s = &report.stats;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Metric", "Value"], no_color));

    let name = s.display_name.as_deref().unwrap_or("-");
    let rows: Vec<(&str, String)> = vec![
        ("Learner", name.to_string()),
        (
            "Level",
            format!("{} {} ({}%)", s.level, s.level_title, s.xp_progress.progress),
        ),
        ("Total XP", s.total_xp.to_string()),
        (
            "Streak",
            format!("{} days (best {})", s.current_streak, s.longest_streak),
        ),
        (
            "Sessions",
            format!("{} ({} min)", s.total_sessions, s.total_study_minutes),
        ),
        ("Avg rating", format!("{:.1}", s.avg_session_rating)),
        (
            "Courses",
            format!(
                "{} ({} done, {} active)",
                s.total_courses, s.completed_courses, s.in_progress_courses
            ),
        ),
        (
            "Flashcards",
            format!("{} cards in {} sets", s.total_cards, s.total_flashcard_sets),
        ),
        (
            "Assignments",
            format!(
                "{}/{} ({}%)",
                s.completed_assignments, s.total_assignments, s.assignment_completion
            ),
        ),
        ("Focus score", s.focus_score.to_string()),
    ];

    for (label, value) in rows {
        table.add_row(Row::from(vec![label.to_string(), value]));
    }
    table.to_string()
}

fn format_activity(days: &[DailyActivity], no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Day", "Minutes", "Sessions", "XP"], no_color));

    // Quarter views only list days with activity
    let active_only = days.len() > 31;
    for day in days.iter().filter(|d| !active_only || d.study_minutes > 0) {
        table.add_row(Row::from(vec![
            day.name.clone(),
            day.study_minutes.to_string(),
            day.sessions.to_string(),
            day.xp_earned.to_string(),
        ]));
    }
    table.to_string()
}

fn format_mastery(subjects: &[SubjectMastery], no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Subject", "Score"], no_color));
    for subject in subjects {
        table.add_row(Row::from(vec![
            subject.subject.clone(),
            format!("{}/{}", subject.score, subject.full_mark),
        ]));
    }
    table.to_string()
}
