//! Unit tests for the analytics pipeline

use super::*;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::levels::QuadraticCurve;
use crate::models::{
    AnalyticsEvent, Assignment, Course, CourseStatus, FlashcardSet, Profile, Streak,
    TutoringSession, UserRecords,
};

fn now() -> DateTime<Utc> {
    // Friday
    Utc.with_ymd_and_hms(2026, 10, 16, 14, 30, 0).unwrap()
}

fn session(
    id: usize,
    topic: &str,
    created_at: DateTime<Utc>,
    rating: Option<f64>,
    duration_seconds: i64,
    xp: i64,
) -> TutoringSession {
    TutoringSession {
        id: format!("session-{}", id),
        topic: topic.to_string(),
        session_type: Some("chat".to_string()),
        duration_seconds,
        quality_rating: rating,
        xp_earned: xp,
        feedback: None,
        created_at,
        ended_at: Some(created_at + Duration::seconds(duration_seconds)),
    }
}

fn event(created_at: DateTime<Utc>) -> AnalyticsEvent {
    AnalyticsEvent {
        event_type: "page_view".to_string(),
        course_id: None,
        event_data: serde_json::Value::Null,
        created_at,
    }
}

fn course(title: &str, status: &str) -> Course {
    Course {
        id: format!("course-{}", title),
        title: title.to_string(),
        status: CourseStatus::from(status.to_string()),
        course_type: None,
        created_at: now() - Duration::days(20),
    }
}

fn compute(records: &UserRecords, range: TimeRange) -> AnalyticsReport {
    AnalyticsReport::compute(records, range, now(), &QuadraticCurve::default())
}

// ============================================================================
// Empty user
// ============================================================================

#[test]
fn test_empty_user_report() {
    let report = compute(&UserRecords::default(), TimeRange::Week);

    assert_eq!(report.stats.total_xp, 0);
    assert_eq!(report.stats.level, 1);
    assert_eq!(report.stats.focus_score, 13, "0 + 0 + 12.5 + 0 rounds to 13");
    assert_eq!(report.stats.avg_session_rating, 0.0);
    assert_eq!(report.stats.assignment_completion, 0);

    let mastery: Vec<(&str, u32, u32)> = report
        .subject_mastery_data
        .iter()
        .map(|s| (s.subject.as_str(), s.score, s.full_mark))
        .collect();
    assert_eq!(
        mastery,
        vec![("Study", 0, 100), ("Practice", 0, 100), ("Review", 0, 100)]
    );

    assert_eq!(report.ai_insights.len(), 2);
    assert!(report.ai_insights[0].contains("Start a study session today"));
    assert!(report.ai_insights[1].contains("focus score is 13"));

    assert!(report.top_topics.is_empty());
    assert!(report.session_stats.is_empty());
    assert!(report.recent_achievements.is_empty());
}

// ============================================================================
// Activity series
// ============================================================================

#[test]
fn test_single_session_today() {
    let records = UserRecords {
        sessions: vec![session(1, "Photosynthesis", now(), Some(5.0), 1800, 50)],
        ..Default::default()
    };
    let report = compute(&records, TimeRange::Week);

    let today = report.activity_data.last().unwrap();
    assert_eq!(today.name, "Fri");
    assert_eq!(today.study_minutes, 30);
    assert_eq!(today.sessions, 1);
    assert_eq!(today.xp_earned, 50);

    assert_eq!(report.stats.avg_session_rating, 5.0);
    assert_eq!(report.top_topics[0].topic, "Photosynthesis");
    assert_eq!(report.top_topics[0].count, 1);
}

#[test]
fn test_activity_length_matches_range() {
    let records = UserRecords::default();
    for (range, days) in [
        (TimeRange::Week, 7),
        (TimeRange::Month, 30),
        (TimeRange::Quarter, 90),
    ] {
        let report = compute(&records, range);
        assert_eq!(report.activity_data.len(), days);

        let dates: Vec<_> = report.activity_data.iter().map(|d| d.date).collect();
        assert_eq!(*dates.last().unwrap(), now().date_naive());
        for pair in dates.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }
}

#[test]
fn test_events_credit_two_minutes_and_out_of_window_is_dropped() {
    let records = UserRecords {
        sessions: vec![
            session(1, "Essay writing", now() - Duration::days(1), None, 600, 10),
            // Outside the 7-day window: no bucket
            session(2, "Essay writing", now() - Duration::days(10), None, 600, 10),
        ],
        events: vec![event(now()), event(now()), event(now() - Duration::days(1))],
        ..Default::default()
    };
    let report = compute(&records, TimeRange::Week);

    let yesterday = &report.activity_data[5];
    assert_eq!(yesterday.study_minutes, 10 + 2);
    assert_eq!(yesterday.sessions, 1);

    let today = &report.activity_data[6];
    assert_eq!(today.study_minutes, 4);
    assert_eq!(today.sessions, 0);

    let total_sessions: u32 = report.activity_data.iter().map(|d| d.sessions).sum();
    assert_eq!(total_sessions, 1);

    // Totals still count every session plus every event
    assert_eq!(report.stats.total_study_minutes, 20 + 6);
}

#[test]
fn test_month_labels() {
    let report = compute(&UserRecords::default(), TimeRange::Month);
    assert_eq!(report.activity_data.last().unwrap().name, "Oct 16");
    assert_eq!(report.activity_data[0].name, "Sep 17");
}

// ============================================================================
// Heatmap
// ============================================================================

#[test]
fn test_heatmap_is_fixed_ninety_days() {
    let records = UserRecords {
        sessions: vec![
            session(1, "Rust", now(), None, 60, 5),
            session(2, "Rust", now() - Duration::days(89), None, 60, 5),
            session(3, "Rust", now() - Duration::days(90), None, 60, 5),
        ],
        events: vec![event(now()), event(now() - Duration::days(3))],
        ..Default::default()
    };

    // Independent of the selected range
    for range in [TimeRange::Week, TimeRange::Quarter] {
        let heatmap = compute(&records, range).streak_heatmap;
        assert_eq!(heatmap.len(), 90);
        assert_eq!(heatmap[89].date, "2026-10-16");
        assert_eq!(heatmap[89].count, 2);
        assert_eq!(heatmap[86].count, 1);
        assert_eq!(heatmap[0].count, 1, "day 89 back is the first cell");
        let total: u32 = heatmap.iter().map(|d| d.count).sum();
        assert_eq!(total, 4, "day 90 back is dropped");

        let mut sorted = heatmap.iter().map(|d| d.date.clone()).collect::<Vec<_>>();
        sorted.sort();
        assert_eq!(
            sorted,
            heatmap.iter().map(|d| d.date.clone()).collect::<Vec<_>>()
        );
    }
}

// ============================================================================
// Courses and mastery
// ============================================================================

#[test]
fn test_course_progress_matches_totals() {
    let records = UserRecords {
        courses: vec![
            course("Calculus I", "completed"),
            course("World History", "processing"),
            course("Python", "ready"),
            course("Design", "uploaded"),
        ],
        ..Default::default()
    };
    let report = compute(&records, TimeRange::Week);
    let total: usize = report.course_progress_data.iter().map(|s| s.value).sum();
    assert_eq!(total, report.stats.total_courses);
    assert_eq!(report.course_progress_data[0].value, 1);
    assert_eq!(report.course_progress_data[1].value, 2);
    assert_eq!(report.course_progress_data[2].value, 1);
}

#[test]
fn test_subject_mastery_scores() {
    let records = UserRecords {
        sessions: vec![
            session(1, "Calculus limits", now(), Some(4.0), 600, 10),
            session(2, "Algebra review", now(), None, 600, 10),
        ],
        courses: vec![course("Python for beginners", "completed")],
        ..Default::default()
    };
    let report = compute(&records, TimeRange::Week);
    let mastery: Vec<(&str, u32)> = report
        .subject_mastery_data
        .iter()
        .map(|s| (s.subject.as_str(), s.score))
        .collect();
    // Mathematics: (80 + 50) / 2 = 65, Programming: 90
    assert_eq!(mastery, vec![("Programming", 90), ("Mathematics", 65)]);
}

#[test]
fn test_subject_mastery_keeps_top_six() {
    let topics = [
        "Calculus",
        "Python",
        "Ancient Rome",
        "Physics",
        "Music",
        "French",
        "Marketing",
        "Nutrition",
        "Misc notes",
    ];
    let sessions = topics
        .iter()
        .enumerate()
        .map(|(i, t)| session(i, t, now(), Some(5.0 - (i as f64) * 0.5), 60, 1))
        .collect();
    let records = UserRecords {
        sessions,
        ..Default::default()
    };
    let mastery = compute(&records, TimeRange::Week).subject_mastery_data;
    assert_eq!(mastery.len(), 6);
    assert_eq!(mastery[0].subject, "Mathematics");
    assert!(mastery.windows(2).all(|w| w[0].score >= w[1].score));
}

// ============================================================================
// Weekly sessions and topics
// ============================================================================

#[test]
fn test_weekly_sessions_sort_by_label_string() {
    // Week starts: Sun Oct 11, Sun Oct 4, Sun Sep 27
    let records = UserRecords {
        sessions: vec![
            session(1, "A", now(), Some(4.0), 600, 20),
            session(2, "A", now() - Duration::days(1), Some(5.0), 600, 30),
            session(3, "B", now() - Duration::days(8), None, 600, 10),
            session(4, "C", now() - Duration::days(15), Some(3.0), 600, 15),
        ],
        ..Default::default()
    };
    let weeks = compute(&records, TimeRange::Week).session_stats;
    let labels: Vec<&str> = weeks.iter().map(|w| w.week.as_str()).collect();
    assert_eq!(labels, vec!["Oct 11", "Oct 4", "Sep 27"]);

    assert_eq!(weeks[0].sessions, 2);
    assert_eq!(weeks[0].xp, 50);
    assert_eq!(weeks[0].avg_rating, 4.5);
    assert_eq!(weeks[1].avg_rating, 0.0);
    assert_eq!(weeks[2].avg_rating, 3.0);
}

#[test]
fn test_weekly_sessions_only_newest_fifty_and_last_eight() {
    // 70 sessions, one per day going back; only the newest 50 count
    let sessions: Vec<TutoringSession> = (0..70)
        .map(|i| session(i, "Drill", now() - Duration::days(i as i64), None, 60, 1))
        .collect();
    let records = UserRecords {
        sessions,
        ..Default::default()
    };
    let weeks = compute(&records, TimeRange::Week).session_stats;
    assert_eq!(weeks.len(), 8);
    let counted: u32 = weeks.iter().map(|w| w.sessions).sum();
    assert!(counted <= 50);
    let mut sorted: Vec<String> = weeks.iter().map(|w| w.week.clone()).collect();
    sorted.sort();
    assert_eq!(sorted, weeks.iter().map(|w| w.week.clone()).collect::<Vec<_>>());
}

#[test]
fn test_top_topics_ranked_and_capped() {
    let mut sessions = Vec::new();
    let counts = [("Calculus", 4), ("Biology", 2), ("French", 3), ("Art", 1), ("Rust", 5), ("Chess", 1)];
    let mut id = 0;
    for (topic, count) in counts {
        for _ in 0..count {
            id += 1;
            sessions.push(session(id, topic, now(), None, 60, 1));
        }
    }
    // Raw strings are not folded: a differently cased topic is its own entry
    sessions.push(session(99, "calculus", now(), None, 60, 1));

    let records = UserRecords {
        sessions,
        ..Default::default()
    };
    let topics = compute(&records, TimeRange::Week).top_topics;
    let ranked: Vec<(&str, u32)> = topics.iter().map(|t| (t.topic.as_str(), t.count)).collect();
    assert_eq!(
        ranked,
        vec![("Rust", 5), ("Calculus", 4), ("French", 3), ("Biology", 2), ("Art", 1)]
    );
}

#[test]
fn test_top_topics_skip_empty_topic() {
    let mut sessions: Vec<TutoringSession> = (0..3)
        .map(|i| session(i, "", now(), None, 60, 1))
        .collect();
    sessions.push(session(10, "Chess", now(), None, 60, 1));

    let records = UserRecords {
        sessions,
        ..Default::default()
    };
    let topics = compute(&records, TimeRange::Week).top_topics;
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].topic, "Chess");
    assert_eq!(topics[0].count, 1);
}

// ============================================================================
// Stats, insights, idempotence
// ============================================================================

#[test]
fn test_recent_rating_between_three_and_four_is_solid() {
    let sessions: Vec<TutoringSession> = [3.0, 4.0, 3.0]
        .into_iter()
        .enumerate()
        .map(|(i, rating)| {
            session(i, "Algebra", now() - Duration::hours(i as i64), Some(rating), 600, 10)
        })
        .collect();
    let records = UserRecords {
        sessions,
        ..Default::default()
    };

    let insights = compute(&records, TimeRange::Week).ai_insights;
    let solid: Vec<&String> = insights
        .iter()
        .filter(|i| i.contains("Solid progress"))
        .collect();
    assert_eq!(solid.len(), 1);
    assert!(solid[0].contains("3.3/5"));
    assert!(!insights.iter().any(|i| i.contains("Excellent work")));
}

#[test]
fn test_rich_user_stats_and_insights() {
    let sessions: Vec<TutoringSession> = (0..12)
        .map(|i| session(i, "Calculus", now() - Duration::days(i as i64 % 5), Some(5.0), 1200, 40))
        .collect();
    let records = UserRecords {
        profile: Some(Profile {
            id: "user-1".to_string(),
            total_xp: 12_100,
            display_name: Some("Ada".to_string()),
        }),
        streak: Some(Streak {
            current_streak: 8,
            longest_streak: 15,
        }),
        sessions,
        assignments: vec![
            Assignment {
                id: "a1".to_string(),
                status: "completed".to_string(),
                due_date: None,
            },
            Assignment {
                id: "a2".to_string(),
                status: "pending".to_string(),
                due_date: None,
            },
        ],
        flashcard_sets: vec![FlashcardSet {
            id: "f1".to_string(),
            title: "Derivatives".to_string(),
            cards: vec![serde_json::json!({"front": "d/dx x^2", "back": "2x"}); 30],
            created_at: now(),
        }],
        ..Default::default()
    };
    let report = compute(&records, TimeRange::Month);

    assert_eq!(report.stats.level, 12);
    assert_eq!(report.stats.assignment_completion, 50);
    assert_eq!(report.stats.total_cards, 30);
    // 25 + 25 + 12.5 + 25
    assert_eq!(report.stats.focus_score, 88);

    assert!(report.ai_insights.len() <= 6);
    assert!(report.ai_insights[0].contains("8-day study streak"));
    assert!(report.ai_insights.iter().any(|i| i.contains("Excellent work")));
    assert!(report.ai_insights.iter().any(|i| i.contains("\"Calculus\"")));
}

#[test]
fn test_focus_score_bounds() {
    for streak in [0, 2, 7, 40] {
        for sessions in [0usize, 3, 10, 25] {
            let records = UserRecords {
                streak: Some(Streak {
                    current_streak: streak,
                    longest_streak: streak,
                }),
                sessions: (0..sessions)
                    .map(|i| session(i, "Topic", now(), Some(1.0 + (i % 5) as f64), 60, 1))
                    .collect(),
                ..Default::default()
            };
            let score = compute(&records, TimeRange::Week).stats.focus_score;
            assert!(score <= 100);
        }
    }
}

#[test]
fn test_report_is_idempotent() {
    let records = UserRecords {
        sessions: vec![
            session(1, "Geometry", now(), Some(4.0), 900, 25),
            session(2, "Spanish", now() - Duration::days(2), Some(3.0), 1500, 30),
        ],
        courses: vec![course("Spanish A1", "processing")],
        events: vec![event(now() - Duration::hours(3))],
        ..Default::default()
    };

    let first = serde_json::to_string(&compute(&records, TimeRange::Month)).unwrap();
    let second = serde_json::to_string(&compute(&records, TimeRange::Month)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_json_field_names() {
    let value = serde_json::to_value(compute(&UserRecords::default(), TimeRange::Week)).unwrap();
    for key in [
        "stats",
        "activityData",
        "courseProgressData",
        "subjectMasteryData",
        "streakHeatmap",
        "sessionStats",
        "topTopics",
        "aiInsights",
        "recentAchievements",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert!(value["stats"].get("focusScore").is_some());
    assert!(value["stats"].get("totalXP").is_some());
    assert!(value["activityData"][0].get("studyMinutes").is_some());
    assert!(value["activityData"][0].get("date").is_none());
    assert!(value["subjectMasteryData"][0].get("fullMark").is_some());
}
