//! Performance benchmarks for the analytics pipeline
//!
//! Targets:
//! - AnalyticsReport::compute(1000 sessions, quarter) → <5ms
//! - compute_subject_mastery(1000 sessions) → <2ms
//! - fetch_user_records(memory source) → <1ms

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use studyboard_core::analytics::compute_subject_mastery;
use studyboard_core::models::{AnalyticsEvent, Course, CourseStatus, TutoringSession};
use studyboard_core::{
    fetch_user_records, AnalyticsReport, MemorySource, QuadraticCurve, TimeRange, UserId,
    UserRecords,
};

const TOPICS: &[&str] = &[
    "Quadratic equations",
    "Python loops",
    "World War II",
    "Cell biology",
    "Watercolor basics",
    "Spanish grammar",
    "Startup finance",
    "Nutrition",
    "Reading notes",
];

/// Generate a learner with `count` sessions spread over `days`
fn generate_records(count: usize, days: usize) -> UserRecords {
    let now = Utc::now();
    let sessions = (0..count)
        .map(|i| {
            let ts = now - Duration::days((i % days) as i64) - Duration::minutes(i as i64);
            TutoringSession {
                id: format!("session-{}", i),
                topic: TOPICS[i % TOPICS.len()].to_string(),
                session_type: None,
                duration_seconds: 600 + (i as i64 % 40) * 60,
                quality_rating: (i % 3 != 0).then_some((i % 5 + 1) as f64),
                xp_earned: 25,
                feedback: None,
                created_at: ts,
                ended_at: None,
            }
        })
        .collect();

    let events = (0..count * 2)
        .map(|i| AnalyticsEvent {
            event_type: "page_view".to_string(),
            course_id: None,
            event_data: serde_json::Value::Null,
            created_at: now - Duration::hours((i % (days * 24)) as i64),
        })
        .collect();

    let courses = (0..20)
        .map(|i| Course {
            id: format!("course-{}", i),
            title: TOPICS[i % TOPICS.len()].to_string(),
            status: if i % 2 == 0 {
                CourseStatus::Completed
            } else {
                CourseStatus::Ready
            },
            course_type: None,
            created_at: now - Duration::days(i as i64),
        })
        .collect();

    UserRecords {
        sessions,
        events,
        courses,
        ..Default::default()
    }
}

/// Benchmark 1: full report with varying session counts
fn report_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("analytics_report");
    let curve = QuadraticCurve::default();
    let now = Utc::now();

    for count in [10, 100, 1000] {
        let records = generate_records(count, 90);
        group.bench_with_input(BenchmarkId::new("sessions", count), &records, |b, records| {
            b.iter(|| {
                black_box(AnalyticsReport::compute(
                    records,
                    TimeRange::Quarter,
                    now,
                    &curve,
                ))
            });
        });
    }

    group.finish();
}

/// Benchmark 2: keyword categorization dominates mastery
fn mastery_benchmark(c: &mut Criterion) {
    let records = generate_records(1000, 90);
    c.bench_function("subject_mastery_1000", |b| {
        b.iter(|| black_box(compute_subject_mastery(&records.sessions, &records.courses)));
    });
}

/// Benchmark 3: concurrent fetch against the in-memory store
fn fetch_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let source = MemorySource::new();
    let user = UserId::from("bench-user");
    source.insert_records(user.clone(), generate_records(1000, 90));

    c.bench_function("fetch_user_records_memory", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(
                fetch_user_records(&source, &user, TimeRange::Month, Utc::now())
                    .await
                    .expect("fetch"),
            )
        });
    });
}

criterion_group!(benches, report_benchmark, mastery_benchmark, fetch_benchmark);
criterion_main!(benches);
