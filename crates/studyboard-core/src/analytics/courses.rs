//! Course status breakdown for the progress donut

use serde::Serialize;

use crate::models::Course;

pub const COMPLETED_COLOR: &str = "#10b981";
pub const IN_PROGRESS_COLOR: &str = "#6366f1";
pub const NOT_STARTED_COLOR: &str = "#94a3b8";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSlice {
    pub name: &'static str,
    pub value: usize,
    pub color: &'static str,
}

/// Completed / In Progress / Not Started, in that order
///
/// Not Started is the remainder and never goes below zero.
pub fn compute_course_progress(courses: &[Course]) -> Vec<CourseSlice> {
    let completed = courses.iter().filter(|c| c.status.is_completed()).count();
    let in_progress = courses.iter().filter(|c| c.status.is_in_progress()).count();
    let not_started = courses.len().saturating_sub(completed + in_progress);

    vec![
        CourseSlice {
            name: "Completed",
            value: completed,
            color: COMPLETED_COLOR,
        },
        CourseSlice {
            name: "In Progress",
            value: in_progress,
            color: IN_PROGRESS_COLOR,
        },
        CourseSlice {
            name: "Not Started",
            value: not_started,
            color: NOT_STARTED_COLOR,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseStatus;
    use chrono::Utc;

    fn course(status: &str) -> Course {
        Course {
            id: format!("course-{}", status),
            title: "Course".to_string(),
            status: CourseStatus::from(status.to_string()),
            course_type: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let courses = vec![
            course("completed"),
            course("processing"),
            course("ready"),
            course("draft"),
            course("failed"),
        ];
        let slices = compute_course_progress(&courses);
        let values: Vec<usize> = slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1, 2, 2]);
        assert_eq!(values.iter().sum::<usize>(), courses.len());
    }

    #[test]
    fn test_empty_courses() {
        let slices = compute_course_progress(&[]);
        assert_eq!(slices.len(), 3);
        assert!(slices.iter().all(|s| s.value == 0));
        assert_eq!(slices[1].name, "In Progress");
    }
}
