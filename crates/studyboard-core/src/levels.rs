//! XP → level progression
//!
//! The analytics pipeline only sees the `LevelCurve` trait, so the
//! progression rules can be swapped without touching the aggregation.

use serde::{Deserialize, Serialize};

/// Progress inside the current level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpProgress {
    /// XP earned since the current level started
    pub current: i64,
    /// XP span of the current level
    pub needed: i64,
    /// `current / needed` as a rounded percentage (0-100)
    pub progress: u32,
}

/// Deterministic, monotonic mapping from total XP to a level
pub trait LevelCurve: Send + Sync {
    fn level(&self, xp: i64) -> u32;

    fn progress_to_next(&self, xp: i64) -> XpProgress;

    fn title(&self, level: u32) -> &str;
}

/// Level titles, ordered by the level they unlock at
const LEVEL_TITLES: &[(u32, &str)] = &[
    (1, "Novice Learner"),
    (3, "Curious Mind"),
    (5, "Dedicated Student"),
    (10, "Knowledge Seeker"),
    (15, "Scholar"),
    (20, "Expert Learner"),
    (30, "Master Scholar"),
    (50, "Grand Scholar"),
];

/// Quadratic curve: level `n` starts at `step * (n - 1)^2` XP
#[derive(Debug, Clone, Copy)]
pub struct QuadraticCurve {
    step: i64,
}

impl QuadraticCurve {
    pub const DEFAULT_STEP: i64 = 100;

    pub fn new(step: i64) -> Self {
        Self { step: step.max(1) }
    }

    /// XP at which `level` begins, saturating at `i64::MAX`
    pub fn threshold(&self, level: u32) -> i64 {
        i64::try_from(self.wide_threshold(level)).unwrap_or(i64::MAX)
    }

    fn wide_threshold(&self, level: u32) -> i128 {
        let n = i128::from(level.saturating_sub(1));
        i128::from(self.step).saturating_mul(n * n)
    }
}

impl Default for QuadraticCurve {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}

impl LevelCurve for QuadraticCurve {
    fn level(&self, xp: i64) -> u32 {
        let xp = i128::from(xp.max(0));
        let mut level = ((xp as f64 / self.step as f64).sqrt().floor() as u32).saturating_add(1);
        // Float sqrt can land one off near perfect squares
        while level > 1 && self.wide_threshold(level) > xp {
            level -= 1;
        }
        while self.wide_threshold(level + 1) <= xp {
            level += 1;
        }
        level
    }

    fn progress_to_next(&self, xp: i64) -> XpProgress {
        let xp = xp.max(0);
        let level = self.level(xp);
        let start = self.threshold(level);
        let needed = self.threshold(level + 1) - start;
        let current = xp - start;
        let progress = ((current as f64 / needed as f64) * 100.0).round().clamp(0.0, 100.0) as u32;

        XpProgress {
            current,
            needed,
            progress,
        }
    }

    fn title(&self, level: u32) -> &str {
        LEVEL_TITLES
            .iter()
            .rev()
            .find(|(min, _)| level >= *min)
            .map(|(_, title)| *title)
            .unwrap_or(LEVEL_TITLES[0].1)
    }
}
