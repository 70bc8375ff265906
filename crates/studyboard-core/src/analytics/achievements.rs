//! Recently unlocked achievements

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::AchievementUnlock;

pub const MAX_ACHIEVEMENTS: usize = 6;

pub const FALLBACK_TITLE: &str = "Achievement Unlocked";
pub const FALLBACK_DESCRIPTION: &str = "You earned a new achievement.";
pub const FALLBACK_ICON: &str = "🏆";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAchievement {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: i64,
    #[serde(rename = "unlockedAt")]
    pub unlocked_at: DateTime<Utc>,
}

/// Map unlocks (newest first) to display entries, filling gaps in the
/// joined definition with fallbacks
pub fn recent_achievements(unlocks: &[AchievementUnlock]) -> Vec<RecentAchievement> {
    unlocks
        .iter()
        .take(MAX_ACHIEVEMENTS)
        .map(|unlock| {
            let def = unlock.achievement.clone().unwrap_or_else(|| {
                tracing::warn!(
                    unlocked_at = %unlock.unlocked_at,
                    "Achievement unlock has no definition, using fallback"
                );
                Default::default()
            });

            RecentAchievement {
                title: def.title.unwrap_or_else(|| FALLBACK_TITLE.to_string()),
                description: def
                    .description
                    .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
                icon: def.icon.unwrap_or_else(|| FALLBACK_ICON.to_string()),
                xp_reward: def.xp_reward.unwrap_or(0),
                unlocked_at: unlock.unlocked_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AchievementDefinition;
    use chrono::Duration;

    #[test]
    fn test_missing_definition_uses_fallbacks() {
        let now = Utc::now();
        let unlocks = vec![
            AchievementUnlock {
                unlocked_at: now,
                achievement: None,
            },
            AchievementUnlock {
                unlocked_at: now - Duration::days(1),
                achievement: Some(AchievementDefinition {
                    title: Some("Week Warrior".to_string()),
                    description: None,
                    icon: Some("⚔️".to_string()),
                    xp_reward: Some(100),
                }),
            },
        ];

        let recent = recent_achievements(&unlocks);
        assert_eq!(recent[0].title, FALLBACK_TITLE);
        assert_eq!(recent[0].icon, FALLBACK_ICON);
        assert_eq!(recent[0].xp_reward, 0);
        assert_eq!(recent[1].title, "Week Warrior");
        assert_eq!(recent[1].description, FALLBACK_DESCRIPTION);
        assert_eq!(recent[1].xp_reward, 100);
    }

    #[test]
    fn test_caps_at_six() {
        let now = Utc::now();
        let unlocks: Vec<AchievementUnlock> = (0..9)
            .map(|i| AchievementUnlock {
                unlocked_at: now - Duration::hours(i),
                achievement: None,
            })
            .collect();
        assert_eq!(recent_achievements(&unlocks).len(), MAX_ACHIEVEMENTS);
    }
}
