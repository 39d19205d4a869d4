//! XP and level system
//!
//! Defines level thresholds and titles. Total XP is the sum of the XP ledger;
//! a user's level is derived from it and never stored.

use serde::{Deserialize, Serialize};

/// Level definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    pub xp_required: i64,
    pub title: &'static str,
}

/// All level definitions (must be sorted by level)
pub static LEVELS: &[Level] = &[
    Level {
        level: 1,
        xp_required: 0,
        title: "Seedling",
    },
    Level {
        level: 2,
        xp_required: 50,
        title: "Sprout",
    },
    Level {
        level: 3,
        xp_required: 120,
        title: "Sprout",
    },
    Level {
        level: 4,
        xp_required: 220,
        title: "Sapling",
    },
    Level {
        level: 5,
        xp_required: 350,
        title: "Sapling",
    },
    Level {
        level: 6,
        xp_required: 520,
        title: "Young Tree",
    },
    Level {
        level: 7,
        xp_required: 730,
        title: "Young Tree",
    },
    Level {
        level: 8,
        xp_required: 1000,
        title: "Strong Oak",
    },
    Level {
        level: 9,
        xp_required: 1350,
        title: "Strong Oak",
    },
    Level {
        level: 10,
        xp_required: 1800,
        title: "Wise Oak",
    },
    Level {
        level: 11,
        xp_required: 2400,
        title: "Forest Keeper",
    },
    Level {
        level: 12,
        xp_required: 3200,
        title: "Forest Keeper",
    },
    Level {
        level: 13,
        xp_required: 4200,
        title: "Guardian",
    },
    Level {
        level: 14,
        xp_required: 5500,
        title: "Guardian",
    },
    Level {
        level: 15,
        xp_required: 7000,
        title: "Values Champion",
    },
];

impl Level {
    /// Level and title for the given XP. Negative XP counts as zero.
    pub fn for_xp(xp: i64) -> &'static Level {
        LEVELS
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&LEVELS[0])
    }

    /// XP needed for the next level (None if max level)
    pub fn xp_for_next(current_level: u32) -> Option<i64> {
        LEVELS
            .iter()
            .find(|l| l.level == current_level + 1)
            .map(|l| l.xp_required)
    }

    pub fn max_level() -> u32 {
        LEVELS.last().map(|l| l.level).unwrap_or(1)
    }
}

/// A user's position on the level ladder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LevelProgress {
    pub level: u32,
    pub title: String,
    pub total_xp: i64,
    /// XP at which the current level starts
    pub current_level_xp: i64,
    /// XP at which the next level starts (None at max level)
    pub next_level_xp: Option<i64>,
    /// Fraction of the way to the next level, 0.0 - 1.0
    pub progress: f32,
}

impl LevelProgress {
    pub fn new(total_xp: i64) -> Self {
        let info = Level::for_xp(total_xp);
        let next = Level::xp_for_next(info.level);
        let progress = match next {
            Some(next) => {
                let span = next - info.xp_required;
                let into = total_xp.max(0) - info.xp_required;
                if span <= 0 {
                    1.0
                } else {
                    (into as f32 / span as f32).clamp(0.0, 1.0)
                }
            }
            None => 1.0,
        };

        Self {
            level: info.level,
            title: info.title.to_string(),
            total_xp,
            current_level_xp: info.xp_required,
            next_level_xp: next,
            progress,
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_xp.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_sorted_and_start_at_zero() {
        assert_eq!(LEVELS[0].xp_required, 0);
        for pair in LEVELS.windows(2) {
            assert_eq!(pair[1].level, pair[0].level + 1);
            assert!(pair[1].xp_required > pair[0].xp_required);
        }
    }

    #[test]
    fn test_level_for_xp() {
        assert_eq!(Level::for_xp(0).level, 1);
        assert_eq!(Level::for_xp(49).level, 1);
        assert_eq!(Level::for_xp(50).level, 2);
        assert_eq!(Level::for_xp(120).level, 3);
        assert_eq!(Level::for_xp(7000).level, 15);
        assert_eq!(Level::for_xp(1_000_000).level, Level::max_level());
        assert_eq!(Level::for_xp(-10).level, 1);
    }

    #[test]
    fn test_level_progress() {
        // Between level 2 (50) and level 3 (120)
        let p = LevelProgress::new(85);
        assert_eq!(p.level, 2);
        assert_eq!(p.title, "Sprout");
        assert_eq!(p.next_level_xp, Some(120));
        assert!((p.progress - 0.5).abs() < 0.01);
    }

    #[test]
    fn max_level_progress_is_full() {
        let p = LevelProgress::new(9_999);
        assert!(p.is_max_level());
        assert_eq!(p.progress, 1.0);
    }
}
