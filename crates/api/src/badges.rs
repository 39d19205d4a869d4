//! Badge rules and evaluation
//!
//! Every badge in the catalogue carries one rule and a threshold. A badge is
//! earned when `stat(rule) >= threshold`; evaluation is a pure function of the
//! user's aggregate statistics and the set of badges already held.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::BadgeResponse;

/// Aggregate activity statistics for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ActivityStats {
    pub lessons_completed: i64,
    pub quizzes_passed: i64,
    pub perfect_quizzes: i64,
    pub total_xp: i64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub challenges_completed: i64,
    pub level: u32,
}

/// Predicate kind a badge is awarded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeRule {
    LessonsCompleted,
    QuizzesPassed,
    PerfectQuizzes,
    TotalXp,
    SigninStreak,
    ChallengesCompleted,
    LevelReached,
}

impl BadgeRule {
    pub const ALL: [BadgeRule; 7] = [
        Self::LessonsCompleted,
        Self::QuizzesPassed,
        Self::PerfectQuizzes,
        Self::TotalXp,
        Self::SigninStreak,
        Self::ChallengesCompleted,
        Self::LevelReached,
    ];

    /// String form stored in `badges.rule`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::QuizzesPassed => "quizzes_passed",
            Self::PerfectQuizzes => "perfect_quizzes",
            Self::TotalXp => "total_xp",
            Self::SigninStreak => "signin_streak",
            Self::ChallengesCompleted => "challenges_completed",
            Self::LevelReached => "level_reached",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// The statistic this rule compares against its threshold.
    pub fn measure(&self, stats: &ActivityStats) -> i64 {
        match self {
            Self::LessonsCompleted => stats.lessons_completed,
            Self::QuizzesPassed => stats.quizzes_passed,
            Self::PerfectQuizzes => stats.perfect_quizzes,
            Self::TotalXp => stats.total_xp,
            // A streak badge holds once reached, even after the streak lapses.
            Self::SigninStreak => i64::from(stats.current_streak.max(stats.best_streak)),
            Self::ChallengesCompleted => stats.challenges_completed,
            Self::LevelReached => i64::from(stats.level),
        }
    }
}

impl std::fmt::Display for BadgeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalogue entry with its rule parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub rule: BadgeRule,
    pub threshold: i64,
    pub xp_bonus: i64,
}

impl BadgeDefinition {
    /// Parse a catalogue row. Rows with an unknown rule yield `None`.
    pub fn from_response(badge: &BadgeResponse) -> Option<Self> {
        let Some(rule) = BadgeRule::parse(&badge.rule) else {
            tracing::warn!(badge = %badge.id, rule = %badge.rule, "skipping badge with unknown rule");
            return None;
        };
        Some(Self {
            id: badge.id.clone(),
            name: badge.name.clone(),
            description: badge.description.clone(),
            icon: badge.icon.clone(),
            rule,
            threshold: badge.threshold,
            xp_bonus: badge.xp_bonus,
        })
    }

    pub fn is_met(&self, stats: &ActivityStats) -> bool {
        self.rule.measure(stats) >= self.threshold
    }

    pub fn to_response(&self) -> BadgeResponse {
        BadgeResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            rule: self.rule.as_str().to_string(),
            threshold: self.threshold,
            xp_bonus: self.xp_bonus,
        }
    }
}

/// Badges whose rule now holds and which the user does not hold yet, in catalogue order.
pub fn evaluate_badges<'a>(
    stats: &ActivityStats,
    catalogue: &'a [BadgeDefinition],
    awarded: &HashSet<String>,
) -> Vec<&'a BadgeDefinition> {
    catalogue
        .iter()
        .filter(|b| !awarded.contains(&b.id))
        .filter(|b| b.is_met(stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(id: &str, rule: BadgeRule, threshold: i64) -> BadgeDefinition {
        BadgeDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            icon: None,
            rule,
            threshold,
            xp_bonus: 0,
        }
    }

    fn catalogue() -> Vec<BadgeDefinition> {
        vec![
            badge("first_lesson", BadgeRule::LessonsCompleted, 1),
            badge("five_lessons", BadgeRule::LessonsCompleted, 5),
            badge("quiz_whiz", BadgeRule::PerfectQuizzes, 1),
            badge("streak_3", BadgeRule::SigninStreak, 3),
            badge("xp_100", BadgeRule::TotalXp, 100),
        ]
    }

    #[test]
    fn rule_names_round_trip() {
        for rule in BadgeRule::ALL {
            assert_eq!(BadgeRule::parse(rule.as_str()), Some(rule));
        }
        assert_eq!(BadgeRule::parse("lessons"), None);
    }

    #[test]
    fn nothing_fires_for_a_new_user() {
        let cat = catalogue();
        let fired = evaluate_badges(&ActivityStats::default(), &cat, &HashSet::new());
        assert!(fired.is_empty());
    }

    #[test]
    fn first_lesson_fires_once() {
        let stats = ActivityStats {
            lessons_completed: 1,
            ..Default::default()
        };
        let cat = catalogue();
        let fired = evaluate_badges(&stats, &cat, &HashSet::new());
        let ids: Vec<&str> = fired.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first_lesson"]);

        let awarded: HashSet<String> = ["first_lesson".to_string()].into();
        assert!(evaluate_badges(&stats, &cat, &awarded).is_empty());
    }

    #[test]
    fn several_thresholds_can_fire_together_in_catalogue_order() {
        let stats = ActivityStats {
            lessons_completed: 6,
            total_xp: 150,
            ..Default::default()
        };
        let cat = catalogue();
        let ids: Vec<&str> = evaluate_badges(&stats, &cat, &HashSet::new())
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first_lesson", "five_lessons", "xp_100"]);
    }

    #[test]
    fn streak_badge_uses_best_streak() {
        let stats = ActivityStats {
            current_streak: 0,
            best_streak: 4,
            ..Default::default()
        };
        let cat = catalogue();
        let fired = evaluate_badges(&stats, &cat, &HashSet::new());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, "streak_3");
    }

    #[test]
    fn unknown_rule_rows_are_skipped() {
        let row = BadgeResponse {
            id: "mystery".into(),
            name: "Mystery".into(),
            description: String::new(),
            icon: None,
            rule: "moon_phase".into(),
            threshold: 1,
            xp_bonus: 0,
        };
        assert!(BadgeDefinition::from_response(&row).is_none());
    }
}
