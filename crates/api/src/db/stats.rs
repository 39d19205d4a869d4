//! Aggregate statistics behind badge rules and challenge progress.

use super::Built;
use crate::ChallengeMetric;

/// Counts feeding `ActivityStats`: lessons completed, quizzes passed,
/// perfect quizzes, total XP, challenges completed.
///
/// Quizzes count once per lesson no matter how often they were retaken.
pub fn activity_counts(user_id: &str) -> Built {
    let sql = "SELECT \
         (SELECT COUNT(*) FROM \"progress\" WHERE \"user_id\" = ?), \
         (SELECT COUNT(DISTINCT \"lesson_id\") FROM \"quiz_results\" WHERE \"user_id\" = ? AND \"passed\" = 1), \
         (SELECT COUNT(DISTINCT \"lesson_id\") FROM \"quiz_results\" WHERE \"user_id\" = ? AND \"correct\" = \"total\"), \
         (SELECT COALESCE(SUM(\"amount\"), 0) FROM \"xp\" WHERE \"user_id\" = ?), \
         (SELECT COUNT(*) FROM \"challenge_progress\" WHERE \"user_id\" = ? AND \"completed_at\" IS NOT NULL)"
        .to_string();
    let values = sea_query::Values(vec![
        user_id.into(),
        user_id.into(),
        user_id.into(),
        user_id.into(),
        user_id.into(),
    ]);
    (sql, values)
}

/// A challenge metric measured over `[from, until)`.
///
/// Bounds are compared as text: `from` is the first day (`YYYY-MM-DD`) and
/// `until` the day after the last, which brackets both day strings and
/// `YYYY-MM-DD HH:MM:SS` timestamps. XP credited by challenges themselves is
/// excluded so completing one challenge cannot advance another.
pub fn metric_in_window(metric: ChallengeMetric, user_id: &str, from: &str, until: &str) -> Built {
    let sql = match metric {
        ChallengeMetric::LessonsCompleted => {
            "SELECT COUNT(*) FROM \"progress\" \
             WHERE \"user_id\" = ? AND \"completed_at\" >= ? AND \"completed_at\" < ?"
        }
        ChallengeMetric::QuizzesPassed => {
            "SELECT COUNT(DISTINCT \"lesson_id\") FROM \"quiz_results\" \
             WHERE \"user_id\" = ? AND \"passed\" = 1 AND \"submitted_at\" >= ? AND \"submitted_at\" < ?"
        }
        ChallengeMetric::XpEarned => {
            "SELECT COALESCE(SUM(\"amount\"), 0) FROM \"xp\" \
             WHERE \"user_id\" = ? AND \"source\" <> 'challenge' AND \"created_at\" >= ? AND \"created_at\" < ?"
        }
        ChallengeMetric::Signins => {
            "SELECT COUNT(*) FROM \"daily_signins\" \
             WHERE \"user_id\" = ? AND \"day\" >= ? AND \"day\" < ?"
        }
    };
    (
        sql.to_string(),
        sea_query::Values(vec![user_id.into(), from.into(), until.into()]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_metric_binds_user_and_window() {
        for metric in [
            ChallengeMetric::LessonsCompleted,
            ChallengeMetric::QuizzesPassed,
            ChallengeMetric::XpEarned,
            ChallengeMetric::Signins,
        ] {
            let (sql, values) = metric_in_window(metric, "u1", "2024-05-01", "2024-05-08");
            assert_eq!(sql.matches('?').count(), 3, "{metric}");
            assert_eq!(values.0.len(), 3);
        }
    }
}
