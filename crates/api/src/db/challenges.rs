//! Class challenge query builders.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{ChallengeProgress, ClassChallenges};

/// Challenge columns, in `ChallengeResponse` order.
pub const CHALLENGE_COLUMNS: &str = "c.\"id\", c.\"class_code\", c.\"title\", c.\"description\", \
     c.\"metric\", c.\"target\", c.\"xp_reward\", c.\"starts_on\", c.\"ends_on\", \
     c.\"created_by\", c.\"created_at\"";

/// Parameters for inserting a challenge.
pub struct InsertParams<'a> {
    pub class_code: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub metric: &'a str,
    pub target: i64,
    pub xp_reward: i64,
    pub starts_on: &'a str,
    pub ends_on: &'a str,
    pub created_by: &'a str,
    pub created_at: &'a str,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(ClassChallenges::Table)
        .columns([
            ClassChallenges::ClassCode,
            ClassChallenges::Title,
            ClassChallenges::Description,
            ClassChallenges::Metric,
            ClassChallenges::Target,
            ClassChallenges::XpReward,
            ClassChallenges::StartsOn,
            ClassChallenges::EndsOn,
            ClassChallenges::CreatedBy,
            ClassChallenges::CreatedAt,
        ])
        .values_panic([
            p.class_code.into(),
            p.title.into(),
            p.description.map(|s| s.to_string()).into(),
            p.metric.into(),
            p.target.into(),
            p.xp_reward.into(),
            p.starts_on.into(),
            p.ends_on.into(),
            p.created_by.into(),
            p.created_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// One challenge, plus the user's progress and completion time (NULL when none).
pub fn get_for_user(challenge_id: i64, user_id: &str) -> Built {
    let sql = format!(
        "SELECT {CHALLENGE_COLUMNS}, cp.\"progress\", cp.\"completed_at\" \
         FROM \"class_challenges\" c \
         LEFT JOIN \"challenge_progress\" cp \
           ON cp.\"challenge_id\" = c.\"id\" AND cp.\"user_id\" = ? \
         WHERE c.\"id\" = ?"
    );
    (
        sql,
        sea_query::Values(vec![user_id.into(), challenge_id.into()]),
    )
}

/// Challenges of a class running on `today`, with the user's progress.
/// Soonest-ending first.
pub fn active_for_user(class_code: &str, user_id: &str, today: &str) -> Built {
    let sql = format!(
        "SELECT {CHALLENGE_COLUMNS}, cp.\"progress\", cp.\"completed_at\" \
         FROM \"class_challenges\" c \
         LEFT JOIN \"challenge_progress\" cp \
           ON cp.\"challenge_id\" = c.\"id\" AND cp.\"user_id\" = ? \
         WHERE c.\"class_code\" = ? AND c.\"starts_on\" <= ? AND c.\"ends_on\" >= ? \
         ORDER BY c.\"ends_on\" ASC, c.\"id\" ASC"
    );
    (
        sql,
        sea_query::Values(vec![
            user_id.into(),
            class_code.into(),
            today.into(),
            today.into(),
        ]),
    )
}

/// Store the user's current progress on a challenge.
pub fn upsert_progress(challenge_id: i64, user_id: &str, progress: i64) -> Built {
    Query::insert()
        .into_table(ChallengeProgress::Table)
        .columns([
            ChallengeProgress::ChallengeId,
            ChallengeProgress::UserId,
            ChallengeProgress::Progress,
        ])
        .values_panic([challenge_id.into(), user_id.into(), progress.into()])
        .on_conflict(
            OnConflict::columns([ChallengeProgress::ChallengeId, ChallengeProgress::UserId])
                .update_column(ChallengeProgress::Progress)
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Mark a challenge completed. Changes no rows if it was already completed.
pub fn mark_completed(challenge_id: i64, user_id: &str, completed_at: &str) -> Built {
    Query::update()
        .table(ChallengeProgress::Table)
        .value(ChallengeProgress::CompletedAt, completed_at)
        .and_where(Expr::col(ChallengeProgress::ChallengeId).eq(challenge_id))
        .and_where(Expr::col(ChallengeProgress::UserId).eq(user_id))
        .and_where(Expr::col(ChallengeProgress::CompletedAt).is_null())
        .build(SqliteQueryBuilder)
}

/// Class standings: user_id, display_name, progress, completed_at.
///
/// Every student of the challenge's class is listed. Higher progress ranks
/// first; among finishers the earlier completion wins.
pub fn standings(challenge_id: i64) -> Built {
    let sql = "SELECT u.\"id\", u.\"display_name\", COALESCE(cp.\"progress\", 0) AS \"p\", cp.\"completed_at\" \
               FROM \"class_challenges\" c \
               INNER JOIN \"users\" u ON u.\"class_code\" = c.\"class_code\" AND u.\"role\" = 'student' \
               LEFT JOIN \"challenge_progress\" cp \
                 ON cp.\"challenge_id\" = c.\"id\" AND cp.\"user_id\" = u.\"id\" \
               WHERE c.\"id\" = ? \
               ORDER BY \"p\" DESC, cp.\"completed_at\" IS NULL, cp.\"completed_at\" ASC, \
                        u.\"display_name\" ASC, u.\"id\" ASC"
        .to_string();
    (sql, sea_query::Values(vec![challenge_id.into()]))
}
