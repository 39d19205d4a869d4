//! XP, badge, challenge and level bookkeeping run after every tracked activity.
//!
//! All functions take a borrowed connection so handlers can run them inside
//! the same transaction that writes the activity row (progress, quiz result,
//! sign-in). Nothing here commits.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Row};

use valuequest_api::badges::evaluate_badges;
use valuequest_api::db;
use valuequest_api::streaks::{best_streak, current_streak, day_string, parse_day, sqlite_timestamp};
use valuequest_api::{
    ActivityRewards, ActivityStats, BadgeDefinition, BadgeResponse, ChallengeMetric,
    ChallengeResponse, Level, LevelProgress, NotificationKind, XpSource,
};

use crate::storage::{sq_execute, sq_query_map, sq_query_opt, sq_query_row, text_enum};

/// A tracked user activity, with the XP it earned itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    LessonCompleted { lesson_id: i64, xp: i64 },
    QuizSubmitted { lesson_id: i64, xp: i64 },
    SignedIn { xp: i64 },
    /// A badge was granted by hand through [`grant_badge`].
    BadgeAwarded,
}

impl Activity {
    fn xp_credit(&self) -> Option<(i64, XpSource, Option<String>)> {
        match *self {
            Self::LessonCompleted { lesson_id, xp } if xp > 0 => {
                Some((xp, XpSource::Lesson, Some(lesson_id.to_string())))
            }
            Self::QuizSubmitted { lesson_id, xp } if xp > 0 => {
                Some((xp, XpSource::Quiz, Some(lesson_id.to_string())))
            }
            Self::SignedIn { xp } if xp > 0 => Some((xp, XpSource::Signin, None)),
            _ => None,
        }
    }

    /// Whether this activity can move a challenge measuring `metric`.
    fn moves(&self, metric: ChallengeMetric) -> bool {
        match metric {
            ChallengeMetric::LessonsCompleted => matches!(self, Self::LessonCompleted { .. }),
            ChallengeMetric::QuizzesPassed => matches!(self, Self::QuizSubmitted { .. }),
            ChallengeMetric::Signins => matches!(self, Self::SignedIn { .. }),
            ChallengeMetric::XpEarned => true,
        }
    }
}

/// What an activity unlocked.
#[derive(Debug, Clone, Default)]
pub struct ActivityOutcome {
    pub new_badges: Vec<BadgeResponse>,
    pub completed_challenges: Vec<i64>,
    pub level_before: u32,
    pub level_after: u32,
    pub total_xp: i64,
}

impl ActivityOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }

    pub fn into_rewards(self) -> ActivityRewards {
        let leveled_up = self.leveled_up();
        ActivityRewards {
            new_badges: self.new_badges,
            completed_challenges: self.completed_challenges,
            level: LevelProgress::new(self.total_xp),
            leveled_up,
        }
    }
}

/// Credit the activity's own XP, then settle challenges, badges and level.
pub fn record_activity(
    conn: &Connection,
    user_id: &str,
    activity: Activity,
    now: DateTime<Utc>,
) -> rusqlite::Result<ActivityOutcome> {
    let total_before = total_xp(conn, user_id)?;
    if let Some((amount, source, source_ref)) = activity.xp_credit() {
        credit_xp(conn, user_id, amount, source, source_ref.as_deref(), now)?;
    }
    settle(conn, user_id, activity, total_before, now)
}

/// Grant a badge by hand and settle what its bonus unlocks.
///
/// Returns `None` when the user already holds the badge. The level baseline
/// is read before the bonus lands, so a bonus that crosses a threshold is
/// reported as a level-up.
pub fn grant_badge(
    conn: &Connection,
    user_id: &str,
    badge: &BadgeResponse,
    now: DateTime<Utc>,
) -> rusqlite::Result<Option<ActivityOutcome>> {
    let total_before = total_xp(conn, user_id)?;
    if !award_badge(conn, user_id, badge, now)? {
        return Ok(None);
    }
    settle(conn, user_id, Activity::BadgeAwarded, total_before, now).map(Some)
}

/// Challenge rewards can unlock badges and badge bonuses can advance XP
/// challenges, so both are re-evaluated until neither fires. Each badge and
/// each challenge completes at most once, which bounds the loop.
fn settle(
    conn: &Connection,
    user_id: &str,
    activity: Activity,
    total_before: i64,
    now: DateTime<Utc>,
) -> rusqlite::Result<ActivityOutcome> {
    let catalogue = load_catalogue(conn)?;
    let mut awarded: HashSet<String> =
        sq_query_map(conn, db::badges::awarded_ids(user_id), |r| r.get(0))?
            .into_iter()
            .collect();
    let mut outcome = ActivityOutcome::default();

    loop {
        let completed = evaluate_challenges(conn, user_id, activity, now)?;
        let mut fired = !completed.is_empty();
        outcome.completed_challenges.extend(completed);

        let stats = compute_stats(conn, user_id, now.date_naive())?;
        let due: Vec<BadgeResponse> = evaluate_badges(&stats, &catalogue, &awarded)
            .into_iter()
            .map(BadgeDefinition::to_response)
            .collect();
        for badge in due {
            awarded.insert(badge.id.clone());
            if award_badge(conn, user_id, &badge, now)? {
                fired = true;
                outcome.new_badges.push(badge);
            }
        }

        if !fired {
            break;
        }
    }

    let total_after = total_xp(conn, user_id)?;
    let before = Level::for_xp(total_before);
    let after = Level::for_xp(total_after);
    if after.level > before.level {
        notify(
            conn,
            user_id,
            NotificationKind::LevelUp,
            &format!("Level {} reached", after.level),
            &format!("You are now a {}.", after.title),
            now,
        )?;
        tracing::info!(user_id, level = after.level, "level up");
    }

    outcome.level_before = before.level;
    outcome.level_after = after.level;
    outcome.total_xp = total_after;
    Ok(outcome)
}

/// Insert the badge row. Returns `false` when the user already holds it; the
/// bonus and notification only follow a fresh award.
fn award_badge(
    conn: &Connection,
    user_id: &str,
    badge: &BadgeResponse,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let ts = sqlite_timestamp(now);
    if sq_execute(conn, db::badges::award(user_id, &badge.id, &ts))? == 0 {
        return Ok(false);
    }
    if badge.xp_bonus > 0 {
        credit_xp(conn, user_id, badge.xp_bonus, XpSource::Badge, Some(&badge.id), now)?;
    }
    notify(
        conn,
        user_id,
        NotificationKind::Badge,
        &format!("Badge earned: {}", badge.name),
        &badge.description,
        now,
    )?;
    tracing::info!(user_id, badge = %badge.id, "badge awarded");
    Ok(true)
}

fn evaluate_challenges(
    conn: &Connection,
    user_id: &str,
    activity: Activity,
    now: DateTime<Utc>,
) -> rusqlite::Result<Vec<i64>> {
    let Some(class_code) = class_code_of(conn, user_id)? else {
        return Ok(Vec::new());
    };
    let today = day_string(now.date_naive());
    let active = sq_query_map(
        conn,
        db::challenges::active_for_user(&class_code, user_id, &today),
        challenge_from_row,
    )?;

    let mut completed = Vec::new();
    for challenge in active {
        if challenge.completed_at.is_some() || !activity.moves(challenge.metric) {
            continue;
        }
        let progress = measure_challenge(conn, user_id, &challenge)?;
        sq_execute(
            conn,
            db::challenges::upsert_progress(challenge.id, user_id, progress),
        )?;
        if progress < challenge.target {
            continue;
        }

        let ts = sqlite_timestamp(now);
        if sq_execute(conn, db::challenges::mark_completed(challenge.id, user_id, &ts))? == 0 {
            continue;
        }
        if challenge.xp_reward > 0 {
            let source_ref = challenge.id.to_string();
            credit_xp(
                conn,
                user_id,
                challenge.xp_reward,
                XpSource::Challenge,
                Some(&source_ref),
                now,
            )?;
        }
        notify(
            conn,
            user_id,
            NotificationKind::Challenge,
            &format!("Challenge complete: {}", challenge.title),
            &format!("You earned {} XP for your class challenge.", challenge.xp_reward),
            now,
        )?;
        tracing::info!(user_id, challenge_id = challenge.id, "challenge completed");
        completed.push(challenge.id);
    }
    Ok(completed)
}

/// The user's count for a challenge metric inside the challenge window.
fn measure_challenge(
    conn: &Connection,
    user_id: &str,
    challenge: &ChallengeResponse,
) -> rusqlite::Result<i64> {
    let until = parse_day(&challenge.ends_on)
        .and_then(|d| d.succ_opt())
        .map(day_string)
        .unwrap_or_else(|| challenge.ends_on.clone());
    sq_query_row(
        conn,
        db::stats::metric_in_window(challenge.metric, user_id, &challenge.starts_on, &until),
        |r| r.get(0),
    )
}

// ── Shared reads and writes ─────────────────────────────────────────────────

pub fn credit_xp(
    conn: &Connection,
    user_id: &str,
    amount: i64,
    source: XpSource,
    source_ref: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    let ts = sqlite_timestamp(now);
    sq_execute(
        conn,
        db::xp::insert(user_id, amount, source.as_str(), source_ref, &ts),
    )?;
    Ok(())
}

pub fn notify(
    conn: &Connection,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    body: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    let ts = sqlite_timestamp(now);
    sq_execute(
        conn,
        db::notifications::insert(user_id, kind.as_str(), title, body, &ts),
    )?;
    Ok(())
}

pub fn total_xp(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
    sq_query_row(conn, db::xp::total(user_id), |r| r.get(0))
}

pub fn class_code_of(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<String>> {
    let code = sq_query_opt(conn, db::users::get_class_code(user_id), |r| {
        r.get::<_, Option<String>>(0)
    })?;
    Ok(code.flatten())
}

/// Distinct sign-in days of a user, newest first.
pub fn signin_days(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<NaiveDate>> {
    let raw = sq_query_map(conn, db::signins::list_days(user_id), |r| {
        r.get::<_, String>(0)
    })?;
    Ok(raw.iter().filter_map(|d| parse_day(d)).collect())
}

/// Aggregate statistics feeding the badge rules.
pub fn compute_stats(
    conn: &Connection,
    user_id: &str,
    today: NaiveDate,
) -> rusqlite::Result<ActivityStats> {
    let (lessons_completed, quizzes_passed, perfect_quizzes, total_xp, challenges_completed) =
        sq_query_row(conn, db::stats::activity_counts(user_id), |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
            ))
        })?;
    let days = signin_days(conn, user_id)?;

    Ok(ActivityStats {
        lessons_completed,
        quizzes_passed,
        perfect_quizzes,
        total_xp,
        current_streak: current_streak(&days, today),
        best_streak: best_streak(&days),
        challenges_completed,
        level: Level::for_xp(total_xp).level,
    })
}

/// Badge catalogue rules the engine understands.
pub fn load_catalogue(conn: &Connection) -> rusqlite::Result<Vec<BadgeDefinition>> {
    let rows = sq_query_map(conn, db::badges::list(), badge_from_row)?;
    Ok(rows.iter().filter_map(BadgeDefinition::from_response).collect())
}

/// Map a row in `BadgeResponse` column order.
pub fn badge_from_row(row: &Row<'_>) -> rusqlite::Result<BadgeResponse> {
    Ok(BadgeResponse {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        icon: row.get(3)?,
        rule: row.get(4)?,
        threshold: row.get(5)?,
        xp_bonus: row.get(6)?,
    })
}

/// Map a challenge row followed by the user's progress and completion time.
pub fn challenge_from_row(row: &Row<'_>) -> rusqlite::Result<ChallengeResponse> {
    Ok(ChallengeResponse {
        id: row.get(0)?,
        class_code: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        metric: text_enum(row, 4, ChallengeMetric::parse)?,
        target: row.get(5)?,
        xp_reward: row.get(6)?,
        starts_on: row.get(7)?,
        ends_on: row.get(8)?,
        created_by: row.get(9)?,
        created_at: row.get(10)?,
        progress: row.get(11)?,
        completed_at: row.get(12)?,
    })
}
