use axum::{Json, extract::State};
use chrono::{NaiveDate, Utc};

use valuequest_api::service::signin_xp;
use valuequest_api::streaks::{best_streak, current_streak, day_string, sqlite_timestamp};
use valuequest_api::{SigninResponse, StreakResponse, db};

use crate::error::ApiErr;
use crate::gamification::{Activity, record_activity, signin_days};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_execute};

fn streak_of(days: &[NaiveDate], today: NaiveDate) -> StreakResponse {
    StreakResponse {
        current: current_streak(days, today),
        best: best_streak(days),
        signed_in_today: days.contains(&today),
    }
}

/// POST /api/signin — record today's sign-in.
///
/// Only the first sign-in of a UTC day counts and earns XP.
pub async fn signin(State(db): State<Db>, user: AuthUser) -> Result<Json<SigninResponse>, ApiErr> {
    let now = Utc::now();
    let today = now.date_naive();
    let day = day_string(today);

    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin sign-in"))?;

    let inserted = sq_execute(
        &tx,
        db::signins::insert(&user.user_id, &day, &sqlite_timestamp(now)),
    )
    .map_err(ApiErr::from_db("record sign-in"))?;
    let already_signed_in = inserted == 0;

    let days = signin_days(&tx, &user.user_id).map_err(ApiErr::from_db("list sign-ins"))?;
    let streak = streak_of(&days, today);
    let xp = if already_signed_in {
        0
    } else {
        signin_xp(streak.current)
    };

    let outcome = record_activity(&tx, &user.user_id, Activity::SignedIn { xp }, now)
        .map_err(ApiErr::from_db("record sign-in activity"))?;
    tx.commit().map_err(ApiErr::from_db("commit sign-in"))?;

    Ok(Json(SigninResponse {
        day,
        already_signed_in,
        streak,
        xp_awarded: xp,
        rewards: outcome.into_rewards(),
    }))
}

/// GET /api/signin/streak
pub async fn streak(State(db): State<Db>, user: AuthUser) -> Result<Json<StreakResponse>, ApiErr> {
    let conn = db.conn();
    let days = signin_days(&conn, &user.user_id).map_err(ApiErr::from_db("list sign-ins"))?;
    Ok(Json(streak_of(&days, Utc::now().date_naive())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuequest_api::streaks::parse_day;

    #[test]
    fn streak_flags_today() {
        let days: Vec<NaiveDate> = ["2024-05-06", "2024-05-05", "2024-05-01"]
            .iter()
            .filter_map(|d| parse_day(d))
            .collect();
        let today = parse_day("2024-05-06").unwrap();
        let streak = streak_of(&days, today);
        assert_eq!(streak.current, 2);
        assert_eq!(streak.best, 2);
        assert!(streak.signed_in_today);

        let tomorrow = parse_day("2024-05-07").unwrap();
        assert!(!streak_of(&days, tomorrow).signed_in_today);
    }
}
