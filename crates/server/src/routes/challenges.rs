use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use rusqlite::Connection;

use valuequest_api::db::challenges::InsertParams;
use valuequest_api::service::{
    DEFAULT_CHALLENGE_XP, normalize_class_code, resolve_xp, validate_challenge,
};
use valuequest_api::streaks::{day_string, sqlite_timestamp};
use valuequest_api::{
    ChallengeDetailResponse, ChallengeResponse, ChallengeStanding, CreateChallengeRequest,
    ListChallengesResponse, NotificationKind, Role, db,
};

use crate::error::ApiErr;
use crate::gamification::{challenge_from_row, class_code_of, notify};
use crate::routes::auth::AuthUser;
use crate::routes::users::profile_from_row;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

fn load_challenge(
    conn: &Connection,
    challenge_id: i64,
    user_id: &str,
) -> Result<ChallengeResponse, ApiErr> {
    sq_query_opt(
        conn,
        db::challenges::get_for_user(challenge_id, user_id),
        challenge_from_row,
    )
    .map_err(ApiErr::from_db("get challenge"))?
    .ok_or_else(|| ApiErr::not_found("challenge not found"))
}

/// GET /api/challenges — challenges running today for the caller's class.
pub async fn list_challenges(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListChallengesResponse>, ApiErr> {
    let conn = db.conn();
    let Some(class_code) =
        class_code_of(&conn, &user.user_id).map_err(ApiErr::from_db("get class code"))?
    else {
        return Ok(Json(ListChallengesResponse {
            challenges: Vec::new(),
        }));
    };

    let today = day_string(Utc::now().date_naive());
    let challenges = sq_query_map(
        &conn,
        db::challenges::active_for_user(&class_code, &user.user_id, &today),
        challenge_from_row,
    )
    .map_err(ApiErr::from_db("list challenges"))?;
    Ok(Json(ListChallengesResponse { challenges }))
}

/// POST /api/challenges — set a goal for a class and notify its students.
///
/// Without an explicit class code the teacher's own class is used.
pub async fn create_challenge(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<ChallengeResponse>), ApiErr> {
    user.require_teacher()?;
    let window = validate_challenge(&req)?;
    let xp_reward = resolve_xp(req.xp_reward, DEFAULT_CHALLENGE_XP)?;
    let now = Utc::now();

    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin create challenge"))?;

    let requested = match req.class_code.as_deref() {
        Some(code) => normalize_class_code(code)?,
        None => None,
    };
    let class_code = match requested {
        Some(code) => code,
        None => class_code_of(&tx, &user.user_id)
            .map_err(ApiErr::from_db("get class code"))?
            .ok_or_else(|| ApiErr::bad_request("class_code is required"))?,
    };

    let title = req.title.trim();
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let starts_on = day_string(window.starts_on);
    let ends_on = day_string(window.ends_on);
    sq_execute(
        &tx,
        db::challenges::insert(&InsertParams {
            class_code: &class_code,
            title,
            description,
            metric: req.metric.as_str(),
            target: req.target,
            xp_reward,
            starts_on: &starts_on,
            ends_on: &ends_on,
            created_by: &user.user_id,
            created_at: &sqlite_timestamp(now),
        }),
    )
    .map_err(ApiErr::from_db("insert challenge"))?;
    let challenge_id = tx.last_insert_rowid();

    let members = sq_query_map(&tx, db::users::list_in_class(&class_code), profile_from_row)
        .map_err(ApiErr::from_db("list class members"))?;
    let body = format!("Runs {starts_on} to {ends_on}. Reward: {xp_reward} XP.");
    for member in members.iter().filter(|m| m.role == Role::Student) {
        notify(
            &tx,
            &member.id,
            NotificationKind::Challenge,
            &format!("New class challenge: {title}"),
            &body,
            now,
        )
        .map_err(ApiErr::from_db("notify class"))?;
    }

    let challenge = load_challenge(&tx, challenge_id, &user.user_id)?;
    tx.commit().map_err(ApiErr::from_db("commit create challenge"))?;
    tracing::info!(challenge_id, class_code = %class_code, teacher = %user.user_id, "challenge created");

    Ok((StatusCode::CREATED, Json(challenge)))
}

/// GET /api/challenges/:id — challenge with the class standings.
///
/// Students only see challenges of their own class.
pub async fn get_challenge(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ChallengeDetailResponse>, ApiErr> {
    let conn = db.conn();
    let challenge = load_challenge(&conn, id, &user.user_id)?;
    if !user.is_teacher() {
        let own_class =
            class_code_of(&conn, &user.user_id).map_err(ApiErr::from_db("get class code"))?;
        if own_class.as_deref() != Some(challenge.class_code.as_str()) {
            return Err(ApiErr::not_found("challenge not found"));
        }
    }

    let standings = sq_query_map(&conn, db::challenges::standings(id), |row| {
        Ok(ChallengeStanding {
            user_id: row.get(0)?,
            display_name: row.get(1)?,
            progress: row.get(2)?,
            completed_at: row.get(3)?,
        })
    })
    .map_err(ApiErr::from_db("challenge standings"))?;

    Ok(Json(ChallengeDetailResponse {
        challenge,
        standings,
    }))
}
