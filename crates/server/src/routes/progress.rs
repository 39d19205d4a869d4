use axum::{Json, extract::State};
use chrono::Utc;

use valuequest_api::streaks::sqlite_timestamp;
use valuequest_api::{
    CompleteLessonRequest, CompleteLessonResponse, ProgressEntry, ProgressResponse, db,
};

use crate::error::ApiErr;
use crate::gamification::{Activity, record_activity};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt};

/// POST /api/complete-lesson
///
/// A lesson is completed at most once per user; repeating the call is
/// harmless and earns nothing.
pub async fn complete_lesson(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CompleteLessonRequest>,
) -> Result<Json<CompleteLessonResponse>, ApiErr> {
    let now = Utc::now();
    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin complete lesson"))?;

    let (_title, reward): (String, i64) = sq_query_opt(
        &tx,
        db::lessons::get_reward(req.lesson_id),
        |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .map_err(ApiErr::from_db("get lesson reward"))?
    .ok_or_else(|| ApiErr::not_found("lesson not found"))?;

    let inserted = sq_execute(
        &tx,
        db::progress::insert_completion(&user.user_id, req.lesson_id, &sqlite_timestamp(now)),
    )
    .map_err(ApiErr::from_db("insert progress"))?;
    let already_completed = inserted == 0;
    let xp = if already_completed { 0 } else { reward };

    let outcome = record_activity(
        &tx,
        &user.user_id,
        Activity::LessonCompleted {
            lesson_id: req.lesson_id,
            xp,
        },
        now,
    )
    .map_err(ApiErr::from_db("record lesson activity"))?;

    tx.commit().map_err(ApiErr::from_db("commit complete lesson"))?;
    if !already_completed {
        tracing::info!(user_id = %user.user_id, lesson_id = req.lesson_id, xp, "lesson completed");
    }

    Ok(Json(CompleteLessonResponse {
        lesson_id: req.lesson_id,
        already_completed,
        xp_awarded: xp,
        rewards: outcome.into_rewards(),
    }))
}

/// GET /api/progress — completed lessons, newest first.
pub async fn list_progress(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ProgressResponse>, ApiErr> {
    let conn = db.conn();
    let entries = sq_query_map(&conn, db::progress::list_for_user(&user.user_id), |row| {
        Ok(ProgressEntry {
            lesson_id: row.get(0)?,
            title: row.get(1)?,
            completed_at: row.get(2)?,
        })
    })
    .map_err(ApiErr::from_db("list progress"))?;
    Ok(Json(ProgressResponse { entries }))
}
