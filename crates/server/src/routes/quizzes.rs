use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use rusqlite::Connection;

use valuequest_api::service::{AnswerKey, grade_quiz};
use valuequest_api::streaks::sqlite_timestamp;
use valuequest_api::{QuizQuestion, QuizResponse, QuizResultResponse, SubmitQuizRequest, db};

use crate::error::ApiErr;
use crate::gamification::{Activity, record_activity};
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_row};

/// A stored question with its answer key.
struct StoredQuestion {
    id: i64,
    position: i64,
    question: String,
    options: String,
    correct_index: i64,
    xp_reward: i64,
}

fn load_questions(conn: &Connection, lesson_id: i64) -> Result<Vec<StoredQuestion>, ApiErr> {
    let exists: bool = sq_query_row(conn, db::lessons::exists(lesson_id), |r| r.get(0))
        .map_err(ApiErr::from_db("lesson exists"))?;
    if !exists {
        return Err(ApiErr::not_found("lesson not found"));
    }
    sq_query_map(conn, db::quizzes::list_for_lesson(lesson_id), |row| {
        Ok(StoredQuestion {
            id: row.get(0)?,
            position: row.get(1)?,
            question: row.get(2)?,
            options: row.get(3)?,
            correct_index: row.get(4)?,
            xp_reward: row.get(5)?,
        })
    })
    .map_err(ApiErr::from_db("list quiz questions"))
}

/// GET /api/lessons/:id/quiz — questions without their answers.
pub async fn get_quiz(
    State(db): State<Db>,
    _user: AuthUser,
    Path(lesson_id): Path<i64>,
) -> Result<Json<QuizResponse>, ApiErr> {
    let conn = db.conn();
    let questions = load_questions(&conn, lesson_id)?
        .into_iter()
        .map(|q| {
            let options: Vec<String> =
                serde_json::from_str(&q.options).map_err(ApiErr::from_db("decode quiz options"))?;
            Ok(QuizQuestion {
                id: q.id,
                position: q.position,
                question: q.question,
                options,
            })
        })
        .collect::<Result<Vec<_>, ApiErr>>()?;

    Ok(Json(QuizResponse {
        lesson_id,
        questions,
    }))
}

/// POST /api/lessons/:id/quiz — grade a submission.
///
/// Every submission is recorded. XP is only credited for the first passing
/// submission of a lesson's quiz.
pub async fn submit_quiz(
    State(db): State<Db>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<Json<QuizResultResponse>, ApiErr> {
    let now = Utc::now();
    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin quiz submission"))?;

    let key: Vec<AnswerKey> = load_questions(&tx, lesson_id)?
        .iter()
        .map(|q| AnswerKey {
            // Negative indexes never match an answer.
            correct_index: usize::try_from(q.correct_index).unwrap_or(usize::MAX),
            xp_reward: q.xp_reward,
        })
        .collect();
    let grade = grade_quiz(&key, &req.answers)?;

    let passed_before: bool = sq_query_row(
        &tx,
        db::quizzes::has_passed(&user.user_id, lesson_id),
        |r| r.get(0),
    )
    .map_err(ApiErr::from_db("check quiz passed"))?;

    sq_execute(
        &tx,
        db::quizzes::insert_result(
            &user.user_id,
            lesson_id,
            grade.correct,
            grade.total,
            grade.passed,
            &sqlite_timestamp(now),
        ),
    )
    .map_err(ApiErr::from_db("record quiz result"))?;

    let first_pass = grade.passed && !passed_before;
    let xp = if first_pass { grade.xp_value } else { 0 };
    let outcome = record_activity(
        &tx,
        &user.user_id,
        Activity::QuizSubmitted { lesson_id, xp },
        now,
    )
    .map_err(ApiErr::from_db("record quiz activity"))?;

    tx.commit().map_err(ApiErr::from_db("commit quiz submission"))?;

    Ok(Json(QuizResultResponse {
        lesson_id,
        correct: grade.correct,
        total: grade.total,
        passed: grade.passed,
        first_pass,
        xp_awarded: xp,
        rewards: outcome.into_rewards(),
    }))
}
