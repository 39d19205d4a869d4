use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rusqlite::{Connection, Row};

use valuequest_api::db::lessons::LessonChanges;
use valuequest_api::service::{
    DEFAULT_LESSON_XP, DEFAULT_QUESTION_XP, resolve_xp, validate_lesson_title, validate_new_lesson,
};
use valuequest_api::{
    CreateLessonRequest, LessonDetail, LessonPage, LessonSummary, ListLessonsResponse,
    OkResponse, UpdateLessonRequest, db,
};

use crate::error::ApiErr;
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row};

/// Map a row in `LessonSummary` column order.
fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<LessonSummary> {
    Ok(LessonSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        sort_order: row.get(4)?,
        xp_reward: row.get(5)?,
        page_count: row.get(6)?,
        question_count: row.get(7)?,
        completed: row.get(8)?,
    })
}

fn load_detail(conn: &Connection, lesson_id: i64, user_id: &str) -> Result<LessonDetail, ApiErr> {
    let lesson = sq_query_opt(
        conn,
        db::lessons::get_for_user(lesson_id, user_id),
        summary_from_row,
    )
    .map_err(ApiErr::from_db("get lesson"))?
    .ok_or_else(|| ApiErr::not_found("lesson not found"))?;

    let pages = sq_query_map(conn, db::lessons::list_pages(lesson_id), |row| {
        Ok(LessonPage {
            page_number: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            image_url: row.get(3)?,
        })
    })
    .map_err(ApiErr::from_db("list lesson pages"))?;

    Ok(LessonDetail { lesson, pages })
}

/// Trimmed optional text; blank means absent.
fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/lessons — the curriculum with the caller's completion flags.
pub async fn list_lessons(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListLessonsResponse>, ApiErr> {
    let conn = db.conn();
    let lessons = sq_query_map(
        &conn,
        db::lessons::list_for_user(&user.user_id),
        summary_from_row,
    )
    .map_err(ApiErr::from_db("list lessons"))?;
    Ok(Json(ListLessonsResponse { lessons }))
}

/// GET /api/lessons/:id
pub async fn get_lesson(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LessonDetail>, ApiErr> {
    let conn = db.conn();
    load_detail(&conn, id, &user.user_id).map(Json)
}

// ---------------------------------------------------------------------------
// Authoring (teachers)
// ---------------------------------------------------------------------------

/// POST /api/lessons — create a lesson with its pages and quiz in one transaction.
pub async fn create_lesson(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<LessonDetail>), ApiErr> {
    user.require_teacher()?;
    let title = validate_new_lesson(&req)?;
    let xp_reward = resolve_xp(req.xp_reward, DEFAULT_LESSON_XP)?;

    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin create lesson"))?;

    let sort_order = match req.sort_order {
        Some(order) => order,
        None => sq_query_row(&tx, db::lessons::next_sort_order(), |r| r.get(0))
            .map_err(ApiErr::from_db("next sort order"))?,
    };
    sq_execute(
        &tx,
        db::lessons::insert(
            &title,
            non_blank(req.description.as_deref()),
            non_blank(req.category.as_deref()),
            sort_order,
            xp_reward,
        ),
    )
    .map_err(ApiErr::from_db("insert lesson"))?;
    let lesson_id = tx.last_insert_rowid();

    for (page_number, page) in (1i64..).zip(&req.pages) {
        sq_execute(
            &tx,
            db::lessons::insert_page(
                lesson_id,
                page_number,
                non_blank(page.title.as_deref()),
                page.content.trim(),
                non_blank(page.image_url.as_deref()),
            ),
        )
        .map_err(ApiErr::from_db("insert lesson page"))?;
    }

    for (position, question) in (1i64..).zip(&req.questions) {
        let options =
            serde_json::to_string(&question.options).map_err(ApiErr::from_db("encode options"))?;
        let correct_index = i64::try_from(question.correct_index)
            .map_err(|_| ApiErr::bad_request("correct_index out of range"))?;
        let xp = resolve_xp(question.xp_reward, DEFAULT_QUESTION_XP)?;
        sq_execute(
            &tx,
            db::quizzes::insert_question(
                lesson_id,
                position,
                question.question.trim(),
                &options,
                correct_index,
                xp,
            ),
        )
        .map_err(ApiErr::from_db("insert quiz question"))?;
    }

    tx.commit().map_err(ApiErr::from_db("commit create lesson"))?;
    tracing::info!(lesson_id, teacher = %user.user_id, "lesson created");

    let detail = load_detail(&conn, lesson_id, &user.user_id)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PUT /api/lessons/:id — update lesson metadata. Absent fields stay as they are.
pub async fn update_lesson(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<Json<LessonDetail>, ApiErr> {
    user.require_teacher()?;
    let title = req
        .title
        .as_deref()
        .map(validate_lesson_title)
        .transpose()?;
    if let Some(xp) = req.xp_reward {
        resolve_xp(Some(xp), DEFAULT_LESSON_XP)?;
    }

    let changes = LessonChanges {
        title: title.as_deref(),
        description: req.description.as_deref().map(|s| non_blank(Some(s))),
        category: req.category.as_deref().map(|s| non_blank(Some(s))),
        sort_order: req.sort_order,
        xp_reward: req.xp_reward,
    };

    let conn = db.conn();
    match db::lessons::update(id, &changes) {
        Some(built) => {
            let changed = sq_execute(&conn, built).map_err(ApiErr::from_db("update lesson"))?;
            if changed == 0 {
                return Err(ApiErr::not_found("lesson not found"));
            }
        }
        None => {
            let exists: bool = sq_query_row(&conn, db::lessons::exists(id), |r| r.get(0))
                .map_err(ApiErr::from_db("lesson exists"))?;
            if !exists {
                return Err(ApiErr::not_found("lesson not found"));
            }
        }
    }

    load_detail(&conn, id, &user.user_id).map(Json)
}

/// DELETE /api/lessons/:id — pages, questions, results and progress go with it.
pub async fn delete_lesson(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiErr> {
    user.require_teacher()?;
    let conn = db.conn();
    let deleted =
        sq_execute(&conn, db::lessons::delete(id)).map_err(ApiErr::from_db("delete lesson"))?;
    if deleted == 0 {
        return Err(ApiErr::not_found("lesson not found"));
    }
    tracing::info!(lesson_id = id, teacher = %user.user_id, "lesson deleted");
    Ok(Json(OkResponse { ok: true }))
}
