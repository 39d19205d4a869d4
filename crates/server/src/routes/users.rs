use axum::{Json, extract::State};
use chrono::Utc;
use rusqlite::{Connection, Row};

use valuequest_api::service::{normalize_class_code, validate_display_name};
use valuequest_api::{LevelProgress, MeResponse, Role, UpdateProfileRequest, UserProfile, db};

use crate::error::ApiErr;
use crate::gamification::compute_stats;
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_execute, sq_query_opt, text_enum};

/// Map a row in `UserProfile` column order.
pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        class_code: row.get(3)?,
        role: text_enum(row, 4, Role::parse)?,
        created_at: row.get(5)?,
    })
}

pub fn load_profile(conn: &Connection, user_id: &str) -> Result<UserProfile, ApiErr> {
    sq_query_opt(conn, db::users::get_by_id(user_id), profile_from_row)
        .map_err(ApiErr::from_db("load profile"))?
        .ok_or_else(|| ApiErr::not_found("user not found"))
}

fn me_response(conn: &Connection, user_id: &str) -> Result<MeResponse, ApiErr> {
    let profile = load_profile(conn, user_id)?;
    let stats = compute_stats(conn, user_id, Utc::now().date_naive())
        .map_err(ApiErr::from_db("compute stats"))?;
    let level = LevelProgress::new(stats.total_xp);
    Ok(MeResponse {
        profile,
        stats,
        level,
    })
}

/// GET /api/me
pub async fn get_me(State(db): State<Db>, user: AuthUser) -> Result<Json<MeResponse>, ApiErr> {
    let conn = db.conn();
    me_response(&conn, &user.user_id).map(Json)
}

/// PUT /api/me — change display name and/or class.
///
/// An empty class code leaves the class.
pub async fn update_me(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<MeResponse>, ApiErr> {
    let display_name = req
        .display_name
        .as_deref()
        .map(validate_display_name)
        .transpose()?;
    let class_code = req
        .class_code
        .as_deref()
        .map(normalize_class_code)
        .transpose()?;

    let conn = db.conn();
    if let Some(name) = display_name {
        sq_execute(&conn, db::users::update_display_name(&user.user_id, &name))
            .map_err(ApiErr::from_db("update display name"))?;
    }
    if let Some(code) = class_code {
        sq_execute(
            &conn,
            db::users::update_class_code(&user.user_id, code.as_deref()),
        )
        .map_err(ApiErr::from_db("update class code"))?;
    }

    me_response(&conn, &user.user_id).map(Json)
}
