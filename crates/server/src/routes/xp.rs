use axum::{
    Json,
    extract::{Query, State},
};

use valuequest_api::service::{clamp_leaderboard_limit, normalize_class_code};
use valuequest_api::{
    LeaderboardEntry, LeaderboardQuery, LeaderboardResponse, Level, LevelProgress, XpEntry,
    XpResponse, XpSource, db,
};

use crate::error::ApiErr;
use crate::gamification::total_xp;
use crate::routes::auth::AuthUser;
use crate::storage::{Db, sq_query_map, text_enum};

/// Ledger entries shown by `GET /api/xp`.
const RECENT_XP_ENTRIES: u64 = 20;

/// GET /api/xp — level progress and the most recent ledger entries.
pub async fn get_xp(State(db): State<Db>, user: AuthUser) -> Result<Json<XpResponse>, ApiErr> {
    let conn = db.conn();
    let total = total_xp(&conn, &user.user_id).map_err(ApiErr::from_db("total xp"))?;
    let recent = sq_query_map(
        &conn,
        db::xp::recent(&user.user_id, RECENT_XP_ENTRIES),
        |row| {
            Ok(XpEntry {
                amount: row.get(0)?,
                source: text_enum(row, 1, XpSource::parse)?,
                source_ref: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .map_err(ApiErr::from_db("recent xp"))?;

    Ok(Json(XpResponse {
        level: LevelProgress::new(total),
        recent,
    }))
}

/// GET /api/leaderboard?limit=&class_code= — students by total XP.
pub async fn leaderboard(
    State(db): State<Db>,
    _user: AuthUser,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiErr> {
    let limit = clamp_leaderboard_limit(q.limit);
    let class_code = match q.class_code.as_deref() {
        Some(code) => normalize_class_code(code)?,
        None => None,
    };

    let conn = db.conn();
    let rows = sq_query_map(
        &conn,
        db::xp::leaderboard(class_code.as_deref(), u64::from(limit)),
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        },
    )
    .map_err(ApiErr::from_db("leaderboard"))?;

    let entries = (1u32..)
        .zip(rows)
        .map(
            |(rank, (user_id, display_name, class_code, total_xp))| LeaderboardEntry {
                rank,
                user_id,
                display_name,
                class_code,
                total_xp,
                level: Level::for_xp(total_xp).level,
            },
        )
        .collect();

    Ok(Json(LeaderboardResponse { entries }))
}
