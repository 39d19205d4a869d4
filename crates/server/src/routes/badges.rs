use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;

use valuequest_api::{
    AchievementsResponse, AwardBadgeRequest, AwardBadgeResponse, AwardedBadge,
    ListBadgesResponse, db,
};

use crate::error::ApiErr;
use crate::gamification::{badge_from_row, compute_stats, grant_badge};
use crate::routes::auth::AuthUser;
use crate::routes::users::load_profile;
use crate::storage::{Db, sq_query_map, sq_query_opt};

/// GET /api/badges — the badge catalogue.
pub async fn list_badges(
    State(db): State<Db>,
    _user: AuthUser,
) -> Result<Json<ListBadgesResponse>, ApiErr> {
    let conn = db.conn();
    let badges =
        sq_query_map(&conn, db::badges::list(), badge_from_row).map_err(ApiErr::from_db("list badges"))?;
    Ok(Json(ListBadgesResponse { badges }))
}

/// GET /api/user/achievements/:id — a user's badges and statistics.
///
/// Students may only read their own; teachers may read anyone's.
pub async fn achievements(
    State(db): State<Db>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<AchievementsResponse>, ApiErr> {
    if user_id != user.user_id && !user.is_teacher() {
        return Err(ApiErr::forbidden("cannot view another user's achievements"));
    }

    let conn = db.conn();
    load_profile(&conn, &user_id)?;

    let badges = sq_query_map(&conn, db::badges::awarded_for_user(&user_id), |row| {
        Ok(AwardedBadge {
            badge: badge_from_row(row)?,
            awarded_at: row.get(7)?,
        })
    })
    .map_err(ApiErr::from_db("list awarded badges"))?;
    let stats = compute_stats(&conn, &user_id, Utc::now().date_naive())
        .map_err(ApiErr::from_db("compute stats"))?;

    Ok(Json(AchievementsResponse {
        user_id,
        badges,
        stats,
    }))
}

/// POST /api/award-badge — grant a badge by hand.
///
/// Idempotent: `awarded` is false when the user already holds the badge.
pub async fn award_badge(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<AwardBadgeRequest>,
) -> Result<Json<AwardBadgeResponse>, ApiErr> {
    user.require_teacher()?;
    let now = Utc::now();

    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin award badge"))?;

    load_profile(&tx, &req.user_id)?;
    let badge = sq_query_opt(&tx, db::badges::get_by_id(&req.badge_id), badge_from_row)
        .map_err(ApiErr::from_db("get badge"))?
        .ok_or_else(|| ApiErr::not_found("badge not found"))?;

    let awarded = grant_badge(&tx, &req.user_id, &badge, now)
        .map_err(ApiErr::from_db("award badge"))?
        .is_some();
    tx.commit().map_err(ApiErr::from_db("commit award badge"))?;

    if awarded {
        tracing::info!(
            teacher = %user.user_id,
            user_id = %req.user_id,
            badge = %badge.id,
            "badge awarded manually"
        );
    }
    Ok(Json(AwardBadgeResponse { awarded, badge }))
}
