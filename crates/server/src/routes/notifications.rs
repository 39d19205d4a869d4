use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use rusqlite::Connection;

use valuequest_api::service::{normalize_class_code, validate_notification};
use valuequest_api::{
    CreateNotificationRequest, CreateNotificationResponse, ListNotificationsResponse,
    NotificationKind, NotificationListQuery, NotificationResponse, OkResponse,
    UpdateNotificationRequest, db,
};

use crate::error::ApiErr;
use crate::gamification::notify;
use crate::routes::auth::AuthUser;
use crate::routes::users::{load_profile, profile_from_row};
use crate::storage::{Db, sq_execute, sq_query_map, sq_query_opt, sq_query_row, text_enum};

/// Resolve a notification the caller owns. Someone else's notification is
/// reported as missing.
fn require_owner(conn: &Connection, id: i64, user_id: &str) -> Result<(), ApiErr> {
    let owner = sq_query_opt(conn, db::notifications::get_owner(id), |r| {
        r.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("get notification owner"))?;
    match owner {
        Some(owner) if owner == user_id => Ok(()),
        _ => Err(ApiErr::not_found("notification not found")),
    }
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

/// GET /api/notifications?unread_only= — newest first.
pub async fn list_notifications(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<NotificationListQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiErr> {
    let unread_only = q.unread_only.unwrap_or(false);
    let conn = db.conn();
    let notifications = sq_query_map(
        &conn,
        db::notifications::list_for_user(&user.user_id, unread_only),
        |row| {
            Ok(NotificationResponse {
                id: row.get(0)?,
                kind: text_enum(row, 1, NotificationKind::parse)?,
                title: row.get(2)?,
                body: row.get(3)?,
                is_read: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    )
    .map_err(ApiErr::from_db("list notifications"))?;
    let unread_count = sq_query_row(
        &conn,
        db::notifications::unread_count(&user.user_id),
        |r| r.get(0),
    )
    .map_err(ApiErr::from_db("count unread notifications"))?;

    Ok(Json(ListNotificationsResponse {
        notifications,
        unread_count,
    }))
}

/// PUT /api/notifications/:id — mark read or unread.
pub async fn update_notification(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateNotificationRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    require_owner(&conn, id, &user.user_id)?;
    sq_execute(&conn, db::notifications::set_read(id, req.is_read))
        .map_err(ApiErr::from_db("update notification"))?;
    Ok(Json(OkResponse { ok: true }))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    sq_execute(&conn, db::notifications::mark_all_read(&user.user_id))
        .map_err(ApiErr::from_db("mark all notifications read"))?;
    Ok(Json(OkResponse { ok: true }))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    require_owner(&conn, id, &user.user_id)?;
    sq_execute(&conn, db::notifications::delete(id))
        .map_err(ApiErr::from_db("delete notification"))?;
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Sending (teachers)
// ---------------------------------------------------------------------------

/// POST /api/notifications — send to one user or to every member of a class.
pub async fn create_notification(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<CreateNotificationResponse>), ApiErr> {
    user.require_teacher()?;
    let (title, body) = validate_notification(&req.title, &req.body)?;
    let kind = req.kind.unwrap_or_default();
    let now = Utc::now();

    let mut conn = db.conn();
    let tx = conn
        .transaction()
        .map_err(ApiErr::from_db("begin create notification"))?;

    let recipients: Vec<String> = match (req.user_id.as_deref(), req.class_code.as_deref()) {
        (Some(user_id), None) => vec![load_profile(&tx, user_id)?.id],
        (None, Some(code)) => {
            let code = normalize_class_code(code)?
                .ok_or_else(|| ApiErr::bad_request("class_code must not be empty"))?;
            sq_query_map(&tx, db::users::list_in_class(&code), profile_from_row)
                .map_err(ApiErr::from_db("list class members"))?
                .into_iter()
                .map(|p| p.id)
                .filter(|id| *id != user.user_id)
                .collect()
        }
        _ => {
            return Err(ApiErr::bad_request(
                "exactly one of user_id or class_code is required",
            ));
        }
    };

    for recipient in &recipients {
        notify(&tx, recipient, kind, &title, &body, now)
            .map_err(ApiErr::from_db("insert notification"))?;
    }
    tx.commit().map_err(ApiErr::from_db("commit create notification"))?;
    tracing::info!(teacher = %user.user_id, count = recipients.len(), %kind, "notifications sent");

    Ok((
        StatusCode::CREATED,
        Json(CreateNotificationResponse {
            created: recipients.len(),
        }),
    ))
}
