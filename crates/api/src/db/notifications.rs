//! Notification query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Notifications;

pub fn insert(user_id: &str, kind: &str, title: &str, body: &str, created_at: &str) -> Built {
    Query::insert()
        .into_table(Notifications::Table)
        .columns([
            Notifications::UserId,
            Notifications::Kind,
            Notifications::Title,
            Notifications::Body,
            Notifications::CreatedAt,
        ])
        .values_panic([
            user_id.into(),
            kind.into(),
            title.into(),
            body.into(),
            created_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// A user's notifications, newest first: id, kind, title, body, is_read, created_at.
pub fn list_for_user(user_id: &str, unread_only: bool) -> Built {
    let mut q = Query::select()
        .columns([
            Notifications::Id,
            Notifications::Kind,
            Notifications::Title,
            Notifications::Body,
            Notifications::IsRead,
            Notifications::CreatedAt,
        ])
        .from(Notifications::Table)
        .and_where(Expr::col(Notifications::UserId).eq(user_id))
        .to_owned();
    if unread_only {
        q.and_where(Expr::col(Notifications::IsRead).eq(false));
    }
    q.order_by(Notifications::CreatedAt, Order::Desc)
        .order_by(Notifications::Id, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn unread_count(user_id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Notifications::Table)
        .and_where(Expr::col(Notifications::UserId).eq(user_id))
        .and_where(Expr::col(Notifications::IsRead).eq(false))
        .build(SqliteQueryBuilder)
}

/// Owner of a notification.
pub fn get_owner(id: i64) -> Built {
    Query::select()
        .column(Notifications::UserId)
        .from(Notifications::Table)
        .and_where(Expr::col(Notifications::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn set_read(id: i64, is_read: bool) -> Built {
    Query::update()
        .table(Notifications::Table)
        .value(Notifications::IsRead, is_read)
        .and_where(Expr::col(Notifications::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn mark_all_read(user_id: &str) -> Built {
    Query::update()
        .table(Notifications::Table)
        .value(Notifications::IsRead, true)
        .and_where(Expr::col(Notifications::UserId).eq(user_id))
        .and_where(Expr::col(Notifications::IsRead).eq(false))
        .build(SqliteQueryBuilder)
}

pub fn delete(id: i64) -> Built {
    Query::delete()
        .from_table(Notifications::Table)
        .and_where(Expr::col(Notifications::Id).eq(id))
        .build(SqliteQueryBuilder)
}
