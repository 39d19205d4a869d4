//! Daily sign-in query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::DailySignins;

/// Record a sign-in for `day`. Changes no rows on a repeat sign-in the same day.
pub fn insert(user_id: &str, day: &str, created_at: &str) -> Built {
    Query::insert()
        .into_table(DailySignins::Table)
        .columns([
            DailySignins::UserId,
            DailySignins::Day,
            DailySignins::CreatedAt,
        ])
        .values_panic([user_id.into(), day.into(), created_at.into()])
        .on_conflict(
            OnConflict::columns([DailySignins::UserId, DailySignins::Day])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// All sign-in days of a user, newest first.
pub fn list_days(user_id: &str) -> Built {
    Query::select()
        .column(DailySignins::Day)
        .from(DailySignins::Table)
        .and_where(Expr::col(DailySignins::UserId).eq(user_id))
        .order_by(DailySignins::Day, Order::Desc)
        .build(SqliteQueryBuilder)
}
