//! Badge catalogue + award query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Badges, UserBadges};

/// Catalogue columns, in `BadgeResponse` order.
fn badge_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.column((Badges::Table, Badges::Id))
        .column((Badges::Table, Badges::Name))
        .column((Badges::Table, Badges::Description))
        .column((Badges::Table, Badges::Icon))
        .column((Badges::Table, Badges::Rule))
        .column((Badges::Table, Badges::Threshold))
        .column((Badges::Table, Badges::XpBonus))
}

/// The whole catalogue in display order.
pub fn list() -> Built {
    let mut q = Query::select().to_owned();
    badge_columns(&mut q);
    q.from(Badges::Table)
        .order_by(Badges::SortOrder, Order::Asc)
        .order_by(Badges::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    badge_columns(&mut q);
    q.from(Badges::Table)
        .and_where(Expr::col((Badges::Table, Badges::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Award a badge. Changes no rows when the user already holds it.
pub fn award(user_id: &str, badge_id: &str, awarded_at: &str) -> Built {
    Query::insert()
        .into_table(UserBadges::Table)
        .columns([UserBadges::UserId, UserBadges::BadgeId, UserBadges::AwardedAt])
        .values_panic([user_id.into(), badge_id.into(), awarded_at.into()])
        .on_conflict(
            OnConflict::columns([UserBadges::UserId, UserBadges::BadgeId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Ids of the badges a user holds.
pub fn awarded_ids(user_id: &str) -> Built {
    Query::select()
        .column(UserBadges::BadgeId)
        .from(UserBadges::Table)
        .and_where(Expr::col(UserBadges::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Badges a user holds with award time, oldest award first.
pub fn awarded_for_user(user_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    badge_columns(&mut q);
    q.column((UserBadges::Table, UserBadges::AwardedAt))
        .from(UserBadges::Table)
        .inner_join(
            Badges::Table,
            Expr::col((Badges::Table, Badges::Id))
                .equals((UserBadges::Table, UserBadges::BadgeId)),
        )
        .and_where(Expr::col((UserBadges::Table, UserBadges::UserId)).eq(user_id))
        .order_by((UserBadges::Table, UserBadges::AwardedAt), Order::Asc)
        .order_by((Badges::Table, Badges::SortOrder), Order::Asc)
        .build(SqliteQueryBuilder)
}
