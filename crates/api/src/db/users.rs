//! User query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Users;

/// Columns read by [`get_by_id`] and [`list_in_class`], in `UserProfile` order.
fn profile_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Users::Id,
        Users::Email,
        Users::DisplayName,
        Users::ClassCode,
        Users::Role,
        Users::CreatedAt,
    ])
}

/// Create the user on first sight, refresh email and role from the token afterwards.
///
/// The display name from the token is only used when the row is created, so a
/// name chosen in-app is never overwritten.
pub fn upsert_from_token(
    id: &str,
    email: Option<&str>,
    display_name: Option<&str>,
    role: &str,
) -> Built {
    let sql = "INSERT INTO \"users\" (\"id\", \"email\", \"display_name\", \"role\") VALUES (?, ?, ?, ?) \
               ON CONFLICT (\"id\") DO UPDATE SET \
               \"email\" = COALESCE(excluded.\"email\", \"users\".\"email\"), \
               \"role\" = excluded.\"role\""
        .to_string();
    let values = sea_query::Values(vec![
        id.into(),
        email.map(|s| s.to_string()).into(),
        display_name.map(|s| s.to_string()).into(),
        role.into(),
    ]);
    (sql, values)
}

/// Find user by id.
pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Users enrolled in a class, ordered by display name.
pub fn list_in_class(class_code: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Users::Table)
        .and_where(Expr::col(Users::ClassCode).eq(class_code))
        .order_by(Users::DisplayName, Order::Asc)
        .order_by(Users::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Class code of a user (NULL when not enrolled).
pub fn get_class_code(id: &str) -> Built {
    Query::select()
        .column(Users::ClassCode)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn update_display_name(id: &str, display_name: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::DisplayName, display_name)
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Set or clear a user's class.
pub fn update_class_code(id: &str, class_code: Option<&str>) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::ClassCode, class_code.map(|s| s.to_string()))
        .and_where(Expr::col(Users::Id).eq(id))
        .build(SqliteQueryBuilder)
}
