//! XP ledger + leaderboard query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Xp;

/// Append a ledger entry.
pub fn insert(
    user_id: &str,
    amount: i64,
    source: &str,
    source_ref: Option<&str>,
    created_at: &str,
) -> Built {
    Query::insert()
        .into_table(Xp::Table)
        .columns([
            Xp::UserId,
            Xp::Amount,
            Xp::Source,
            Xp::SourceRef,
            Xp::CreatedAt,
        ])
        .values_panic([
            user_id.into(),
            amount.into(),
            source.into(),
            source_ref.map(|s| s.to_string()).into(),
            created_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Total XP of a user (0 when the ledger is empty).
pub fn total(user_id: &str) -> Built {
    let sql = "SELECT COALESCE(SUM(\"amount\"), 0) FROM \"xp\" WHERE \"user_id\" = ?".to_string();
    (sql, sea_query::Values(vec![user_id.into()]))
}

/// Most recent ledger entries: amount, source, source_ref, created_at.
pub fn recent(user_id: &str, limit: u64) -> Built {
    Query::select()
        .columns([Xp::Amount, Xp::Source, Xp::SourceRef, Xp::CreatedAt])
        .from(Xp::Table)
        .and_where(Expr::col(Xp::UserId).eq(user_id))
        .order_by(Xp::CreatedAt, Order::Desc)
        .order_by(Xp::Id, Order::Desc)
        .limit(limit)
        .build(SqliteQueryBuilder)
}

/// Leaderboard rows: user_id, display_name, class_code, total_xp.
///
/// Users are ordered by total XP descending; ties go to display name, then id,
/// so the order is total. Only students are ranked; users without XP appear with 0.
pub fn leaderboard(class_code: Option<&str>, limit: u64) -> Built {
    let mut sql = String::from(
        "SELECT u.\"id\", u.\"display_name\", u.\"class_code\", \
         COALESCE(SUM(x.\"amount\"), 0) AS \"total_xp\" \
         FROM \"users\" u \
         LEFT JOIN \"xp\" x ON x.\"user_id\" = u.\"id\" \
         WHERE u.\"role\" = 'student'",
    );
    let mut values: Vec<sea_query::Value> = Vec::new();
    if let Some(class_code) = class_code {
        sql.push_str(" AND u.\"class_code\" = ?");
        values.push(class_code.into());
    }
    sql.push_str(
        " GROUP BY u.\"id\" \
         ORDER BY \"total_xp\" DESC, u.\"display_name\" IS NULL, u.\"display_name\" ASC, u.\"id\" ASC \
         LIMIT ?",
    );
    values.push(i64::try_from(limit).unwrap_or(i64::MAX).into());
    (sql, sea_query::Values(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_class_filter_is_optional() {
        let (sql, values) = leaderboard(None, 10);
        assert!(!sql.contains("class_code\" = ?"));
        assert_eq!(values.0.len(), 1);

        let (sql, values) = leaderboard(Some("5B"), 10);
        assert!(sql.contains("AND u.\"class_code\" = ?"));
        assert_eq!(values.0.len(), 2);
    }
}
