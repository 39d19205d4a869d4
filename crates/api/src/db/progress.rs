//! Lesson completion query builders.

use sea_query::{OnConflict, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::Progress;

/// Record a completion. A second completion of the same lesson changes no rows.
pub fn insert_completion(user_id: &str, lesson_id: i64, completed_at: &str) -> Built {
    Query::insert()
        .into_table(Progress::Table)
        .columns([Progress::UserId, Progress::LessonId, Progress::CompletedAt])
        .values_panic([user_id.into(), lesson_id.into(), completed_at.into()])
        .on_conflict(
            OnConflict::columns([Progress::UserId, Progress::LessonId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Completed lessons, newest first: lesson_id, title, completed_at.
pub fn list_for_user(user_id: &str) -> Built {
    let sql = "SELECT p.\"lesson_id\", l.\"title\", p.\"completed_at\" \
               FROM \"progress\" p \
               INNER JOIN \"lessons\" l ON l.\"id\" = p.\"lesson_id\" \
               WHERE p.\"user_id\" = ? \
               ORDER BY p.\"completed_at\" DESC, p.\"id\" DESC"
        .to_string();
    (sql, sea_query::Values(vec![user_id.into()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_insert_ignores_duplicates() {
        let (sql, values) = insert_completion("u1", 4, "2024-05-01 10:00:00");
        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("DO NOTHING"));
        assert_eq!(values.0.len(), 3);
    }
}
