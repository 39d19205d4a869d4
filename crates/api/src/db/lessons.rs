//! Lesson + page query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{LessonPages, Lessons};

/// Lesson summary columns, in `LessonSummary` order. The single placeholder
/// is the requesting user's id (for the `completed` flag).
const SUMMARY_SELECT: &str = "SELECT l.\"id\", l.\"title\", l.\"description\", l.\"category\", \
     l.\"sort_order\", l.\"xp_reward\", \
     (SELECT COUNT(*) FROM \"lesson_pages\" p WHERE p.\"lesson_id\" = l.\"id\"), \
     (SELECT COUNT(*) FROM \"quizzes\" q WHERE q.\"lesson_id\" = l.\"id\"), \
     EXISTS (SELECT 1 FROM \"progress\" pr WHERE pr.\"lesson_id\" = l.\"id\" AND pr.\"user_id\" = ?) \
     FROM \"lessons\" l";

/// All lessons in curriculum order, with the user's completion flag.
pub fn list_for_user(user_id: &str) -> Built {
    let sql = format!("{SUMMARY_SELECT} ORDER BY l.\"sort_order\" ASC, l.\"id\" ASC");
    (sql, sea_query::Values(vec![user_id.into()]))
}

/// One lesson summary, with the user's completion flag.
pub fn get_for_user(lesson_id: i64, user_id: &str) -> Built {
    let sql = format!("{SUMMARY_SELECT} WHERE l.\"id\" = ?");
    (
        sql,
        sea_query::Values(vec![user_id.into(), lesson_id.into()]),
    )
}

pub fn insert(
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
    sort_order: i64,
    xp_reward: i64,
) -> Built {
    Query::insert()
        .into_table(Lessons::Table)
        .columns([
            Lessons::Title,
            Lessons::Description,
            Lessons::Category,
            Lessons::SortOrder,
            Lessons::XpReward,
        ])
        .values_panic([
            title.into(),
            description.map(|s| s.to_string()).into(),
            category.map(|s| s.to_string()).into(),
            sort_order.into(),
            xp_reward.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Next free `sort_order` (appends the lesson to the curriculum).
pub fn next_sort_order() -> Built {
    let sql = "SELECT COALESCE(MAX(\"sort_order\"), 0) + 1 FROM \"lessons\"".to_string();
    (sql, sea_query::Values(vec![]))
}

/// Fields changed by `PUT /lessons/:id`.
#[derive(Debug, Default)]
pub struct LessonChanges<'a> {
    pub title: Option<&'a str>,
    /// `Some(None)` clears the column.
    pub description: Option<Option<&'a str>>,
    pub category: Option<Option<&'a str>>,
    pub sort_order: Option<i64>,
    pub xp_reward: Option<i64>,
}

/// UPDATE the present fields. Returns `None` when nothing changes.
pub fn update(lesson_id: i64, changes: &LessonChanges<'_>) -> Option<Built> {
    let mut q = Query::update();
    q.table(Lessons::Table);
    let mut any = false;
    if let Some(title) = changes.title {
        q.value(Lessons::Title, title);
        any = true;
    }
    if let Some(description) = changes.description {
        q.value(Lessons::Description, description.map(|s| s.to_string()));
        any = true;
    }
    if let Some(category) = changes.category {
        q.value(Lessons::Category, category.map(|s| s.to_string()));
        any = true;
    }
    if let Some(sort_order) = changes.sort_order {
        q.value(Lessons::SortOrder, sort_order);
        any = true;
    }
    if let Some(xp_reward) = changes.xp_reward {
        q.value(Lessons::XpReward, xp_reward);
        any = true;
    }
    if !any {
        return None;
    }
    Some(
        q.and_where(Expr::col(Lessons::Id).eq(lesson_id))
            .build(SqliteQueryBuilder),
    )
}

pub fn delete(lesson_id: i64) -> Built {
    Query::delete()
        .from_table(Lessons::Table)
        .and_where(Expr::col(Lessons::Id).eq(lesson_id))
        .build(SqliteQueryBuilder)
}

pub fn exists(lesson_id: i64) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Lessons::Table)
        .and_where(Expr::col(Lessons::Id).eq(lesson_id))
        .build(SqliteQueryBuilder)
}

/// `(title, xp_reward)` for a lesson.
pub fn get_reward(lesson_id: i64) -> Built {
    Query::select()
        .columns([Lessons::Title, Lessons::XpReward])
        .from(Lessons::Table)
        .and_where(Expr::col(Lessons::Id).eq(lesson_id))
        .build(SqliteQueryBuilder)
}

// ── Pages ──────────────────────────────────────────────────────────────────

pub fn insert_page(
    lesson_id: i64,
    page_number: i64,
    title: Option<&str>,
    content: &str,
    image_url: Option<&str>,
) -> Built {
    Query::insert()
        .into_table(LessonPages::Table)
        .columns([
            LessonPages::LessonId,
            LessonPages::PageNumber,
            LessonPages::Title,
            LessonPages::Content,
            LessonPages::ImageUrl,
        ])
        .values_panic([
            lesson_id.into(),
            page_number.into(),
            title.map(|s| s.to_string()).into(),
            content.into(),
            image_url.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Pages of a lesson in reading order.
pub fn list_pages(lesson_id: i64) -> Built {
    Query::select()
        .columns([
            LessonPages::PageNumber,
            LessonPages::Title,
            LessonPages::Content,
            LessonPages::ImageUrl,
        ])
        .from(LessonPages::Table)
        .and_where(Expr::col(LessonPages::LessonId).eq(lesson_id))
        .order_by(LessonPages::PageNumber, Order::Asc)
        .build(SqliteQueryBuilder)
}
