//! Quiz question + result query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{QuizResults, Quizzes};

/// INSERT a question. `options_json` is a JSON array of option strings.
pub fn insert_question(
    lesson_id: i64,
    position: i64,
    question: &str,
    options_json: &str,
    correct_index: i64,
    xp_reward: i64,
) -> Built {
    Query::insert()
        .into_table(Quizzes::Table)
        .columns([
            Quizzes::LessonId,
            Quizzes::Position,
            Quizzes::Question,
            Quizzes::Options,
            Quizzes::CorrectIndex,
            Quizzes::XpReward,
        ])
        .values_panic([
            lesson_id.into(),
            position.into(),
            question.into(),
            options_json.into(),
            correct_index.into(),
            xp_reward.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Questions of a lesson in order: id, position, question, options, correct_index, xp_reward.
pub fn list_for_lesson(lesson_id: i64) -> Built {
    Query::select()
        .columns([
            Quizzes::Id,
            Quizzes::Position,
            Quizzes::Question,
            Quizzes::Options,
            Quizzes::CorrectIndex,
            Quizzes::XpReward,
        ])
        .from(Quizzes::Table)
        .and_where(Expr::col(Quizzes::LessonId).eq(lesson_id))
        .order_by(Quizzes::Position, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn insert_result(
    user_id: &str,
    lesson_id: i64,
    correct: i64,
    total: i64,
    passed: bool,
    submitted_at: &str,
) -> Built {
    Query::insert()
        .into_table(QuizResults::Table)
        .columns([
            QuizResults::UserId,
            QuizResults::LessonId,
            QuizResults::Correct,
            QuizResults::Total,
            QuizResults::Passed,
            QuizResults::SubmittedAt,
        ])
        .values_panic([
            user_id.into(),
            lesson_id.into(),
            correct.into(),
            total.into(),
            passed.into(),
            submitted_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Whether the user already has a passing result for this lesson's quiz.
pub fn has_passed(user_id: &str, lesson_id: i64) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(QuizResults::Table)
        .and_where(Expr::col(QuizResults::UserId).eq(user_id))
        .and_where(Expr::col(QuizResults::LessonId).eq(lesson_id))
        .and_where(Expr::col(QuizResults::Passed).eq(true))
        .build(SqliteQueryBuilder)
}
