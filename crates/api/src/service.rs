//! Shared business logic — framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters: they validate through these helpers,
//! run SQL, and shape responses.

use chrono::NaiveDate;

use crate::streaks::parse_day;
use crate::{CreateChallengeRequest, CreateLessonRequest, ServiceError};

// ─── XP rewards ─────────────────────────────────────────────────────────────

/// XP for completing a lesson when the lesson doesn't set its own reward.
pub const DEFAULT_LESSON_XP: i64 = 20;

/// XP per correctly answered quiz question when the question doesn't set its own.
pub const DEFAULT_QUESTION_XP: i64 = 5;

/// Extra XP for answering every question of a quiz correctly.
pub const PERFECT_QUIZ_BONUS: i64 = 10;

/// XP for the first sign-in of a day, before the streak bonus.
pub const SIGNIN_BASE_XP: i64 = 5;

/// XP for finishing a class challenge when the teacher doesn't set a reward.
pub const DEFAULT_CHALLENGE_XP: i64 = 50;

/// Minimum share of correct answers, in percent, for a quiz to pass.
pub const PASS_PERCENT: i64 = 70;

/// Streak bonus: day 1 = 2 XP, day 2 = 4 XP, ... capped at 20.
pub fn streak_bonus(streak_days: u32) -> i64 {
    (i64::from(streak_days) * 2).min(20)
}

/// Total XP for a daily sign-in that extends the streak to `streak_days`.
pub fn signin_xp(streak_days: u32) -> i64 {
    SIGNIN_BASE_XP + streak_bonus(streak_days)
}

// ─── Quiz grading ───────────────────────────────────────────────────────────

/// Answer key entry for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerKey {
    pub correct_index: usize,
    pub xp_reward: i64,
}

/// Outcome of grading one quiz submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizGrade {
    pub correct: i64,
    pub total: i64,
    pub passed: bool,
    pub perfect: bool,
    /// XP this submission is worth if it is the user's first passing attempt.
    pub xp_value: i64,
}

/// Grade answers positionally against the key. Missing answers count as wrong.
pub fn grade_quiz(key: &[AnswerKey], answers: &[usize]) -> Result<QuizGrade, ServiceError> {
    if key.is_empty() {
        return Err(ServiceError::BadRequest("lesson has no quiz".into()));
    }
    if answers.len() > key.len() {
        return Err(ServiceError::BadRequest(format!(
            "expected at most {} answers, got {}",
            key.len(),
            answers.len()
        )));
    }

    let mut correct = 0i64;
    let mut xp_value = 0i64;
    for (question, answer) in key.iter().zip(answers) {
        if question.correct_index == *answer {
            correct += 1;
            xp_value += question.xp_reward;
        }
    }

    let total = key.len() as i64;
    let perfect = correct == total;
    if perfect {
        xp_value += PERFECT_QUIZ_BONUS;
    }

    Ok(QuizGrade {
        correct,
        total,
        passed: correct * 100 >= PASS_PERCENT * total,
        perfect,
        xp_value,
    })
}

// ─── Validation ─────────────────────────────────────────────────────────────

/// Validate and normalize a display name. Returns the trimmed name.
pub fn validate_display_name(name: &str) -> Result<String, ServiceError> {
    let trimmed = name.trim().to_string();
    if trimmed.is_empty() || trimmed.chars().count() > 64 {
        return Err(ServiceError::BadRequest(
            "display name must be 1-64 characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Normalize a class code to upper case. An empty code means "no class".
pub fn normalize_class_code(code: &str) -> Result<Option<String>, ServiceError> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid_chars || !(3..=16).contains(&trimmed.len()) {
        return Err(ServiceError::BadRequest(
            "class code must be 3-16 letters, digits, or dashes".into(),
        ));
    }
    Ok(Some(trimmed.to_ascii_uppercase()))
}

/// Validate a lesson title. Returns the trimmed title.
pub fn validate_lesson_title(title: &str) -> Result<String, ServiceError> {
    let trimmed = title.trim().to_string();
    if trimmed.is_empty() || trimmed.chars().count() > 120 {
        return Err(ServiceError::BadRequest(
            "lesson title must be 1-120 characters".into(),
        ));
    }
    Ok(trimmed)
}

/// Resolve an optional XP amount, rejecting negatives.
pub fn resolve_xp(amount: Option<i64>, default: i64) -> Result<i64, ServiceError> {
    match amount {
        Some(v) if v < 0 => Err(ServiceError::BadRequest("xp reward must be >= 0".into())),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

/// Validate a full lesson creation request.
pub fn validate_new_lesson(req: &CreateLessonRequest) -> Result<String, ServiceError> {
    let title = validate_lesson_title(&req.title)?;
    resolve_xp(req.xp_reward, DEFAULT_LESSON_XP)?;

    if req.pages.iter().any(|p| p.content.trim().is_empty()) {
        return Err(ServiceError::BadRequest(
            "lesson pages must have content".into(),
        ));
    }

    for (i, q) in req.questions.iter().enumerate() {
        let n = i + 1;
        if q.question.trim().is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "question {n} has no text"
            )));
        }
        if !(2..=6).contains(&q.options.len()) {
            return Err(ServiceError::BadRequest(format!(
                "question {n} must have 2-6 options"
            )));
        }
        if q.correct_index >= q.options.len() {
            return Err(ServiceError::BadRequest(format!(
                "question {n} has an out-of-range correct_index"
            )));
        }
        resolve_xp(q.xp_reward, DEFAULT_QUESTION_XP)?;
    }

    Ok(title)
}

/// Validate a notification title and body. Returns trimmed values.
pub fn validate_notification(title: &str, body: &str) -> Result<(String, String), ServiceError> {
    let title = title.trim().to_string();
    if title.is_empty() || title.chars().count() > 120 {
        return Err(ServiceError::BadRequest(
            "notification title must be 1-120 characters".into(),
        ));
    }
    let body = body.trim().to_string();
    if body.chars().count() > 2000 {
        return Err(ServiceError::BadRequest(
            "notification body must be at most 2000 characters".into(),
        ));
    }
    Ok((title, body))
}

/// Validated challenge window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeWindow {
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

/// Validate a challenge creation request and parse its date window.
pub fn validate_challenge(req: &CreateChallengeRequest) -> Result<ChallengeWindow, ServiceError> {
    let title = req.title.trim();
    if title.is_empty() || title.chars().count() > 120 {
        return Err(ServiceError::BadRequest(
            "challenge title must be 1-120 characters".into(),
        ));
    }
    if req.target < 1 {
        return Err(ServiceError::BadRequest(
            "challenge target must be at least 1".into(),
        ));
    }
    resolve_xp(req.xp_reward, DEFAULT_CHALLENGE_XP)?;

    let starts_on = parse_day(&req.starts_on)
        .ok_or_else(|| ServiceError::BadRequest("starts_on must be YYYY-MM-DD".into()))?;
    let ends_on = parse_day(&req.ends_on)
        .ok_or_else(|| ServiceError::BadRequest("ends_on must be YYYY-MM-DD".into()))?;
    if starts_on > ends_on {
        return Err(ServiceError::BadRequest(
            "challenge must not end before it starts".into(),
        ));
    }
    Ok(ChallengeWindow { starts_on, ends_on })
}

// ─── Leaderboard ────────────────────────────────────────────────────────────

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;

pub fn clamp_leaderboard_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT)
}
