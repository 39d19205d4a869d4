//! Shared API types, gamification rules, and SQL builders for ValueQuest.
//!
//! This crate is the **single source of truth** for all API request/response types.
//! TypeScript types are auto-generated via `ts-rs` and consumed by the mobile client.
//!
//! To regenerate TypeScript types:
//!   cargo test -p valuequest-api --features ts -- export_typescript --nocapture

use serde::{Deserialize, Serialize};

pub mod badges;
#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
pub mod levels;
pub mod service;
pub mod streaks;

pub use badges::{ActivityStats, BadgeDefinition, BadgeRule};
pub use levels::{Level, LevelProgress};

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Role of an account. Teachers manage content, challenges, and manual awards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an XP ledger row was credited for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum XpSource {
    Lesson,
    Quiz,
    Signin,
    Challenge,
    Badge,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Quiz => "quiz",
            Self::Signin => "signin",
            Self::Challenge => "challenge",
            Self::Badge => "badge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lesson" => Some(Self::Lesson),
            "quiz" => Some(Self::Quiz),
            "signin" => Some(Self::Signin),
            "challenge" => Some(Self::Challenge),
            "badge" => Some(Self::Badge),
            _ => None,
        }
    }
}

impl std::fmt::Display for XpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum NotificationKind {
    Badge,
    LevelUp,
    Challenge,
    #[default]
    Announcement,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Badge => "badge",
            Self::LevelUp => "level_up",
            Self::Challenge => "challenge",
            Self::Announcement => "announcement",
            Self::Reminder => "reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "badge" => Some(Self::Badge),
            "level_up" => Some(Self::LevelUp),
            "challenge" => Some(Self::Challenge),
            "announcement" => Some(Self::Announcement),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity a class challenge counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum ChallengeMetric {
    LessonsCompleted,
    QuizzesPassed,
    XpEarned,
    Signins,
}

impl ChallengeMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonsCompleted => "lessons_completed",
            Self::QuizzesPassed => "quizzes_passed",
            Self::XpEarned => "xp_earned",
            Self::Signins => "signins",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lessons_completed" => Some(Self::LessonsCompleted),
            "quizzes_passed" => Some(Self::QuizzesPassed),
            "xp_earned" => Some(Self::XpEarned),
            "signins" => Some(Self::Signins),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChallengeMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Common ──────────────────────────────────────────────────────────────────

/// Generic success response for operations that don't return data.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct OkResponse {
    pub ok: bool,
}

/// Returned by `GET /api/health` — server liveness check.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// A user row as seen by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub class_code: Option<String>,
    pub role: Role,
    pub created_at: String,
}

/// Returned by `GET /api/me`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MeResponse {
    pub profile: UserProfile,
    pub stats: ActivityStats,
    pub level: LevelProgress,
}

/// Request body for `PUT /api/me`. An empty `class_code` leaves the class.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub class_code: Option<String>,
}

// ─── Lessons ─────────────────────────────────────────────────────────────────

/// Lesson listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LessonSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: i64,
    pub xp_reward: i64,
    pub page_count: i64,
    pub question_count: i64,
    /// Whether the requesting user has completed this lesson.
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListLessonsResponse {
    pub lessons: Vec<LessonSummary>,
}

/// One page of lesson content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LessonPage {
    pub page_number: i64,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
}

/// Returned by `GET /api/lessons/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LessonDetail {
    pub lesson: LessonSummary,
    pub pages: Vec<LessonPage>,
}

/// Page content supplied when creating a lesson. Pages are numbered in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct NewLessonPage {
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
}

/// Quiz question supplied when creating a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub xp_reward: Option<i64>,
}

/// Request body for `POST /api/lessons`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
    pub xp_reward: Option<i64>,
    #[serde(default)]
    pub pages: Vec<NewLessonPage>,
    #[serde(default)]
    pub questions: Vec<NewQuizQuestion>,
}

/// Request body for `PUT /api/lessons/:id`. Absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateLessonRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<i64>,
    pub xp_reward: Option<i64>,
}

// ─── Quizzes ─────────────────────────────────────────────────────────────────

/// A quiz question as served to the learner (no answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct QuizQuestion {
    pub id: i64,
    pub position: i64,
    pub question: String,
    pub options: Vec<String>,
}

/// Returned by `GET /api/lessons/:id/quiz`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct QuizResponse {
    pub lesson_id: i64,
    pub questions: Vec<QuizQuestion>,
}

/// Request body for `POST /api/lessons/:id/quiz`. Answers are option indexes in question order.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SubmitQuizRequest {
    pub answers: Vec<usize>,
}

/// Returned by `POST /api/lessons/:id/quiz`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct QuizResultResponse {
    pub lesson_id: i64,
    pub correct: i64,
    pub total: i64,
    pub passed: bool,
    /// True when this submission is the user's first passing attempt for the lesson.
    pub first_pass: bool,
    pub xp_awarded: i64,
    pub rewards: ActivityRewards,
}

// ─── Progress & XP ───────────────────────────────────────────────────────────

/// Request body for `POST /api/complete-lesson`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CompleteLessonRequest {
    pub lesson_id: i64,
}

/// Returned by `POST /api/complete-lesson`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CompleteLessonResponse {
    pub lesson_id: i64,
    pub already_completed: bool,
    pub xp_awarded: i64,
    pub rewards: ActivityRewards,
}

/// Side effects of a tracked activity: badges, challenges, and level changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ActivityRewards {
    pub new_badges: Vec<BadgeResponse>,
    pub completed_challenges: Vec<i64>,
    pub level: LevelProgress,
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ProgressEntry {
    pub lesson_id: i64,
    pub title: String,
    pub completed_at: String,
}

/// Returned by `GET /api/progress`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ProgressResponse {
    pub entries: Vec<ProgressEntry>,
}

/// One row of the XP ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct XpEntry {
    pub amount: i64,
    pub source: XpSource,
    pub source_ref: Option<String>,
    pub created_at: String,
}

/// Returned by `GET /api/xp`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct XpResponse {
    pub level: LevelProgress,
    pub recent: Vec<XpEntry>,
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

/// Query parameters for `GET /api/leaderboard`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
    pub class_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub display_name: Option<String>,
    pub class_code: Option<String>,
    pub total_xp: i64,
    pub level: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

// ─── Badges ──────────────────────────────────────────────────────────────────

/// A badge from the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BadgeResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub rule: String,
    pub threshold: i64,
    pub xp_bonus: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListBadgesResponse {
    pub badges: Vec<BadgeResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AwardedBadge {
    pub badge: BadgeResponse,
    pub awarded_at: String,
}

/// Returned by `GET /api/user/achievements/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AchievementsResponse {
    pub user_id: String,
    pub badges: Vec<AwardedBadge>,
    pub stats: ActivityStats,
}

/// Request body for `POST /api/award-badge`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AwardBadgeRequest {
    pub user_id: String,
    pub badge_id: String,
}

/// Returned by `POST /api/award-badge`. `awarded` is false when the user already held the badge.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AwardBadgeResponse {
    pub awarded: bool,
    pub badge: BadgeResponse,
}

// ─── Daily sign-in ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct StreakResponse {
    pub current: u32,
    pub best: u32,
    pub signed_in_today: bool,
}

/// Returned by `POST /api/signin`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SigninResponse {
    pub day: String,
    pub already_signed_in: bool,
    pub streak: StreakResponse,
    pub xp_awarded: i64,
    pub rewards: ActivityRewards,
}

// ─── Class challenges ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ChallengeResponse {
    pub id: i64,
    pub class_code: String,
    pub title: String,
    pub description: Option<String>,
    pub metric: ChallengeMetric,
    pub target: i64,
    pub xp_reward: i64,
    pub starts_on: String,
    pub ends_on: String,
    pub created_by: String,
    pub created_at: String,
    /// Requesting user's progress, when listed for a learner.
    pub progress: Option<i64>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListChallengesResponse {
    pub challenges: Vec<ChallengeResponse>,
}

/// Request body for `POST /api/challenges`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateChallengeRequest {
    /// Defaults to the creating teacher's class.
    pub class_code: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub metric: ChallengeMetric,
    pub target: i64,
    pub xp_reward: Option<i64>,
    pub starts_on: String,
    pub ends_on: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ChallengeStanding {
    pub user_id: String,
    pub display_name: Option<String>,
    pub progress: i64,
    pub completed_at: Option<String>,
}

/// Returned by `GET /api/challenges/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ChallengeDetailResponse {
    pub challenge: ChallengeResponse,
    pub standings: Vec<ChallengeStanding>,
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

/// Query parameters for `GET /api/notifications`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct NotificationListQuery {
    pub unread_only: Option<bool>,
}

/// Request body for `POST /api/notifications`. Exactly one of `user_id` / `class_code`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateNotificationRequest {
    pub user_id: Option<String>,
    pub class_code: Option<String>,
    pub kind: Option<NotificationKind>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateNotificationResponse {
    pub created: usize,
}

/// Request body for `PUT /api/notifications/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateNotificationRequest {
    pub is_read: bool,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code; the server converts it into a
/// `{"error": "..."}` response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error into `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}

// ─── TypeScript generation ───────────────────────────────────────────────────

#[cfg(all(test, feature = "ts"))]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use ts_rs::TS;

    /// Run with: cargo test -p valuequest-api --features ts -- export_typescript --nocapture
    #[test]
    fn export_typescript() {
        let out_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/ts/api-types.generated.ts");

        let cfg = ts_rs::Config::new().with_large_int("number");
        let mut parts: Vec<String> = Vec::new();
        parts.push("// AUTO-GENERATED by valuequest-api — DO NOT EDIT".to_string());
        parts.push(String::new());

        macro_rules! collect_ts {
            ($($t:ty),+ $(,)?) => {
                $(
                    let decl = <$t>::decl(&cfg);
                    let decl = if decl.contains(" = {") {
                        decl
                            .replacen("type ", "export interface ", 1)
                            .replace(" = {", " {")
                            .trim_end_matches(';')
                            .to_string()
                    } else {
                        decl
                            .replacen("type ", "export type ", 1)
                            .trim_end_matches(';')
                            .to_string()
                    };
                    parts.push(decl);
                    parts.push(String::new());
                )+
            };
        }

        collect_ts!(
            Role,
            XpSource,
            NotificationKind,
            ChallengeMetric,
            OkResponse,
            HealthResponse,
            UserProfile,
            MeResponse,
            UpdateProfileRequest,
            ActivityStats,
            LevelProgress,
            LessonSummary,
            ListLessonsResponse,
            LessonPage,
            LessonDetail,
            NewLessonPage,
            NewQuizQuestion,
            CreateLessonRequest,
            UpdateLessonRequest,
            QuizQuestion,
            QuizResponse,
            SubmitQuizRequest,
            QuizResultResponse,
            CompleteLessonRequest,
            CompleteLessonResponse,
            ActivityRewards,
            ProgressEntry,
            ProgressResponse,
            XpEntry,
            XpResponse,
            LeaderboardQuery,
            LeaderboardEntry,
            LeaderboardResponse,
            BadgeResponse,
            ListBadgesResponse,
            AwardedBadge,
            AchievementsResponse,
            AwardBadgeRequest,
            AwardBadgeResponse,
            StreakResponse,
            SigninResponse,
            ChallengeResponse,
            ListChallengesResponse,
            CreateChallengeRequest,
            ChallengeStanding,
            ChallengeDetailResponse,
            NotificationResponse,
            ListNotificationsResponse,
            NotificationListQuery,
            CreateNotificationRequest,
            CreateNotificationResponse,
            UpdateNotificationRequest,
            ApiError,
        );

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let mut file = std::fs::File::create(&out_path)
            .unwrap_or_else(|e| panic!("Failed to create {}: {}", out_path.display(), e));
        file.write_all(parts.join("\n").as_bytes())
            .unwrap_or_else(|e| panic!("Failed to write {}: {}", out_path.display(), e));
    }
}
