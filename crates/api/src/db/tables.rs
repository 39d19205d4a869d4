//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    ClassCode,
    Role,
    CreatedAt,
}

#[derive(Iden)]
pub enum Lessons {
    Table,
    Id,
    Title,
    Description,
    Category,
    SortOrder,
    XpReward,
    CreatedAt,
}

#[derive(Iden)]
pub enum LessonPages {
    Table,
    Id,
    LessonId,
    PageNumber,
    Title,
    Content,
    ImageUrl,
}

#[derive(Iden)]
pub enum Quizzes {
    Table,
    Id,
    LessonId,
    Position,
    Question,
    Options,
    CorrectIndex,
    XpReward,
}

#[derive(Iden)]
pub enum QuizResults {
    Table,
    Id,
    UserId,
    LessonId,
    Correct,
    Total,
    Passed,
    SubmittedAt,
}

#[derive(Iden)]
pub enum Progress {
    Table,
    Id,
    UserId,
    LessonId,
    CompletedAt,
}

#[derive(Iden)]
pub enum Xp {
    Table,
    Id,
    UserId,
    Amount,
    Source,
    SourceRef,
    CreatedAt,
}

#[derive(Iden)]
pub enum Badges {
    Table,
    Id,
    Name,
    Description,
    Icon,
    Rule,
    Threshold,
    XpBonus,
    SortOrder,
}

#[derive(Iden)]
pub enum UserBadges {
    Table,
    UserId,
    BadgeId,
    AwardedAt,
}

#[derive(Iden)]
pub enum ClassChallenges {
    Table,
    Id,
    ClassCode,
    Title,
    Description,
    Metric,
    Target,
    XpReward,
    StartsOn,
    EndsOn,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
pub enum ChallengeProgress {
    Table,
    ChallengeId,
    UserId,
    Progress,
    CompletedAt,
}

#[derive(Iden)]
pub enum DailySignins {
    Table,
    UserId,
    Day,
    CreatedAt,
}

#[derive(Iden)]
pub enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Body,
    IsRead,
    CreatedAt,
}
