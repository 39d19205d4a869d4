pub mod auth;
pub mod badges;
pub mod challenges;
pub mod health;
pub mod lessons;
pub mod notifications;
pub mod progress;
pub mod quizzes;
pub mod signins;
pub mod users;
pub mod xp;
