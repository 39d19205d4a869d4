use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

use valuequest_api::crypto::{IdTokenClaims, sign_id_token};
use valuequest_server::{AppConfig, AppState, build_router, init_db};

const SECRET: &str = "test-secret";
const PROJECT: &str = "valuequest-test";

struct TestApp {
    router: Router,
    _dir: TempDir,
}

fn app_with_secret(secret: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = init_db(dir.path()).unwrap();
    let config = AppConfig {
        token_secret: secret.to_string(),
        project_id: Some(PROJECT.to_string()),
        base_url: "http://localhost:3000".to_string(),
    };
    TestApp {
        router: build_router(AppState { db, config }),
        _dir: dir,
    }
}

fn app() -> TestApp {
    app_with_secret(SECRET)
}

fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap()
}

fn token(sub: &str, name: &str, role: Option<&str>) -> String {
    let mut claims = IdTokenClaims::new(sub, Some(PROJECT), now());
    claims.name = Some(name.to_string());
    claims.email = Some(format!("{sub}@school.test"));
    claims.role = role.map(str::to_string);
    sign_id_token(&claims, SECRET).unwrap()
}

fn student(sub: &str) -> String {
    token(sub, &format!("Student {sub}"), None)
}

fn teacher() -> String {
    token("teacher", "Ms. Lee", Some("teacher"))
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = auth {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, auth: &str) -> (StatusCode, Value) {
        self.call("GET", uri, Some(auth), None).await
    }

    async fn post(&self, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
        self.call("POST", uri, Some(auth), Some(body)).await
    }

    async fn put(&self, uri: &str, auth: &str, body: Value) -> (StatusCode, Value) {
        self.call("PUT", uri, Some(auth), Some(body)).await
    }

    /// Create a lesson with two pages and a three-question quiz. Returns its id.
    async fn seed_lesson(&self, title: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/lessons",
                &teacher(),
                json!({
                    "title": title,
                    "description": "Why telling the truth matters",
                    "category": "honesty",
                    "xp_reward": 20,
                    "pages": [
                        { "title": "Intro", "content": "Honesty builds trust." },
                        { "content": "Tell the truth even when it is hard." }
                    ],
                    "questions": [
                        { "question": "Honesty builds?", "options": ["trust", "walls"], "correct_index": 0 },
                        { "question": "Should you lie?", "options": ["yes", "no"], "correct_index": 1 },
                        { "question": "Truth is?", "options": ["hard", "brave", "both"], "correct_index": 2, "xp_reward": 10 }
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["lesson"]["id"].as_i64().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Health + auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_token() {
    let app = app();
    let (status, body) = app.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_rejected() {
    let app = app();
    let (status, body) = app.call("GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/me", "not.a.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut claims = IdTokenClaims::new("ana", Some(PROJECT), now());
    claims.aud = Some("another-project".into());
    let wrong_audience = sign_id_token(&claims, SECRET).unwrap();
    let (status, _) = app.get("/api/me", &wrong_audience).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = sign_id_token(&IdTokenClaims::new("ana", Some(PROJECT), now()), "other").unwrap();
    let (status, _) = app.get("/api/me", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_secret_disables_authentication() {
    let app = app_with_secret("");
    let (status, _) = app.get("/api/me", &student("ana")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_request_creates_profile() {
    let app = app();
    let (status, body) = app.get("/api/me", &student("ana")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["id"], "ana");
    assert_eq!(body["profile"]["display_name"], "Student ana");
    assert_eq!(body["profile"]["role"], "student");
    assert_eq!(body["level"]["level"], 1);
    assert_eq!(body["stats"]["total_xp"], 0);
}

#[tokio::test]
async fn profile_updates_are_validated() {
    let app = app();
    let ana = student("ana");

    let (status, body) = app
        .put("/api/me", &ana, json!({ "display_name": "  Ana  ", "class_code": "5b-blue" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["display_name"], "Ana");
    assert_eq!(body["profile"]["class_code"], "5B-BLUE");

    let (status, _) = app.put("/api/me", &ana, json!({ "class_code": "x!" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The token name does not overwrite a name chosen in-app.
    let (_, body) = app.get("/api/me", &ana).await;
    assert_eq!(body["profile"]["display_name"], "Ana");
}

// ---------------------------------------------------------------------------
// Lessons + quizzes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn students_cannot_author_lessons() {
    let app = app();
    let (status, body) = app
        .post("/api/lessons", &student("ana"), json!({ "title": "Sneaky" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "teacher role required");
}

#[tokio::test]
async fn lesson_crud() {
    let app = app();
    let id = app.seed_lesson("Honesty").await;

    let (status, body) = app.get(&format!("/api/lessons/{id}"), &student("ana")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson"]["page_count"], 2);
    assert_eq!(body["lesson"]["question_count"], 3);
    assert_eq!(body["pages"][1]["page_number"], 2);

    let (status, body) = app
        .put(&format!("/api/lessons/{id}"), &teacher(), json!({ "title": "Being Honest" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson"]["title"], "Being Honest");

    let (status, _) = app
        .call("DELETE", &format!("/api/lessons/{id}"), Some(&teacher()), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/lessons/{id}"), &student("ana")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_lesson_fields_are_stored_as_null() {
    let app = app();
    let id = app.seed_lesson("Honesty").await;

    let (status, body) = app
        .put(
            &format!("/api/lessons/{id}"),
            &teacher(),
            json!({ "description": "   ", "category": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["lesson"]["description"].is_null());
    assert!(body["lesson"]["category"].is_null());

    let (status, body) = app
        .post(
            "/api/lessons",
            &teacher(),
            json!({ "title": "Kindness", "description": " ", "category": "  " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["lesson"]["description"].is_null());
    assert!(body["lesson"]["category"].is_null());
}

#[tokio::test]
async fn quiz_hides_answers() {
    let app = app();
    let id = app.seed_lesson("Honesty").await;
    let (status, body) = app.get(&format!("/api/lessons/{id}/quiz"), &student("ana")).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions[0].get("correct_index").is_none());
    assert_eq!(questions[2]["options"], json!(["hard", "brave", "both"]));
}

#[tokio::test]
async fn quiz_xp_only_on_first_pass() {
    let app = app();
    let ana = student("ana");
    let id = app.seed_lesson("Honesty").await;
    let uri = format!("/api/lessons/{id}/quiz");

    let (status, body) = app.post(&uri, &ana, json!({ "answers": [0, 0, 0] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passed"], false);
    assert_eq!(body["xp_awarded"], 0);

    // 5 + 5 + 10 for the questions, plus the perfect bonus.
    let (_, body) = app.post(&uri, &ana, json!({ "answers": [0, 1, 2] })).await;
    assert_eq!(body["passed"], true);
    assert_eq!(body["first_pass"], true);
    assert_eq!(body["xp_awarded"], 30);
    let badges: Vec<&str> = body["rewards"]["new_badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(badges, vec!["quiz_starter", "sharp_thinker"]);

    let (_, body) = app.post(&uri, &ana, json!({ "answers": [0, 1, 2] })).await;
    assert_eq!(body["first_pass"], false);
    assert_eq!(body["xp_awarded"], 0);

    let (status, _) = app
        .post(&uri, &ana, json!({ "answers": [0, 1, 2, 0] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Progress, XP, badges
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completing_a_lesson_twice_keeps_one_progress_row() {
    let app = app();
    let ana = student("ana");
    let id = app.seed_lesson("Honesty").await;

    let (status, body) = app
        .post("/api/complete-lesson", &ana, json!({ "lesson_id": id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_completed"], false);
    assert_eq!(body["xp_awarded"], 20);
    assert_eq!(body["rewards"]["new_badges"][0]["id"], "first_steps");

    let (_, body) = app
        .post("/api/complete-lesson", &ana, json!({ "lesson_id": id }))
        .await;
    assert_eq!(body["already_completed"], true);
    assert_eq!(body["xp_awarded"], 0);
    assert_eq!(body["rewards"]["new_badges"], json!([]));

    let (_, body) = app.get("/api/progress", &ana).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["title"], "Honesty");

    let (_, body) = app.get("/api/user/achievements/ana", &ana).await;
    assert_eq!(body["badges"].as_array().unwrap().len(), 1);
    assert_eq!(body["stats"]["lessons_completed"], 1);

    // lesson 20 + first_steps 10
    let (_, body) = app.get("/api/xp", &ana).await;
    assert_eq!(body["level"]["total_xp"], 30);
    assert_eq!(body["recent"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn completing_an_unknown_lesson_is_not_found() {
    let app = app();
    let (status, _) = app
        .post("/api/complete-lesson", &student("ana"), json!({ "lesson_id": 999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leaderboard_orders_by_xp() {
    let app = app();
    let first = app.seed_lesson("Honesty").await;
    let second = app.seed_lesson("Kindness").await;

    let (ana, ben, cy) = (student("ana"), student("ben"), student("cy"));
    for lesson in [first, second] {
        app.post("/api/complete-lesson", &ben, json!({ "lesson_id": lesson }))
            .await;
    }
    app.post("/api/complete-lesson", &ana, json!({ "lesson_id": first }))
        .await;
    app.get("/api/me", &cy).await;

    let (status, body) = app.get("/api/leaderboard", &ana).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    let order: Vec<&str> = entries
        .iter()
        .map(|e| e["user_id"].as_str().unwrap())
        .collect();
    // Teachers are not ranked.
    assert_eq!(order, vec!["ben", "ana", "cy"]);
    let xp: Vec<i64> = entries
        .iter()
        .map(|e| e["total_xp"].as_i64().unwrap())
        .collect();
    assert!(xp.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(entries[0]["rank"], 1);

    let (_, body) = app.get("/api/leaderboard?limit=1", &ana).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn manual_badge_award_is_idempotent() {
    let app = app();
    app.get("/api/me", &student("ana")).await;
    let award = json!({ "user_id": "ana", "badge_id": "steady_7" });

    let (status, _) = app.post("/api/award-badge", &student("ben"), award.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post("/api/award-badge", &teacher(), award.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["awarded"], true);
    assert_eq!(body["badge"]["name"], "Week of Wonder");

    let (_, body) = app.post("/api/award-badge", &teacher(), award).await;
    assert_eq!(body["awarded"], false);

    let (_, body) = app.get("/api/user/achievements/ana", &teacher()).await;
    let ids: Vec<&str> = body["badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["badge"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["steady_7"]);

    let (status, _) = app
        .post(
            "/api/award-badge",
            &teacher(),
            json!({ "user_id": "ana", "badge_id": "no_such_badge" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn achievements_are_private_to_students() {
    let app = app();
    app.get("/api/me", &student("ana")).await;
    let (status, _) = app.get("/api/user/achievements/ana", &student("ben")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Sign-ins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signin_counts_once_per_day() {
    let app = app();
    let ana = student("ana");

    let (status, body) = app.call("POST", "/api/signin", Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_signed_in"], false);
    assert_eq!(body["streak"]["current"], 1);
    // base 5 + streak bonus 2
    assert_eq!(body["xp_awarded"], 7);

    let (_, body) = app.call("POST", "/api/signin", Some(&ana), None).await;
    assert_eq!(body["already_signed_in"], true);
    assert_eq!(body["xp_awarded"], 0);

    let (_, body) = app.get("/api/signin/streak", &ana).await;
    assert_eq!(body["current"], 1);
    assert_eq!(body["signed_in_today"], true);
}

// ---------------------------------------------------------------------------
// Challenges
// ---------------------------------------------------------------------------

#[tokio::test]
async fn class_challenge_completes_on_lesson() {
    let app = app();
    let ana = student("ana");
    app.put("/api/me", &ana, json!({ "class_code": "5B" })).await;
    app.put("/api/me", &student("ben"), json!({ "class_code": "5B" }))
        .await;
    let lesson = app.seed_lesson("Honesty").await;

    let today = chrono::Utc::now().date_naive();
    let (status, body) = app
        .post(
            "/api/challenges",
            &teacher(),
            json!({
                "class_code": "5b",
                "title": "One lesson each",
                "metric": "lessons_completed",
                "target": 1,
                "xp_reward": 40,
                "starts_on": today.format("%Y-%m-%d").to_string(),
                "ends_on": (today + chrono::Duration::days(6)).format("%Y-%m-%d").to_string(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let challenge_id = body["id"].as_i64().unwrap();
    assert_eq!(body["class_code"], "5B");

    let (_, body) = app.get("/api/challenges", &ana).await;
    assert_eq!(body["challenges"].as_array().unwrap().len(), 1);

    let (_, body) = app
        .post("/api/complete-lesson", &ana, json!({ "lesson_id": lesson }))
        .await;
    assert_eq!(body["rewards"]["completed_challenges"], json!([challenge_id]));

    let (status, body) = app
        .get(&format!("/api/challenges/{challenge_id}"), &ana)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["challenge"]["progress"], 1);
    assert!(body["challenge"]["completed_at"].is_string());
    let standings = body["standings"].as_array().unwrap();
    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0]["user_id"], "ana");
    assert_eq!(standings[1]["progress"], 0);

    // Outsiders cannot see the class challenge.
    let (status, _) = app
        .get(&format!("/api/challenges/{challenge_id}"), &student("zed"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn challenge_window_is_validated() {
    let app = app();
    let (status, _) = app
        .post(
            "/api/challenges",
            &teacher(),
            json!({
                "class_code": "5B",
                "title": "Backwards",
                "metric": "signins",
                "target": 3,
                "starts_on": "2024-05-10",
                "ends_on": "2024-05-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notifications_lifecycle() {
    let app = app();
    let ana = student("ana");
    app.put("/api/me", &ana, json!({ "class_code": "5B" })).await;
    app.put("/api/me", &student("ben"), json!({ "class_code": "5B" }))
        .await;

    let (status, body) = app
        .post(
            "/api/notifications",
            &teacher(),
            json!({ "class_code": "5B", "title": "Field trip", "body": "Bring water." }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 2);

    let (_, body) = app.get("/api/notifications", &ana).await;
    assert_eq!(body["unread_count"], 1);
    let id = body["notifications"][0]["id"].as_i64().unwrap();
    assert_eq!(body["notifications"][0]["kind"], "announcement");

    // Someone else's notification looks missing.
    let (status, _) = app
        .put(&format!("/api/notifications/{id}"), &student("ben"), json!({ "is_read": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .put(&format!("/api/notifications/{id}"), &ana, json!({ "is_read": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/notifications?unread_only=true", &ana).await;
    assert_eq!(body["notifications"], json!([]));
    assert_eq!(body["unread_count"], 0);

    let (_, body) = app.get("/api/notifications", &student("ben")).await;
    assert_eq!(body["unread_count"], 1);
    let (status, _) = app
        .put("/api/notifications/read-all", &student("ben"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/notifications", &student("ben")).await;
    assert_eq!(body["unread_count"], 0);

    let (status, _) = app
        .call("DELETE", &format!("/api/notifications/{id}"), Some(&ana), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/notifications", &ana).await;
    assert_eq!(body["notifications"], json!([]));
}

#[tokio::test]
async fn notification_needs_exactly_one_target() {
    let app = app();
    let (status, _) = app
        .post(
            "/api/notifications",
            &teacher(),
            json!({ "title": "Hello", "body": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
