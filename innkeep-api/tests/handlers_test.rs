//! Drives the full router through tower with the in-memory backends: session
//! cookies, flashes, the draft lifecycle, the commit, and the notifications.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use innkeep_api::notify::{Dispatcher, MailData, Mailer};
use innkeep_api::session::Sessions;
use innkeep_api::{app, AppState};
use innkeep_core::models::RestrictionKind;
use innkeep_store::app_config::OverflowPolicy;
use innkeep_store::{MemorySessionStore, MemoryStore};

struct CaptureMailer {
    sent: Mutex<Vec<MailData>>,
}

impl CaptureMailer {
    fn new() -> Arc<Self> {
        Arc::new(Self { sent: Mutex::new(Vec::new()) })
    }

    async fn wait_for(&self, count: usize) -> Vec<MailData> {
        for _ in 0..200 {
            let sent = self.sent.lock().await;
            if sent.len() >= count {
                return sent.clone();
            }
            drop(sent);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, message: &MailData) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

async fn setup() -> (Router, Arc<MemoryStore>, Arc<CaptureMailer>) {
    let store = Arc::new(MemoryStore::new());
    store.seed_room(1, "General's Quarters").await;
    store.seed_room(2, "Major's Suite").await;
    store.seed_user(1, "owner@example.com", "password123").await;

    let mailer = CaptureMailer::new();
    let state = AppState {
        store: store.clone(),
        sessions: Sessions::new(Arc::new(MemorySessionStore::new()), Duration::from_secs(3600)),
        mail: Dispatcher::start(16, OverflowPolicy::DropNewest, Duration::from_millis(50), mailer.clone()),
        mail_from: "stay@innkeep.example".into(),
        owner_address: "owner@innkeep.example".into(),
        cookie_secure: false,
    };

    (app(state), store, mailer)
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_post(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn session_cookie_of(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("innkeep_session"))
        .and_then(|v| v.split(';').next())
        .expect("response sets a session cookie")
        .to_string()
}

fn location_of(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response has a Location header")
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn public_get_routes_respond_ok() {
    let (app, _, _) = setup().await;

    for path in [
        "/",
        "/about",
        "/contact",
        "/rooms/generals-quarters",
        "/rooms/majors-suite",
        "/search-availability",
        "/user/login",
    ] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);
    }
}

#[tokio::test]
async fn search_lists_only_free_rooms() {
    let (app, store, _) = setup().await;
    store
        .seed_restriction(
            1,
            "2024-06-02".parse().unwrap(),
            "2024-06-04".parse().unwrap(),
            RestrictionKind::Reservation,
        )
        .await;

    let response = app
        .clone()
        .oneshot(form_post("/search-availability", "start=2024-06-01&end=2024-06-03", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("/choose-room/2"), "free room offered: {}", body);
    assert!(!body.contains("/choose-room/1"), "restricted room hidden: {}", body);
}

#[tokio::test]
async fn search_with_no_vacancy_flashes_and_redirects() {
    let (app, store, _) = setup().await;
    for room_id in [1, 2] {
        store
            .seed_restriction(
                room_id,
                "2024-06-01".parse().unwrap(),
                "2024-06-05".parse().unwrap(),
                RestrictionKind::OwnerBlock,
            )
            .await;
    }

    let response = app
        .clone()
        .oneshot(form_post("/search-availability", "start=2024-06-02&end=2024-06-03", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/search-availability");

    let cookie = session_cookie_of(&response);
    let follow = app
        .clone()
        .oneshot(get("/search-availability", Some(&cookie)))
        .await
        .unwrap();
    let body = body_string(follow).await;
    assert!(body.contains("No availability"), "{}", body);
}

#[tokio::test]
async fn search_rejects_inverted_date_range() {
    let (app, _, _) = setup().await;

    let response = app
        .clone()
        .oneshot(form_post("/search-availability", "start=2024-06-05&end=2024-06-01", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = session_cookie_of(&response);
    let follow = app
        .clone()
        .oneshot(get("/search-availability", Some(&cookie)))
        .await
        .unwrap();
    let body = body_string(follow).await;
    assert!(body.contains("check-in date must fall before check-out date"), "{}", body);
}

#[tokio::test]
async fn choose_room_without_a_draft_redirects_home() {
    let (app, _, _) = setup().await;

    let response = app.clone().oneshot(get("/choose-room/1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn summary_without_a_draft_redirects_home() {
    let (app, _, _) = setup().await;

    let response = app.clone().oneshot(get("/reservation-summary", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn full_booking_flow_commits_once_and_notifies_twice() {
    let (app, store, mailer) = setup().await;

    // 1. Search: the draft enters DatesChosen and the session cookie is set.
    let response = app
        .clone()
        .oneshot(form_post("/search-availability", "start=2024-06-01&end=2024-06-03", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie_of(&response);

    // 2. Choose a room.
    let response = app
        .clone()
        .oneshot(get("/choose-room/2", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/make-reservation");

    // 3. The form shows the chosen room and dates.
    let response = app
        .clone()
        .oneshot(get("/make-reservation", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("2024-06-01"));
    assert!(body.contains("Major&#39;s Suite"));

    // 4. Submit the contact details.
    let response = app
        .clone()
        .oneshot(form_post(
            "/make-reservation",
            "first_name=Alice&last_name=Smith&email=alice%40example.com&phone=555-0100",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/reservation-summary");

    let reservations = store.reservations().await;
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0].room_id, 2);
    assert_eq!(reservations[0].email, "alice@example.com");
    let restrictions = store.restrictions().await;
    assert_eq!(restrictions.len(), 1);
    assert_eq!(restrictions[0].reservation_id, Some(reservations[0].id));

    let sent = mailer.wait_for(2).await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "Reservation Confirmation");
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(sent[1].subject, "Reservation Notification");
    assert_eq!(sent[1].template.as_deref(), Some("basic.html"));

    // 5. The summary renders once, then the draft is gone.
    let response = app
        .clone()
        .oneshot(get("/reservation-summary", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Alice Smith"));

    let response = app
        .clone()
        .oneshot(get("/reservation-summary", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");
}

#[tokio::test]
async fn invalid_contact_details_redisplay_without_persisting() {
    let (app, store, mailer) = setup().await;

    let response = app
        .clone()
        .oneshot(form_post("/search-availability", "start=2024-06-01&end=2024-06-03", None))
        .await
        .unwrap();
    let cookie = session_cookie_of(&response);
    app.clone()
        .oneshot(get("/choose-room/1", Some(&cookie)))
        .await
        .unwrap();

    // "Al" is too short and "alice@example" has no TLD.
    let response = app
        .clone()
        .oneshot(form_post(
            "/make-reservation",
            "first_name=Al&last_name=Smith&email=alice%40example&phone=",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("at least 3 characters"), "{}", body);
    assert!(body.contains("Invalid email address"), "{}", body);
    // Entered values are preserved for the redisplay.
    assert!(body.contains(r#"value="Al""#));
    assert!(body.contains(r#"value="alice@example""#));

    assert!(store.reservations().await.is_empty());
    assert!(store.restrictions().await.is_empty());
    assert!(mailer.sent.lock().await.is_empty());
}

#[tokio::test]
async fn stale_draft_conflicts_flash_and_redirect_to_search() {
    let (app, store, _) = setup().await;

    // Draft built directly from a room page link, then the dates get taken.
    let response = app
        .clone()
        .oneshot(get("/book-room?id=1&s=2024-06-10&e=2024-06-12", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie_of(&response);

    store
        .seed_restriction(
            1,
            "2024-06-11".parse().unwrap(),
            "2024-06-13".parse().unwrap(),
            RestrictionKind::Reservation,
        )
        .await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/make-reservation",
            "first_name=Alice&last_name=Smith&email=alice%40example.com&phone=",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/search-availability");

    assert!(store.reservations().await.is_empty());

    let follow = app
        .clone()
        .oneshot(get("/search-availability", Some(&cookie)))
        .await
        .unwrap();
    let body = body_string(follow).await;
    assert!(body.contains("no longer available"), "{}", body);
}

#[tokio::test]
async fn availability_json_distinguishes_no_from_unknown() {
    let (app, store, _) = setup().await;
    store
        .seed_restriction(
            1,
            "2024-06-02".parse().unwrap(),
            "2024-06-04".parse().unwrap(),
            RestrictionKind::Reservation,
        )
        .await;

    // Free room: ok true.
    let response = app
        .clone()
        .oneshot(form_post(
            "/search-availability-json",
            "start=2024-06-01&end=2024-06-03&room_id=2",
            None,
        ))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["room_id"], "2");
    assert_eq!(body["start_date"], "2024-06-01");

    // Restricted room: a definite no with an empty message.
    let response = app
        .clone()
        .oneshot(form_post(
            "/search-availability-json",
            "start=2024-06-01&end=2024-06-03&room_id=1",
            None,
        ))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["message"], "");

    // Bad input: not an availability verdict at all.
    let response = app
        .clone()
        .oneshot(form_post(
            "/search-availability-json",
            "start=junk&end=2024-06-03&room_id=1",
            None,
        ))
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["ok"], false);
    assert_ne!(body["message"], "");
}

#[tokio::test]
async fn login_rejects_bad_credentials_without_detail() {
    let (app, _, _) = setup().await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/user/login",
            "email=owner%40example.com&password=wrong",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/user/login");

    let cookie = session_cookie_of(&response);
    let follow = app.clone().oneshot(get("/user/login", Some(&cookie))).await.unwrap();
    let body = body_string(follow).await;
    assert!(body.contains("Invalid login credentials"), "{}", body);
}

#[tokio::test]
async fn login_validation_errors_redisplay_the_form() {
    let (app, _, _) = setup().await;

    let response = app
        .clone()
        .oneshot(form_post("/user/login", "email=&password=", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("This field cannot be blank"), "{}", body);
}

#[tokio::test]
async fn login_renews_the_session_and_unlocks_admin() {
    let (app, _, _) = setup().await;

    // Establish a session first so the renewal is observable.
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let anon_cookie = session_cookie_of(&response);

    let response = app
        .clone()
        .oneshot(form_post(
            "/user/login",
            "email=owner%40example.com&password=password123",
            Some(&anon_cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/");

    let auth_cookie = session_cookie_of(&response);
    assert_ne!(auth_cookie, anon_cookie, "session id must change on login");

    let follow = app.clone().oneshot(get("/", Some(&auth_cookie))).await.unwrap();
    let body = body_string(follow).await;
    assert!(body.contains("Logged in successfully"), "{}", body);

    let response = app
        .clone()
        .oneshot(get("/admin/dashboard", Some(&auth_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Dashboard"));

    // Logout issues a fresh id; admin locks again.
    let response = app
        .clone()
        .oneshot(get("/user/logout", Some(&auth_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let fresh_cookie = session_cookie_of(&response);
    assert_ne!(fresh_cookie, auth_cookie);

    let response = app
        .clone()
        .oneshot(get("/admin/dashboard", Some(&fresh_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/user/login");
}

#[tokio::test]
async fn admin_requires_a_logged_in_user() {
    let (app, _, _) = setup().await;

    let response = app.clone().oneshot(get("/admin/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location_of(&response), "/user/login");
}
