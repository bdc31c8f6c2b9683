//! End-to-end tests of the HTTP surface over the in-memory ledger.
//!
//! Run with: `cargo test --test http_api_test`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use boxoffice_server::auth::{
    AccessGate, InMemoryLoginThrottle, OrganiserCredential, SessionStore, ThrottlePolicy,
};
use boxoffice_server::config::{Environment, DEFAULT_ALLOWED_ORIGINS};
use boxoffice_server::ledger::{InMemoryLedger, Ledger};
use boxoffice_server::routes::create_routes;
use boxoffice_server::services::FixedClock;
use boxoffice_server::state::AppState;

const PASSWORD: &str = "correct horse battery staple";

struct TestApp {
    router: Router,
    ledger: InMemoryLedger,
}

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

fn test_app() -> TestApp {
    let ledger = InMemoryLedger::new();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let gate = AccessGate::new(
        OrganiserCredential::new(PASSWORD),
        Arc::new(InMemoryLoginThrottle::new(ThrottlePolicy::default())),
        Arc::new(SessionStore::default()),
    );
    let state = AppState::new(
        Arc::new(ledger.clone()),
        Arc::new(FixedClock::new(now)),
        gate,
        Environment::Unspecified,
    );

    TestApp {
        router: create_routes(state, DEFAULT_ALLOWED_ORIGINS),
        ledger,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        self.send_from("203.0.113.10:40000", method, uri, cookie, body)
            .await
    }

    async fn send_from(
        &self,
        peer: &str,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let mut request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let peer: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Reply {
            status,
            set_cookie,
            body,
        }
    }

    async fn login(&self) -> String {
        let reply = self
            .send(
                Method::POST,
                "/organiser/login",
                None,
                Some(json!({ "password": PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);

        let set_cookie = reply.set_cookie.expect("login sets a session cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }

    /// Creates, edits and publishes an event; returns its id.
    async fn published_event(&self, cookie: &str, full: i64, concession: i64) -> String {
        let created = self
            .send(Method::POST, "/organiser/events", Some(cookie), None)
            .await;
        assert_eq!(created.status, StatusCode::CREATED);
        let id = created.body["data"]["id"].as_str().unwrap().to_string();

        let edited = self
            .send(
                Method::PUT,
                &format!("/organiser/events/{id}"),
                Some(cookie),
                Some(json!({
                    "title": "Harbour Lights",
                    "description": "An evening concert on the pier",
                    "event_date": "2026-06-01T19:00",
                    "full_price_tickets": full,
                    "full_price_cost": "10.00",
                    "concession_tickets": concession,
                    "concession_cost": 5,
                })),
            )
            .await;
        assert_eq!(edited.status, StatusCode::OK, "{}", edited.body);

        let published = self
            .send(
                Method::POST,
                &format!("/organiser/events/{id}/publish"),
                Some(cookie),
                None,
            )
            .await;
        assert_eq!(published.status, StatusCode::OK);
        id
    }

    async fn bookings_for(&self, id: &str) -> Vec<boxoffice_server::models::Booking> {
        let event_id = uuid::Uuid::parse_str(id).unwrap();
        self.ledger.bookings_for_event(event_id).await.unwrap()
    }

    async fn book(&self, id: &str, name: &str, full: i64, concession: i64) -> Reply {
        self.send(
            Method::POST,
            &format!("/attendee/events/{id}/bookings"),
            None,
            Some(json!({
                "attendee_name": name,
                "full_price_tickets": full,
                "concession_tickets": concession,
            })),
        )
        .await
    }
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app();
    let reply = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "ok");
}

#[tokio::test]
async fn organiser_routes_require_a_session() {
    let app = test_app();

    for (method, uri) in [
        (Method::GET, "/organiser"),
        (Method::POST, "/organiser/events"),
        (Method::GET, "/organiser/bookings"),
        (Method::GET, "/organiser/settings"),
    ] {
        let reply = app.send(method, uri, None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(reply.body["error"]["code"], "AUTH_ERROR");
    }

    let forged = format!("sessionId={}", uuid::Uuid::new_v4());
    let reply = app
        .send(Method::GET, "/organiser", Some(&forged), None)
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app();
    let cookie = app.login().await;

    let reply = app
        .send(Method::POST, "/organiser/logout", Some(&cookie), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.set_cookie.unwrap().contains("Max-Age=0"));

    let reply = app.send(Method::GET, "/organiser", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_bad_passwords_lock_out_the_client() {
    let app = test_app();
    let attacker = "198.51.100.23:5000";

    for _ in 0..5 {
        let reply = app
            .send_from(
                attacker,
                Method::POST,
                "/organiser/login",
                None,
                Some(json!({ "password": "guess" })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            reply.body["error"]["message"],
            "Invalid credentials. Please try again."
        );
    }

    let reply = app
        .send_from(
            attacker,
            Method::POST,
            "/organiser/login",
            None,
            Some(json!({ "password": PASSWORD })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(reply.set_cookie.is_none());

    // A different client address is not affected.
    app.login().await;
}

#[tokio::test]
async fn drafts_are_hidden_from_attendees() {
    let app = test_app();
    let cookie = app.login().await;

    let created = app
        .send(Method::POST, "/organiser/events", Some(&cookie), None)
        .await;
    let id = created.body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created.body["data"]["status"], "draft");

    let home = app.send(Method::GET, "/attendee", None, None).await;
    assert_eq!(home.body["data"]["events"], json!([]));
    assert_eq!(home.body["data"]["settings"]["site_name"], "Event Manager");

    let detail = app
        .send(Method::GET, &format!("/attendee/events/{id}"), None, None)
        .await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);

    let booking = app.book(&id, "Alice", 1, 0).await;
    assert_eq!(booking.status, StatusCode::NOT_FOUND);
    assert!(app.bookings_for(&id).await.is_empty());

    let dashboard = app.send(Method::GET, "/organiser", Some(&cookie), None).await;
    assert_eq!(dashboard.body["data"]["draft_events"][0]["id"], id.as_str());
}

#[tokio::test]
async fn last_tickets_then_capacity_conflict() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 2, 3).await;

    let booked = app.book(&id, "Alice", 2, 0).await;
    assert_eq!(booked.status, StatusCode::CREATED);
    assert_eq!(booked.body["data"]["full_price_tickets"], 2);
    assert_eq!(booked.body["data"]["attendee_name"], "Alice");
    assert_eq!(booked.body["data"]["event"]["id"], id.as_str());
    assert!(booked.body["data"]["booking_id"].is_string());

    let detail = app
        .send(Method::GET, &format!("/attendee/events/{id}"), None, None)
        .await;
    assert_eq!(detail.body["data"]["full_price_remaining"], 0);
    assert_eq!(detail.body["data"]["concession_remaining"], 3);

    let rejected = app.book(&id, "Bob", 1, 0).await;
    assert_eq!(rejected.status, StatusCode::CONFLICT);
    assert_eq!(rejected.body["error"]["code"], "CAPACITY_CONFLICT");
    assert_eq!(
        rejected.body["error"]["message"],
        "Not enough tickets available"
    );

    let detail = app
        .send(Method::GET, &format!("/attendee/events/{id}"), None, None)
        .await;
    assert_eq!(detail.body["data"]["full_price_remaining"], 0);
    assert_eq!(app.bookings_for(&id).await.len(), 1);
}

#[tokio::test]
async fn rejected_bookings_write_nothing() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 2, 3).await;

    let zero = app.book(&id, "Alice", 0, 0).await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        zero.body["error"]["message"],
        "Please select at least one ticket"
    );

    let nameless = app.book(&id, "   ", 1, 0).await;
    assert_eq!(nameless.status, StatusCode::BAD_REQUEST);
    assert_eq!(nameless.body["error"]["message"], "Attendee name is required");

    let negative = app.book(&id, "Alice", -1, 2).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative.body["error"]["message"], "Invalid ticket quantity");

    let bad_id = app.book("not-an-id", "Alice", 1, 0).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"]["message"], "Invalid event ID");

    assert!(app.bookings_for(&id).await.is_empty());
}

#[tokio::test]
async fn invalid_edit_keeps_previous_fields() {
    let app = test_app();
    let cookie = app.login().await;

    let created = app
        .send(Method::POST, "/organiser/events", Some(&cookie), None)
        .await;
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let reply = app
        .send(
            Method::PUT,
            &format!("/organiser/events/{id}"),
            Some(&cookie),
            Some(json!({
                "title": "Too Late",
                "description": "Already happened",
                "event_date": "2020-05-05T10:00",
                "full_price_tickets": 10,
                "full_price_cost": 10,
                "concession_tickets": 10,
                "concession_cost": 5,
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["details"]["field"], "event_date");

    let current = app
        .send(
            Method::GET,
            &format!("/organiser/events/{id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(current.body["data"], created.body["data"]);
}

#[tokio::test]
async fn delete_leaves_orphaned_bookings() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 5, 5).await;
    assert_eq!(app.book(&id, "Alice", 1, 1).await.status, StatusCode::CREATED);

    let deleted = app
        .send(
            Method::DELETE,
            &format!("/organiser/events/{id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    // The raw rows survive the event.
    let orphans = app
        .send(
            Method::GET,
            &format!("/organiser/events/{id}/bookings"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(orphans.status, StatusCode::OK);
    assert_eq!(orphans.body["data"].as_array().unwrap().len(), 1);
    assert_eq!(orphans.body["data"][0]["attendee_name"], "Alice");

    // The joined ledger no longer shows them.
    let report = app
        .send(Method::GET, "/organiser/bookings", Some(&cookie), None)
        .await;
    assert_eq!(report.body["data"]["bookings"], json!([]));
    assert_eq!(report.body["data"]["summary"]["total_bookings"], 0);

    let home = app.send(Method::GET, "/attendee", None, None).await;
    assert_eq!(home.body["data"]["events"], json!([]));
    let detail = app
        .send(Method::GET, &format!("/attendee/events/{id}"), None, None)
        .await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn republishing_is_a_conflict() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 1, 1).await;

    let again = app
        .send(
            Method::POST,
            &format!("/organiser/events/{id}/publish"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"]["message"], "Event is already published");
}

#[tokio::test]
async fn settings_update_shows_on_attendee_home() {
    let app = test_app();
    let cookie = app.login().await;

    let invalid = app
        .send(
            Method::PUT,
            "/organiser/settings",
            Some(&cookie),
            Some(json!({ "site_name": "", "site_description": "x" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"]["message"], "Site name is required");

    let updated = app
        .send(
            Method::PUT,
            "/organiser/settings",
            Some(&cookie),
            Some(json!({
                "site_name": "Harbour Hall",
                "site_description": "Concerts on the water",
            })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let home = app.send(Method::GET, "/attendee", None, None).await;
    assert_eq!(home.body["data"]["settings"]["site_name"], "Harbour Hall");
}

#[tokio::test]
async fn bookings_report_prices_each_booking() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 10, 10).await;

    app.book(&id, "Alice", 2, 1).await;
    app.book(&id, "Bob", 1, 0).await;

    let report = app
        .send(Method::GET, "/organiser/bookings", Some(&cookie), None)
        .await;
    let summary = &report.body["data"]["summary"];
    assert_eq!(summary["total_bookings"], 2);
    assert_eq!(summary["total_tickets"], 4);
    assert_eq!(summary["total_revenue"], "35.00");

    let dashboard = app.send(Method::GET, "/organiser", Some(&cookie), None).await;
    let published = &dashboard.body["data"]["published_events"][0];
    assert_eq!(published["full_sold"], 3);
    assert_eq!(published["concession_sold"], 1);
}

#[tokio::test]
async fn unknown_paths_are_json_not_found() {
    let app = test_app();
    let reply = app.send(Method::GET, "/nowhere", None, None).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn mistyped_booking_body_is_a_validation_error() {
    let app = test_app();
    let cookie = app.login().await;
    let id = app.published_event(&cookie, 2, 2).await;

    let reply = app
        .send(
            Method::POST,
            &format!("/attendee/events/{id}/bookings"),
            None,
            Some(json!({ "attendee_name": 42, "full_price_tickets": 1 })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        reply.body["error"]["message"],
        "Request body has invalid fields"
    );
    assert!(app.bookings_for(&id).await.is_empty());
}

#[tokio::test]
async fn mistyped_event_edit_is_a_validation_error() {
    let app = test_app();
    let cookie = app.login().await;
    let created = app
        .send(Method::POST, "/organiser/events", Some(&cookie), None)
        .await;
    let id = created.body["data"]["id"].as_str().unwrap().to_string();

    let reply = app
        .send(
            Method::PUT,
            &format!("/organiser/events/{id}"),
            Some(&cookie),
            Some(json!({ "title": 7 })),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unparseable_login_body_is_a_validation_error() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/organiser/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["message"], "Request body is not valid JSON");
}
