//! Integration tests for the CafeHub backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a cafe and return its data object.
    async fn create_cafe(&self, name: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/cafes"))
            .json(&json!({
                "owner_sub": "owner-sub-1",
                "name": name,
                "address": "1 Main Street",
                "city": "Amsterdam",
                "latitude": 52.37,
                "longitude": 4.89
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    /// Create a user and return its data object.
    async fn create_user(&self, subject: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/users"))
            .json(&json!({
                "subject": subject,
                "username": format!("user-{}", subject),
                "email": format!("{}@example.com", subject)
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    /// Check a user in at a cafe.
    async fn checkin(&self, subject: &str, cafe_id: &str) {
        let resp = self
            .client
            .post(self.url("/checkins"))
            .json(&json!({ "user_sub": subject, "cafe_id": cafe_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::with_psk(Some("secret-key".to_string())).await;

    // Request without API key
    let client = Client::new();
    let resp = client
        .get(format!("{}/cafes", fixture.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::with_psk(Some("correct-key".to_string())).await;

    let client = Client::new();
    let resp = client
        .get(format!("{}/cafes", fixture.base_url))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = fixture
        .client
        .get(fixture.url("/cafes"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_cafe_crud() {
    let fixture = TestFixture::new().await;

    let cafe = fixture.create_cafe("Cafe Test").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    assert_eq!(cafe["name"], "Cafe Test");
    assert_eq!(cafe["city"], "Amsterdam");

    // Get cafe
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["name"], "Cafe Test");

    // List cafes
    let list_resp = fixture
        .client
        .get(fixture.url("/cafes"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Patch plain fields
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "description": "Quiet spot",
            "working_hours": { "monday": { "open": "08:00", "close": "18:00" } }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patch_body: Value = patch_resp.json().await.unwrap();
    assert_eq!(patch_body["data"]["description"], "Quiet spot");
    assert_eq!(
        patch_body["data"]["working_hours"]["monday"]["open"],
        "08:00"
    );
    // Name untouched
    assert_eq!(patch_body["data"]["name"], "Cafe Test");

    // Delete cafe
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Verify deleted
    let get_deleted = fixture
        .client
        .get(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_cafe_create_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/cafes"))
        .json(&json!({
            "owner_sub": "owner-sub-1",
            "name": "",
            "address": "1 Main Street",
            "city": "Amsterdam",
            "latitude": 52.37,
            "longitude": 4.89
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_patch_list_table_config_recomputes_occupancy() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("List Config Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "table_config": [
                { "id": "t1", "size": 2, "occupied_seats": 1 },
                { "id": "t2", "size": 4, "occupied_seats": 2 }
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(patch_resp.status(), 200);
    let body: Value = patch_resp.json().await.unwrap();
    // capacity 6, occupied 3 -> 50
    assert_eq!(body["data"]["occupancy_level"], 50);

    // Exactly one history snapshot, matching the cafe's level
    let history_resp = fixture
        .client
        .get(fixture.url(&format!("/occupancy/history/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(history_resp.status(), 200);
    let history_body: Value = history_resp.json().await.unwrap();
    let rows = history_body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["occupancy_level"], 50);
    assert_eq!(rows[0]["total_capacity"], 6);
    assert_eq!(rows[0]["total_occupied"], 3);
}

#[tokio::test]
async fn test_patch_summary_table_config_recomputes_occupancy() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Summary Config Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "table_config": {
                "2_seats_table": { "total": 3, "occupied_seats": 2 },
                "4_seats_table": { "total": 2, "occupied_seats": 4 }
            }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(patch_resp.status(), 200);
    let body: Value = patch_resp.json().await.unwrap();
    // capacity 3*2 + 2*4 = 14, occupied 2+4 = 6 -> floor(600/14) = 42
    assert_eq!(body["data"]["occupancy_level"], 42);
}

#[tokio::test]
async fn test_malformed_table_config_is_partial_update() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Malformed Config Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    // Establish a known occupancy level first
    fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "table_config": [{ "size": 2, "occupied_seats": 2 }]
        }))
        .send()
        .await
        .unwrap();

    // A bare string is not a recognized shape: other fields still apply,
    // occupancy stays unchanged, no new history row appears
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "name": "Renamed Cafe",
            "table_config": "not a table config"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(patch_resp.status(), 200);
    let body: Value = patch_resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Renamed Cafe");
    assert_eq!(body["data"]["occupancy_level"], 100);

    let history_resp = fixture
        .client
        .get(fixture.url(&format!("/occupancy/history/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let history_body: Value = history_resp.json().await.unwrap();
    assert_eq!(history_body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_table_config_rejected() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Bad Ranges Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    // occupied_seats greater than size
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({
            "name": "Should Not Apply",
            "table_config": [{ "size": 2, "occupied_seats": 5 }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(patch_resp.status(), 400);

    // Rejected before any write: the name change did not apply
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["name"], "Bad Ranges Cafe");
}

#[tokio::test]
async fn test_occupancy_report_endpoint() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Report Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/occupancy"))
        .json(&json!({
            "cafe_id": cafe_id,
            "two_tables": 3,
            "four_tables": 2,
            "two_table_seats": 6,
            "four_table_seats": 8,
            "two_tables_occupied": 2,
            "four_tables_occupied": 1,
            "two_seats_occupied": 3,
            "four_seats_occupied": 4
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    // capacity 14, occupied 7 -> 50
    assert_eq!(body["data"]["occupancy_level"], 50);

    // Cafe carries the new level
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["occupancy_level"], 50);

    // One history snapshot with the raw counts
    let history_resp = fixture
        .client
        .get(fixture.url(&format!("/occupancy/history/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let history_body: Value = history_resp.json().await.unwrap();
    let rows = history_body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total_capacity"], 14);
    assert_eq!(rows[0]["total_occupied"], 7);
}

#[tokio::test]
async fn test_occupancy_history_is_append_only() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Idempotence Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let payload = json!({
        "table_config": [{ "size": 4, "occupied_seats": 2 }]
    });

    for _ in 0..2 {
        let resp = fixture
            .client
            .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Two identical submissions produce two snapshots, not one
    let history_resp = fixture
        .client
        .get(fixture.url(&format!("/occupancy/history/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let history_body: Value = history_resp.json().await.unwrap();
    let rows = history_body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["occupancy_level"], 50);
    assert_eq!(rows[1]["occupancy_level"], 50);
    // Ascending by creation time
    assert!(rows[0]["created_at"].as_str().unwrap() <= rows[1]["created_at"].as_str().unwrap());
}

#[tokio::test]
async fn test_occupancy_report_unknown_cafe() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/occupancy"))
        .json(&json!({
            "cafe_id": "non-existent-id",
            "two_tables": 1,
            "four_tables": 1,
            "two_table_seats": 2,
            "four_table_seats": 4,
            "two_tables_occupied": 0,
            "four_tables_occupied": 0,
            "two_seats_occupied": 0,
            "four_seats_occupied": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_occupancy_report_negative_tallies() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Negative Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/occupancy"))
        .json(&json!({
            "cafe_id": cafe_id,
            "two_tables": 1,
            "four_tables": 1,
            "two_table_seats": -2,
            "four_table_seats": 4,
            "two_tables_occupied": 0,
            "four_tables_occupied": 0,
            "two_seats_occupied": 0,
            "four_seats_occupied": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_occupancy_zero_capacity() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Empty Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    let resp = fixture
        .client
        .post(fixture.url("/occupancy"))
        .json(&json!({
            "cafe_id": cafe_id,
            "two_tables": 0,
            "four_tables": 0,
            "two_table_seats": 0,
            "four_table_seats": 0,
            "two_tables_occupied": 0,
            "four_tables_occupied": 0,
            "two_seats_occupied": 0,
            "four_seats_occupied": 0
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["occupancy_level"], 0);
}

#[tokio::test]
async fn test_user_create_idempotent() {
    let fixture = TestFixture::new().await;

    let first = fixture.create_user("sub-123").await;
    assert_eq!(first["subject"], "sub-123");
    assert_eq!(first["total_checkins"], 0);

    // Same subject again returns the stored profile
    let resp = fixture
        .client
        .post(fixture.url("/users"))
        .json(&json!({
            "subject": "sub-123",
            "username": "different-name",
            "email": "different@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "user-sub-123");

    let list_resp = fixture
        .client
        .get(fixture.url("/users"))
        .send()
        .await
        .unwrap();
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_preferences_update() {
    let fixture = TestFixture::new().await;
    fixture.create_user("pref-sub").await;

    let resp = fixture
        .client
        .patch(fixture.url("/users/pref-sub"))
        .json(&json!({
            "work_friendly": true,
            "vibe_preferences": ["cozy", "modern"],
            "push_notifications": true
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["preferences"]["work_friendly"], true);
    assert_eq!(
        body["data"]["preferences"]["vibe_preferences"],
        json!(["cozy", "modern"])
    );
    assert_eq!(body["data"]["push_notifications"], true);

    // A second partial update keeps earlier preferences
    let resp2 = fixture
        .client
        .patch(fixture.url("/users/pref-sub"))
        .json(&json!({ "noise_preference": "quiet" }))
        .send()
        .await
        .unwrap();
    let body2: Value = resp2.json().await.unwrap();
    assert_eq!(body2["data"]["preferences"]["work_friendly"], true);
    assert_eq!(body2["data"]["preferences"]["noise_preference"], "quiet");
}

#[tokio::test]
async fn test_checkin_flow() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Checkin Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("checkin-sub").await;

    // Status before any check-in
    let status_resp = fixture
        .client
        .get(fixture.url(&format!(
            "/checkins/status?user_sub=checkin-sub&cafe_id={}",
            cafe_id
        )))
        .send()
        .await
        .unwrap();
    let status_body: Value = status_resp.json().await.unwrap();
    assert_eq!(status_body["data"]["checked_in_today"], false);

    fixture.checkin("checkin-sub", cafe_id).await;

    // Status after
    let status_resp = fixture
        .client
        .get(fixture.url(&format!(
            "/checkins/status?user_sub=checkin-sub&cafe_id={}",
            cafe_id
        )))
        .send()
        .await
        .unwrap();
    let status_body: Value = status_resp.json().await.unwrap();
    assert_eq!(status_body["data"]["checked_in_today"], true);
    assert!(status_body["data"]["last_checkin"].is_string());

    // Today's cafes
    let today_resp = fixture
        .client
        .get(fixture.url("/checkins/today?user_sub=checkin-sub"))
        .send()
        .await
        .unwrap();
    let today_body: Value = today_resp.json().await.unwrap();
    assert_eq!(today_body["data"], json!([cafe_id]));

    // Counter bumped
    let user_resp = fixture
        .client
        .get(fixture.url("/users/checkin-sub"))
        .send()
        .await
        .unwrap();
    let user_body: Value = user_resp.json().await.unwrap();
    assert_eq!(user_body["data"]["total_checkins"], 1);
}

#[tokio::test]
async fn test_review_requires_checkin() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Gated Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("no-checkin-sub").await;

    let resp = fixture
        .client
        .post(fixture.url("/reviews"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "no-checkin-sub",
            "rating": 5,
            "review_text": "Great coffee"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_review_daily_duplicate_conflict() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Once A Day Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("daily-sub").await;
    fixture.checkin("daily-sub", cafe_id).await;

    let review = json!({
        "cafe_id": cafe_id,
        "user_sub": "daily-sub",
        "rating": 4,
        "review_text": "Nice spot"
    });

    let first = fixture
        .client
        .post(fixture.url("/reviews"))
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = fixture
        .client
        .post(fixture.url("/reviews"))
        .json(&review)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_review_validation() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Validation Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("rating-sub").await;
    fixture.checkin("rating-sub", cafe_id).await;

    let resp = fixture
        .client
        .post(fixture.url("/reviews"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "rating-sub",
            "rating": 6,
            "review_text": "Too enthusiastic"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_avg_rating_is_mean_of_reviews() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Rated Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();

    for (subject, rating) in [("rater-1", 5), ("rater-2", 4)] {
        fixture.create_user(subject).await;
        fixture.checkin(subject, cafe_id).await;
        let resp = fixture
            .client
            .post(fixture.url("/reviews"))
            .json(&json!({
                "cafe_id": cafe_id,
                "user_sub": subject,
                "rating": rating,
                "review_text": "Review text"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["avg_rating"], 4.5);

    // Reviewer counter and listing with usernames
    let reviews_resp = fixture
        .client
        .get(fixture.url(&format!("/reviews/cafe/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    let reviews_body: Value = reviews_resp.json().await.unwrap();
    let reviews = reviews_body["data"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert!(reviews[0]["username"].is_string());
}

#[tokio::test]
async fn test_reservation_flow() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Reservation Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("res-sub").await;

    let create_resp = fixture
        .client
        .post(fixture.url("/reservations"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "res-sub",
            "reservation_date": "2026-09-01",
            "reservation_time": "14:00",
            "party_size": 4,
            "special_request": "Window table"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 201);
    let create_body: Value = create_resp.json().await.unwrap();
    let reservation_id = create_body["data"]["id"].as_str().unwrap();
    assert_eq!(create_body["data"]["status"], "pending");
    assert_eq!(create_body["data"]["cafe_name"], "Reservation Cafe");

    // Confirm it
    let patch_resp = fixture
        .client
        .patch(fixture.url(&format!("/reservations/{}", reservation_id)))
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch_resp.status(), 200);
    let patch_body: Value = patch_resp.json().await.unwrap();
    assert_eq!(patch_body["data"]["status"], "confirmed");

    // Listings
    let user_list: Value = fixture
        .client
        .get(fixture.url("/reservations/user/res-sub"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user_list["data"].as_array().unwrap().len(), 1);

    let cafe_list: Value = fixture
        .client
        .get(fixture.url(&format!("/reservations/cafe/{}", cafe_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cafe_list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reservation_party_size_validation() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Party Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("party-sub").await;

    let resp = fixture
        .client
        .post(fixture.url("/reservations"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "party-sub",
            "reservation_date": "2026-09-01",
            "reservation_time": "14:00",
            "party_size": 25
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_reservation_delete() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Cancelled Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("cancel-sub").await;

    let create_resp = fixture
        .client
        .post(fixture.url("/reservations"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "cancel-sub",
            "reservation_date": "2026-09-02",
            "reservation_time": "10:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 201);
    let create_body: Value = create_resp.json().await.unwrap();
    let reservation_id = create_body["data"]["id"].as_str().unwrap();

    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/reservations/{}", reservation_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);
    let delete_body: Value = delete_resp.json().await.unwrap();
    assert_eq!(delete_body["success"], true);

    // Gone from the user's listing
    let user_list: Value = fixture
        .client
        .get(fixture.url("/reservations/user/cancel-sub"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user_list["data"].as_array().unwrap().len(), 0);

    // A second delete reports the reservation as missing
    let second_delete = fixture
        .client
        .delete(fixture.url(&format!("/reservations/{}", reservation_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(second_delete.status(), 404);
    let second_body: Value = second_delete.json().await.unwrap();
    assert_eq!(second_body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_live_update_flow() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Story Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap();
    fixture.create_user("story-sub").await;

    let create_resp = fixture
        .client
        .post(fixture.url("/liveUpdates"))
        .json(&json!({
            "cafe_id": cafe_id,
            "user_sub": "story-sub",
            "image_url": "https://blobs.example.com/liveupdates/abc.jpg",
            "vibe": "cozy"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 201);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(
        create_body["data"]["image_url"],
        "https://blobs.example.com/liveupdates/abc.jpg"
    );
    assert!(create_body["data"]["expires_at"].as_str().unwrap()
        > create_body["data"]["created_at"].as_str().unwrap());

    // Cafe listing
    let cafe_list: Value = fixture
        .client
        .get(fixture.url(&format!("/liveUpdates/cafe/{}", cafe_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cafe_list["data"].as_array().unwrap().len(), 1);

    // User listing carries the cafe name
    let user_list: Value = fixture
        .client
        .get(fixture.url("/liveUpdates/user/story-sub"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let updates = user_list["data"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["cafe_name"], "Story Cafe");
}

#[tokio::test]
async fn test_cafe_delete_cascades() {
    let fixture = TestFixture::new().await;
    let cafe = fixture.create_cafe("Doomed Cafe").await;
    let cafe_id = cafe["id"].as_str().unwrap().to_string();
    fixture.create_user("doomed-sub").await;
    fixture.checkin("doomed-sub", &cafe_id).await;

    // Seed a history snapshot
    fixture
        .client
        .patch(fixture.url(&format!("/cafes/{}", cafe_id)))
        .json(&json!({ "table_config": [{ "size": 2, "occupied_seats": 1 }] }))
        .send()
        .await
        .unwrap();

    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/cafes/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // History endpoint now reports the cafe as gone
    let history_resp = fixture
        .client
        .get(fixture.url(&format!("/occupancy/history/{}", cafe_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(history_resp.status(), 404);

    // Dependent listings are empty
    let reviews_resp: Value = fixture
        .client
        .get(fixture.url(&format!("/reviews/cafe/{}", cafe_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reviews_resp["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    for path in [
        "/cafes/non-existent-id",
        "/users/non-existent-sub",
        "/occupancy/history/non-existent-id",
    ] {
        let resp = fixture.client.get(fixture.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 404, "expected 404 for {}", path);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
