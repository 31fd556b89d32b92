//! Integration tests for the portal's HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::gate::HISTORY_REPLACE_HEADER;
use crate::models::TypeformLinks;
use crate::remote::mock::MockBackend;
use crate::remote::Backend;
use crate::{create_router, AppState};

const PSK: &str = "test-api-key";

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        api_psk: Some(PSK.to_string()),
        db_path: temp_dir.path().join("test.sqlite"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        hackathon_year: 2025,
        applications_open: "2000-01-01".to_string(),
        applications_close: "2999-12-31".to_string(),
        draft_autosave: Duration::from_millis(50),
        cache_gc: Duration::from_secs(300),
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    repo: Repository,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = test_config(&temp_dir);
        customize(&mut config);

        let pool = init_database(&config.db_path).await.expect("Failed to init DB");
        let repo = Repository::new(pool);

        let state = AppState::new(Arc::new(repo.clone()), config);
        let base_url = serve(state).await;

        TestFixture {
            client: client(Some(PSK)),
            base_url,
            repo,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn sign_in(&self, uid: &str, admin: bool) {
        sign_in(&self.client, &self.base_url, uid, admin).await;
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.put(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }
}

async fn serve(state: AppState) -> String {
    let app = create_router(state);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");

    // Spawn server
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    format!("http://{}", addr)
}

/// Gate redirects are asserted on, so the client must not follow them.
fn client(psk: Option<&str>) -> Client {
    let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());
    if let Some(key) = psk {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-api-key", key.parse().unwrap());
        builder = builder.default_headers(headers);
    }
    builder.build().unwrap()
}

async fn sign_in(client: &Client, base_url: &str, uid: &str, admin: bool) {
    let resp = client
        .post(format!("{}/api/session", base_url))
        .json(&json!({
            "uid": uid,
            "displayName": "Ada Lovelace",
            "email": "ada@example.com",
            "claims": { "admin": admin }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

fn complete_draft() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "phoneCountry": "Canada (+1)",
        "phoneDigits": "416-555-0100",
        "shirtSize": "M",
        "consents": {
            "codeOfConduct": true,
            "privacyPolicy": true,
            "marketingEmails": false,
            "photoRelease": true
        }
    })
}

fn assert_redirect(resp: &reqwest::Response, location: &str, replace: bool) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], location);
    assert_eq!(
        resp.headers()[HISTORY_REPLACE_HEADER],
        if replace { "true" } else { "false" }
    );
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = Client::new().get(fixture.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    let resp = client(None).get(fixture.url("/api/session")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = client(Some("wrong-key"))
        .get(fixture.url("/api/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_home_is_public() {
    let fixture = TestFixture::new().await;

    let body: Value = fixture.get("/api").await.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["signedIn"], false);
    assert_eq!(body["data"]["hasApplication"], false);

    fixture.sign_in("u1", false).await;
    let body: Value = fixture.get("/api").await.json().await.unwrap();
    assert_eq!(body["data"]["signedIn"], true);
    assert_eq!(body["data"]["displayName"], "Ada Lovelace");
    assert_eq!(body["data"]["applicationsOpen"], true);
    assert_eq!(body["data"]["hasApplication"], false);
}

#[tokio::test]
async fn test_signed_out_pages_redirect_to_login() {
    let fixture = TestFixture::new().await;

    for path in ["/api/profile", "/api/apply", "/api/status", "/api/admin/scan/x"] {
        let resp = fixture.get(path).await;
        assert_redirect(&resp, "/login", true);
    }
}

#[tokio::test]
async fn test_apply_view_prefills_identity() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;

    let resp = fixture.get("/api/apply").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["draft"]["firstName"], "Ada");
    assert_eq!(data["draft"]["lastName"], "Lovelace");
    assert_eq!(data["draft"]["status"], "draft");
    assert_eq!(data["phoneCountry"], "Canada (+1)");
    assert_eq!(data["phoneDigits"], "");
    assert_eq!(data["unsaved"], false);
    let countries = data["options"]["countryCodes"].as_array().unwrap();
    assert!(countries.contains(&json!("Jamaica (+1-876)")));
}

#[tokio::test]
async fn test_save_draft_composes_phone() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;

    let resp = fixture
        .put(
            "/api/apply/draft",
            json!({ "phoneCountry": "Jamaica (+1-876)", "phoneDigits": "555-0100" }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["phone"], "(+1-876) 555-0100");

    let stored = fixture.repo.get_draft("u1", 2025).await.unwrap().unwrap();
    assert_eq!(stored.phone, "(+1-876) 555-0100");

    let resp = fixture
        .put("/api/apply/draft", json!({ "phoneDigits": "555 0100" }))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let body: Value = fixture.get("/api/apply").await.json().await.unwrap();
    assert_eq!(body["data"]["phoneCountry"], "Jamaica (+1-876)");
    assert_eq!(body["data"]["phoneDigits"], "555-0100");
}

#[tokio::test]
async fn test_autosave_merges_edits() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;

    let resp = fixture
        .put("/api/apply/draft?autosave=true", json!({ "school": "Waterloo" }))
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let resp = fixture
        .put("/api/apply/draft?autosave=true", json!({ "shirtSize": "M" }))
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let body: Value = fixture.get("/api/apply").await.json().await.unwrap();
    assert_eq!(body["data"]["unsaved"], true);
    assert_eq!(body["data"]["draft"]["school"], "Waterloo");
    assert_eq!(body["data"]["draft"]["shirtSize"], "M");

    tokio::time::sleep(Duration::from_millis(300)).await;

    let stored = fixture.repo.get_draft("u1", 2025).await.unwrap().unwrap();
    assert_eq!(stored.school.as_deref(), Some("Waterloo"));
    assert_eq!(stored.shirt_size.as_deref(), Some("M"));

    let body: Value = fixture.get("/api/apply").await.json().await.unwrap();
    assert_eq!(body["data"]["unsaved"], false);
    assert_eq!(body["data"]["draft"]["school"], "Waterloo");
}

#[tokio::test]
async fn test_submit_flow() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;

    // Nothing submitted yet
    let resp = fixture.get("/api/status").await;
    assert_redirect(&resp, "/apply", true);

    // Incomplete drafts are rejected
    fixture
        .put("/api/apply/draft", json!({ "firstName": "Ada" }))
        .await;
    let resp = fixture.post("/api/apply/submit", json!({})).await;
    assert_eq!(resp.status(), 400);

    // Pending autosave edits are flushed before submitting
    let resp = fixture
        .put("/api/apply/draft?autosave=true", complete_draft())
        .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let resp = fixture.post("/api/apply/submit", json!({})).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["phone"], "(+1) 416-555-0100");

    let body: Value = fixture.get("/api/status").await.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["mjvUrl"].is_null());

    // Already applied
    let resp = fixture.get("/api/apply").await;
    assert_redirect(&resp, "/", true);

    let body: Value = fixture.get("/api").await.json().await.unwrap();
    assert_eq!(body["data"]["hasApplication"], true);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = fixture.repo.list_events().await.unwrap();
    assert!(events.iter().any(|e| e.kind == "application-submitted"));
}

#[tokio::test]
async fn test_closed_window_redirects_home() {
    let fixture = TestFixture::with_config(|config| {
        config.applications_open = "2000-01-01".to_string();
        config.applications_close = "2000-12-31".to_string();
    })
    .await;
    fixture.sign_in("u1", false).await;

    let resp = fixture.get("/api/apply").await;
    assert_redirect(&resp, "/", true);
}

#[tokio::test]
async fn test_admin_review_and_acceptance_link() {
    let fixture = TestFixture::new().await;
    fixture
        .repo
        .set_typeform_links(&TypeformLinks {
            mjv_url: "https://forms.example.com/mjv".to_string(),
        })
        .await
        .unwrap();

    fixture.sign_in("u1", false).await;
    fixture.put("/api/apply/draft", complete_draft()).await;
    let body: Value = fixture
        .post("/api/apply/submit", json!({}))
        .await
        .json()
        .await
        .unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Non-admins are pushed home without replacing history
    let resp = fixture.get(&format!("/api/admin/scan/{}", id)).await;
    assert_redirect(&resp, "/", false);

    fixture.sign_in("admin", true).await;
    let resp = fixture.get(&format!("/api/admin/scan/{}", id)).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["applicantId"], "u1");

    let resp = fixture.get("/api/admin/scan/missing").await;
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .put(
            &format!("/api/admin/applications/{}/status", id),
            json!({ "status": "draft" }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let resp = fixture
        .put(
            &format!("/api/admin/applications/{}/status", id),
            json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    fixture.sign_in("u1", false).await;
    let body: Value = fixture.get("/api/status").await.json().await.unwrap();
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["mjvUrl"], "https://forms.example.com/mjv");
}

#[tokio::test]
async fn test_profile_documents() {
    let fixture = TestFixture::new().await;
    fixture
        .repo
        .register_github_email("gh-token", "ada@example.com")
        .await
        .unwrap();
    fixture.sign_in("u1", false).await;

    let resp = fixture
        .put("/api/profile/socials", json!({ "github": "ada" }))
        .await;
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .put("/api/profile/picture", json!({ "url": "not-a-url" }))
        .await;
    assert_eq!(resp.status(), 400);
    let resp = fixture
        .put("/api/profile/picture", json!({ "url": "https://img.example.com/ada.png" }))
        .await;
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .put(
            "/api/profile/emergency-contact",
            json!({ "name": "Byron", "phone": "(+44) 20-7946-0000", "relationship": "Parent" }),
        )
        .await;
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .put("/api/profile/team", json!({ "name": "Engines", "memberIds": ["u2"] }))
        .await;
    assert_eq!(resp.status(), 200);
    let team: Value = resp.json().await.unwrap();
    assert_eq!(team["data"]["ownerId"], "u1");
    assert_eq!(team["data"]["memberIds"], json!(["u1", "u2"]));

    let body: Value = fixture.get("/api/profile").await.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["socials"]["github"], "ada");
    assert_eq!(data["profilePictureUrl"], "https://img.example.com/ada.png");
    assert_eq!(data["emergencyContact"]["name"], "Byron");
    assert_eq!(data["team"]["name"], "Engines");

    let body: Value = fixture
        .post(
            "/api/profile/verify-github",
            json!({ "token": "gh-token", "email": "ADA@example.com" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["verified"], true);

    let body: Value = fixture
        .post(
            "/api/profile/verify-github",
            json!({ "token": "gh-token", "email": "other@example.com" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["verified"], false);
}

#[tokio::test]
async fn test_team_members_cannot_edit() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("owner", false).await;
    fixture
        .put("/api/profile/team", json!({ "name": "Engines", "memberIds": ["u2"] }))
        .await;

    fixture.sign_in("u2", false).await;
    let body: Value = fixture.get("/api/profile").await.json().await.unwrap();
    assert_eq!(body["data"]["team"]["ownerId"], "owner");

    let resp = fixture
        .put("/api/profile/team", json!({ "name": "Renamed" }))
        .await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_socials_rollback_on_failed_write() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new());
    let state = AppState::new(backend.clone(), test_config(&temp_dir));
    let base_url = serve(state).await;
    let client = client(Some(PSK));
    sign_in(&client, &base_url, "u1", false).await;

    let resp = client
        .put(format!("{}/api/profile/socials", base_url))
        .json(&json!({ "github": "ada" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    backend
        .fail_writes
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let resp = client
        .put(format!("{}/api/profile/socials", base_url))
        .json(&json!({ "github": "grace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BACKEND_ERROR");

    let body: Value = client
        .get(format!("{}/api/profile", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["socials"]["github"], "ada");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(backend
        .events()
        .iter()
        .any(|(kind, data)| kind == "write-error" && data["operation"] == "update-socials"));
}

#[tokio::test]
async fn test_draft_edit_during_read_outage_keeps_one_draft() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(MockBackend::new());
    let mut stored = crate::queries::test_support::application(
        "u1",
        crate::models::ApplicationStatus::Draft,
    );
    stored.school = Some("UofT".to_string());
    backend.insert_application(stored.clone());

    let state = AppState::new(backend.clone(), test_config(&temp_dir));
    let base_url = serve(state).await;
    let client = client(Some(PSK));
    sign_in(&client, &base_url, "u1", false).await;

    backend
        .fail_reads
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let resp = client
        .put(format!("{}/api/apply/draft", base_url))
        .json(&json!({ "lastName": "Lovelace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BACKEND_ERROR");

    let resp = client
        .post(format!("{}/api/apply/submit", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    let drafts: Vec<_> = backend
        .applications()
        .into_iter()
        .filter(|a| a.applicant_id == "u1")
        .collect();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, stored.id);
    assert_eq!(drafts[0].school.as_deref(), Some("UofT"));
    assert!(!drafts[0].status.is_submitted());
}

#[tokio::test]
async fn test_sign_out_clears_client_state() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;
    fixture
        .put("/api/apply/draft?autosave=true", json!({ "school": "Waterloo" }))
        .await;

    let resp = fixture.client.delete(fixture.url("/api/session")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = fixture.get("/api/session").await.json().await.unwrap();
    assert!(body["data"].is_null());
    let resp = fixture.get("/api/apply").await;
    assert_redirect(&resp, "/login", true);

    // The pending autosave was dropped, not written
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(fixture.repo.get_draft("u1", 2025).await.unwrap().is_none());

    fixture.sign_in("u1", false).await;
    let body: Value = fixture.get("/api/apply").await.json().await.unwrap();
    assert!(body["data"]["draft"]["school"].is_null());
}

#[tokio::test]
async fn test_identity_switch_does_not_leak_cache() {
    let fixture = TestFixture::new().await;
    fixture.sign_in("u1", false).await;
    fixture.put("/api/apply/draft", complete_draft()).await;
    fixture.post("/api/apply/submit", json!({})).await;

    let body: Value = fixture.get("/api").await.json().await.unwrap();
    assert_eq!(body["data"]["hasApplication"], true);

    fixture.sign_in("u2", false).await;
    let body: Value = fixture.get("/api").await.json().await.unwrap();
    assert_eq!(body["data"]["hasApplication"], false);
    let resp = fixture.get("/api/status").await;
    assert_redirect(&resp, "/apply", true);
}
