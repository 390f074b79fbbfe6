//! HTTP surface tests: routing, auth, inbound acceptance and the manual
//! birthday trigger, with the state wired by `bootstrap::assemble`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use wb_domain::config::{Config, ContactEntry};
use wb_domain::error::Result;
use wb_domain::turn::RawMessage;
use wb_gateway::api;
use wb_gateway::bootstrap::assemble;
use wb_gateway::roster::{RosterEntry, RosterSource};
use wb_gateway::state::AppState;
use wb_gateway::transport::{ChatTransport, ImageMessage};
use wb_providers::{ChatRequest, ChatResponse, LlmProvider};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl ChatTransport for Outbox {
    async fn fetch_history(&self, _: &str, _: usize) -> Result<Vec<RawMessage>> {
        Ok(vec![RawMessage::peer("hello")])
    }
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.sent.lock().push((chat_id.into(), text.into()));
        Ok(())
    }
    async fn send_typing(&self, _: &str) -> Result<()> {
        Ok(())
    }
    async fn send_image(&self, chat_id: &str, image: &ImageMessage) -> Result<()> {
        self.sent.lock().push((chat_id.into(), image.caption.clone()));
        Ok(())
    }
}

struct Canned;

#[async_trait::async_trait]
impl LlmProvider for Canned {
    async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
        Ok(ChatResponse {
            content: "Good afternoon, Mum.".into(),
            usage: None,
            model: "canned".into(),
            finish_reason: Some("stop".into()),
        })
    }
    fn provider_id(&self) -> &str {
        "canned"
    }
}

struct OneBirthday;

#[async_trait::async_trait]
impl RosterSource for OneBirthday {
    async fn fetch(&self) -> Result<Vec<RosterEntry>> {
        Ok(vec![RosterEntry {
            name: "Ada".into(),
            phone_number: "2348110000001".into(),
            birthday: NaiveDate::from_ymd_opt(2004, 7, 21).unwrap(),
            profile_url: None,
            gender: Some("female".into()),
        }])
    }
}

fn setup(group_id: &str, state_dir: &std::path::Path) -> (Router, AppState, Arc<Outbox>) {
    let mut config = Config::default();
    config.contacts.family_elder.push(ContactEntry {
        name: "Mum".into(),
        id: "2348012345678".into(),
    });
    config.birthdays.group_id = group_id.into();
    config.workspace.state_path = state_dir.to_path_buf();
    config.server.api_token_env = "WABOT_TEST_UNSET_TOKEN_VAR".into();

    let outbox = Arc::new(Outbox::default());
    let mut state = assemble(Arc::new(config), Arc::new(Canned), outbox.clone(), Arc::new(OneBirthday));
    state.api_token_hash = Some(Sha256::digest(TOKEN.as_bytes()).to_vec());

    let app = api::router(state.clone()).with_state(state.clone());
    (app, state, outbox)
}

fn post(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, _) = setup("", dir.path());

    let resp = app
        .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["contacts"], 1);
}

#[tokio::test]
async fn inbound_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, _) = setup("", dir.path());

    let body = r#"{"sender":"2348012345678@s.whatsapp.net","body":"hi"}"#;
    let resp = app.clone().oneshot(post("/v1/inbound", body, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = app.oneshot(post("/v1/inbound", body, Some("wrong"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inbound_is_accepted_and_replied_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, outbox) = setup("", dir.path());

    let body = r#"{"sender":"2348012345678@s.whatsapp.net","body":"hello","message_id":"ABC"}"#;
    let resp = app.clone().oneshot(post("/v1/inbound", body, Some(TOKEN))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(resp).await["accepted"], true);

    // The reply is produced by a spawned task.
    for _ in 0..100 {
        if !outbox.sent.lock().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        *outbox.sent.lock(),
        vec![("2348012345678@s.whatsapp.net".to_string(), "Good afternoon, Mum.".to_string())]
    );

    // Same message id again is acknowledged but not dispatched.
    let resp = app.oneshot(post("/v1/inbound", body, Some(TOKEN))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["duplicate"], true);
}

#[tokio::test]
async fn inbound_rejects_missing_sender() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, _) = setup("", dir.path());
    let resp = app
        .oneshot(post("/v1/inbound", r#"{"sender":"  ","body":"hi"}"#, Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn birthday_trigger_conflicts_without_group() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state, _) = setup("", dir.path());
    assert!(state.birthdays.is_none());

    let resp = app.oneshot(post("/v1/birthdays/run", "{}", Some(TOKEN))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn birthday_trigger_runs_for_requested_date() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _, outbox) = setup("120363000000000000@g.us", dir.path());

    let resp = app
        .clone()
        .oneshot(post(
            "/v1/birthdays/run",
            r#"{"date":"2025-07-21","dry_run":true}"#,
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json_body(resp).await;
    assert_eq!(report["matched"], 1);
    assert_eq!(report["sent"], 0);
    assert_eq!(report["drafts"][0]["name"], "Ada");
    assert!(outbox.sent.lock().is_empty());

    let resp = app
        .clone()
        .oneshot(post("/v1/birthdays/run", r#"{"date":"2025-07-21"}"#, Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["sent"], 1);

    let resp = app
        .oneshot(post("/v1/birthdays/run", r#"{"date":"2025-07-21"}"#, Some(TOKEN)))
        .await
        .unwrap();
    let report = json_body(resp).await;
    assert_eq!(report["sent"], 0);
    assert_eq!(report["skipped_already_sent"], 1);
    assert_eq!(outbox.sent.lock().len(), 1);
}
