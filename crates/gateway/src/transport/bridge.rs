//! REST client for the WhatsApp HTTP bridge.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use wb_domain::config::TransportConfig;
use wb_domain::error::{Error, Result};
use wb_domain::turn::RawMessage;
use wb_providers::util::from_reqwest;

use super::{ChatTransport, ImageMessage};

pub struct BridgeClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl BridgeClient {
    /// Build the client from the `[transport]` section. The bearer token is
    /// read from the configured env var once; an unset var means no auth.
    pub fn from_config(cfg: &TransportConfig) -> Result<Self> {
        let token = std::env::var(&cfg.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(
                env_var = %cfg.token_env,
                "bridge token not set, calling the bridge unauthenticated"
            );
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn chat_url(&self, chat_id: &str, tail: &str) -> Result<String> {
        validate_chat_id(chat_id)?;
        Ok(format!("{}/chats/{}/{}", self.base_url, chat_id, tail))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        let resp = self
            .authorize(self.client.post(url))
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;
        check_status(resp).await.map(|_| ())
    }
}

/// Reject ids that would escape the `/chats/{id}/` path segment.
pub(crate) fn validate_chat_id(chat_id: &str) -> Result<()> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9@._-]+$").expect("valid chat id regex"));
    if re.is_match(chat_id) {
        Ok(())
    } else {
        Err(Error::Transport(format!("invalid chat id: {chat_id:?}")))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let text = resp.text().await.map_err(from_reqwest)?;
    if !status.is_success() {
        return Err(Error::Transport(format!("HTTP {} - {}", status.as_u16(), text)));
    }
    Ok(text)
}

/// The bridge returns either a bare array or `{ "data": [...] }` /
/// `{ "messages": [...] }`.
pub(crate) fn parse_history(body: &str) -> Result<Vec<RawMessage>> {
    let v: Value = serde_json::from_str(body)?;
    let items = match v {
        Value::Array(_) => v,
        Value::Object(mut map) => map
            .remove("data")
            .or_else(|| map.remove("messages"))
            .ok_or_else(|| Error::Transport("history response has no message list".into()))?,
        _ => return Err(Error::Transport("unexpected history response shape".into())),
    };
    Ok(serde_json::from_value(items)?)
}

#[async_trait::async_trait]
impl ChatTransport for BridgeClient {
    async fn fetch_history(&self, chat_id: &str, limit: usize) -> Result<Vec<RawMessage>> {
        let url = self.chat_url(chat_id, "messages")?;
        let resp = self
            .authorize(self.client.get(&url))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(from_reqwest)?;
        let body = check_status(resp).await?;
        let messages = parse_history(&body)?;
        tracing::debug!(chat_id = %chat_id, count = messages.len(), "history fetched");
        Ok(messages)
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = self.chat_url(chat_id, "messages")?;
        self.post_json(&url, &serde_json::json!({ "text": text })).await
    }

    async fn send_typing(&self, chat_id: &str) -> Result<()> {
        let url = self.chat_url(chat_id, "typing")?;
        self.post_json(&url, &serde_json::json!({})).await
    }

    async fn send_image(&self, chat_id: &str, image: &ImageMessage) -> Result<()> {
        let url = self.chat_url(chat_id, "media")?;
        self.post_json(&url, &serde_json::to_value(image)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_ids_with_suffixes_are_valid() {
        assert!(validate_chat_id("2348081986116@c.us").is_ok());
        assert!(validate_chat_id("120363400270745236@g.us").is_ok());
        assert!(validate_chat_id("2348081986116@s.whatsapp.net").is_ok());
    }

    #[test]
    fn chat_ids_that_escape_the_path_are_rejected() {
        assert!(validate_chat_id("").is_err());
        assert!(validate_chat_id("../admin").is_err());
        assert!(validate_chat_id("a/b").is_err());
        assert!(validate_chat_id("123?limit=1").is_err());
    }

    #[test]
    fn history_accepts_bare_and_wrapped_arrays() {
        let bare = r#"[{"fromMe":false,"body":"hi"},{"fromMe":true,"body":"hello"}]"#;
        let msgs = parse_history(bare).unwrap();
        assert_eq!(msgs, vec![RawMessage::peer("hi"), RawMessage::own("hello")]);

        let wrapped = r#"{"data":[{"fromMe":false,"body":"yo"}]}"#;
        assert_eq!(parse_history(wrapped).unwrap(), vec![RawMessage::peer("yo")]);

        let messages = r#"{"messages":[]}"#;
        assert!(parse_history(messages).unwrap().is_empty());
    }

    #[test]
    fn history_without_list_is_transport_error() {
        let err = parse_history(r#"{"ok":true}"#).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let cfg = TransportConfig {
            base_url: "http://bridge:3000/".into(),
            token_env: "WB_TEST_BRIDGE_TOKEN_UNSET_1111".into(),
            ..Default::default()
        };
        let client = BridgeClient::from_config(&cfg).unwrap();
        assert_eq!(
            client.chat_url("123@c.us", "messages").unwrap(),
            "http://bridge:3000/chats/123@c.us/messages"
        );
        assert!(client.token.is_none());
    }
}
