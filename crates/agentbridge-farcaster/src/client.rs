use reqwest::Client;
use serde_json::{json, Value};

use crate::error::FarcasterError;

/// Thin wrapper over a Neynar-style Farcaster hub REST API. Grounded on
/// `original_source/chatbot/integrations/farcaster/observer.py`
/// (`_observe_user_feed`/`_observe_channel_feed`/`post_cast`).
#[derive(Clone)]
pub struct FarcasterClient {
    http: Client,
    hub_url: String,
    api_key: String,
    signer_uuid: String,
    fid: u64,
}

impl FarcasterClient {
    pub fn new(hub_url: String, api_key: String, signer_uuid: String, fid: u64) -> Self {
        Self {
            http: Client::new(),
            hub_url: hub_url.trim_end_matches('/').to_string(),
            api_key,
            signer_uuid,
            fid,
        }
    }

    pub fn fid(&self) -> u64 {
        self.fid
    }

    pub async fn test_connection(&self) -> Result<Value, FarcasterError> {
        self.get(&format!("/v2/farcaster/user/bulk?fids={}", self.fid))
            .await
    }

    /// Fetches recent casts mentioning or replying to our own fid
    /// ("user feed" in the source's terminology).
    pub async fn recent_mentions(&self, limit: u32) -> Result<Value, FarcasterError> {
        self.get(&format!(
            "/v2/farcaster/feed/user/replies_and_recasts?fid={}&limit={limit}",
            self.fid
        ))
        .await
    }

    pub async fn channel_feed(&self, channel_id: &str, limit: u32) -> Result<Value, FarcasterError> {
        self.get(&format!(
            "/v2/farcaster/feed/channels?channel_ids={channel_id}&limit={limit}"
        ))
        .await
    }

    pub async fn post_cast(
        &self,
        text: &str,
        channel_id: Option<&str>,
        reply_to_hash: Option<&str>,
        embeds: &[String],
    ) -> Result<String, FarcasterError> {
        if self.api_key.is_empty() {
            return Err(FarcasterError::MissingApiKey);
        }
        let mut body = json!({
            "signer_uuid": self.signer_uuid,
            "text": text,
        });
        if let Some(channel) = channel_id {
            body["channel_id"] = json!(channel);
        }
        if let Some(parent) = reply_to_hash {
            body["parent"] = json!(parent);
        }
        if !embeds.is_empty() {
            body["embeds"] = json!(embeds.iter().map(|url| json!({"url": url})).collect::<Vec<_>>());
        }
        let resp = self.post("/v2/farcaster/cast", &body).await?;
        Ok(resp
            .pointer("/cast/hash")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn react_to_cast(&self, cast_hash: &str, reaction_type: &str) -> Result<(), FarcasterError> {
        let body = json!({
            "signer_uuid": self.signer_uuid,
            "reaction_type": reaction_type,
            "target": cast_hash,
        });
        self.post("/v2/farcaster/reaction", &body).await?;
        Ok(())
    }

    pub async fn user_profile(&self, fid_or_username: &str) -> Result<Value, FarcasterError> {
        self.get(&format!(
            "/v2/farcaster/user/by_username?username={fid_or_username}"
        ))
        .await
    }

    pub async fn search_casts(&self, query: &str, limit: u32) -> Result<Value, FarcasterError> {
        self.get(&format!(
            "/v2/farcaster/cast/search?q={}&limit={limit}",
            urlencode(query)
        ))
        .await
    }

    async fn get(&self, path: &str) -> Result<Value, FarcasterError> {
        let resp = self
            .http
            .get(format!("{}{}", self.hub_url, path))
            .header("api_key", &self.api_key)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, FarcasterError> {
        let resp = self
            .http
            .post(format!("{}{}", self.hub_url, path))
            .header("api_key", &self.api_key)
            .json(body)
            .send()
            .await?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value, FarcasterError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp.json().await.unwrap_or(Value::Null))
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(FarcasterError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
