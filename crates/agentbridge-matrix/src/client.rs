use reqwest::Client;
use serde_json::{json, Value};

use crate::error::MatrixError;

/// Thin wrapper over the Matrix Client-Server API (`/sync`, room send/join/
/// leave, reactions, to-device key requests). Grounded on
/// `original_source/chatbot/integrations/matrix/observer.py` and
/// `service.py`, re-expressed as direct HTTP calls via `reqwest` rather than
/// a full client SDK (the teacher's dependency table has no Matrix SDK, and
/// this spec needs only the handful of endpoints below).
#[derive(Clone)]
pub struct MatrixClient {
    http: Client,
    homeserver_url: String,
    access_token: String,
    user_id: String,
}

impl MatrixClient {
    pub fn new(homeserver_url: String, access_token: String, user_id: String) -> Self {
        Self {
            http: Client::new(),
            homeserver_url: homeserver_url.trim_end_matches('/').to_string(),
            access_token,
            user_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.homeserver_url, path)
    }

    pub async fn whoami(&self) -> Result<Value, MatrixError> {
        self.get("/_matrix/client/v3/account/whoami").await
    }

    /// Long-polling sync. `since` is `None` for the initial sync.
    pub async fn sync(&self, since: Option<&str>, timeout_ms: u64) -> Result<Value, MatrixError> {
        let mut path = format!(
            "/_matrix/client/v3/sync?timeout={timeout_ms}&full_state=false"
        );
        if let Some(token) = since {
            path.push_str(&format!("&since={token}"));
        }
        self.get(&path).await
    }

    pub async fn join_room(&self, room_id_or_alias: &str) -> Result<Value, MatrixError> {
        self.post(
            &format!("/_matrix/client/v3/join/{}", urlencode(room_id_or_alias)),
            &json!({}),
        )
        .await
    }

    pub async fn leave_room(&self, room_id: &str) -> Result<Value, MatrixError> {
        self.post(
            &format!("/_matrix/client/v3/rooms/{}/leave", urlencode(room_id)),
            &json!({}),
        )
        .await
    }

    pub async fn send_message(
        &self,
        room_id: &str,
        body: &str,
        reply_to_event_id: Option<&str>,
    ) -> Result<String, MatrixError> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let mut content = json!({
            "msgtype": "m.text",
            "body": body,
        });
        if let Some(parent) = reply_to_event_id {
            content["m.relates_to"] = json!({ "m.in_reply_to": { "event_id": parent } });
        }
        let resp = self
            .put(
                &format!(
                    "/_matrix/client/v3/rooms/{}/send/m.room.message/{}",
                    urlencode(room_id),
                    txn_id
                ),
                &content,
            )
            .await?;
        Ok(resp
            .get("event_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }

    pub async fn send_reaction(
        &self,
        room_id: &str,
        event_id: &str,
        emoji: &str,
    ) -> Result<(), MatrixError> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let content = json!({
            "m.relates_to": {
                "rel_type": "m.annotation",
                "event_id": event_id,
                "key": emoji,
            }
        });
        self.put(
            &format!(
                "/_matrix/client/v3/rooms/{}/send/m.reaction/{}",
                urlencode(room_id),
                txn_id
            ),
            &content,
        )
        .await?;
        Ok(())
    }

    pub async fn room_profile(&self, room_id: &str) -> Result<Value, MatrixError> {
        self.get(&format!(
            "/_matrix/client/v3/rooms/{}/state/m.room.name",
            urlencode(room_id)
        ))
        .await
    }

    pub async fn user_profile(&self, user_id: &str) -> Result<Value, MatrixError> {
        self.get(&format!(
            "/_matrix/client/v3/profile/{}",
            urlencode(user_id)
        ))
        .await
    }

    /// Broadcasts an `m.room_key_request` to-device event, asking other
    /// devices to re-share the session for a message we couldn't decrypt
    /// (spec §4.2/§9 undecryptable-event retry).
    pub async fn request_room_key(
        &self,
        room_id: &str,
        session_id: &str,
    ) -> Result<(), MatrixError> {
        let txn_id = uuid::Uuid::new_v4().to_string();
        let body = json!({
            "messages": {
                self.user_id.clone(): {
                    "*": {
                        "action": "request",
                        "body": {
                            "algorithm": "m.megolm.v1.aes-sha2",
                            "room_id": room_id,
                            "session_id": session_id,
                        },
                        "request_id": txn_id,
                        "requesting_device_id": "agentbridge",
                    }
                }
            }
        });
        self.put(
            &format!(
                "/_matrix/client/v3/sendToDevice/m.room_key_request/{}",
                txn_id
            ),
            &body,
        )
        .await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Value, MatrixError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, MatrixError> {
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        handle_response(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, MatrixError> {
        let resp = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        handle_response(resp).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value, MatrixError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp.json().await.unwrap_or(Value::Null))
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(MatrixError::Api {
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
