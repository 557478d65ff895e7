use serde_json::{json, Value};
use tracing::warn;

use crate::services::db_utils::AppState;
use crate::services::messages::{FetchAdminPushTokens, FetchPushToken};
use crate::types::AppConfig;

#[derive(Clone)]
pub struct PushClient {
    http: reqwest::Client,
    endpoint: String,
    server_key: String,
}

pub fn build_payload(device_token: &str, title: &str, body: &str) -> Value {
    json!({
        "to": device_token,
        "notification": {
            "title": title,
            "body": body,
        }
    })
}

impl PushClient {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.fcm_endpoint.clone(),
            server_key: config.fcm_server_key.clone(),
        }
    }

    /// Best-effort delivery: failures are logged and swallowed, the caller
    /// never observes them.
    pub async fn send(&self, device_token: &str, title: &str, body: &str) {
        let payload = build_payload(device_token, title, body);

        let result = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => warn!("push notification rejected: {}", resp.status()),
            Err(err) => warn!("failed to send push notification: {err}"),
        }
    }
}

/// Fan-out to every admin with a registered device token.
pub async fn notify_admins(state: &AppState, title: &str, body: &str) {
    let tokens = match state.pg_db.send(FetchAdminPushTokens).await {
        Ok(Ok(tokens)) => tokens,
        Ok(Err(err)) => {
            warn!("unable to load admin push tokens: {err}");
            return;
        }
        Err(err) => {
            warn!("unable to load admin push tokens: {err}");
            return;
        }
    };

    for token in tokens {
        state.push.send(&token, title, body).await;
    }
}

pub async fn notify_user(state: &AppState, user_id: i64, title: &str, body: &str) {
    match state.pg_db.send(FetchPushToken(user_id)).await {
        Ok(Ok(Some(token))) => state.push.send(&token, title, body).await,
        Ok(Ok(None)) => {}
        Ok(Err(err)) => warn!("unable to load push token for user {user_id}: {err}"),
        Err(err) => warn!("unable to load push token for user {user_id}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_nests_title_and_body_under_notification() {
        let payload = build_payload("device-123", "New order", "Order from Ann Smith");

        assert_eq!(payload["to"], "device-123");
        assert_eq!(payload["notification"]["title"], "New order");
        assert_eq!(payload["notification"]["body"], "Order from Ann Smith");
    }
}
