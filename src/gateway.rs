use serde::Deserialize;

use crate::error::SentinelError;

/// Seam between alert dispatch and the outbound notification transport.
/// The sentinel treats the transport as untrusted with respect to latency;
/// the dispatcher wraps every call in its own timeout.
pub trait Notify: Send + Sync + 'static {
    fn send(
        &self,
        session_key: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), SentinelError>> + Send;
}

#[derive(Debug, Deserialize)]
pub struct SessionEntry {
    #[serde(rename = "sessionKey")]
    pub session_key: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct SessionListResponse {
    #[serde(default)]
    sessions: Vec<SessionEntry>,
}

/// Pick the session for a channel: an exact session-key match wins, a
/// display-name match is the fallback.
pub fn pick_session<'a>(sessions: &'a [SessionEntry], channel_id: &str) -> Option<&'a str> {
    sessions
        .iter()
        .find(|s| s.session_key.contains(channel_id))
        .or_else(|| sessions.iter().find(|s| s.display_name.contains(channel_id)))
        .map(|s| s.session_key.as_str())
}

/// HTTP client for the local notification gateway.
#[derive(Clone)]
pub struct GatewayNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayNotifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up the session key for the configured channel. Called once at
    /// process start; the key is assumed stable for the process lifetime.
    pub async fn resolve_session(&self, channel_id: &str) -> Result<String, SentinelError> {
        let url = format!("{}/api/v1/sessions/list", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SentinelError::Gateway(format!(
                "session list returned {}",
                response.status()
            )));
        }
        let list: SessionListResponse = response.json().await?;
        pick_session(&list.sessions, channel_id)
            .map(str::to_string)
            .ok_or_else(|| {
                SentinelError::Gateway(format!("no session matches channel {}", channel_id))
            })
    }
}

impl Notify for GatewayNotifier {
    async fn send(&self, session_key: &str, text: &str) -> Result<(), SentinelError> {
        let url = format!("{}/api/v1/sessions/send", self.base_url);
        let payload = serde_json::json!({
            "sessionKey": session_key,
            "message": format!("[SENTINEL ALERT] {}", text),
        });
        let response = self.http.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(SentinelError::Gateway(format!(
                "session send returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, name: &str) -> SessionEntry {
        SessionEntry {
            session_key: key.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn session_key_match_wins_over_display_name() {
        let sessions = vec![
            entry("discord:111", "trader channel 222"),
            entry("discord:222", "other"),
        ];
        assert_eq!(pick_session(&sessions, "222"), Some("discord:222"));
    }

    #[test]
    fn falls_back_to_display_name() {
        let sessions = vec![
            entry("discord:111", "general"),
            entry("discord:333", "saiabets 222"),
        ];
        assert_eq!(pick_session(&sessions, "222"), Some("discord:333"));
    }

    #[test]
    fn no_match_returns_none() {
        let sessions = vec![entry("discord:111", "general")];
        assert_eq!(pick_session(&sessions, "999"), None);
    }

    #[test]
    fn deserialize_session_list() {
        let json = r#"{"sessions":[{"sessionKey":"discord:123","displayName":"trader"}]}"#;
        let list: SessionListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.sessions[0].session_key, "discord:123");
    }
}
