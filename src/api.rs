//! Client for the companion service's HTTP API.

use std::fmt;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub user_id: Option<String>,
    pub text: String,
}

/// Reply from `POST /chat`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub user_id: String,
    pub text: String,
    pub emotion: String,
    pub confidence: f64,
    pub escalate: bool,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// One exchange from `GET /history/{user_id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub user: String,
    pub bot: String,
    pub emotion: String,
}

/// Emotion label counts from `GET /stats/{user_id}`, in the order the
/// server sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoodStats {
    entries: Vec<(String, u64)>,
}

impl MoodStats {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.entries.iter().map(|(_, count)| *count).collect()
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for MoodStats {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StatsVisitor;

        impl<'de> Visitor<'de> for StatsVisitor {
            type Value = MoodStats;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of emotion labels to counts")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, count)) = map.next_entry::<String, f64>()? {
                    let count = if count.is_finite() && count > 0.0 {
                        count.round() as u64
                    } else {
                        0
                    };
                    entries.push((label, count));
                }
                Ok(MoodStats { entries })
            }
        }

        deserializer.deserialize_map(StatsVisitor)
    }
}

/// The remote contract the conversation controller talks to.
#[async_trait]
pub trait CompanionApi: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> ApiResult<ChatReply>;

    async fn stats(&self, user_id: &str) -> ApiResult<MoodStats>;

    async fn history(&self, user_id: &str) -> ApiResult<Vec<HistoryEntry>>;
}

/// HTTP implementation backed by reqwest
#[derive(Clone)]
pub struct HttpCompanionApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpCompanionApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim().trim_end_matches('/'))
            .map_err(|_| ApiError::InvalidUrl(raw.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(raw));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Read a response body, turning non-success statuses and malformed
    /// JSON into errors.
    async fn decode<T>(response: reqwest::Response) -> ApiResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::status(status.as_u16(), body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CompanionApi for HttpCompanionApi {
    async fn chat(&self, request: ChatRequest) -> ApiResult<ChatReply> {
        let url = self.endpoint(&["chat"])?;
        debug!(url = %url, has_session = request.user_id.is_some(), "posting chat message");

        let response = self.client.post(url).json(&request).send().await?;
        Self::decode(response).await
    }

    async fn stats(&self, user_id: &str) -> ApiResult<MoodStats> {
        let url = self.endpoint(&["stats", user_id])?;
        debug!(url = %url, "fetching mood stats");

        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn history(&self, user_id: &str) -> ApiResult<Vec<HistoryEntry>> {
        let url = self.endpoint(&["history", user_id])?;
        debug!(url = %url, "fetching history");

        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_null_user_id() {
        let request = ChatRequest {
            user_id: None,
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": null, "text": "hello"}));
    }

    #[test]
    fn reply_ignores_extra_fields_and_missing_suggestion() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"user_id":"u1","text":"Thanks for sharing.","emotion":"neutral",
                "confidence":0.5,"escalate":false,"timestamp":"2024-01-01T00:00:00Z","extra":1}"#,
        )
        .unwrap();
        assert_eq!(reply.user_id, "u1");
        assert_eq!(reply.suggestion, None);
        assert_eq!(reply.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn reply_with_null_suggestion() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"user_id":"u1","text":"ok","emotion":"calm","confidence":0.4,
                "escalate":false,"suggestion":null}"#,
        )
        .unwrap();
        assert_eq!(reply.suggestion, None);
    }

    #[test]
    fn stats_keep_server_order() {
        let stats: MoodStats = serde_json::from_str(r#"{"joy":7,"anger":3,"calm":1}"#).unwrap();
        assert_eq!(stats.labels(), vec!["joy", "anger", "calm"]);
        assert_eq!(stats.values(), vec![7, 3, 1]);
        assert_eq!(stats.total(), 11);
    }

    #[test]
    fn stats_reject_non_map() {
        assert!(serde_json::from_str::<MoodStats>("[1,2]").is_err());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let api = HttpCompanionApi::new("http://localhost:8000/api/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(
            api.endpoint(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/api/chat"
        );
    }

    #[test]
    fn user_id_is_one_encoded_segment() {
        let api = HttpCompanionApi::new("http://localhost:8000/api", Duration::from_secs(1)).unwrap();
        let url = api.endpoint(&["stats", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/stats/a%2Fb%3Fc%23d");
    }

    #[test]
    fn base_url_must_be_absolute() {
        let err = HttpCompanionApi::new("not a url", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    /// Serve one canned HTTP response on a local port; yields the request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            // read the head and any body so closing does not reset the connection
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let body_len = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + body_len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (base, handle)
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let (base, server) = serve_once("503 Service Unavailable", "busy").await;
        let api = HttpCompanionApi::new(base, Duration::from_secs(5)).unwrap();

        let err = api
            .chat(ChatRequest {
                user_id: None,
                text: "hi".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert_eq!(err.to_string(), "server returned 503: busy");
        assert!(server.await.unwrap().starts_with("POST /api/chat "));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (base, server) = serve_once("200 OK", "{not json").await;
        let api = HttpCompanionApi::new(base, Duration::from_secs(5)).unwrap();

        let err = api.history("u1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn stats_request_hits_encoded_path() {
        let (base, server) = serve_once("200 OK", r#"{"joy":2,"anger":1}"#).await;
        let api = HttpCompanionApi::new(base, Duration::from_secs(5)).unwrap();

        let stats = api.stats("team/alice").await.unwrap();
        assert_eq!(stats.labels(), vec!["joy", "anger"]);
        assert!(server.await.unwrap().starts_with("GET /api/stats/team%2Falice "));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let api = HttpCompanionApi::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = api
            .chat(ChatRequest {
                user_id: None,
                text: "hi".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
