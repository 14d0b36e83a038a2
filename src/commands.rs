use std::io::Write;
use std::path::Path;
use std::pin::pin;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::StreamExt;

use crate::api::{ChatRequest, CompanionApi};
use crate::config::Config;
use crate::emotion::{Emotion, format_metadata};
use crate::reveal::{CURSOR, reveal_stream};
use crate::ui::conversation::NETWORK_ERROR_PREFIX;
use crate::ui::dashboard::ChartData;
use crate::voice::Speaker;

/// Send one message and print the reply with the reveal animation
pub async fn send_message<W: Write>(
    api: &dyn CompanionApi,
    speaker: &dyn Speaker,
    out: &mut W,
    text: &str,
    session: Option<String>,
    tick: Duration,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        writeln!(out, "Nothing to send.")?;
        return Ok(());
    }

    let reply = match api
        .chat(ChatRequest {
            user_id: session,
            text: text.to_string(),
        })
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            writeln!(out, "🤖 {}{}", NETWORK_ERROR_PREFIX, e)?;
            bail!("chat request failed");
        }
    };

    speaker.speak(&reply.text);

    write!(out, "🤖 ")?;
    let mut printed = 0;
    let mut frames = pin!(reveal_stream(reply.text.clone(), tick));
    while let Some(frame) = frames.next().await {
        let visible = frame.strip_suffix(CURSOR).unwrap_or(&frame);
        let fresh: String = visible.chars().skip(printed).collect();
        printed += fresh.chars().count();
        write!(out, "{}", fresh)?;
        out.flush()?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "   {}",
        format_metadata(&reply.emotion, reply.confidence, reply.escalate)
    )?;
    if let Some(suggestion) = reply.suggestion.as_deref().filter(|s| !s.is_empty()) {
        writeln!(out, "   💡 {}", suggestion)?;
    }
    writeln!(out)?;
    writeln!(out, "session: {}", reply.user_id)?;
    writeln!(out, "continue with: moodmate send --session {} <TEXT>", reply.user_id)?;

    Ok(())
}

/// Print the mood breakdown for a session
pub async fn show_stats<W: Write>(api: &dyn CompanionApi, out: &mut W, user_id: Option<&str>) -> Result<()> {
    let Some(user_id) = user_id else {
        writeln!(out, "📭 No session given. Pass the id printed by 'moodmate send'.")?;
        return Ok(());
    };

    let stats = api.stats(user_id).await.context("Failed to fetch mood stats")?;
    let chart = ChartData::from_stats(&stats);

    if chart.labels.is_empty() {
        writeln!(out, "📭 No moods recorded yet for {}.", user_id)?;
        return Ok(());
    }

    writeln!(out, "📊 Mood dashboard for {}", user_id)?;
    writeln!(out, "{}", "=".repeat(50))?;
    let width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    for ((label, value), share) in chart.labels.iter().zip(&chart.values).zip(chart.shares()) {
        let bar = "█".repeat((share / 4.0).round() as usize);
        writeln!(
            out,
            "{} {:<width$} {:>4} {:>4.0}% {}",
            Emotion::parse(label).icon(),
            label,
            value,
            share,
            bar,
            width = width
        )?;
    }
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "total: {}", chart.total())?;

    Ok(())
}

/// Print the server-side conversation log for a session
pub async fn show_history<W: Write>(api: &dyn CompanionApi, out: &mut W, user_id: &str) -> Result<()> {
    let entries = api.history(user_id).await.context("Failed to fetch history")?;

    if entries.is_empty() {
        writeln!(out, "📭 No history recorded for {}.", user_id)?;
        return Ok(());
    }

    writeln!(out, "📜 History for {}:\n", user_id)?;
    for entry in entries {
        writeln!(out, "🕒 {}", entry.timestamp)?;
        writeln!(out, "   👤 {}", entry.user)?;
        writeln!(
            out,
            "   🤖 {} {} ({})",
            entry.bot,
            Emotion::parse(&entry.emotion).icon(),
            entry.emotion
        )?;
        writeln!(out)?;
    }

    Ok(())
}

/// Print where the config lives and what is in effect
pub fn show_config<W: Write>(out: &mut W, config: &Config, path: &Path) -> Result<()> {
    writeln!(out, "# {}", path.display())?;
    write!(out, "{}", config.to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatReply, HistoryEntry, MoodStats};
    use crate::error::{ApiError, ApiResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CannedApi {
        reply: Mutex<Option<ApiResult<ChatReply>>>,
        requests: Mutex<Vec<ChatRequest>>,
        stats: MoodStats,
        history: Vec<HistoryEntry>,
    }

    #[async_trait]
    impl CompanionApi for CannedApi {
        async fn chat(&self, request: ChatRequest) -> ApiResult<ChatReply> {
            self.requests.lock().unwrap().push(request);
            self.reply.lock().unwrap().take().unwrap()
        }

        async fn stats(&self, _user_id: &str) -> ApiResult<MoodStats> {
            Ok(self.stats.clone())
        }

        async fn history(&self, _user_id: &str) -> ApiResult<Vec<HistoryEntry>> {
            Ok(self.history.clone())
        }
    }

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
    }

    fn reply(suggestion: Option<&str>) -> ChatReply {
        ChatReply {
            user_id: "u1".to_string(),
            text: "I hear you".to_string(),
            emotion: "sadness".to_string(),
            confidence: 0.92,
            escalate: false,
            suggestion: suggestion.map(str::to_string),
            timestamp: None,
        }
    }

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn send_prints_revealed_reply_without_cursor() {
        let api = CannedApi {
            reply: Mutex::new(Some(Ok(reply(Some("Try a short walk"))))),
            ..CannedApi::default()
        };
        let speaker = RecordingSpeaker::default();
        let mut out = Vec::new();

        send_message(&api, &speaker, &mut out, "  I feel awful ", Some("u1".into()), Duration::from_millis(1))
            .await
            .unwrap();

        let text = printed(out);
        assert!(text.starts_with("🤖 I hear you\n"));
        assert!(!text.contains(CURSOR));
        assert!(text.contains("😢 sadness (92%) "));
        assert!(text.contains("💡 Try a short walk"));
        assert!(text.contains("session: u1"));
        assert_eq!(api.requests.lock().unwrap()[0].text, "I feel awful");
        assert_eq!(api.requests.lock().unwrap()[0].user_id.as_deref(), Some("u1"));
        assert_eq!(*speaker.spoken.lock().unwrap(), vec!["I hear you".to_string()]);
    }

    #[tokio::test]
    async fn send_skips_empty_suggestion() {
        let api = CannedApi {
            reply: Mutex::new(Some(Ok(reply(Some(""))))),
            ..CannedApi::default()
        };
        let mut out = Vec::new();

        send_message(&api, &RecordingSpeaker::default(), &mut out, "hi", None, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(!printed(out).contains("💡"));
    }

    #[tokio::test]
    async fn send_failure_prints_network_error_and_fails() {
        let api = CannedApi {
            reply: Mutex::new(Some(Err(ApiError::status(502, "")))),
            ..CannedApi::default()
        };
        let speaker = RecordingSpeaker::default();
        let mut out = Vec::new();

        let result = send_message(&api, &speaker, &mut out, "hi", None, Duration::from_millis(1)).await;

        assert!(result.is_err());
        assert_eq!(
            printed(out),
            "🤖 ⚠️ Network error: server returned 502: no response body\n"
        );
        assert!(speaker.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_send_makes_no_request() {
        let api = CannedApi::default();
        let mut out = Vec::new();

        send_message(&api, &RecordingSpeaker::default(), &mut out, "   ", None, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(printed(out), "Nothing to send.\n");
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_print_bars_in_server_order() {
        let api = CannedApi {
            stats: MoodStats::from_pairs([("anger", 3), ("joy", 7)]),
            ..CannedApi::default()
        };
        let mut out = Vec::new();

        show_stats(&api, &mut out, Some("u1")).await.unwrap();

        let text = printed(out);
        let anger = text.find("anger").unwrap();
        let joy = text.find("joy").unwrap();
        assert!(anger < joy);
        assert!(text.contains(&format!("😡 anger    3   30% {}", "█".repeat(8))));
        assert!(text.contains(&format!("😊 joy      7   70% {}", "█".repeat(18))));
        assert!(text.contains("total: 10"));
    }

    #[tokio::test]
    async fn stats_without_session_or_data() {
        let api = CannedApi::default();
        let mut out = Vec::new();
        show_stats(&api, &mut out, None).await.unwrap();
        show_stats(&api, &mut out, Some("u1")).await.unwrap();

        let text = printed(out);
        assert!(text.contains("No session given"));
        assert!(text.contains("No moods recorded yet for u1."));
    }

    #[tokio::test]
    async fn history_lists_entries() {
        let api = CannedApi {
            history: vec![HistoryEntry {
                timestamp: "2024-05-01T10:00:00Z".to_string(),
                user: "hello".to_string(),
                bot: "Thanks for sharing.".to_string(),
                emotion: "neutral".to_string(),
            }],
            ..CannedApi::default()
        };
        let mut out = Vec::new();

        show_history(&api, &mut out, "u1").await.unwrap();

        let text = printed(out);
        assert!(text.contains("🕒 2024-05-01T10:00:00Z"));
        assert!(text.contains("👤 hello"));
        assert!(text.contains("🤖 Thanks for sharing. 🙂 (neutral)"));
    }
}
