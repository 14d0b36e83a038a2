use std::sync::Arc;

use crate::api::{ChatReply, ChatRequest, CompanionApi, HistoryEntry, MoodStats};
use crate::emotion::format_metadata;
use crate::events::{ResponseEvent, Role};
use crate::session::SessionContext;
use crate::ui::conversation::commands::{ParsedCommand, SlashCommand, get_help_text};
use crate::ui::conversation::composer::ComposerResult;
use crate::ui::conversation::{ChatTurn, ConversationComposer, Transcript};
use crate::ui::dashboard::Dashboard;
use crate::ui::suggestion::SuggestionPanel;
use crate::voice::{Dictation, RecognitionOptions, Speaker};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Prefix of the bot turn shown when a chat request fails.
pub const NETWORK_ERROR_PREFIX: &str = "⚠️ Network error: ";

const SCROLL_STEP: usize = 5;

/// Actions the UI loop should take after input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Drives one conversation: renders turns, sends requests and applies
/// their results.
pub struct ConversationController {
    api: Arc<dyn CompanionApi>,
    speaker: Arc<dyn Speaker>,
    dictation: Dictation,
    recognition: RecognitionOptions,
    session: SessionContext,
    transcript: Transcript,
    composer: ConversationComposer,
    suggestions: SuggestionPanel,
    dashboard: Dashboard,
    muted: bool,
    pending_requests: usize,
    response_tx: mpsc::UnboundedSender<ResponseEvent>,
    response_rx: mpsc::UnboundedReceiver<ResponseEvent>,
}

impl ConversationController {
    pub fn new(api: Arc<dyn CompanionApi>, speaker: Arc<dyn Speaker>, dictation: Dictation) -> Self {
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        Self {
            api,
            speaker,
            dictation,
            recognition: RecognitionOptions::single_utterance("en-US"),
            session: SessionContext::new(),
            transcript: Transcript::new(true),
            composer: ConversationComposer::new("Type a message and press Enter..."),
            suggestions: SuggestionPanel::new(),
            dashboard: Dashboard::new(),
            muted: false,
            pending_requests: 0,
            response_tx,
            response_rx,
        }
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.recognition = RecognitionOptions::single_utterance(language);
        self
    }

    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.transcript = Transcript::new(show_timestamps);
        self
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Send a message. Returns false, doing nothing, when the trimmed text
    /// is empty.
    pub fn submit(&mut self, raw_text: &str) -> bool {
        let text = raw_text.trim();
        if text.is_empty() {
            return false;
        }

        self.transcript.append(ChatTurn::user(text));
        self.composer.clear();

        let request = ChatRequest {
            user_id: self.session.user_id().map(str::to_string),
            text: text.to_string(),
        };
        self.pending_requests += 1;
        debug!(pending = self.pending_requests, "chat request issued");

        let api = Arc::clone(&self.api);
        let tx = self.response_tx.clone();
        tokio::spawn(async move {
            let event = match api.chat(request).await {
                Ok(reply) => ResponseEvent::Reply(reply),
                Err(e) => {
                    warn!(error = %e, "chat request failed");
                    ResponseEvent::ChatFailed(e.to_string())
                }
            };
            let _ = tx.send(event);
        });

        true
    }

    /// Fetch stats for the current session and show the dashboard
    pub fn request_stats(&mut self) {
        let Some(user_id) = self.session.user_id().map(str::to_string) else {
            self.transcript.append(ChatTurn::system(
                "No mood stats yet. Send a message first to start a session.",
            ));
            return;
        };
        self.request_stats_for(user_id);
    }

    pub fn request_stats_for(&mut self, user_id: String) {
        let api = Arc::clone(&self.api);
        let tx = self.response_tx.clone();
        tokio::spawn(async move {
            match api.stats(&user_id).await {
                Ok(stats) => {
                    let _ = tx.send(ResponseEvent::Stats(stats));
                }
                Err(e) => warn!(user_id = %user_id, error = %e, "stats request failed"),
            }
        });
    }

    /// Fetch the server-side history for the current session
    pub fn request_history(&mut self) {
        let Some(user_id) = self.session.user_id().map(str::to_string) else {
            self.transcript.append(ChatTurn::system(
                "No history yet. Send a message first to start a session.",
            ));
            return;
        };
        self.request_history_for(user_id);
    }

    pub fn request_history_for(&mut self, user_id: String) {
        let api = Arc::clone(&self.api);
        let tx = self.response_tx.clone();
        tokio::spawn(async move {
            match api.history(&user_id).await {
                Ok(entries) => {
                    let _ = tx.send(ResponseEvent::History(entries));
                }
                Err(e) => warn!(user_id = %user_id, error = %e, "history request failed"),
            }
        });
    }

    /// Listen for one utterance and submit it. Does nothing when no
    /// recognizer is available.
    pub fn start_dictation(&mut self) {
        if !self.dictation.is_present() {
            debug!("dictation requested but no recognizer is configured");
            return;
        }

        let dictation = self.dictation.clone();
        let options = self.recognition.clone();
        let tx = self.response_tx.clone();
        info!(language = %options.language, "listening for dictation");
        tokio::spawn(async move {
            if let Some(transcript) = dictation.listen(&options).await {
                let _ = tx.send(ResponseEvent::Dictated(transcript));
            }
        });
    }

    /// Apply the result of background work
    pub fn apply(&mut self, event: ResponseEvent) {
        match event {
            ResponseEvent::Reply(reply) => {
                self.finish_request();
                self.render_reply(reply);
            }
            ResponseEvent::ChatFailed(description) => {
                self.finish_request();
                self.transcript.append(ChatTurn::bot(
                    format!("{}{}", NETWORK_ERROR_PREFIX, description),
                    None,
                    false,
                ));
            }
            ResponseEvent::Stats(stats) => self.render_stats(&stats),
            ResponseEvent::History(entries) => self.render_history(&entries),
            ResponseEvent::Dictated(transcript) => {
                self.composer.set_content(transcript);
                let text = self.composer.content().to_string();
                self.submit(&text);
            }
        }
    }

    fn finish_request(&mut self) {
        self.pending_requests = self.pending_requests.saturating_sub(1);
    }

    fn render_reply(&mut self, reply: ChatReply) {
        self.session.adopt(reply.user_id.as_str());

        let metadata = format_metadata(&reply.emotion, reply.confidence, reply.escalate);
        if reply.escalate {
            info!(emotion = %reply.emotion, "reply flagged for escalation");
        }
        self.transcript
            .append(ChatTurn::bot(reply.text.as_str(), Some(metadata), true));
        self.suggestions.replace(reply.suggestion.as_deref());

        if !self.muted {
            self.speaker.speak(&reply.text);
        }
    }

    fn render_stats(&mut self, stats: &MoodStats) {
        debug!(categories = stats.entries().len(), "rendering mood stats");
        self.dashboard.show_stats(stats);
        self.composer.set_focus(false);
    }

    fn hide_dashboard(&mut self) {
        self.dashboard.hide();
        self.composer.set_focus(true);
    }

    fn render_history(&mut self, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            self.transcript
                .append(ChatTurn::system("No history recorded for this session."));
            return;
        }
        for entry in entries {
            self.transcript.append(ChatTurn::system(format!(
                "[{}] you: {}\n[{}] bot: {} ({})",
                entry.timestamp, entry.user, entry.timestamp, entry.bot, entry.emotion
            )));
        }
    }

    /// Apply every result that has arrived. Returns true if any did.
    pub fn process_responses(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.response_rx.try_recv() {
            self.apply(event);
            applied = true;
        }
        applied
    }

    /// Wait for the next background result and apply it
    pub async fn next_response(&mut self) {
        if let Some(event) = self.response_rx.recv().await {
            self.apply(event);
        }
    }

    /// Advance running reveals by one tick
    pub fn tick(&mut self) -> bool {
        self.transcript.tick()
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ConversationAction::Exit;
        }

        match key.code {
            KeyCode::F(2) => {
                self.start_dictation();
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.transcript.scroll_up(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.transcript.scroll_down(SCROLL_STEP);
                return ConversationAction::None;
            }
            KeyCode::Esc if self.dashboard.is_visible() && !self.composer.is_palette_open() => {
                self.hide_dashboard();
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.submit(&text);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Handle slash commands
    ///
    /// `/stats` and `/history` take an optional session id; the other
    /// commands ignore arguments.
    pub fn handle_command(&mut self, command: ParsedCommand) -> ConversationAction {
        let argument = command.argument().map(str::to_string);
        match (command.command, argument) {
            (SlashCommand::Stats, Some(user_id)) => self.request_stats_for(user_id),
            (SlashCommand::Stats, None) => self.request_stats(),
            (SlashCommand::History, Some(user_id)) => self.request_history_for(user_id),
            (SlashCommand::History, None) => self.request_history(),
            (other, Some(argument)) => {
                debug!(command = other.command(), argument = %argument, "ignoring command argument");
                return self.handle_command(ParsedCommand {
                    command: other,
                    argument: None,
                });
            }
            (SlashCommand::Mic, None) => self.start_dictation(),
            (SlashCommand::Mute, None) => {
                self.muted = !self.muted;
                let note = if self.muted {
                    "Spoken replies off."
                } else {
                    "Spoken replies on."
                };
                self.transcript.append(ChatTurn::system(note));
            }
            (SlashCommand::Help, None) => self.transcript.append(ChatTurn::system(get_help_text())),
            (SlashCommand::Bye, None) => return ConversationAction::Exit,
        }
        ConversationAction::None
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut ConversationComposer {
        &mut self.composer
    }

    pub fn suggestions(&self) -> &SuggestionPanel {
        &self.suggestions
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn pending_requests(&self) -> usize {
        self.pending_requests
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn status_line(&self) -> Line<'static> {
        let session = match self.session.short_id() {
            Some(id) => format!("session {}", id),
            None => "new session".to_string(),
        };
        let voice = if self.muted { "voice muted" } else { "voice on" };
        let mic = if self.dictation.is_present() {
            "F2 dictate"
        } else {
            "no mic"
        };

        let mut spans = vec![Span::styled(
            format!(" {} · {} · {} ", session, voice, mic),
            Style::default().fg(Color::DarkGray),
        )];
        if self.pending_requests > 0 {
            spans.push(Span::styled(
                "· waiting for reply…",
                Style::default().fg(Color::Yellow),
            ));
        } else if self.transcript.count_role(Role::Bot) == 0 {
            spans.push(Span::styled(
                "· /help for commands",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for &ConversationController {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),    // transcript
                Constraint::Length(3), // suggestion
                Constraint::Length(3), // composer
                Constraint::Length(1), // status
            ])
            .split(area);

        self.transcript.render(chunks[0], buf);
        self.suggestions.render(chunks[1], buf);
        self.composer.render(chunks[2], buf);
        buf.set_line(chunks[3].x, chunks[3].y, &self.status_line(), chunks[3].width);

        let palette_height = self.composer.palette_height();
        if palette_height > 0 {
            let palette_area = Rect {
                x: chunks[2].x,
                y: chunks[2].y.saturating_sub(palette_height),
                width: chunks[2].width,
                height: palette_height.min(chunks[2].y),
            };
            self.composer.render_palette(palette_area, buf);
        }

        if self.dashboard.is_visible() {
            self.dashboard.render(centered(chunks[0], 70, 80), buf);
        }
    }
}

/// Rect covering `percent_x` by `percent_y` of `area`, centered
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
