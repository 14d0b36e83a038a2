//! Full-screen chat: terminal setup, the event loop and teardown.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::api::HttpCompanionApi;
use crate::config::Config;
use crate::session::SessionContext;
use crate::ui::conversation::{ConversationAction, ConversationController};
use crate::voice::{Dictation, speaker_from_config};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Options for one interactive session
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub session: Option<String>,
    pub muted: bool,
}

/// Enter raw mode and the alternate screen
pub fn init_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Leave the alternate screen and raw mode
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Restore the terminal before the panic message is printed
pub fn install_panic_hook() {
    chain_panic_hook(restore_terminal);
}

fn chain_panic_hook(restore: fn() -> io::Result<()>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous(info);
    }));
}

/// Wire up a controller from config
pub fn build_controller(config: &Config, options: &ChatOptions) -> Result<ConversationController> {
    let api = HttpCompanionApi::from_config(config).context("Failed to build HTTP client")?;
    let dictation = Dictation::from_config(&config.voice);
    info!(
        api_url = %api.base_url(),
        dictation = dictation.is_present(),
        "starting conversation"
    );

    let mut controller = ConversationController::new(
        Arc::new(api),
        speaker_from_config(&config.voice),
        dictation,
    )
    .with_language(config.voice.language.clone())
    .with_timestamps(config.ui.show_timestamps)
    .with_muted(options.muted);

    if let Some(user_id) = &options.session {
        controller = controller.with_session(SessionContext::with_user_id(user_id.clone()));
    }
    Ok(controller)
}

/// Run the interactive chat until the user leaves
pub async fn run(config: &Config, options: ChatOptions) -> Result<()> {
    let mut controller = build_controller(config, &options)?;
    install_panic_hook();
    let mut terminal = init_terminal().context("Failed to initialize terminal")?;

    let result = event_loop(&mut terminal, &mut controller, config.reveal_tick()).await;

    if let Err(e) = restore_terminal() {
        warn!(error = %e, "failed to restore terminal");
    }
    info!(
        turns = controller.transcript().len(),
        "conversation closed"
    );
    result
}

/// Draw, read keys, apply responses and advance reveals once per tick
pub async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut ConversationController,
    tick: Duration,
) -> Result<()> {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| frame.render_widget(&*controller, frame.size()))?;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if controller.handle_key(key) == ConversationAction::Exit {
                    return Ok(());
                }
            }
        }

        controller.process_responses();
        ticker.tick().await;
        controller.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    static RESTORED: AtomicBool = AtomicBool::new(false);

    fn mark_restored() -> io::Result<()> {
        RESTORED.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[test]
    fn panic_restores_terminal_first() {
        chain_panic_hook(mark_restored);
        let result = std::panic::catch_unwind(|| panic!("draw failed"));
        // back to the default hook
        let _ = std::panic::take_hook();

        assert!(result.is_err());
        assert!(RESTORED.load(Ordering::SeqCst));
    }

    #[test]
    fn controller_uses_configured_options() {
        let config = Config::default();
        let controller = build_controller(
            &config,
            &ChatOptions {
                session: Some("u7".to_string()),
                muted: true,
            },
        )
        .unwrap();
        assert_eq!(controller.session().user_id(), Some("u7"));
        assert!(controller.is_muted());
    }
}
