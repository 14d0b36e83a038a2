//! Speech playback and dictation adapters.
//!
//! Both are optional. Playback is fire-and-forget; dictation is only wired
//! up when a recognizer is present.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::VoiceConfig;

/// Speaks bot replies aloud.
pub trait Speaker: Send + Sync {
    /// Start speaking `text`. Must not block and must not report failure.
    fn speak(&self, text: &str);
}

/// Speaker that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, _text: &str) {}
}

/// Speaker that hands the text to an external TTS program.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Build from an argv list; `None` if the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self, text: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        // the child is reaped on the runtime, so there is nothing to do without one
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(program = %self.program, "no async runtime, skipping speech playback");
            return;
        };

        match self.command(text).spawn() {
            Ok(mut child) => {
                handle.spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => debug!(program = %self.program, error = %e, "speech playback unavailable"),
        }
    }
}

/// Pick a speaker from config.
pub fn speaker_from_config(config: &VoiceConfig) -> Arc<dyn Speaker> {
    if !config.playback {
        return Arc::new(SilentSpeaker);
    }
    match config.speak_command.as_deref().and_then(CommandSpeaker::from_argv) {
        Some(speaker) => Arc::new(speaker),
        None => Arc::new(SilentSpeaker),
    }
}

/// How a single dictation attempt listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionOptions {
    pub fn single_utterance(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

/// Speech-to-text capability.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Listen for one utterance and return the top transcript candidate,
    /// or `None` if nothing was recognized.
    async fn listen_once(&self, options: &RecognitionOptions) -> Result<Option<String>>;
}

/// Recognizer backed by an external program.
///
/// The program receives the listen options in `MOODMATE_SPEECH_LANG`,
/// `MOODMATE_SPEECH_CONTINUOUS` and `MOODMATE_SPEECH_INTERIM` and prints
/// candidates one per line, best first.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Recognizer for CommandRecognizer {
    async fn listen_once(&self, options: &RecognitionOptions) -> Result<Option<String>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("MOODMATE_SPEECH_LANG", &options.language)
            .env("MOODMATE_SPEECH_CONTINUOUS", options.continuous.to_string())
            .env("MOODMATE_SPEECH_INTERIM", options.interim_results.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start recognizer '{}'", self.program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Recognizer stdout was not captured"))?;
        let mut lines = BufReader::new(stdout).lines();

        let mut candidate = None;
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if !line.is_empty() {
                candidate = Some(line.to_string());
                break;
            }
        }

        // single utterance: stop the program once we have a candidate
        if candidate.is_some() {
            let _ = child.start_kill();
        }
        let _ = child.wait().await;
        Ok(candidate)
    }
}

/// Whether voice dictation is available in this environment.
#[derive(Clone)]
pub enum Dictation {
    Present(Arc<dyn Recognizer>),
    Absent,
}

impl Dictation {
    pub fn from_config(config: &VoiceConfig) -> Self {
        match config
            .dictation_command
            .as_deref()
            .and_then(CommandRecognizer::from_argv)
        {
            Some(recognizer) => Dictation::Present(Arc::new(recognizer)),
            None => Dictation::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Dictation::Present(_))
    }

    /// Run one dictation attempt. Absent capability and recognizer errors
    /// both yield `None`.
    pub async fn listen(&self, options: &RecognitionOptions) -> Option<String> {
        let Dictation::Present(recognizer) = self else {
            return None;
        };
        match recognizer.listen_once(options).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(error = %e, "dictation failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for Dictation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dictation::Present(_) => f.write_str("Dictation::Present"),
            Dictation::Absent => f.write_str("Dictation::Absent"),
        }
    }
}
