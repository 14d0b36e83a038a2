use futures::Stream;
use tokio::time::Duration;

/// Cursor drawn after partially revealed text.
pub const CURSOR: char = '▌';

/// Default delay between revealed characters.
pub const DEFAULT_TICK: Duration = Duration::from_millis(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Running,
    Cancelled,
    Complete,
}

/// Progressive character-by-character reveal of a bot reply.
///
/// Each call to [`Reveal::next_frame`] yields the next display state: the
/// first `n` characters followed by [`CURSOR`], and finally the whole text
/// without a cursor. Once complete it yields nothing until [`Reveal::reset`].
/// A cancelled reveal keeps its last frame and can be resumed.
#[derive(Debug, Clone)]
pub struct Reveal {
    text: String,
    total_chars: usize,
    position: usize,
    current: String,
    state: RevealState,
}

impl Reveal {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let total_chars = text.chars().count();
        Self {
            text,
            total_chars,
            position: 0,
            current: String::new(),
            state: RevealState::Running,
        }
    }

    /// Advance by one tick. Returns the new frame, or `None` when cancelled
    /// or already complete.
    pub fn next_frame(&mut self) -> Option<String> {
        if self.state != RevealState::Running {
            return None;
        }

        if self.position < self.total_chars {
            let end = self
                .text
                .char_indices()
                .nth(self.position)
                .map_or(self.text.len(), |(index, _)| index);
            let mut frame = String::with_capacity(end + CURSOR.len_utf8());
            frame.push_str(&self.text[..end]);
            frame.push(CURSOR);
            self.current = frame;
            self.position += 1;
        } else {
            self.current = self.text.clone();
            self.state = RevealState::Complete;
        }

        Some(self.current.clone())
    }

    /// Text currently on display.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Full text being revealed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == RevealState::Complete
    }

    pub fn is_running(&self) -> bool {
        self.state == RevealState::Running
    }

    /// Stop producing frames, keeping the current one on display.
    pub fn cancel(&mut self) {
        if self.state == RevealState::Running {
            self.state = RevealState::Cancelled;
        }
    }

    /// Continue a cancelled reveal from where it stopped.
    pub fn resume(&mut self) {
        if self.state == RevealState::Cancelled {
            self.state = RevealState::Running;
        }
    }

    /// Start over from zero characters.
    pub fn reset(&mut self) {
        self.position = 0;
        self.current.clear();
        self.state = RevealState::Running;
    }

    /// Ticks left until the final frame, inclusive.
    pub fn remaining_ticks(&self) -> usize {
        match self.state {
            RevealState::Complete => 0,
            _ => self.total_chars - self.position + 1,
        }
    }
}

impl Iterator for Reveal {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

/// Drive a reveal on a timer, yielding one frame per tick.
pub fn reveal_stream(text: impl Into<String>, tick: Duration) -> impl Stream<Item = String> {
    let reveal = Reveal::new(text);
    let interval = tokio::time::interval(tick);
    futures::stream::unfold((reveal, interval), |(mut reveal, mut interval)| async move {
        interval.tick().await;
        let frame = reveal.next_frame()?;
        Some((frame, (reveal, interval)))
    })
}
