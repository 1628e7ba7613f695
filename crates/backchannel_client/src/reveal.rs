//! Typewriter-style reveal of an already complete answer.

use std::str::CharIndices;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK: Duration = Duration::from_millis(30);

/// Growing prefixes of `text`, one character longer each step.
pub fn prefixes(text: &str) -> Prefixes<'_> {
    Prefixes {
        text,
        chars: text.char_indices(),
    }
}

pub struct Prefixes<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.chars
            .next()
            .map(|(start, c)| &self.text[..start + c.len_utf8()])
    }
}

/// Replays a finished answer one character per tick.
///
/// Starting a new reveal stops the previous one; its receiver then closes
/// without yielding the rest of the old text.
#[derive(Debug)]
pub struct RevealController {
    tick: Duration,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Default for RevealController {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl RevealController {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            token: CancellationToken::new(),
            task: None,
        }
    }

    /// Begin revealing `text`. Must be called from within a tokio runtime.
    pub fn start(&mut self, text: impl Into<String>) -> mpsc::UnboundedReceiver<String> {
        self.cancel();
        let text = text.into();
        let (tx, rx) = mpsc::unbounded_channel();
        if text.is_empty() {
            return rx;
        }

        let token = CancellationToken::new();
        self.token = token.clone();
        let tick = self.tick;
        self.task = Some(tokio::spawn(async move {
            for prefix in prefixes(&text) {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(tick) => {}
                }
                if tx.send(prefix.to_string()).is_err() {
                    return;
                }
            }
        }));
        rx
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
        self.task = None;
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}
