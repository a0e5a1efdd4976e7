use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::topology::command::InterfacePrompt;

#[derive(Default)]
struct Slot {
    waiting: Option<oneshot::Sender<Option<String>>>,
    /// Lines meant as answers that arrived before the question was asked.
    held: VecDeque<String>,
}

/// Interface prompt answered by the next line typed on the console.
///
/// The console's line reader hands every line to [`ConsolePrompt::offer`] first; a line is
/// only treated as a command when no question is waiting. While a link attempt is in flight
/// but its question has not been asked yet, the reader parks lines with
/// [`ConsolePrompt::hold`] and the next `ask` takes them in order.
#[derive(Default)]
pub struct ConsolePrompt {
    slot: Mutex<Slot>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_waiting(&self) -> bool {
        self.slot.lock().map(|slot| slot.waiting.is_some()).unwrap_or(false)
    }

    /// Answers the waiting question with `line`. Gives the line back if nobody asked.
    pub fn offer(&self, line: String) -> Option<String> {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.waiting.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => {
                let _ = sender.send(Some(line));
                None
            }
            None => Some(line),
        }
    }

    /// Keeps `line` as the answer to the next question, or answers the waiting one.
    pub fn hold(&self, line: String) {
        if let Some(line) = self.offer(line)
            && let Ok(mut slot) = self.slot.lock()
        {
            slot.held.push_back(line);
        }
    }

    /// Forgets answers parked for a question that never came.
    pub fn clear_held(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.held.clear();
        }
    }

    /// Abandons the waiting question, if any (end of input).
    pub fn close(&self) {
        if let Ok(mut slot) = self.slot.lock()
            && let Some(sender) = slot.waiting.take()
        {
            let _ = sender.send(None);
        }
    }
}

/// Maps a typed line onto a prompt answer: empty takes the default, `cancel` abandons.
pub fn interpret_answer(line: &str, default: &str) -> Option<String> {
    match line.trim() {
        "" => Some(default.to_string()),
        answer if answer.eq_ignore_ascii_case("cancel") => None,
        answer => Some(answer.to_string()),
    }
}

#[async_trait]
impl InterfacePrompt for ConsolePrompt {
    async fn ask(&self, question: &str, default: &str) -> Option<String> {
        let (sender, answer) = oneshot::channel();
        let held = {
            let mut slot = self.slot.lock().ok()?;
            let held = slot.held.pop_front();
            if held.is_none() {
                slot.waiting = Some(sender);
            }
            held
        };
        println!("{question} [{default}] (or 'cancel')");

        let line = match held {
            Some(line) => Some(line),
            None => answer.await.ok().flatten(),
        };
        let answer = line.and_then(|line| interpret_answer(&line, default));
        debug!(question, ?answer, "prompt answered");
        answer
    }
}
