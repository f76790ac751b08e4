use std::time::Duration;

use tokio::task::AbortHandle;

/// Idle window after which a typing indicator clears itself.
pub const TYPING_EXPIRY: Duration = Duration::from_millis(3000);

struct Pending {
    name: String,
    ticket: u64,
    timer: Option<AbortHandle>,
}

/// Who is typing, each with at most one pending expiry timer.
///
/// Every `start` hands out a fresh ticket. An expiry only takes effect if it
/// presents the ticket currently on record, so a timer that outlives its
/// entry (replaced, stopped, or its session gone) is a no-op.
#[derive(Default)]
pub struct TypingRegistry {
    entries: Vec<Pending>,
    next_ticket: u64,
}

impl TypingRegistry {
    /// Cancels any pending timer for `name` and returns the ticket its
    /// replacement must be armed with.
    pub fn start(&mut self, name: &str) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;

        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                entry.ticket = ticket;
            }
            None => self.entries.push(Pending {
                name: name.to_string(),
                ticket,
                timer: None,
            }),
        }

        ticket
    }

    pub fn arm(&mut self, name: &str, ticket: u64, timer: AbortHandle) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.name == name && entry.ticket == ticket)
        {
            Some(entry) => entry.timer = Some(timer),
            None => timer.abort(),
        }
    }

    /// Returns false when `name` was not typing.
    pub fn stop(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|entry| entry.name == name) {
            Some(index) => {
                let entry = self.entries.remove(index);
                if let Some(timer) = entry.timer {
                    timer.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Called by the timer itself, so the timer is not aborted here.
    pub fn expire(&mut self, name: &str, ticket: u64) -> bool {
        match self
            .entries
            .iter()
            .position(|entry| entry.name == name && entry.ticket == ticket)
        {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Typing names in the order they started.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }
}
