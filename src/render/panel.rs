// SPDX-License-Identifier: GPL-3.0-only

//! Result area of a workflow
//!
//! Hosts subscribe to the panel and redraw whenever the view changes.
//! Every write is tied to a [`Ticket`]; a write with anything but the most
//! recently issued ticket is dropped, so a response that arrives after the
//! user moved on never replaces newer content.

use super::view::ResultView;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

/// Permission to write one result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Shared result area
#[derive(Debug, Clone)]
pub struct ResultPanel {
    sender: Arc<watch::Sender<ResultView>>,
    issued: Arc<Mutex<u64>>,
}

impl Default for ResultPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultPanel {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ResultView::Empty);
        Self {
            sender: Arc::new(sender),
            issued: Arc::new(Mutex::new(0)),
        }
    }

    /// Issue a new ticket, invalidating all earlier ones
    pub fn begin(&self) -> Ticket {
        match self.issued.lock() {
            Ok(mut issued) => {
                *issued += 1;
                Ticket(*issued)
            }
            Err(poisoned) => {
                let mut issued = poisoned.into_inner();
                *issued += 1;
                Ticket(*issued)
            }
        }
    }

    /// Replace the content if `ticket` is still current
    ///
    /// Returns `false` when the write was dropped as stale.
    pub fn present(&self, ticket: Ticket, view: ResultView) -> bool {
        let Ok(issued) = self.issued.lock() else {
            return false;
        };
        if ticket.0 != *issued {
            debug!(
                ticket = ticket.0,
                current = *issued,
                "Dropping stale result"
            );
            return false;
        }
        self.sender.send_replace(view);
        true
    }

    /// Replace the content unconditionally
    pub fn show(&self, view: ResultView) -> Ticket {
        let ticket = self.begin();
        self.present(ticket, view);
        ticket
    }

    pub fn clear(&self) {
        self.show(ResultView::Empty);
    }

    /// Content currently shown
    pub fn current(&self) -> ResultView {
        self.sender.borrow().clone()
    }

    /// Receive every change to the content
    pub fn subscribe(&self) -> watch::Receiver<ResultView> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ticket_is_dropped() {
        let panel = ResultPanel::new();
        let first = panel.begin();
        let second = panel.begin();

        assert!(panel.present(second, ResultView::loading("newer")));
        assert!(!panel.present(first, ResultView::loading("older")));
        assert_eq!(panel.current(), ResultView::loading("newer"));
    }

    #[test]
    fn test_rendering_replaces_content() {
        let panel = ResultPanel::new();
        panel.show(ResultView::Tips);
        panel.show(ResultView::Tips);
        assert_eq!(panel.current(), ResultView::Tips);

        panel.clear();
        assert_eq!(panel.current(), ResultView::Empty);
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let panel = ResultPanel::new();
        let mut rx = panel.subscribe();
        panel.show(ResultView::ManualFoodSearch);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ResultView::ManualFoodSearch);
    }
}
