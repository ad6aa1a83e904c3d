use crate::lifecycle::{wait_stopped, Controller, LifecycleState};
use crate::message::{Cursor, EventTag, Message};
use crate::registry::Registry;
use crate::source::SourceHandle;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing new; cursor unchanged and no hooks fired.
    Empty,
    /// `count` messages were handed to the hooks.
    Dispatched { count: usize },
    /// The fetch failed; handled like an empty page.
    Failed,
}

pub struct Poller {
    source: SourceHandle,
    registry: Arc<Registry>,
    state: watch::Receiver<LifecycleState>,
    interval: Duration,
    cursor: Cursor,
}

impl Poller {
    pub fn new(
        source: SourceHandle,
        registry: Arc<Registry>,
        controller: &Controller,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            state: controller.subscribe(),
            interval,
            cursor: Cursor::unset(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// One fetch-and-dispatch cycle, ignoring the lifecycle state.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let fetched = self.source.fetch_since(self.cursor).await;
        self.handle_fetch(fetched).await
    }

    async fn handle_fetch(&mut self, fetched: Result<Vec<Message>>) -> PollOutcome {
        let messages = match fetched {
            Ok(messages) => messages,
            Err(e) => {
                warn!(cursor = ?self.cursor.get(), "timeline fetch failed: {:#}", e);
                return PollOutcome::Failed;
            }
        };

        let Some(newest) = messages.first() else {
            debug!("no new messages");
            return PollOutcome::Empty;
        };
        self.cursor.advance(newest.id);
        debug!(count = messages.len(), cursor = %newest.id, "new messages");

        self.registry
            .dispatch_hooks(&messages, EventTag::UpdateFriendsTimeline, &self.source)
            .await;
        PollOutcome::Dispatched {
            count: messages.len(),
        }
    }

    /// Poll until the controller stops. While paused the task parks on the
    /// lifecycle channel; a stop request interrupts the fetch and the sleep,
    /// but hooks already running are allowed to finish.
    pub async fn run(mut self) {
        info!(interval = ?self.interval, "poller started");
        loop {
            if !wait_until_running(&mut self.state).await {
                break;
            }

            let fetched = tokio::select! {
                biased;
                _ = wait_stopped(&mut self.state) => break,
                fetched = self.source.fetch_since(self.cursor) => fetched,
            };
            self.handle_fetch(fetched).await;

            tokio::select! {
                biased;
                _ = wait_stopped(&mut self.state) => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(cursor = ?self.cursor.get(), "poller stopped");
    }
}

/// Park while paused. Returns `false` once the state is `Stopped`.
async fn wait_until_running(state: &mut watch::Receiver<LifecycleState>) -> bool {
    loop {
        let current = *state.borrow_and_update();
        match current {
            LifecycleState::Running => return true,
            LifecycleState::Stopped => return false,
            LifecycleState::Paused => {
                debug!("poller paused");
                if state.changed().await.is_err() {
                    return false;
                }
            }
        }
    }
}
