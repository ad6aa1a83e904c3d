use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Running,
    Paused,
    Stopped,
}

impl LifecycleState {
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Shared pause/resume/terminate switch for the poller and the input loop.
///
/// Cloning yields another handle onto the same state, so command handlers can
/// hold one. Tasks observe changes through [`Controller::subscribe`].
#[derive(Clone)]
pub struct Controller {
    state: Arc<watch::Sender<LifecycleState>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Running);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// `Running -> Paused`. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Paused)
    }

    /// `Paused -> Running`, waking a suspended poller. Returns whether the
    /// state changed.
    pub fn resume(&self) -> bool {
        self.transition(LifecycleState::Paused, LifecycleState::Running)
    }

    /// Move to `Stopped` from any state. Both tasks unblock and exit.
    pub fn terminate(&self) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_stopped() {
                return false;
            }
            *state = LifecycleState::Stopped;
            true
        });
        if changed {
            info!("terminating");
        }
    }

    /// Resolves once the state reaches `Stopped`.
    pub async fn stopped(&self) {
        wait_stopped(&mut self.subscribe()).await;
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state != from {
                return false;
            }
            *state = to;
            true
        });
        if changed {
            info!(%from, %to, "lifecycle transition");
        }
        changed
    }
}

/// Wait on a lifecycle receiver until it reports `Stopped`. A dropped
/// controller counts as stopped.
pub async fn wait_stopped(state: &mut watch::Receiver<LifecycleState>) {
    let _ = state.wait_for(|state| state.is_stopped()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_running() {
        assert_eq!(Controller::new().state(), LifecycleState::Running);
    }

    #[test]
    fn test_pause_resume_transitions() {
        let controller = Controller::new();
        assert!(controller.pause());
        assert_eq!(controller.state(), LifecycleState::Paused);
        assert!(!controller.pause());

        assert!(controller.resume());
        assert_eq!(controller.state(), LifecycleState::Running);
        assert!(!controller.resume());
    }

    #[test]
    fn test_terminate_is_final() {
        let controller = Controller::new();
        controller.pause();
        controller.terminate();
        assert_eq!(controller.state(), LifecycleState::Stopped);
        assert!(!controller.resume());
        assert!(!controller.pause());
        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[test]
    fn test_clones_share_state() {
        let controller = Controller::new();
        let handle = controller.clone();
        handle.pause();
        assert_eq!(controller.state(), LifecycleState::Paused);
    }

    #[tokio::test]
    async fn test_stopped_wakes_waiters() {
        let controller = Controller::new();
        let waiter = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.stopped().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        controller.terminate();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
