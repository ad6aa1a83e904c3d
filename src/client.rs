use crate::input::{stdin_lines, InputLoop};
use crate::lifecycle::Controller;
use crate::poller::Poller;
use crate::registry::Registry;
use crate::source::SourceHandle;
use crate::terminal::TerminalGuard;
use anyhow::Result;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One interactive session: a poller and an input loop sharing a registry,
/// a source, and a lifecycle controller.
///
/// Register hooks and commands through [`Client::registry`] before calling
/// [`Client::run`]; hand clones of [`Client::controller`] to command handlers
/// that need to pause, resume, or exit.
pub struct Client {
    registry: Arc<Registry>,
    source: SourceHandle,
    controller: Controller,
    interval: Duration,
}

impl Client {
    pub fn new(source: SourceHandle, interval: Duration) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            source,
            controller: Controller::new(),
            interval,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn source(&self) -> &SourceHandle {
        &self.source
    }

    /// Run against stdin/stdout until end of input, `exit`, or an interrupt.
    /// The terminal is restored before an interrupt terminates, and again when
    /// the session ends.
    pub async fn run(self) -> Result<()> {
        let guard = TerminalGuard::capture();
        let interrupts = tokio::spawn(watch_interrupts(
            wait_for_interrupt(),
            move || guard.restore(),
            self.controller.clone(),
        ));

        let result = self.run_with(stdin_lines(), io::stdout()).await;
        interrupts.abort();
        if let Err(e) = guard.restore() {
            warn!("failed to restore terminal: {}", e);
        }
        result.map(|_| ())
    }

    /// Start the poller and the input loop, wait for the input loop to end,
    /// then stop the poller. Returns the input loop's writer.
    pub async fn run_with<W>(self, lines: mpsc::Receiver<String>, out: W) -> Result<W>
    where
        W: Write + Send + 'static,
    {
        let poller = Poller::new(
            Arc::clone(&self.source),
            Arc::clone(&self.registry),
            &self.controller,
            self.interval,
        );
        let input = InputLoop::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.source),
            &self.controller,
            lines,
            out,
        );

        let poll_task = tokio::spawn(poller.run());
        let input_task = tokio::spawn(input.run());

        let out = input_task.await;
        self.controller.terminate();
        poll_task.await?;
        Ok(out?)
    }
}

/// On `interrupt`, restore the terminal and then terminate. Returns quietly
/// if the controller stops first.
pub async fn watch_interrupts<I, R>(interrupt: I, restore: R, controller: Controller)
where
    I: Future<Output = ()>,
    R: FnOnce() -> io::Result<()>,
{
    tokio::select! {
        _ = interrupt => {
            info!("interrupted");
            if let Err(e) = restore() {
                warn!("failed to restore terminal: {}", e);
            }
            controller.terminate();
        }
        _ = controller.stopped() => {}
    }
}

async fn wait_for_interrupt() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => warn!("failed to install SIGTERM handler: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for interrupts: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleState;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_interrupt_restores_terminal_then_terminates() {
        let controller = Controller::new();
        let (fire, interrupted) = oneshot::channel::<()>();
        let seen = Arc::new(Mutex::new(None));
        let restore_seen = Arc::clone(&seen);
        let observed = controller.clone();

        let watcher = tokio::spawn(watch_interrupts(
            async move {
                let _ = interrupted.await;
            },
            move || {
                *restore_seen.lock() = Some(observed.state());
                Ok(())
            },
            controller.clone(),
        ));
        fire.send(()).unwrap();
        watcher.await.unwrap();

        assert_eq!(*seen.lock(), Some(LifecycleState::Running));
        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_restore_still_terminates() {
        let controller = Controller::new();
        watch_interrupts(
            async {},
            || Err(io::Error::other("no tty")),
            controller.clone(),
        )
        .await;

        assert_eq!(controller.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn test_watcher_exits_when_controller_stops_first() {
        let controller = Controller::new();
        let restored = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&restored);

        let watcher = tokio::spawn(watch_interrupts(
            std::future::pending::<()>(),
            move || {
                *flag.lock() = true;
                Ok(())
            },
            controller.clone(),
        ));
        tokio::task::yield_now().await;
        controller.terminate();

        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(!*restored.lock());
    }
}
