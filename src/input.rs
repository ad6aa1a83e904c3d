use crate::editor::forward_edited_lines;
use crate::error::ShellError;
use crate::lifecycle::{wait_stopped, Controller, LifecycleState};
use crate::registry::Registry;
use crate::source::SourceHandle;
use crate::terminal::line_ending;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

const LINE_BUFFER: usize = 16;

/// Read stdin on a dedicated thread, one line per message. A terminal gets the
/// line editor; piped input is read as raw lines. The channel closes at end of
/// input.
///
/// The thread is detached: a blocking read can't be cancelled, so it is left
/// behind when the client stops.
pub fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = std::thread::Builder::new()
        .name("termfeed-stdin".to_string())
        .spawn(move || {
            if io::stdin().is_terminal() {
                if let Err(e) = forward_edited_lines(&tx) {
                    warn!("line editor failed: {}", e);
                }
            } else {
                forward_lines(io::stdin().lock(), &tx);
            }
        });
    if let Err(e) = spawned {
        warn!("failed to spawn stdin reader: {}", e);
    }
    rx
}

/// Forward each line of `reader` until end of input, a hard read error, or
/// the receiver going away. Bytes that are not UTF-8 are replaced rather than
/// ending the stream.
pub fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("stdin read failed: {}", e);
                break;
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.blocking_send(line).is_err() {
            break;
        }
    }
}

/// Feeds operator lines into the command registry until end of input or
/// until the controller stops.
pub struct InputLoop<W> {
    registry: Arc<Registry>,
    source: SourceHandle,
    state: watch::Receiver<LifecycleState>,
    lines: mpsc::Receiver<String>,
    out: W,
}

impl<W: Write + Send> InputLoop<W> {
    pub fn new(
        registry: Arc<Registry>,
        source: SourceHandle,
        controller: &Controller,
        lines: mpsc::Receiver<String>,
        out: W,
    ) -> Self {
        Self {
            registry,
            source,
            state: controller.subscribe(),
            lines,
            out,
        }
    }

    /// Returns the output writer once the loop ends.
    pub async fn run(mut self) -> W {
        loop {
            let line = tokio::select! {
                biased;
                _ = wait_stopped(&mut self.state) => break,
                line = self.lines.recv() => line,
            };
            let Some(line) = line else {
                debug!("end of input");
                break;
            };
            let line = line.trim_end_matches(['\r', '\n']);

            let dispatched = tokio::select! {
                biased;
                _ = wait_stopped(&mut self.state) => break,
                dispatched = self.registry.dispatch_command(line, &self.source) => dispatched,
            };
            match dispatched {
                Ok(matched) => debug!(matched, "command dispatched"),
                Err(ShellError::CommandNotFound(text)) => self.report_unknown(&text),
            }
        }
        self.out
    }

    fn report_unknown(&mut self, text: &str) {
        let newline = line_ending();
        let written = write!(self.out, "Unknown command \"{}\"{}", text, newline)
            .and_then(|_| write!(self.out, "Enter \"help\" for instructions{}", newline))
            .and_then(|_| self.out.flush());
        if let Err(e) = written {
            warn!("failed to report unknown command: {}", e);
        }
    }
}
