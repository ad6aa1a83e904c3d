use crate::error::ShellError;
use crate::message::{EventTag, Message};
use crate::source::SourceHandle;
use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use regex::{Captures, Regex};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

type HookFn =
    dyn Fn(Vec<Message>, EventTag, SourceHandle) -> BoxFuture<'static, Result<()>> + Send + Sync;
type HandlerFn = dyn Fn(CommandMatch, SourceHandle) -> BoxFuture<'static, Result<()>> + Send + Sync;

struct CommandEntry {
    pattern: Regex,
    handler: Arc<HandlerFn>,
}

/// Successful match of a command pattern against an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    input: String,
    groups: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl CommandMatch {
    fn from_captures(pattern: &Regex, input: &str, captures: &Captures<'_>) -> Self {
        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let named = pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();

        Self {
            input: input.to_string(),
            groups,
            named,
        }
    }

    /// The full operator line the pattern was evaluated against.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The substring matched by the whole pattern.
    pub fn matched(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Positional capture group; 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|group| group.as_deref())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Number of groups including the whole match.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Hooks and commands in registration order.
///
/// Dispatch snapshots the entries and calls them with the lock released, so a
/// handler may register or clear entries; the change applies to the next
/// dispatch.
#[derive(Default)]
pub struct Registry {
    hooks: RwLock<Vec<Arc<HookFn>>>,
    commands: RwLock<Vec<Arc<CommandEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. Duplicates are allowed and each copy fires.
    pub fn add_hook<F, Fut>(&self, hook: F)
    where
        F: Fn(Vec<Message>, EventTag, SourceHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let hook: Arc<HookFn> = Arc::new(
            move |messages: Vec<Message>, event: EventTag, source: SourceHandle| {
                hook(messages, event, source).boxed()
            },
        );
        self.hooks.write().push(hook);
    }

    pub fn clear_hooks(&self) {
        self.hooks.write().clear();
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    /// Append a command matched against whole input lines. Later entries never
    /// shadow earlier ones: every matching command fires.
    pub fn add_command<F, Fut>(&self, pattern: &str, handler: F) -> Result<(), regex::Error>
    where
        F: Fn(CommandMatch, SourceHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let pattern = Regex::new(pattern)?;
        let handler: Arc<HandlerFn> = Arc::new(move |matched: CommandMatch, source: SourceHandle| {
            handler(matched, source).boxed()
        });
        self.commands
            .write()
            .push(Arc::new(CommandEntry { pattern, handler }));
        Ok(())
    }

    pub fn clear_commands(&self) {
        self.commands.write().clear();
    }

    pub fn command_count(&self) -> usize {
        self.commands.read().len()
    }

    /// Invoke every hook in registration order, each with its own copy of
    /// `messages`. A hook that errors or panics is logged and skipped over.
    /// Returns how many hooks were invoked.
    pub async fn dispatch_hooks(
        &self,
        messages: &[Message],
        event: EventTag,
        source: &SourceHandle,
    ) -> usize {
        let hooks: Vec<Arc<HookFn>> = self.hooks.read().clone();
        debug!(%event, hooks = hooks.len(), messages = messages.len(), "dispatching hooks");

        for (index, hook) in hooks.iter().enumerate() {
            let call = async { hook(messages.to_vec(), event, Arc::clone(source)).await };
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(hook = index, %event, "hook failed: {:#}", e),
                Err(panic) => error!(
                    hook = index,
                    %event,
                    "hook panicked: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }

        hooks.len()
    }

    /// Run every command whose pattern matches `text`.
    ///
    /// Empty input is a no-op. Handler faults are logged and do not stop the
    /// remaining commands. Returns the number of matched commands, or
    /// [`ShellError::CommandNotFound`] when nothing matched.
    pub async fn dispatch_command(
        &self,
        text: &str,
        source: &SourceHandle,
    ) -> Result<usize, ShellError> {
        if text.is_empty() {
            return Ok(0);
        }

        let commands: Vec<Arc<CommandEntry>> = self.commands.read().clone();
        let mut matched = 0;

        for entry in &commands {
            let command_match = match entry.pattern.captures(text) {
                Some(captures) => CommandMatch::from_captures(&entry.pattern, text, &captures),
                None => continue,
            };
            matched += 1;

            let call = async { (entry.handler)(command_match, Arc::clone(source)).await };
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(pattern = %entry.pattern, "command failed: {:#}", e),
                Err(panic) => error!(
                    pattern = %entry.pattern,
                    "command panicked: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }

        if matched == 0 {
            return Err(ShellError::CommandNotFound(text.to_string()));
        }
        Ok(matched)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
