use crate::lifecycle::Controller;
use crate::message::{EventTag, Message, MessageId};
use crate::registry::{CommandMatch, Registry};
use crate::source::SourceHandle;
use crate::terminal::line_ending;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Weak};
use tracing::info;

pub const HELP: &str = "\
update <text>, u <text>   post a message
list <handle>, l <handle> show a user's timeline
search <query>, s <query> search messages
show <id>                 show a single message
replies, r                show replies to you
pause                     stop polling the timeline
resume                    resume polling
exit, e                   quit
help                      show this help";

/// Register the standard command set. Text replies such as `help` go to `out`.
///
/// Commands that fetch route their results through the registry's hooks with
/// the matching [`EventTag`]. They hold the registry weakly so the registry
/// does not keep itself alive.
pub fn register_defaults<W>(
    registry: &Arc<Registry>,
    controller: &Controller,
    out: W,
) -> Result<()>
where
    W: Write + Send + 'static,
{
    registry.add_command(r"^(?:update|u)\s+(?P<text>.+)$", |matched, source| async move {
        let text = capture(&matched, "text")?;
        source.post_message(text).await?;
        info!("posted message");
        Ok(())
    })?;

    add_fetch_command(
        registry,
        r"^(?:list|l)\s+(?P<handle>\S+)\s*$",
        EventTag::ListUserTimeline,
        |matched, source| async move {
            source
                .fetch_user_timeline(capture(&matched, "handle")?)
                .await
        },
    )?;

    add_fetch_command(
        registry,
        r"^(?:search|s)\s+(?P<query>.+)$",
        EventTag::Search,
        |matched, source| async move { source.search(capture(&matched, "query")?).await },
    )?;

    add_fetch_command(
        registry,
        r"^show\s+(?P<id>\d+)\s*$",
        EventTag::Show,
        |matched, source| async move {
            let raw = capture(&matched, "id")?;
            let id: u64 = raw
                .parse()
                .with_context(|| format!("invalid message id {}", raw))?;
            source.fetch_by_id(MessageId(id)).await
        },
    )?;

    add_fetch_command(
        registry,
        r"^(?:replies|r)\s*$",
        EventTag::Replies,
        |_matched, source| async move { source.fetch_replies().await },
    )?;

    let pause = controller.clone();
    registry.add_command(r"^pause\s*$", move |_matched, _source| {
        let changed = pause.pause();
        async move {
            if !changed {
                info!("pause ignored: not running");
            }
            Ok(())
        }
    })?;

    let resume = controller.clone();
    registry.add_command(r"^resume\s*$", move |_matched, _source| {
        let changed = resume.resume();
        async move {
            if !changed {
                info!("resume ignored: not paused");
            }
            Ok(())
        }
    })?;

    let exit = controller.clone();
    registry.add_command(r"^(?:exit|e)\s*$", move |_matched, _source| {
        exit.terminate();
        async { Ok(()) }
    })?;

    let out = Arc::new(Mutex::new(out));
    registry.add_command(r"^help\s*$", move |_matched, _source| {
        let written = print_help(&mut *out.lock());
        async move { Ok(written?) }
    })?;

    Ok(())
}

fn add_fetch_command<F, Fut>(
    registry: &Arc<Registry>,
    pattern: &str,
    event: EventTag,
    fetch: F,
) -> Result<()>
where
    F: Fn(CommandMatch, SourceHandle) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Message>>> + Send + 'static,
{
    let hooks: Weak<Registry> = Arc::downgrade(registry);
    registry.add_command(pattern, move |matched, source| {
        let hooks = hooks.clone();
        let fetched = fetch(matched, Arc::clone(&source));
        async move {
            let messages = fetched.await?;
            if let Some(registry) = hooks.upgrade() {
                registry.dispatch_hooks(&messages, event, &source).await;
            }
            Ok(())
        }
    })?;
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    let newline = line_ending();
    for line in HELP.lines() {
        write!(out, "{}{}", line, newline)?;
    }
    out.flush()
}

fn capture<'a>(matched: &'a CommandMatch, name: &str) -> Result<&'a str> {
    matched
        .name(name)
        .with_context(|| format!("missing {} in {:?}", name, matched.input()))
}
