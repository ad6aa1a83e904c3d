use crate::message::{EventTag, Message};
use crate::registry::Registry;
use crate::terminal::line_ending;
use chrono::{Local, TimeZone};
use std::fmt::Display;
use std::io::{self, Write};

/// Register the stdout printer: every batch is printed oldest first.
pub fn register_defaults(registry: &Registry) {
    registry.add_hook(|messages: Vec<Message>, event, _source| async move {
        let newline = line_ending();
        let mut stdout = io::stdout().lock();
        for line in render_batch(&messages, event, &Local) {
            write!(stdout, "{}{}", line, newline)?;
        }
        stdout.flush()?;
        Ok(())
    });
}

pub fn render_batch<Tz>(messages: &[Message], event: EventTag, tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = Vec::with_capacity(messages.len() + 1);
    if event != EventTag::UpdateFriendsTimeline && messages.is_empty() {
        lines.push(format!("({}: nothing found)", event));
    }
    lines.extend(messages.iter().rev().map(|message| render_line(message, tz)));
    lines
}

pub fn render_line<Tz>(message: &Message, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = message.created_at.with_timezone(tz).format("%H:%M:%S");
    format!("[{}] {}: {}", time, message.author_handle, message.text)
}
