use crate::message::{Cursor, Message, MessageId};
use crate::source::TimelineSource;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

pub(crate) fn message(id: u64, text: &str) -> Message {
    Message {
        id: MessageId(id),
        text: text.to_string(),
        created_at: Utc.with_ymd_and_hms(2008, 3, 8, 12, 0, 0).unwrap(),
        truncated: false,
        in_reply_to_message_id: None,
        in_reply_to_author_id: None,
        author_id: None,
        author_name: None,
        author_handle: "jugyo".to_string(),
        author_url: None,
        author_avatar_url: None,
    }
}

/// In-memory source that replays queued friends-timeline results in order and
/// then returns empty pages.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<Message>>>>,
    cursors: Mutex<Vec<Cursor>>,
    posted: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn new(batches: Vec<Vec<Message>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn push_failure(&self, reason: &str) {
        self.batches
            .lock()
            .push_back(Err(anyhow::anyhow!(reason.to_string())));
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.cursors.lock().len()
    }

    pub(crate) fn cursors(&self) -> Vec<Cursor> {
        self.cursors.lock().clone()
    }

    pub(crate) fn posted(&self) -> Vec<String> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl TimelineSource for ScriptedSource {
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Message>> {
        self.cursors.lock().push(cursor);
        self.batches.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn post_message(&self, text: &str) -> Result<()> {
        self.posted.lock().push(text.to_string());
        Ok(())
    }

    async fn fetch_user_timeline(&self, handle: &str) -> Result<Vec<Message>> {
        Ok(vec![message(100, &format!("by {}", handle))])
    }

    async fn fetch_by_id(&self, id: MessageId) -> Result<Vec<Message>> {
        Ok(vec![message(id.0, "shown")])
    }

    async fn fetch_replies(&self) -> Result<Vec<Message>> {
        Ok(vec![message(200, "@jugyo hi"), message(199, "@jugyo yo")])
    }

    async fn search(&self, query: &str) -> Result<Vec<Message>> {
        if query == "fail" {
            anyhow::bail!("search unavailable");
        }
        Ok(vec![message(300, &format!("about {}", query))])
    }
}

/// Cloneable writer whose contents can be read back after it was handed off.
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
