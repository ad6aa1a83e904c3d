pub mod http;

use crate::message::{Cursor, Message, MessageId};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to the timeline collaborator, passed to every hook and command.
pub type SourceHandle = Arc<dyn TimelineSource>;

/// Fetch/post operations against the remote feed.
///
/// Every fetch returns messages newest first.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Messages newer than `cursor`; an unset cursor means the most recent page.
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Message>>;

    async fn post_message(&self, text: &str) -> Result<()>;

    async fn fetch_user_timeline(&self, handle: &str) -> Result<Vec<Message>>;

    async fn fetch_by_id(&self, id: MessageId) -> Result<Vec<Message>>;

    async fn fetch_replies(&self) -> Result<Vec<Message>>;

    async fn search(&self, query: &str) -> Result<Vec<Message>>;
}
