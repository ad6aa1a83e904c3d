use chrono::{DateTime, Utc};
use std::fmt;

/// Identifier of a single timeline message as assigned by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Bookmark of the highest message id seen by the poller.
///
/// Starts unset; an unset cursor asks the source for its most recent page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(Option<MessageId>);

impl Cursor {
    pub fn unset() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<MessageId> {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }

    /// Moves the cursor forward to `id`. Never rewinds: an older id is ignored.
    pub fn advance(&mut self, id: MessageId) {
        match self.0 {
            Some(current) if current >= id => {}
            _ => self.0 = Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub truncated: bool,
    pub in_reply_to_message_id: Option<MessageId>,
    pub in_reply_to_author_id: Option<u64>,
    pub author_id: Option<u64>,
    pub author_name: Option<String>,
    pub author_handle: String,
    pub author_url: Option<String>,
    pub author_avatar_url: Option<String>,
}

/// Why a batch of messages was handed to the hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    UpdateFriendsTimeline,
    Search,
    Show,
    Replies,
    ListUserTimeline,
}

impl EventTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateFriendsTimeline => "update_friends_timeline",
            Self::Search => "search",
            Self::Show => "show",
            Self::Replies => "replies",
            Self::ListUserTimeline => "list_user_timeline",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
