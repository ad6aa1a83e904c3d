use crate::message::{Message, MessageId};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

const TIMELINE_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const SEARCH_TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawStatus>),
    One(Box<RawStatus>),
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    id: u64,
    text: String,
    created_at: String,
    #[serde(default)]
    truncated: bool,
    in_reply_to_status_id: Option<u64>,
    in_reply_to_user_id: Option<u64>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: Option<u64>,
    name: Option<String>,
    screen_name: String,
    url: Option<String>,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearchPage {
    results: Vec<RawSearchResult>,
}

#[derive(Debug, Deserialize)]
struct RawSearchResult {
    id: u64,
    text: String,
    created_at: String,
    from_user: String,
    from_user_id: Option<u64>,
    profile_image_url: Option<String>,
}

impl RawStatus {
    fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: MessageId(self.id),
            created_at: parse_timestamp(&self.created_at, TIMELINE_TIME_FORMAT)?,
            text: self.text,
            truncated: self.truncated,
            in_reply_to_message_id: self.in_reply_to_status_id.map(MessageId),
            in_reply_to_author_id: self.in_reply_to_user_id,
            author_id: self.user.id,
            author_name: self.user.name,
            author_handle: self.user.screen_name,
            author_url: self.user.url,
            author_avatar_url: self.user.profile_image_url,
        })
    }
}

impl RawSearchResult {
    fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: MessageId(self.id),
            created_at: parse_timestamp(&self.created_at, SEARCH_TIME_FORMAT)?,
            text: self.text,
            truncated: false,
            in_reply_to_message_id: None,
            in_reply_to_author_id: None,
            author_id: self.from_user_id,
            author_name: None,
            author_handle: self.from_user,
            author_url: None,
            author_avatar_url: self.profile_image_url,
        })
    }
}

fn parse_timestamp(raw: &str, format: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_str(raw.trim(), format)
        .with_context(|| format!("invalid timestamp {:?}", raw))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Parse a timeline response body. A single status object (as returned by
/// the show endpoint) becomes a one-element sequence.
pub fn parse_timeline(body: &str) -> Result<Vec<Message>> {
    let raw: OneOrMany = serde_json::from_str(body).context("malformed timeline response")?;
    match raw {
        OneOrMany::Many(statuses) => statuses.into_iter().map(RawStatus::into_message).collect(),
        OneOrMany::One(status) => Ok(vec![status.into_message()?]),
    }
}

/// Parse a search response body (`{"results": [...]}`).
pub fn parse_search_results(body: &str) -> Result<Vec<Message>> {
    let page: RawSearchPage = serde_json::from_str(body).context("malformed search response")?;
    page.results
        .into_iter()
        .map(RawSearchResult::into_message)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const STATUS: &str = r#"{
        "id": 42,
        "text": "hello world",
        "created_at": "Sat Mar 08 12:30:00 +0000 2008",
        "truncated": false,
        "in_reply_to_status_id": 40,
        "in_reply_to_user_id": 7,
        "user": {
            "id": 1,
            "name": "Jane",
            "screen_name": "jane",
            "url": "http://example.com",
            "profile_image_url": "http://example.com/jane.png"
        }
    }"#;

    #[test]
    fn test_parse_timeline_array() {
        let body = format!("[{}]", STATUS);
        let messages = parse_timeline(&body).unwrap();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.id, MessageId(42));
        assert_eq!(message.text, "hello world");
        assert_eq!(message.author_handle, "jane");
        assert_eq!(message.author_name.as_deref(), Some("Jane"));
        assert_eq!(message.in_reply_to_message_id, Some(MessageId(40)));
        assert_eq!(message.in_reply_to_author_id, Some(7));
        assert_eq!(
            message.created_at,
            Utc.with_ymd_and_hms(2008, 3, 8, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timeline_single_object() {
        let messages = parse_timeline(STATUS).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId(42));
    }

    #[test]
    fn test_parse_timeline_null_reply_fields() {
        let body = r#"[{"id": 3, "text": "t", "created_at": "Sat Mar 08 12:30:00 +0900 2008",
            "in_reply_to_status_id": null, "in_reply_to_user_id": null,
            "user": {"screen_name": "bob"}}]"#;
        let messages = parse_timeline(body).unwrap();
        assert_eq!(messages[0].in_reply_to_message_id, None);
        assert_eq!(messages[0].author_url, None);
        assert_eq!(
            messages[0].created_at,
            Utc.with_ymd_and_hms(2008, 3, 8, 3, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timeline_empty() {
        assert!(parse_timeline("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_timeline_bad_timestamp() {
        let body = r#"[{"id": 3, "text": "t", "created_at": "yesterday",
            "user": {"screen_name": "bob"}}]"#;
        assert!(parse_timeline(body).is_err());
    }

    #[test]
    fn test_parse_search_results() {
        let body = r#"{"results": [
            {"id": 10, "text": "rust", "created_at": "Sat, 08 Mar 2008 12:30:00 +0000", "from_user": "ann"}
        ]}"#;
        let messages = parse_search_results(body).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author_handle, "ann");
        assert_eq!(messages[0].text, "rust");
    }

    #[test]
    fn test_parse_search_malformed() {
        assert!(parse_search_results("{not json").is_err());
    }
}
