use super::TimelineSource;
use crate::config::Config;
use crate::message::{Cursor, Message, MessageId};
use crate::parser::{parse_search_results, parse_timeline};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const CLIENT_NAME: &str = "termfeed";
const CLIENT_URL: &str = "https://github.com/muk2/termfeed";

/// Timeline source backed by the remote service's JSON API.
pub struct HttpTimelineSource {
    api_base: String,
    search_base: String,
    user_name: String,
    password: String,
    client: reqwest::Client,
}

impl HttpTimelineSource {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(format!("{} {}", CLIENT_NAME, CLIENT_URL))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            search_base: config.search_base.trim_end_matches('/').to_string(),
            user_name: config.user_name.clone(),
            password: config.password.clone(),
            client,
        }
    }

    fn friends_timeline_url(&self, cursor: Cursor) -> String {
        match cursor.get() {
            Some(since_id) => format!(
                "{}/statuses/friends_timeline.json?since_id={}",
                self.api_base, since_id
            ),
            None => format!("{}/statuses/friends_timeline.json", self.api_base),
        }
    }

    fn user_timeline_url(&self, handle: &str) -> String {
        format!(
            "{}/statuses/user_timeline/{}.json",
            self.api_base,
            urlencoding::encode(handle)
        )
    }

    fn show_url(&self, id: MessageId) -> String {
        format!("{}/statuses/show/{}.json", self.api_base, id)
    }

    fn replies_url(&self) -> String {
        format!("{}/statuses/replies.json", self.api_base)
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search.json?q={}",
            self.search_base,
            urlencoding::encode(query)
        )
    }

    fn update_url(&self) -> String {
        format!("{}/statuses/update.xml", self.api_base)
    }

    async fn get_body(&self, url: &str, authenticated: bool) -> Result<String> {
        debug!(%url, "GET");
        let mut request = self.client.get(url);
        if authenticated {
            request = request.basic_auth(&self.user_name, Some(&self.password));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("timeline API error: {}", response.status()));
        }

        Ok(response.text().await?)
    }

    async fn get_timeline(&self, url: &str) -> Result<Vec<Message>> {
        let body = self.get_body(url, true).await?;
        parse_timeline(&body)
    }
}

#[async_trait]
impl TimelineSource for HttpTimelineSource {
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Message>> {
        self.get_timeline(&self.friends_timeline_url(cursor)).await
    }

    async fn post_message(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.update_url())
            .basic_auth(&self.user_name, Some(&self.password))
            .header("X-Twitter-Client", CLIENT_NAME)
            .header("X-Twitter-Client-URL", CLIENT_URL)
            .header("X-Twitter-Client-Version", env!("CARGO_PKG_VERSION"))
            .form(&[("status", text)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("update failed: {}", response.status()));
        }
        Ok(())
    }

    async fn fetch_user_timeline(&self, handle: &str) -> Result<Vec<Message>> {
        self.get_timeline(&self.user_timeline_url(handle)).await
    }

    async fn fetch_by_id(&self, id: MessageId) -> Result<Vec<Message>> {
        self.get_timeline(&self.show_url(id)).await
    }

    async fn fetch_replies(&self) -> Result<Vec<Message>> {
        self.get_timeline(&self.replies_url()).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Message>> {
        let body = self.get_body(&self.search_url(query), false).await?;
        parse_search_results(&body)
    }
}
