//! REST client for the messaging service.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ChatBackend;
use super::model::{
    self, Channel, ChannelId, Guild, GuildId, Message, MessageReference, Profile, User, UserId,
};

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_reference: Option<&'a MessageReference>,
}

pub struct HttpBackend {
    client: Client,
    base: String,
    token: String,
}

impl HttpBackend {
    pub fn new(base: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).header(AUTHORIZATION, &self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).header(AUTHORIZATION, &self.token)
    }

    async fn send_json<T: DeserializeOwned>(&self, what: &str, request: RequestBuilder) -> Result<T> {
        debug!("{what} request");
        let resp = request
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("Failed to read {what} response"))?;
        debug!(%status, bytes = body.len(), "{what} response");
        if !status.is_success() {
            bail!("{what} failed with {status}: {}", truncate(&body, 200));
        }
        serde_json::from_str(&body).with_context(|| format!("Invalid {what} response"))
    }

    pub async fn guilds(&self) -> Result<Vec<Guild>> {
        self.send_json("list servers", self.get("/users/@me/guilds")).await
    }

    pub async fn guild_channels(&self, guild: &GuildId) -> Result<Vec<Channel>> {
        self.send_json("list channels", self.get(&format!("/guilds/{guild}/channels")))
            .await
    }

    pub async fn direct_channels(&self) -> Result<Vec<Channel>> {
        self.send_json("list direct messages", self.get("/users/@me/channels"))
            .await
    }

    /// The account the token belongs to.
    pub async fn current_user(&self) -> Result<User> {
        self.send_json("get user info", self.get("/users/@me")).await
    }

    pub async fn profile(&self, user: &UserId) -> Result<Profile> {
        self.send_json("get user profile", self.get(&format!("/users/{user}/profile")))
            .await
    }
}

impl ChatBackend for HttpBackend {
    async fn fetch_messages(&self, channel: &ChannelId, limit: usize) -> Result<Vec<Message>> {
        let request = self.get(&format!("/channels/{channel}/messages?limit={limit}"));
        let page: Vec<serde_json::Value> = self.send_json("get messages", request).await?;
        Ok(model::decode_page(page))
    }

    async fn send_message(
        &self,
        channel: &ChannelId,
        content: &str,
        reply: Option<&MessageReference>,
    ) -> Result<Message> {
        let body = OutgoingMessage {
            content,
            message_reference: reply,
        };
        let request = self
            .post(&format!("/channels/{channel}/messages"))
            .json(&body);
        self.send_json("send message", request).await
    }

    async fn notify_typing(&self, channel: &ChannelId) -> Result<()> {
        debug!("typing request");
        let resp = self
            .post(&format!("/channels/{channel}/typing"))
            .send()
            .await
            .context("typing request failed")?;
        if !resp.status().is_success() {
            bail!("typing failed with {}", resp.status());
        }
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
