// Path: crates/clients/src/forum.rs
//! Discord REST adapter for forum channels.

use crate::{build_client, check_status};
use async_trait::async_trait;
use bridge_api::ForumApi;
use bridge_types::error::BridgeError;
use bridge_types::forum::{CreatedThread, ForumChannel, NewThread};
use reqwest::{header, Client, Method};
use serde_json::{json, Value as JsonValue};

const SERVICE: &str = "forum";

/// Discord requires bots to identify themselves with this User-Agent shape.
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/mega-dao/forum-bridge, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Talks to the Discord REST API with a bot token.
#[derive(Clone)]
pub struct DiscordForum {
    api_base: String,
    bot_token: String,
    client: Client,
}

impl DiscordForum {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Result<Self, BridgeError> {
        let client = build_client(SERVICE, Client::builder().user_agent(USER_AGENT))?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            client,
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> Result<reqwest::Response, BridgeError> {
        let url = format!("{}/{}", self.api_base, path);
        let mut req = self
            .client
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.bot_token));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("{method} {path}: {e}")))?;
        check_status(SERVICE, &format!("{method} {path}"), resp).await
    }
}

/// JSON body for `POST channels/{id}/threads` on a forum channel.
pub(crate) fn thread_body(thread: &NewThread) -> JsonValue {
    json!({
        "name": thread.name,
        "auto_archive_duration": thread.auto_archive_minutes,
        "message": { "content": thread.content },
        "applied_tags": thread.applied_tags,
    })
}

#[async_trait]
impl ForumApi for DiscordForum {
    async fn get_channel(&self, channel_id: &str) -> Result<ForumChannel, BridgeError> {
        let resp = self
            .request(Method::GET, &format!("channels/{channel_id}"), None)
            .await?;
        resp.json::<ForumChannel>()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("decode channel {channel_id}: {e}")))
    }

    async fn create_thread(
        &self,
        channel_id: &str,
        thread: NewThread,
    ) -> Result<CreatedThread, BridgeError> {
        let resp = self
            .request(
                Method::POST,
                &format!("channels/{channel_id}/threads"),
                Some(thread_body(&thread)),
            )
            .await?;
        let created = resp
            .json::<CreatedThread>()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("decode created thread: {e}")))?;
        tracing::debug!(target: "forum", thread_id = %created.id, name = %thread.name, "thread created");
        Ok(created)
    }

    async fn update_thread_tags(
        &self,
        thread_id: &str,
        tag_ids: Vec<String>,
    ) -> Result<(), BridgeError> {
        self.request(
            Method::PATCH,
            &format!("channels/{thread_id}"),
            Some(json!({ "applied_tags": tag_ids })),
        )
        .await?;
        Ok(())
    }
}
