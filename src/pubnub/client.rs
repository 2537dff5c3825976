use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use pubnub::subscribe::{EventEmitter, EventSubscriber, SubscriptionParams};
use pubnub::{Keyset, PubNubClientBuilder};
use serde_json::Value;
use tracing::debug;

use crate::errors::PluginError;

/// Keys and client instance id used to open a subscription.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscribeKeys {
    pub publish_key: String,
    pub subscribe_key: String,
    pub uuid: String,
}

impl std::fmt::Debug for SubscribeKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribeKeys")
            .field("publish_key", &"<redacted>")
            .field("subscribe_key", &self.subscribe_key)
            .field("uuid", &self.uuid)
            .finish()
    }
}

/// One message as delivered by the subscription client.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub message: Value,
    pub channel: String,
    pub subscription: String,
    pub publisher: String,
    pub time_token: String,
}

/// The PubNub client seam. Ordering, retries and delivery guarantees are
/// whatever the implementation provides; the trigger adds none.
#[async_trait]
pub trait SubscriptionClient: Send + Sync {
    async fn subscribe(
        &self,
        keys: &SubscribeKeys,
        channels: &[String],
    ) -> Result<BoxStream<'static, MessageEvent>, PluginError>;
}

/// `SubscriptionClient` backed by the PubNub SDK.
///
/// Every call to `subscribe` builds its own SDK client from the keys; the
/// returned stream owns the client and the subscription, so dropping the
/// stream ends the subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct PubNubClient;

#[async_trait]
impl SubscriptionClient for PubNubClient {
    async fn subscribe(
        &self,
        keys: &SubscribeKeys,
        channels: &[String],
    ) -> Result<BoxStream<'static, MessageEvent>, PluginError> {
        let client = PubNubClientBuilder::with_reqwest_transport()
            .with_keyset(Keyset {
                subscribe_key: keys.subscribe_key.clone(),
                publish_key: Some(keys.publish_key.clone()),
                secret_key: None,
            })
            .with_user_id(keys.uuid.clone())
            .build()
            .map_err(|e| PluginError::SubscribeError(format!("pubnub client: {e}")))?;

        let subscription = client.subscription(SubscriptionParams {
            channels: Some(channels),
            channel_groups: None,
            options: None,
        });
        subscription.subscribe();
        debug!("pubnub subscription opened for {:?}", channels);

        let messages = subscription.messages_stream();
        let events = messages.map(move |message| {
            // The stream keeps the client and subscription alive.
            let _owned = (&client, &subscription);
            message_event(
                message.channel,
                message.subscription,
                message.sender,
                message.timestamp,
                &message.data,
            )
        });
        Ok(events.boxed())
    }
}

/// Builds a `MessageEvent` from the fields of an SDK message.
#[must_use]
pub fn message_event(
    channel: String,
    subscription: String,
    sender: Option<String>,
    timetoken: impl std::fmt::Display,
    data: &[u8],
) -> MessageEvent {
    MessageEvent {
        message: decode_payload(data),
        channel,
        subscription,
        publisher: sender.unwrap_or_default(),
        time_token: timetoken.to_string(),
    }
}

/// Message payloads are JSON; anything else is passed on as text.
#[must_use]
pub fn decode_payload(data: &[u8]) -> Value {
    serde_json::from_slice(data)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(data).into_owned()))
}
