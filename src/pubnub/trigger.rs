use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::client::{MessageEvent, SubscribeKeys, SubscriptionClient};
use super::{HANDLER_SETTING_CHANNEL, SETTING_PUBLISH_KEY, SETTING_SUBSCRIBE_KEY, SETTING_UUID};
use crate::core::metadata::PluginMetadata;
use crate::errors::PluginError;

const TRIGGER_METADATA: &str = include_str!("trigger.json");

/// Trigger-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    pub publish_key: String,
    pub subscribe_key: String,
    pub uuid: Option<String>,
}

impl TriggerSettings {
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required setting is missing or not a string.
    pub fn from_config(
        metadata: &PluginMetadata,
        config: &Map<String, Value>,
    ) -> Result<Self, PluginError> {
        metadata.require_settings(config)?;
        Ok(Self {
            publish_key: setting_str(config, SETTING_PUBLISH_KEY).unwrap_or_default(),
            subscribe_key: setting_str(config, SETTING_SUBSCRIBE_KEY).unwrap_or_default(),
            uuid: setting_str(config, SETTING_UUID).filter(|u| !u.is_empty()),
        })
    }

    /// Keys for the subscription; a fresh client id is generated when none is configured.
    #[must_use]
    pub fn into_keys(self) -> SubscribeKeys {
        SubscribeKeys {
            publish_key: self.publish_key,
            subscribe_key: self.subscribe_key,
            uuid: self.uuid.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

/// Per-handler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    pub channel: String,
}

impl HandlerSettings {
    /// # Errors
    ///
    /// Returns a `ConfigError` if `channel` is missing or not a string.
    pub fn from_config(
        metadata: &PluginMetadata,
        config: &Map<String, Value>,
    ) -> Result<Self, PluginError> {
        metadata.require_handler_settings(config)?;
        Ok(Self {
            channel: setting_str(config, HANDLER_SETTING_CHANNEL).unwrap_or_default(),
        })
    }
}

fn setting_str(config: &Map<String, Value>, name: &str) -> Option<String> {
    config.get(name).and_then(Value::as_str).map(str::to_string)
}

/// The record handed to a handler for every delivered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOutput {
    pub message: Value,
    pub channel: String,
    pub subscription: String,
    pub publisher: String,
    pub time_token: String,
}

impl From<MessageEvent> for TriggerOutput {
    fn from(event: MessageEvent) -> Self {
        Self {
            message: event.message,
            channel: event.channel,
            subscription: event.subscription,
            publisher: event.publisher,
            time_token: event.time_token,
        }
    }
}

/// Engine-side handler registered for a channel.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(&self, output: TriggerOutput) -> Result<Value, PluginError>;
}

type Routes = HashMap<String, Vec<Arc<dyn TriggerHandler>>>;

/// Subscribes to every registered channel and forwards each delivered message
/// to the handlers registered for it.
pub struct SubscriberTrigger {
    metadata: PluginMetadata,
    keys: SubscribeKeys,
    handlers: Vec<(HandlerSettings, Arc<dyn TriggerHandler>)>,
}

impl SubscriberTrigger {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the trigger settings are invalid.
    pub fn new(config: &Map<String, Value>) -> Result<Self, PluginError> {
        let metadata = PluginMetadata::parse(TRIGGER_METADATA)?;
        let keys = TriggerSettings::from_config(&metadata, config)?.into_keys();
        Ok(Self {
            metadata,
            keys,
            handlers: Vec::new(),
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn keys(&self) -> &SubscribeKeys {
        &self.keys
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` if the handler settings are invalid.
    pub fn add_handler(
        &mut self,
        config: &Map<String, Value>,
        handler: Arc<dyn TriggerHandler>,
    ) -> Result<(), PluginError> {
        let settings = HandlerSettings::from_config(&self.metadata, config)?;
        info!("Registered handler for channel {}", settings.channel);
        self.handlers.push((settings, handler));
        Ok(())
    }

    /// Distinct channels in registration order.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::new();
        for (settings, _) in &self.handlers {
            if !channels.contains(&settings.channel) {
                channels.push(settings.channel.clone());
            }
        }
        channels
    }

    /// Opens one subscription covering every registered channel and spawns
    /// the dispatch loop.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if no handler is registered and a
    /// `SubscribeError` (or whatever the client reports) if subscribing fails.
    pub async fn start<C>(&self, client: &C) -> Result<TriggerHandle, PluginError>
    where
        C: SubscriptionClient + ?Sized,
    {
        let channels = self.channels();
        if channels.is_empty() {
            return Err(PluginError::ConfigError(
                "trigger has no handlers registered".to_string(),
            ));
        }

        let events = client.subscribe(&self.keys, &channels).await.map_err(|e| {
            error!("Failed to subscribe to {:?}: {}", channels, e);
            e
        })?;
        info!("Subscribed to {} channel(s)", channels.len());

        let mut routes: Routes = HashMap::new();
        for (settings, handler) in &self.handlers {
            routes
                .entry(settings.channel.clone())
                .or_default()
                .push(Arc::clone(handler));
        }

        let span = info_span!("pubnub_trigger", uuid = %self.keys.uuid);
        let task = tokio::spawn(dispatch(events, routes).instrument(span));
        Ok(TriggerHandle { task })
    }
}

async fn dispatch(mut events: BoxStream<'static, MessageEvent>, routes: Routes) {
    while let Some(event) = events.next().await {
        // Wildcard subscriptions deliver on a concrete channel; fall back to
        // the subscription pattern the handler was registered with.
        let handlers = routes
            .get(&event.channel)
            .or_else(|| routes.get(&event.subscription));
        let Some(handlers) = handlers else {
            warn!("Dropping message for unregistered channel {}", event.channel);
            continue;
        };

        let output = TriggerOutput::from(event);
        for handler in handlers {
            match handler.handle(output.clone()).await {
                Ok(reply) => debug!(channel = %output.channel, "handler replied {}", reply),
                Err(e) => error!(
                    channel = %output.channel,
                    time_token = %output.time_token,
                    "Trigger handler failed: {}",
                    e
                ),
            }
        }
    }
    info!("Subscription stream ended");
}

/// Running dispatch loop.
pub struct TriggerHandle {
    task: JoinHandle<()>,
}

impl TriggerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Waits for the subscription stream to end.
    ///
    /// # Errors
    ///
    /// Returns a `SubscribeError` if the dispatch task panicked or was stopped.
    pub async fn join(self) -> Result<(), PluginError> {
        self.task
            .await
            .map_err(|e| PluginError::SubscribeError(format!("dispatch task: {e}")))
    }
}
