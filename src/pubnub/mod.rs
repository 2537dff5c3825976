//! PubNub subscriber trigger.

pub mod client;
pub mod trigger;

pub use client::{MessageEvent, PubNubClient, SubscribeKeys, SubscriptionClient};
pub use trigger::{
    HandlerSettings, SubscriberTrigger, TriggerHandle, TriggerHandler, TriggerOutput,
    TriggerSettings,
};

pub const SETTING_PUBLISH_KEY: &str = "publishKey";
pub const SETTING_SUBSCRIBE_KEY: &str = "subscribeKey";
pub const SETTING_UUID: &str = "uuid";
pub const HANDLER_SETTING_CHANNEL: &str = "channel";
