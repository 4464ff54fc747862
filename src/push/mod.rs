/**
 * Topic Bridge
 *
 * Abstraction over the push-notification provider's topic primitives:
 * subscribe/unsubscribe a device token to a topic, drop every topic
 * relationship a token holds, and send a message to a topic or directly to
 * a token.
 *
 * All operations report plain pass/fail - the provider's structured errors
 * are logged at the implementation and never reach the engines. Failures are
 * not retried here; the engines decide whether a refusal is fatal (topic
 * state changes) or best-effort (notifications).
 */

mod fcm;
mod mock;

pub use fcm::FcmClient;
pub use mock::{BridgeCall, RecordingBridge};

use async_trait::async_trait;

/// Destination of a push message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// Fan out to every device subscribed to the topic
    Topic(String),
    /// A single device token
    Token(String),
}

/// Push-provider topic operations consumed by the engines.
#[async_trait]
pub trait TopicBridge: Send + Sync {
    /// Subscribe a device token to a topic. Idempotent at the provider.
    async fn subscribe(&self, topic: &str, device_token: &str) -> bool;

    /// Unsubscribe a device token from a topic.
    async fn unsubscribe(&self, topic: &str, device_token: &str) -> bool;

    /// Drop every topic relationship held by a device token (used when a
    /// user's device token is rotated).
    async fn unsubscribe_all(&self, device_token: &str) -> bool;

    /// Send a notification to a topic or a single token.
    async fn send(&self, target: &PushTarget, title: &str, body: &str) -> bool;
}
