/**
 * Recording Topic Bridge
 *
 * Test double that records every bridge call and can be scripted to refuse
 * specific operations, so the suites can assert both the happy path and the
 * partial-failure behavior of the engines without a push provider.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PushTarget, TopicBridge};

/// A recorded bridge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Subscribe { topic: String, device_token: String },
    Unsubscribe { topic: String, device_token: String },
    UnsubscribeAll { device_token: String },
    Send { target: PushTarget, title: String, body: String },
}

/// Recording `TopicBridge` test double.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<BridgeCall>>,
    refuse_subscribe: AtomicBool,
    refuse_unsubscribe: AtomicBool,
    refuse_unsubscribe_all: AtomicBool,
    refuse_send: AtomicBool,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `subscribe` calls report failure.
    pub fn refuse_subscribe(&self) {
        self.refuse_subscribe.store(true, Ordering::SeqCst);
    }

    /// Make subsequent `unsubscribe` calls report failure.
    pub fn refuse_unsubscribe(&self) {
        self.refuse_unsubscribe.store(true, Ordering::SeqCst);
    }

    /// Make subsequent `unsubscribe_all` calls report failure.
    pub fn refuse_unsubscribe_all(&self) {
        self.refuse_unsubscribe_all.store(true, Ordering::SeqCst);
    }

    /// Make subsequent `send` calls report failure.
    pub fn refuse_send(&self) {
        self.refuse_send.store(true, Ordering::SeqCst);
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Topics passed to `subscribe` so far, in order.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BridgeCall::Subscribe { topic, .. } => Some(topic),
                _ => None,
            })
            .collect()
    }

    /// Titles passed to `send` so far, in order.
    pub fn sent_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BridgeCall::Send { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BridgeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TopicBridge for RecordingBridge {
    async fn subscribe(&self, topic: &str, device_token: &str) -> bool {
        self.record(BridgeCall::Subscribe {
            topic: topic.to_string(),
            device_token: device_token.to_string(),
        });
        !self.refuse_subscribe.load(Ordering::SeqCst)
    }

    async fn unsubscribe(&self, topic: &str, device_token: &str) -> bool {
        self.record(BridgeCall::Unsubscribe {
            topic: topic.to_string(),
            device_token: device_token.to_string(),
        });
        !self.refuse_unsubscribe.load(Ordering::SeqCst)
    }

    async fn unsubscribe_all(&self, device_token: &str) -> bool {
        self.record(BridgeCall::UnsubscribeAll {
            device_token: device_token.to_string(),
        });
        !self.refuse_unsubscribe_all.load(Ordering::SeqCst)
    }

    async fn send(&self, target: &PushTarget, title: &str, body: &str) -> bool {
        self.record(BridgeCall::Send {
            target: target.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });
        !self.refuse_send.load(Ordering::SeqCst)
    }
}
