/**
 * FCM Topic Bridge
 *
 * Implements `TopicBridge` against Firebase Cloud Messaging: the legacy send
 * endpoint for messages and the Instance-ID endpoints for topic membership.
 * Every request carries the configured server key and an explicit timeout;
 * nothing is retried here.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::FcmConfig;
use crate::error::{EngineError, EngineResult};

use super::{PushTarget, TopicBridge};

/// FCM-backed `TopicBridge`.
#[derive(Debug, Clone)]
pub struct FcmClient {
    http: Client,
    config: FcmConfig,
}

impl FcmClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: FcmConfig) -> EngineResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build FCM HTTP client: {e}");
                EngineError::external("push client setup")
            })?;

        Ok(Self { http, config })
    }

    fn auth_header(&self) -> String {
        format!("key={}", self.config.server_key)
    }

    async fn post_topic_batch(&self, endpoint: &str, topic: &str, device_token: &str) -> bool {
        let url = format!("{}/iid/v1:{}", self.config.topic_url, endpoint);
        let body = json!({
            "to": format!("/topics/{topic}"),
            "registration_tokens": [device_token],
        });

        match self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::error!(
                    "Topic {endpoint} failure: provider returned {}",
                    response.status()
                );
                false
            }
            Err(e) => {
                tracing::error!("Topic {endpoint} failure: {e}");
                false
            }
        }
    }

    /// Topics the provider currently has this token subscribed to.
    async fn topic_relationships(&self, device_token: &str) -> Option<Vec<String>> {
        let url = format!(
            "{}/iid/info/{}?details=true",
            self.config.topic_url, device_token
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::error!(
                "Topic lookup failure: provider returned {}",
                response.status()
            );
            return None;
        }

        let info: serde_json::Value = response.json().await.ok()?;
        let topics = info
            .get("rel")
            .and_then(|rel| rel.get("topics"))
            .and_then(|topics| topics.as_object())
            .map(|topics| topics.keys().cloned().collect())
            .unwrap_or_default();

        Some(topics)
    }
}

#[async_trait]
impl TopicBridge for FcmClient {
    async fn subscribe(&self, topic: &str, device_token: &str) -> bool {
        self.post_topic_batch("batchAdd", topic, device_token).await
    }

    async fn unsubscribe(&self, topic: &str, device_token: &str) -> bool {
        self.post_topic_batch("batchRemove", topic, device_token)
            .await
    }

    async fn unsubscribe_all(&self, device_token: &str) -> bool {
        // The provider has no single call for this: list the token's topic
        // relationships, then remove each one.
        let Some(topics) = self.topic_relationships(device_token).await else {
            return false;
        };

        let mut all_removed = true;
        for topic in topics {
            if !self.unsubscribe(&topic, device_token).await {
                all_removed = false;
            }
        }
        all_removed
    }

    async fn send(&self, target: &PushTarget, title: &str, body: &str) -> bool {
        let to = match target {
            PushTarget::Topic(topic) => format!("/topics/{topic}"),
            PushTarget::Token(token) => token.clone(),
        };

        let message = json!({
            "to": to,
            "notification": {
                "title": title,
                "body": body,
            },
            "data": {
                "priority": "high",
                "vibrate": "true",
                "sound": "true",
            },
        });

        match self
            .http
            .post(&self.config.send_url)
            .header("Authorization", self.auth_header())
            .json(&message)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::error!(
                    "Notification failure: provider returned {}",
                    response.status()
                );
                false
            }
            Err(e) => {
                tracing::error!("Notification failure: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> FcmConfig {
        FcmConfig {
            server_key: "test-server-key".to_string(),
            send_url: format!("{}/fcm/send", server.uri()),
            topic_url: server.uri(),
            timeout: Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_subscribe_posts_batch_add() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iid/v1:batchAdd"))
            .and(body_partial_json(serde_json::json!({
                "to": "/topics/campus_news",
                "registration_tokens": ["device-1"],
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = FcmClient::new(test_config(&server)).unwrap();
        assert!(client.subscribe("campus_news", "device-1").await);
    }

    #[tokio::test]
    async fn test_unsubscribe_posts_batch_remove() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iid/v1:batchRemove"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = FcmClient::new(test_config(&server)).unwrap();
        assert!(client.unsubscribe("campus_news", "device-1").await);
    }

    #[tokio::test]
    async fn test_provider_error_reports_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iid/v1:batchAdd"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = FcmClient::new(test_config(&server)).unwrap();
        assert!(!client.subscribe("campus_news", "device-1").await);
    }

    #[tokio::test]
    async fn test_send_to_topic_shapes_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(body_partial_json(serde_json::json!({
                "to": "/topics/campus_news",
                "notification": {
                    "title": "Subscription Alert!",
                },
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = FcmClient::new(test_config(&server)).unwrap();
        let target = PushTarget::Topic("campus_news".to_string());
        assert!(client.send(&target, "Subscription Alert!", "hello").await);
    }

    #[tokio::test]
    async fn test_unsubscribe_all_walks_relationships() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/iid/info/device-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rel": { "topics": { "campus_news": {}, "sports": {} } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/iid/v1:batchRemove"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let client = FcmClient::new(test_config(&server)).unwrap();
        assert!(client.unsubscribe_all("device-1").await);
    }
}
