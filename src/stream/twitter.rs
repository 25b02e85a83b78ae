//! Twitter filtered-stream client
//!
//! Long-lived chunked HTTP response carrying line-delimited JSON, one tweet
//! per line. Blank keep-alive lines are dropped. Reconnects with a fixed
//! delay up to a bounded count.

use super::{SocialStream, StreamMessage};
use crate::config::StreamConfig;
use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for the Twitter stream client
#[derive(Debug, Clone)]
pub struct TwitterStreamConfig {
    pub base_url: String,
    pub bearer_token: String,
    pub reconnect_delay: Duration,
    pub max_reconnects: u32,
}

impl TwitterStreamConfig {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            bearer_token: config.bearer_token.clone(),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            max_reconnects: config.max_reconnects,
        }
    }
}

/// Filtered-stream consumer
pub struct TwitterStream {
    config: TwitterStreamConfig,
}

#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    #[serde(default)]
    author_id: String,
    text: String,
}

impl TwitterStream {
    pub fn new(config: TwitterStreamConfig) -> Self {
        Self { config }
    }

    /// Parse one stream line. Blank keep-alives and unrecognized payloads
    /// (errors, rule notices) yield `None`.
    fn parse_line(line: &str) -> Option<StreamMessage> {
        if line.trim().is_empty() {
            return None;
        }
        let envelope: StreamEnvelope = serde_json::from_str(line).ok()?;
        Some(StreamMessage {
            id: envelope.data.id,
            author_id: envelope.data.author_id,
            text: envelope.data.text,
            received_at: Utc::now(),
        })
    }

    async fn consume_once(
        client: &Client,
        url: &str,
        config: &TwitterStreamConfig,
        tx: &mpsc::Sender<StreamMessage>,
    ) -> anyhow::Result<()> {
        let response = client
            .get(url)
            .bearer_auth(&config.bearer_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("stream request failed: {status} - {body}");
        }

        tracing::info!("Stream connected");

        let mut bytes = response.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                if let Some(message) = Self::parse_line(&line) {
                    if tx.send(message).await.is_err() {
                        // Receiver gone, stop consuming
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_stream(config: TwitterStreamConfig, tx: mpsc::Sender<StreamMessage>) {
        let client = Client::new();
        let url = format!("{}/tweets/search/stream", config.base_url);
        let mut reconnects = 0;

        loop {
            match Self::consume_once(&client, &url, &config, &tx).await {
                Ok(()) => tracing::info!("Stream closed"),
                Err(e) => tracing::warn!(error = %e, "Stream error"),
            }

            if tx.is_closed() {
                return;
            }
            reconnects += 1;
            if reconnects > config.max_reconnects {
                tracing::error!(reconnects, "Stream reconnect budget exhausted");
                return;
            }
            tracing::warn!(attempt = reconnects, "Stream reconnecting...");
            tokio::time::sleep(config.reconnect_delay).await;
        }
    }
}

#[async_trait]
impl SocialStream for TwitterStream {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamMessage>> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            Self::run_stream(config, tx).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let line = r#"{"data":{"id":"1","author_id":"877807935493033984","text":"Binance will list Foo (FOO)"}}"#;
        let message = TwitterStream::parse_line(line).unwrap();
        assert_eq!(message.id, "1");
        assert_eq!(message.author_id, "877807935493033984");
        assert_eq!(message.text, "Binance will list Foo (FOO)");
    }

    #[test]
    fn test_parse_keep_alive_line() {
        assert!(TwitterStream::parse_line("").is_none());
        assert!(TwitterStream::parse_line("\r").is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(TwitterStream::parse_line("not json").is_none());
    }

    #[test]
    fn test_parse_missing_author_defaults_empty() {
        let line = r#"{"data":{"id":"1","text":"hello"}}"#;
        let message = TwitterStream::parse_line(line).unwrap();
        assert_eq!(message.author_id, "");
    }

    #[test]
    fn test_parse_error_payload_skipped() {
        let line = r#"{"errors":[{"title":"operational-disconnect"}]}"#;
        assert!(TwitterStream::parse_line(line).is_none());
    }
}
