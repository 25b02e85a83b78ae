//! Social stream ingestion
//!
//! A live sequence of text messages fanned into a channel.

mod twitter;

pub use twitter::{TwitterStream, TwitterStreamConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// One message from the stream
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

/// Trait for social stream implementations
#[async_trait]
pub trait SocialStream: Send + Sync {
    /// Start consuming the stream; messages arrive on the returned channel
    /// until the stream ends or the receiver is dropped.
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<StreamMessage>>;
}
