use crate::error::EngineError;
use crate::transport::DataChannel;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The dialer's data channel. Closed at most once, whoever asks first.
pub struct OutboundChannel {
    channel: Arc<dyn DataChannel>,
    closed: AtomicBool,
}

impl OutboundChannel {
    pub(crate) fn new(channel: Arc<dyn DataChannel>) -> Self {
        Self {
            channel,
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<dyn DataChannel> {
        &self.channel
    }

    pub fn label(&self) -> &str {
        self.channel.label()
    }

    pub async fn send(&self, data: impl Into<Bytes>) -> Result<usize, EngineError> {
        self.channel.send(&data.into()).await
    }

    pub async fn close(&self) -> Result<(), EngineError> {
        self.close_once().await.map(|_| ())
    }

    /// Returns `false` when the channel had already been closed.
    pub(crate) async fn close_once(&self) -> Result<bool, EngineError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.channel.close().await?;
        Ok(true)
    }
}
