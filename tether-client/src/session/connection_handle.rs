use crate::error::EngineError;
use crate::session::OutboundChannel;
use bytes::Bytes;
use std::any::Any;
use std::sync::Arc;
use tether_core::PeerName;

/// Established channel to a peer, handed to the caller once connected.
pub struct ConnectionHandle {
    peer: PeerName,
    channel: Arc<OutboundChannel>,
    user_data: Option<Box<dyn Any + Send + Sync>>,
}

impl ConnectionHandle {
    pub(crate) fn new(peer: PeerName, channel: Arc<OutboundChannel>) -> Self {
        Self {
            peer,
            channel,
            user_data: None,
        }
    }

    pub fn peer(&self) -> &PeerName {
        &self.peer
    }

    pub fn label(&self) -> &str {
        self.channel.label()
    }

    /// Shared sending side, for callbacks that outlive a borrow of the handle.
    /// Closing it counts as closing the handle.
    pub fn channel(&self) -> Arc<OutboundChannel> {
        self.channel.clone()
    }

    pub fn on_open<F>(&self, f: F)
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.channel.inner().on_open(Box::new(f));
    }

    pub fn on_close<F>(&self, f: F)
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.channel.inner().on_close(Box::new(f));
    }

    /// `f` is called once per received message with its raw payload.
    pub fn on_message<F>(&self, f: F)
    where
        F: FnMut(Bytes) + Send + Sync + 'static,
    {
        self.channel.inner().on_message(Box::new(f));
    }

    /// Transport errors are returned as reported by the engine.
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<usize, EngineError> {
        self.channel.send(data).await
    }

    pub async fn close(&self) -> Result<(), EngineError> {
        self.channel.close().await
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_deref()?.downcast_ref()
    }

    pub fn set_user_data<T: Any + Send + Sync>(&mut self, value: T) {
        self.user_data = Some(Box::new(value));
    }
}
