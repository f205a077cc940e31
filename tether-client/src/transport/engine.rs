use crate::error::EngineError;
use crate::transport::TransportConfig;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tether_core::{Candidate, ConnectivityState, SessionDescription, SignalingState};
use tokio::sync::mpsc;

pub type OpenHandler = Box<dyn FnOnce() + Send + Sync>;
pub type CloseHandler = Box<dyn FnMut() + Send + Sync>;
pub type MessageHandler = Box<dyn FnMut(Bytes) + Send + Sync>;

/// Message-oriented channel opened on a peer connection.
#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> &str;

    async fn send(&self, data: &Bytes) -> Result<usize, EngineError>;

    fn on_open(&self, f: OpenHandler);

    fn on_close(&self, f: CloseHandler);

    fn on_message(&self, f: MessageHandler);

    async fn close(&self) -> Result<(), EngineError>;
}

/// One negotiated connection inside the engine.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_outbound_channel(
        &self,
        label: &str,
    ) -> Result<Arc<dyn DataChannel>, EngineError>;

    async fn create_local_offer(&self) -> Result<SessionDescription, EngineError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError>;

    async fn add_remote_candidate(&self, candidate: Candidate) -> Result<(), EngineError>;

    async fn close(&self) -> Result<(), EngineError>;
}

/// Asynchronous notifications of one connection, one queue per category.
///
/// A `None` on `candidates` means local discovery is exhausted.
pub struct ConnectionEvents {
    pub connectivity: mpsc::UnboundedReceiver<ConnectivityState>,
    pub signaling: mpsc::UnboundedReceiver<SignalingState>,
    pub candidates: mpsc::UnboundedReceiver<Option<Candidate>>,
}

/// Producer side of [`ConnectionEvents`], handed to engine callbacks.
#[derive(Clone)]
pub struct EventSenders {
    pub connectivity: mpsc::UnboundedSender<ConnectivityState>,
    pub signaling: mpsc::UnboundedSender<SignalingState>,
    pub candidates: mpsc::UnboundedSender<Option<Candidate>>,
}

impl ConnectionEvents {
    pub fn channel() -> (EventSenders, ConnectionEvents) {
        let (connectivity_tx, connectivity_rx) = mpsc::unbounded_channel();
        let (signaling_tx, signaling_rx) = mpsc::unbounded_channel();
        let (candidates_tx, candidates_rx) = mpsc::unbounded_channel();

        (
            EventSenders {
                connectivity: connectivity_tx,
                signaling: signaling_tx,
                candidates: candidates_tx,
            },
            ConnectionEvents {
                connectivity: connectivity_rx,
                signaling: signaling_rx,
                candidates: candidates_rx,
            },
        )
    }
}

pub struct EngineConnection {
    pub connection: Arc<dyn PeerConnection>,
    pub events: ConnectionEvents,
}

#[async_trait]
pub trait ConnectivityEngine: Send + Sync {
    async fn create_connection(
        &self,
        config: &TransportConfig,
    ) -> Result<EngineConnection, EngineError>;
}
