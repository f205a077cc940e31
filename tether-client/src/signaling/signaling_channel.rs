use crate::error::SignalingError;
use async_trait::async_trait;
use serde_json::Value;
use tether_core::{PeerName, SignalEnvelope};

/// Client of the signaling relay that carries setup metadata between two
/// named participants.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Connect to the relay at `scheme://address` and log in as `identity`.
    async fn connect(
        &self,
        scheme: &str,
        address: &str,
        identity: &PeerName,
    ) -> Result<(), SignalingError>;

    /// Send `payload` to `peer` and wait for the correlated reply.
    async fn publish_and_await_reply(
        &self,
        peer: &PeerName,
        payload: Value,
    ) -> Result<SignalEnvelope, SignalingError>;

    /// Fire-and-forget send to `peer`.
    async fn publish(&self, peer: &PeerName, payload: Value) -> Result<(), SignalingError>;

    /// Next uncorrelated message from the relay. Fails once the relay is gone.
    async fn receive_next(&self) -> Result<SignalEnvelope, SignalingError>;

    async fn disconnect(&self);
}
