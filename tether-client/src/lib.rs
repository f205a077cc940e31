mod error;
mod session;
mod signaling;
mod transport;

pub use error::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;

use std::sync::Arc;
use tether_core::PeerName;

/// Connects to `peer_name` through the WebSocket relay at
/// `scheme://relay_address` as `identity`, over the `webrtc` engine with the
/// default configuration. See [`Connector::establish`].
pub async fn establish<F>(
    scheme: &str,
    relay_address: &str,
    identity: &str,
    peer_name: &str,
    on_connected: F,
) -> Result<(), EstablishError>
where
    F: FnOnce(PeerName, ConnectionHandle) + Send + 'static,
{
    let connector = Connector::new(
        Arc::new(WsSignalingClient::default()),
        Arc::new(WebRtcEngine::new()),
    );

    connector
        .establish(
            scheme,
            relay_address,
            &PeerName::from(identity),
            &PeerName::from(peer_name),
            on_connected,
        )
        .await
}
