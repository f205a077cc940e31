use std::sync::Arc;
use tether_client::{Connector, SignalingConfig, TransportConfig, WebRtcEngine, WsSignalingClient};
use tether_core::{PeerName, RelayFrame};

use crate::integration::{CLIENT_NAME, SERVER_NAME, init_tracing};
use crate::utils::{
    CONNECTION_TIMEOUT_MS, DATA_CHANNEL_TIMEOUT_MS, DISCONNECT_TIMEOUT_MS, RelayMode, TestRelay,
    ms,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_end_to_end_over_webrtc() {
    init_tracing();

    let relay = TestRelay::start(RelayMode::Responder)
        .await
        .expect("Failed to start relay");

    let connector = Connector::new(
        Arc::new(WsSignalingClient::new(SignalingConfig::default())),
        Arc::new(WebRtcEngine::new()),
    )
    .with_config(TransportConfig::local());

    let (open_tx, open_rx) = tokio::sync::oneshot::channel();
    let address = relay.address();
    let task = tokio::spawn(async move {
        connector
            .establish(
                "ws",
                &address,
                &PeerName::from(CLIENT_NAME),
                &PeerName::from(SERVER_NAME),
                move |peer, handle| {
                    tracing::info!("connected to {}", peer);
                    let channel = handle.channel();
                    handle.on_open(move || {
                        let _ = open_tx.send(channel);
                    });
                },
            )
            .await
    });

    let channel = tokio::time::timeout(ms(CONNECTION_TIMEOUT_MS + DATA_CHANNEL_TIMEOUT_MS), open_rx)
        .await
        .expect("Timeout waiting for data channel")
        .expect("Data channel never opened");

    channel
        .send("hello")
        .await
        .expect("Send failed");

    let received = relay.next_message(DATA_CHANNEL_TIMEOUT_MS).await;
    assert_eq!(received.as_deref(), Some(&b"hello"[..]));

    // Login came first, then the offer to the dialed peer.
    let frames = relay.received();
    assert_eq!(
        frames.first(),
        Some(&RelayFrame::Login {
            login: Some(PeerName::from(CLIENT_NAME))
        })
    );
    assert!(frames.iter().any(
        |f| matches!(f, RelayFrame::Offer { peer, .. } if peer.as_str() == SERVER_NAME)
    ));

    relay.hang_up().await.expect("Failed to hang up");

    let result = tokio::time::timeout(ms(DISCONNECT_TIMEOUT_MS), task)
        .await
        .expect("establish did not return after hang up")
        .expect("establish panicked");
    assert!(result.is_ok(), "Unexpected error: {:?}", result);
}
