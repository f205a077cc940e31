use serde_json::json;
use std::sync::Arc;
use tether_client::EstablishError;
use tether_core::{PeerName, SdpKind};

use crate::integration::{
    CLIENT_NAME, SERVER_NAME, connected_channel, create_connector, init_tracing,
};
use crate::utils::{
    EngineCall, MockEngine, MockSignaling, ReplyBehavior, SignalCall, TEST_OFFER_SDP,
};

async fn establish_with_reply(reply: serde_json::Value) -> (Result<(), EstablishError>, MockEngine) {
    let signaling = Arc::new(MockSignaling::new().with_reply(ReplyBehavior::Reply(reply)));
    let engine = MockEngine::new();
    let connector = create_connector(&signaling, &engine);
    let (on_connected, _connected_rx) = connected_channel();

    let result = connector
        .establish(
            "ws",
            "relay.local:8080",
            &PeerName::from(CLIENT_NAME),
            &PeerName::from(SERVER_NAME),
            on_connected,
        )
        .await;

    (result, engine)
}

#[tokio::test]
async fn test_undecodable_answer_keeps_raw_payload() {
    init_tracing();

    let (result, engine) = establish_with_reply(json!("not an answer")).await;

    match result {
        Err(EstablishError::AnswerDecode { raw, .. }) => {
            assert!(raw.contains("not an answer"), "raw payload missing: {}", raw);
        }
        other => panic!("expected an answer decode failure, got {:?}", other),
    }
    assert!(!engine.calls().iter().any(|c| matches!(c, EngineCall::SetRemote(_))));
    assert!(engine.calls().contains(&EngineCall::CloseConnection));
}

#[tokio::test]
async fn test_offer_in_reply_is_rejected() {
    init_tracing();

    let (result, engine) =
        establish_with_reply(json!({ "type": "offer", "sdp": TEST_OFFER_SDP })).await;

    assert!(matches!(
        result,
        Err(EstablishError::UnexpectedDescription {
            kind: SdpKind::Offer
        })
    ));
    assert!(!engine.calls().iter().any(|c| matches!(c, EngineCall::SetRemote(_))));
}

#[tokio::test]
async fn test_descriptions_applied_in_order() {
    init_tracing();

    let signaling = Arc::new(MockSignaling::new());
    let engine = MockEngine::new().with_states([tether_core::ConnectivityState::Failed]);
    let connector = create_connector(&signaling, &engine);
    let (on_connected, _connected_rx) = connected_channel();

    connector
        .establish(
            "ws",
            "relay.local:8080",
            &PeerName::from(CLIENT_NAME),
            &PeerName::from(SERVER_NAME),
            on_connected,
        )
        .await
        .expect("establish failed");

    let create_offer = engine.position(|c| *c == EngineCall::CreateOffer).unwrap();
    let set_local = engine
        .position(|c| *c == EngineCall::SetLocal(SdpKind::Offer))
        .unwrap();
    let set_remote = engine
        .position(|c| *c == EngineCall::SetRemote(SdpKind::Answer))
        .unwrap();
    let channel = engine
        .position(|c| matches!(c, EngineCall::CreateChannel(_)))
        .unwrap();

    assert!(channel < create_offer, "channel must be in the offer");
    assert!(create_offer < set_local);
    assert!(set_local < set_remote);
    assert_eq!(engine.ordering_violations(), 0);
}

#[tokio::test]
async fn test_offer_failure_names_the_step() {
    init_tracing();

    let signaling = Arc::new(MockSignaling::new());
    let engine = MockEngine::new().failing_offer();
    let connector = create_connector(&signaling, &engine);
    let (on_connected, _connected_rx) = connected_channel();

    let result = connector
        .establish(
            "ws",
            "relay.local:8080",
            &PeerName::from(CLIENT_NAME),
            &PeerName::from(SERVER_NAME),
            on_connected,
        )
        .await;

    let err = result.expect_err("offer failure must abort the attempt");
    assert!(matches!(err, EstablishError::CreateOffer(_)));
    assert_eq!(err.to_string(), "CreateOffer error");
    assert!(!signaling.calls().iter().any(|c| matches!(c, SignalCall::Request { .. })));
    assert!(engine.calls().contains(&EngineCall::CloseConnection));
}
