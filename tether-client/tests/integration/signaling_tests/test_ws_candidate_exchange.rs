use serde_json::Value;
use tether_client::{SignalingChannel, WsSignalingClient};
use tether_core::{CandidateSignal, PeerName, RelayFrame};

use crate::integration::{CLIENT_NAME, SERVER_NAME, init_tracing};
use crate::utils::{
    RelayMode, SIGNAL_TIMEOUT_MS, TestRelay, answer_payload, candidate_payload, ms, wait_until,
};

#[tokio::test]
async fn test_relayed_candidates_arrive_in_order() {
    init_tracing();

    let relay = TestRelay::start(RelayMode::Scripted { candidates: 3 })
        .await
        .expect("Failed to start relay");
    let client = WsSignalingClient::default();
    client
        .connect("ws", &relay.address(), &PeerName::from(CLIENT_NAME))
        .await
        .expect("Failed to connect");

    let reply = client
        .publish_and_await_reply(&PeerName::from(SERVER_NAME), answer_payload())
        .await
        .expect("Request failed");
    assert_eq!(reply.payload, answer_payload());

    let mut received = Vec::new();
    loop {
        let envelope = tokio::time::timeout(ms(SIGNAL_TIMEOUT_MS), client.receive_next())
            .await
            .expect("Timeout waiting for candidate")
            .expect("Relay closed");
        assert_eq!(envelope.peer, PeerName::from(SERVER_NAME));

        match CandidateSignal::from_payload(&envelope.payload).expect("Bad candidate") {
            CandidateSignal::Candidate(c) => received.push(c),
            CandidateSignal::EndOfCandidates => break,
        }
    }

    let expected: Vec<Value> = (1..=3).map(candidate_payload).collect();
    let received: Vec<Value> = received
        .into_iter()
        .map(|c| serde_json::to_value(c).unwrap())
        .collect();
    assert_eq!(received, expected);

    client.disconnect().await;
}

#[tokio::test]
async fn test_published_candidates_reach_relay() {
    init_tracing();

    let relay = TestRelay::start(RelayMode::Silent)
        .await
        .expect("Failed to start relay");
    let client = WsSignalingClient::default();
    client
        .connect("ws", &relay.address(), &PeerName::from(CLIENT_NAME))
        .await
        .expect("Failed to connect");

    let peer = PeerName::from(SERVER_NAME);
    client.publish(&peer, candidate_payload(1)).await.unwrap();
    client.publish(&peer, candidate_payload(2)).await.unwrap();
    client.publish(&peer, Value::Null).await.unwrap();

    assert!(wait_until(SIGNAL_TIMEOUT_MS, || relay.received_candidates().len() == 3).await);
    assert_eq!(
        relay.received_candidates(),
        vec![candidate_payload(1), candidate_payload(2), Value::Null]
    );
    assert!(relay.received().iter().skip(1).all(|f| matches!(
        f,
        RelayFrame::Candidate { peer, .. } if peer.as_str() == SERVER_NAME
    )));

    client.disconnect().await;
}
