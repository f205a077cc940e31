use crate::signaling::SignalingChannel;
use crate::transport::PeerConnection;
use std::sync::Arc;
use tether_core::CandidateSignal;
use tracing::{debug, info, warn};

/// Feeds the peer's relayed candidates into `connection`.
///
/// Stops on the end-of-candidates marker or when the relay fails. A
/// malformed or rejected candidate is logged and skipped.
pub async fn relay_candidates(
    signaling: Arc<dyn SignalingChannel>,
    connection: Arc<dyn PeerConnection>,
) {
    loop {
        let envelope = match signaling.receive_next().await {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Candidate relay stopped: {}", e);
                break;
            }
        };

        let candidate = match CandidateSignal::from_payload(&envelope.payload) {
            Ok(CandidateSignal::Candidate(candidate)) => candidate,
            Ok(CandidateSignal::EndOfCandidates) => {
                info!("All ICECandidate from {} processed", envelope.peer);
                break;
            }
            Err(e) => {
                warn!(
                    "can't unmarshal candidate from {}, error: {}. Payload: {}",
                    envelope.peer, e, envelope.payload
                );
                continue;
            }
        };

        debug!("Got ICECandidate from {}", envelope.peer);
        if let Err(e) = connection.add_remote_candidate(candidate).await {
            warn!("can't add ICECandidate, error: {}", e);
        }
    }
}
