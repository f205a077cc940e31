use anyhow::{Context, Result};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tether_core::{Candidate, PeerName, RelayFrame, SessionDescription};
use tokio::sync::mpsc;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Answering peer behind the test relay.
///
/// Its candidates go out as relay frames on `frames`, terminated by a
/// `null` payload. Messages received on the offered data channel go to
/// `messages`.
pub struct TestResponder {
    /// Name the responder answers as.
    pub peer: PeerName,
    peer_connection: Arc<RTCPeerConnection>,
}

impl TestResponder {
    pub async fn new(
        peer: PeerName,
        frames: mpsc::UnboundedSender<RelayFrame>,
        messages: mpsc::UnboundedSender<Bytes>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        // Host candidates only.
        let peer_connection = Arc::new(api.new_peer_connection(RTCConfiguration::default()).await?);

        let candidate_peer = peer.clone();
        peer_connection.on_ice_candidate(Box::new(move |candidate| {
            let frames = frames.clone();
            let peer = candidate_peer.clone();
            Box::pin(async move {
                let data = match candidate.map(|c| c.to_json()) {
                    Some(Ok(init)) => serde_json::to_value(init).unwrap_or(Value::Null),
                    Some(Err(e)) => {
                        tracing::warn!("[TestResponder] can't encode candidate: {}", e);
                        return;
                    }
                    None => Value::Null,
                };
                tracing::debug!("[TestResponder] ICE candidate generated");
                let _ = frames.send(RelayFrame::Candidate { peer, data });
            })
        }));

        peer_connection.on_data_channel(Box::new(move |dc| {
            let messages = messages.clone();
            Box::pin(async move {
                tracing::debug!("[TestResponder] Data channel received: {}", dc.label());

                dc.on_message(Box::new(move |msg: DataChannelMessage| {
                    let messages = messages.clone();
                    Box::pin(async move {
                        tracing::debug!("[TestResponder] Message received: {} bytes", msg.data.len());
                        let _ = messages.send(Bytes::from(msg.data.to_vec()));
                    })
                }));
            })
        }));

        Ok(Self {
            peer,
            peer_connection,
        })
    }

    /// Applies the offer and returns the local answer.
    pub async fn accept_offer(&self, offer: SessionDescription) -> Result<SessionDescription> {
        let offer = RTCSessionDescription::offer(offer.sdp)?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to set remote description")?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;

        Ok(SessionDescription::answer(answer.sdp))
    }

    pub async fn add_ice_candidate(&self, candidate: Candidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}
