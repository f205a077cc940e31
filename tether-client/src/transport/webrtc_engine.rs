use crate::error::EngineError;
use crate::transport::{
    CloseHandler, ConnectionEvents, ConnectivityEngine, DataChannel, EngineConnection,
    MessageHandler, OpenHandler, PeerConnection, TransportConfig,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tether_core::{
    Candidate, ConnectivityState, IceServerConfig, SdpKind, SessionDescription, SignalingState,
};
use tracing::{debug, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

/// Connectivity engine backed by the `webrtc` crate.
#[derive(Debug, Default, Clone)]
pub struct WebRtcEngine;

impl WebRtcEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectivityEngine for WebRtcEngine {
    async fn create_connection(
        &self,
        config: &TransportConfig,
    ) -> Result<EngineConnection, EngineError> {
        // Codecs and interceptors are registered even though only data channels are used.
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Callbacks only forward into the event queues; the orchestrator consumes them.
        let (senders, events) = ConnectionEvents::channel();

        let state_tx = senders.connectivity.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                debug!("ICE Connection State has changed: {}", s);
                let _ = state_tx.send(connectivity_state(s));
                Box::pin(async {})
            },
        ));

        let signaling_tx = senders.signaling.clone();
        peer_connection.on_signaling_state_change(Box::new(move |s: RTCSignalingState| {
            let _ = signaling_tx.send(signaling_state(s));
            Box::pin(async {})
        }));

        let candidate_tx = senders.candidates;
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            match c {
                Some(candidate) => match candidate.to_json() {
                    Ok(init) => {
                        let _ = candidate_tx.send(Some(candidate_from_init(init)));
                    }
                    Err(e) => warn!("can't marshal ICECandidate, error: {}", e),
                },
                None => {
                    let _ = candidate_tx.send(None);
                }
            }
            Box::pin(async {})
        }));

        Ok(EngineConnection {
            connection: Arc::new(WebRtcConnection { peer_connection }),
            events,
        })
    }
}

pub struct WebRtcConnection {
    peer_connection: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerConnection for WebRtcConnection {
    async fn create_outbound_channel(
        &self,
        label: &str,
    ) -> Result<Arc<dyn DataChannel>, EngineError> {
        let channel = self.peer_connection.create_data_channel(label, None).await?;
        Ok(Arc::new(WebRtcDataChannel { channel }))
    }

    async fn create_local_offer(&self) -> Result<SessionDescription, EngineError> {
        let offer = self.peer_connection.create_offer(None).await?;
        description_from_rtc(&offer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let desc = description_to_rtc(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), EngineError> {
        let desc = description_to_rtc(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: Candidate) -> Result<(), EngineError> {
        self.peer_connection
            .add_ice_candidate(candidate_to_init(candidate))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

pub struct WebRtcDataChannel {
    channel: Arc<RTCDataChannel>,
}

#[async_trait]
impl DataChannel for WebRtcDataChannel {
    fn label(&self) -> &str {
        self.channel.label()
    }

    async fn send(&self, data: &Bytes) -> Result<usize, EngineError> {
        Ok(self.channel.send(data).await?)
    }

    fn on_open(&self, f: OpenHandler) {
        self.channel.on_open(Box::new(move || {
            f();
            Box::pin(async {})
        }));
    }

    fn on_close(&self, mut f: CloseHandler) {
        self.channel.on_close(Box::new(move || {
            f();
            Box::pin(async {})
        }));
    }

    fn on_message(&self, mut f: MessageHandler) {
        self.channel
            .on_message(Box::new(move |msg: DataChannelMessage| {
                f(msg.data);
                Box::pin(async {})
            }));
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.channel.close().await?;
        Ok(())
    }
}

fn ice_server(config: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: config.urls.clone(),
        username: config.username.clone().unwrap_or_default(),
        credential: config.credential.clone().unwrap_or_default(),
    }
}

fn connectivity_state(s: RTCIceConnectionState) -> ConnectivityState {
    match s {
        RTCIceConnectionState::Unspecified => ConnectivityState::Unspecified,
        RTCIceConnectionState::New => ConnectivityState::New,
        RTCIceConnectionState::Checking => ConnectivityState::Checking,
        RTCIceConnectionState::Connected => ConnectivityState::Connected,
        RTCIceConnectionState::Completed => ConnectivityState::Completed,
        RTCIceConnectionState::Disconnected => ConnectivityState::Disconnected,
        RTCIceConnectionState::Failed => ConnectivityState::Failed,
        RTCIceConnectionState::Closed => ConnectivityState::Closed,
    }
}

fn signaling_state(s: RTCSignalingState) -> SignalingState {
    match s {
        RTCSignalingState::Unspecified => SignalingState::Unspecified,
        RTCSignalingState::Stable => SignalingState::Stable,
        RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
        RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
        RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
        RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
        RTCSignalingState::Closed => SignalingState::Closed,
    }
}

fn description_from_rtc(desc: &RTCSessionDescription) -> Result<SessionDescription, EngineError> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        RTCSdpType::Unspecified => {
            return Err(EngineError::Unsupported(
                "session description without type".to_owned(),
            ));
        }
    };

    Ok(SessionDescription {
        kind,
        sdp: desc.sdp.clone(),
    })
}

fn description_to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription, EngineError> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        SdpKind::Rollback => {
            return Err(EngineError::Unsupported("rollback description".to_owned()));
        }
    };
    Ok(rtc)
}

fn candidate_from_init(init: RTCIceCandidateInit) -> Candidate {
    Candidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn candidate_to_init(candidate: Candidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_mline_index,
        username_fragment: candidate.username_fragment,
    }
}
