use crate::error::EstablishError;
use crate::session::{ConnectionHandle, OutboundChannel, relay_candidates};
use crate::signaling::SignalingChannel;
use crate::transport::{
    ConnectionEvents, ConnectivityEngine, EngineConnection, PeerConnection, TransportConfig,
};
use std::sync::Arc;
use tether_core::{CandidateSignal, ConnectivityState, PeerName, SdpKind, SessionDescription};
use tracing::{debug, error, info, warn};

/// Dials peers through a signaling relay and drives each connection until it ends.
#[derive(Clone)]
pub struct Connector {
    signaling: Arc<dyn SignalingChannel>,
    engine: Arc<dyn ConnectivityEngine>,
    config: TransportConfig,
}

impl Connector {
    pub fn new(signaling: Arc<dyn SignalingChannel>, engine: Arc<dyn ConnectivityEngine>) -> Self {
        Self {
            signaling,
            engine,
            config: TransportConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Connects to `peer` through the relay at `scheme://relay_address` as `identity`.
    ///
    /// `on_connected` is invoked at most once, when connectivity reaches
    /// `connected`. Returns only after the connection has ended; an attempt
    /// that never connects still returns `Ok(())` without invoking it.
    /// Errors are reported for setup failures only.
    pub async fn establish<F>(
        &self,
        scheme: &str,
        relay_address: &str,
        identity: &PeerName,
        peer: &PeerName,
        on_connected: F,
    ) -> Result<(), EstablishError>
    where
        F: FnOnce(PeerName, ConnectionHandle) + Send + 'static,
    {
        if let Err(e) = self
            .signaling
            .connect(scheme, relay_address, identity)
            .await
        {
            error!("can't connect to signal server: {}", e);
            return Err(EstablishError::RelayConnect(e));
        }

        let EngineConnection { connection, events } =
            match self.engine.create_connection(&self.config).await {
                Ok(c) => c,
                Err(e) => {
                    error!("can't create connection: {}", e);
                    self.signaling.disconnect().await;
                    return Err(EstablishError::Engine(e));
                }
            };

        let result = self
            .run(connection.clone(), events, peer, on_connected)
            .await;
        if let Err(e) = &result {
            error!("Connection to {} aborted: {}", peer, e);
        }

        if let Err(e) = connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
        self.signaling.disconnect().await;

        result
    }

    async fn run<F>(
        &self,
        connection: Arc<dyn PeerConnection>,
        events: ConnectionEvents,
        peer: &PeerName,
        on_connected: F,
    ) -> Result<(), EstablishError>
    where
        F: FnOnce(PeerName, ConnectionHandle) + Send + 'static,
    {
        let channel = connection
            .create_outbound_channel(&self.config.channel_label)
            .await
            .map_err(EstablishError::CreateChannel)?;
        let channel = Arc::new(OutboundChannel::new(channel));

        let remote_peer = self.negotiate(connection.as_ref(), peer).await?;

        // Both descriptions are applied: candidates may flow in both directions now.
        let relay = tokio::spawn(relay_candidates(
            self.signaling.clone(),
            connection.clone(),
        ));

        self.drive(events, peer, &remote_peer, channel, on_connected)
            .await;

        relay.abort();
        Ok(())
    }

    /// Offer/answer exchange. Returns the name the answer came from.
    async fn negotiate(
        &self,
        connection: &dyn PeerConnection,
        peer: &PeerName,
    ) -> Result<PeerName, EstablishError> {
        let offer = connection
            .create_local_offer()
            .await
            .map_err(EstablishError::CreateOffer)?;
        connection
            .set_local_description(offer.clone())
            .await
            .map_err(EstablishError::ApplyLocal)?;

        let payload = offer.to_payload().map_err(EstablishError::OfferEncode)?;
        let reply = self
            .signaling
            .publish_and_await_reply(peer, payload)
            .await
            .map_err(|source| EstablishError::OfferExchange {
                peer: peer.clone(),
                source,
            })?;

        let answer = SessionDescription::from_payload(&reply.payload).map_err(|source| {
            EstablishError::AnswerDecode {
                raw: reply.payload.to_string(),
                source,
            }
        })?;
        if answer.kind != SdpKind::Answer {
            return Err(EstablishError::UnexpectedDescription { kind: answer.kind });
        }
        info!("Got answer from {}", reply.peer);

        connection
            .set_remote_description(answer)
            .await
            .map_err(EstablishError::ApplyRemote)?;

        Ok(reply.peer)
    }

    /// Consumes engine notifications until connectivity reaches a terminal state.
    async fn drive<F>(
        &self,
        mut events: ConnectionEvents,
        peer: &PeerName,
        remote_peer: &PeerName,
        channel: Arc<OutboundChannel>,
        on_connected: F,
    ) where
        F: FnOnce(PeerName, ConnectionHandle) + Send + 'static,
    {
        let mut on_connected = Some(on_connected);
        let mut discovering = true;
        let mut signaling_open = true;

        loop {
            tokio::select! {
                state = events.connectivity.recv() => {
                    let Some(state) = state else {
                        warn!("Connectivity events closed, treating {} as disconnected", peer);
                        break;
                    };
                    info!("ICE Connection State has changed: {}", state);

                    if state == ConnectivityState::Connected {
                        if let Some(callback) = on_connected.take() {
                            info!("Connected to {}", peer);
                            callback(peer.clone(), ConnectionHandle::new(peer.clone(), channel.clone()));
                        }
                    } else if state.is_terminal() {
                        break;
                    }
                }

                candidate = events.candidates.recv(), if discovering => {
                    let signal = match candidate {
                        Some(Some(candidate)) => CandidateSignal::Candidate(candidate),
                        Some(None) | None => {
                            info!("Collection of candidates is finished");
                            discovering = false;
                            CandidateSignal::EndOfCandidates
                        }
                    };
                    self.publish_candidate(remote_peer, &signal).await;
                }

                state = events.signaling.recv(), if signaling_open => {
                    match state {
                        Some(state) => debug!("Signal changed: {}", state),
                        None => signaling_open = false,
                    }
                }
            }
        }

        match channel.close_once().await {
            Ok(true) => debug!("Data channel '{}' closed", channel.label()),
            Ok(false) => {}
            Err(e) => warn!("Failed to close data channel: {}", e),
        }
    }

    async fn publish_candidate(&self, remote_peer: &PeerName, signal: &CandidateSignal) {
        let payload = match signal.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("can't marshal ICECandidate, error: {}", e);
                return;
            }
        };

        if let Err(e) = self.signaling.publish(remote_peer, payload).await {
            warn!("Failed to send ICECandidate to {}: {}", remote_peer, e);
        }
    }
}
