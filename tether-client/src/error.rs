use std::time::Duration;
use tether_core::{PeerName, SdpKind};
use thiserror::Error;

/// Failures of the signaling relay client.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("invalid relay url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("can't connect to signal server: {0}")]
    Connect(String),

    #[error("not connected to signal server")]
    NotConnected,

    #[error("signal server connection closed")]
    Closed,

    #[error("no reply from {peer} within {timeout:?}")]
    ReplyTimeout { peer: PeerName, timeout: Duration },

    #[error("can't encode signal frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures reported by the connectivity engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),

    #[error("data channel is closed")]
    ChannelClosed,

    #[error("rejected by engine: {0}")]
    Rejected(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Setup failures that abort an establishment attempt.
#[derive(Debug, Error)]
pub enum EstablishError {
    #[error("can't connect to signal server")]
    RelayConnect(#[source] SignalingError),

    #[error("can't create connection")]
    Engine(#[source] EngineError),

    #[error("can't create data channel")]
    CreateChannel(#[source] EngineError),

    #[error("CreateOffer error")]
    CreateOffer(#[source] EngineError),

    #[error("SetLocalDescription error")]
    ApplyLocal(#[source] EngineError),

    #[error("offer/answer exchange with {peer} failed")]
    OfferExchange {
        peer: PeerName,
        #[source]
        source: SignalingError,
    },

    #[error("can't encode offer")]
    OfferEncode(#[source] serde_json::Error),

    #[error("can't unmarshal answer, message: '{raw}'")]
    AnswerDecode {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected an answer, got {kind}")]
    UnexpectedDescription { kind: SdpKind },

    #[error("SetRemoteDescription error")]
    ApplyRemote(#[source] EngineError),
}
