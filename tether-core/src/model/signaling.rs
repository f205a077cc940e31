use crate::model::peer::PeerName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A payload relayed between two named participants.
///
/// On receipt, `peer` is the originator and is where replies go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEnvelope {
    pub peer: PeerName,
    #[serde(default)]
    pub payload: Value,
}

impl SignalEnvelope {
    pub fn new(peer: impl Into<PeerName>, payload: Value) -> Self {
        Self {
            peer: peer.into(),
            payload,
        }
    }
}

/// Frame exchanged with the relay over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum RelayFrame {
    Login {
        #[serde(default)]
        login: Option<PeerName>,
    },
    Offer {
        peer: PeerName,
        #[serde(default)]
        data: Value,
    },
    Answer {
        peer: PeerName,
        #[serde(default)]
        data: Value,
    },
    Candidate {
        peer: PeerName,
        #[serde(default)]
        data: Value,
    },
}

impl RelayFrame {
    pub fn login(identity: impl Into<PeerName>) -> Self {
        Self::Login {
            login: Some(identity.into()),
        }
    }

    pub fn peer(&self) -> Option<&PeerName> {
        match self {
            Self::Login { .. } => None,
            Self::Offer { peer, .. } | Self::Answer { peer, .. } | Self::Candidate { peer, .. } => {
                Some(peer)
            }
        }
    }

    pub fn into_envelope(self) -> Option<SignalEnvelope> {
        match self {
            Self::Login { .. } => None,
            Self::Offer { peer, data } | Self::Answer { peer, data } | Self::Candidate { peer, data } => {
                Some(SignalEnvelope { peer, payload: data })
            }
        }
    }
}
