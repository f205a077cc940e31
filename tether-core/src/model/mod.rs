mod candidate;
mod description;
mod ice;
mod peer;
mod signaling;
mod state;

pub use candidate::{Candidate, CandidateSignal, PayloadError};
pub use description::{SdpKind, SessionDescription};
pub use ice::IceServerConfig;
pub use peer::PeerName;
pub use signaling::{RelayFrame, SignalEnvelope};
pub use state::{ConnectivityState, SignalingState};
