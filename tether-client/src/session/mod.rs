mod candidate_relay;
mod connection_handle;
mod handshake;
mod outbound_channel;

pub use candidate_relay::*;
pub use connection_handle::*;
pub use handshake::*;
pub use outbound_channel::OutboundChannel;
