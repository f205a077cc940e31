mod signaling_channel;
mod ws_client;

pub use signaling_channel::*;
pub use ws_client::*;
