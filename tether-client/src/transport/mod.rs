mod engine;
mod transport_config;
mod webrtc_engine;

pub use engine::*;
pub use transport_config::*;
pub use webrtc_engine::*;
