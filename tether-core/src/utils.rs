pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub const DEFAULT_CHANNEL_LABEL: &str = "tether";

pub const DEFAULT_SIGNAL_PATH: &str = "/signal";
