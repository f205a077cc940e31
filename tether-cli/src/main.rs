use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tether_client::{
    ConnectionHandle, Connector, SignalingConfig, TransportConfig, WebRtcEngine,
    WsSignalingClient,
};
use tether_core::utils::{DEFAULT_CHANNEL_LABEL, DEFAULT_STUN_ADDR};
use tether_core::{IceServerConfig, PeerName};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Dials a named peer through a signaling relay and greets it over a data channel.
#[derive(Parser)]
#[command(name = "tether", version)]
struct Args {
    /// Relay address, host:port
    #[arg(long, env = "TETHER_ADDR", default_value = "localhost:8080")]
    addr: String,

    /// Name to log in to the relay with
    #[arg(long, env = "TETHER_NAME", default_value = "client-1")]
    name: String,

    /// Name of the peer to dial
    #[arg(long, env = "TETHER_SERVER", default_value = "server-1")]
    server: String,

    /// Relay URL scheme
    #[arg(long, env = "TETHER_SCHEME", default_value = "ws")]
    scheme: String,

    /// STUN/TURN server URL, repeatable
    #[arg(
        long = "stun",
        env = "TETHER_STUN",
        value_delimiter = ',',
        default_value = DEFAULT_STUN_ADDR
    )]
    stun: Vec<String>,

    /// Seconds between greetings
    #[arg(long, env = "TETHER_INTERVAL", default_value_t = 5)]
    interval: u64,

    /// Data channel label
    #[arg(long, env = "TETHER_LABEL", default_value = DEFAULT_CHANNEL_LABEL)]
    label: String,

    /// Seconds to wait for the peer's answer
    #[arg(long, env = "TETHER_REPLY_TIMEOUT", default_value_t = 30)]
    reply_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let signaling = WsSignalingClient::new(SignalingConfig {
        reply_timeout: Duration::from_secs(args.reply_timeout),
        ..SignalingConfig::default()
    });
    let transport = TransportConfig {
        ice_servers: args.stun.iter().map(IceServerConfig::stun).collect(),
        channel_label: args.label.clone(),
    };
    let connector =
        Connector::new(Arc::new(signaling), Arc::new(WebRtcEngine::new())).with_config(transport);

    println!(
        "{} {} -> {} via {}://{}",
        "Dialing".green().bold(),
        args.name,
        args.server,
        args.scheme,
        args.addr
    );

    let name = args.name.clone();
    let interval = Duration::from_secs(args.interval.max(1));
    connector
        .establish(
            &args.scheme,
            &args.addr,
            &PeerName::from(args.name.as_str()),
            &PeerName::from(args.server.as_str()),
            move |peer, handle| on_connected(peer, handle, name, interval),
        )
        .await
        .context("connect error")?;

    println!("{}", "Connection closed".yellow().bold());
    Ok(())
}

fn on_connected(peer: PeerName, handle: ConnectionHandle, name: String, interval: Duration) {
    info!("Connected to {}", peer);

    let from = peer.clone();
    handle.on_message(move |data: Bytes| {
        info!("Message from {}: {}", from, String::from_utf8_lossy(&data));
    });

    handle.on_close(move || info!("Data channel to {} closed", peer));

    let channel = handle.channel();
    handle.on_open(move || {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for id in 1u64.. {
                ticker.tick().await;
                let greeting = format!("Hello from {} with id {}!", name, id);
                if let Err(e) = channel.send(greeting).await {
                    warn!("Send failed, stopping greetings: {}", e);
                    break;
                }
            }
        });
    });
}
