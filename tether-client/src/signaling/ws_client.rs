use crate::error::SignalingError;
use crate::signaling::SignalingChannel;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tether_core::utils::DEFAULT_SIGNAL_PATH;
use tether_core::{PeerName, RelayFrame, SignalEnvelope};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Outstanding requests keyed by request number.
type PendingReplies = DashMap<u64, PendingReply>;

struct PendingReply {
    peer: PeerName,
    reply: oneshot::Sender<SignalEnvelope>,
}

/// Write half of one relay connection. `open` drops to `false` once the
/// relay side of the socket is gone.
struct Outbound {
    tx: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Path of the relay endpoint, appended to `scheme://address`.
    pub path: String,
    /// Upper bound on the wait for a correlated reply.
    pub reply_timeout: Duration,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SIGNAL_PATH.to_owned(),
            reply_timeout: Duration::from_secs(30),
        }
    }
}

/// Signaling relay client over a WebSocket with JSON [`RelayFrame`]s.
///
/// An answer resolves the request addressed to its originator, or else the
/// oldest outstanding request, since whoever picks up an offer may answer
/// under its own name. Everything else lands in the inbox read by
/// [`SignalingChannel::receive_next`].
pub struct WsSignalingClient {
    config: SignalingConfig,
    outbound: RwLock<Option<Outbound>>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<SignalEnvelope>>>,
    pending: Arc<PendingReplies>,
    next_request: AtomicU64,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
}

impl WsSignalingClient {
    pub fn new(config: SignalingConfig) -> Self {
        Self {
            config,
            outbound: RwLock::new(None),
            inbox: Mutex::new(None),
            pending: Arc::new(DashMap::new()),
            next_request: AtomicU64::new(0),
            receiver_task: Mutex::new(None),
        }
    }

    async fn send_frame(&self, frame: RelayFrame) -> Result<(), SignalingError> {
        let json = serde_json::to_string(&frame)?;

        let outbound = self.outbound.read().await;
        let outbound = outbound.as_ref().ok_or(SignalingError::NotConnected)?;
        if !outbound.open.load(Ordering::SeqCst) {
            return Err(SignalingError::Closed);
        }
        outbound
            .tx
            .send(Message::Text(json))
            .map_err(|_| SignalingError::Closed)
    }

    async fn sender_task(
        mut write: SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
    ) {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write.send(msg).await {
                warn!("Failed to send WS message: {}", e);
                break;
            }
        }

        debug!("Sender task terminated");
    }

    async fn receiver_task(
        mut read: SplitStream<WsStream>,
        inbox: mpsc::UnboundedSender<SignalEnvelope>,
        pending: Arc<PendingReplies>,
        open: Arc<AtomicBool>,
    ) {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => Self::route(&text, &inbox, &pending),
                Ok(Message::Close(_)) => {
                    info!("Signal server closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        open.store(false, Ordering::SeqCst);
        // Dropping the waiters fails their requests with `Closed`.
        pending.clear();
        debug!("Receiver task terminated");
    }

    fn route(
        text: &str,
        inbox: &mpsc::UnboundedSender<SignalEnvelope>,
        pending: &PendingReplies,
    ) {
        let frame: RelayFrame = match serde_json::from_str(text) {
            Ok(f) => f,
            Err(e) => {
                warn!("Invalid relay frame: {}. Text: {}", e, text);
                return;
            }
        };

        match frame {
            RelayFrame::Login { .. } => debug!("Login acknowledged by signal server"),
            RelayFrame::Answer { peer, data } => {
                let envelope = SignalEnvelope {
                    peer,
                    payload: data,
                };
                let unclaimed = match Self::claim(pending, &envelope.peer) {
                    Some(waiter) => {
                        if waiter.peer != envelope.peer {
                            info!("Offer to {} answered by {}", waiter.peer, envelope.peer);
                        }
                        waiter.reply.send(envelope).err()
                    }
                    None => Some(envelope),
                };
                if let Some(envelope) = unclaimed {
                    debug!("Unsolicited answer from {}", envelope.peer);
                    let _ = inbox.send(envelope);
                }
            }
            other => {
                if let Some(envelope) = other.into_envelope() {
                    let _ = inbox.send(envelope);
                }
            }
        }
    }

    fn claim(pending: &PendingReplies, from: &PeerName) -> Option<PendingReply> {
        let addressed = pending
            .iter()
            .filter(|entry| entry.value().peer == *from)
            .map(|entry| *entry.key())
            .min();
        let key = addressed.or_else(|| pending.iter().map(|entry| *entry.key()).min())?;
        pending.remove(&key).map(|(_, waiter)| waiter)
    }
}

impl Default for WsSignalingClient {
    fn default() -> Self {
        Self::new(SignalingConfig::default())
    }
}

#[async_trait]
impl SignalingChannel for WsSignalingClient {
    async fn connect(
        &self,
        scheme: &str,
        address: &str,
        identity: &PeerName,
    ) -> Result<(), SignalingError> {
        let raw = format!("{}://{}{}", scheme, address, self.config.path);
        let url = Url::parse(&raw).map_err(|source| SignalingError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        info!("Connecting to signal server: {}", url);
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| SignalingError::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::sender_task(write, out_rx));
        let receiver = tokio::spawn(Self::receiver_task(
            read,
            inbox_tx,
            self.pending.clone(),
            open.clone(),
        ));

        *self.outbound.write().await = Some(Outbound { tx: out_tx, open });
        *self.inbox.lock().await = Some(inbox_rx);
        if let Some(previous) = self.receiver_task.lock().await.replace(receiver) {
            previous.abort();
        }

        self.send_frame(RelayFrame::login(identity.clone())).await?;
        info!("Connected to signal server as {}", identity);
        Ok(())
    }

    async fn publish_and_await_reply(
        &self,
        peer: &PeerName,
        payload: Value,
    ) -> Result<SignalEnvelope, SignalingError> {
        let (tx, rx) = oneshot::channel();
        let request = self.next_request.fetch_add(1, Ordering::SeqCst);
        self.pending.insert(
            request,
            PendingReply {
                peer: peer.clone(),
                reply: tx,
            },
        );

        let frame = RelayFrame::Offer {
            peer: peer.clone(),
            data: payload,
        };
        if let Err(e) = self.send_frame(frame).await {
            self.pending.remove(&request);
            return Err(e);
        }

        match tokio::time::timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            Ok(Err(_)) => Err(SignalingError::Closed),
            Err(_) => {
                self.pending.remove(&request);
                Err(SignalingError::ReplyTimeout {
                    peer: peer.clone(),
                    timeout: self.config.reply_timeout,
                })
            }
        }
    }

    async fn publish(&self, peer: &PeerName, payload: Value) -> Result<(), SignalingError> {
        self.send_frame(RelayFrame::Candidate {
            peer: peer.clone(),
            data: payload,
        })
        .await
    }

    async fn receive_next(&self) -> Result<SignalEnvelope, SignalingError> {
        let mut inbox = self.inbox.lock().await;
        let rx = inbox.as_mut().ok_or(SignalingError::NotConnected)?;
        rx.recv().await.ok_or(SignalingError::Closed)
    }

    async fn disconnect(&self) {
        if let Some(outbound) = self.outbound.write().await.take() {
            let _ = outbound.tx.send(Message::Close(None));
        }
        if let Some(task) = self.receiver_task.lock().await.take() {
            task.abort();
        }
        self.pending.clear();
        info!("Disconnected from signal server");
    }
}
