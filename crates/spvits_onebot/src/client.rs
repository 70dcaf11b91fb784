use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use spvits_core::{Reply, ReplySink};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::event::{ChatTarget, InboundMessage, MessageSegment, OneBotEvent, SendMessageAction};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How many of our own text replies to remember for echo suppression.
const SENT_HISTORY: usize = 32;

/// Texts this client sent recently. Their `message_sent` echoes must not be
/// mistaken for generated replies and voiced.
#[derive(Debug, Default, Clone)]
pub struct SentHistory(Arc<Mutex<VecDeque<String>>>);

impl SentHistory {
    pub fn remember(&self, text: &str) {
        let Ok(mut sent) = self.0.lock() else { return };
        if sent.len() == SENT_HISTORY {
            sent.pop_front();
        }
        sent.push_back(text.to_string());
    }

    /// True (and forgets it) if `text` is one of ours.
    pub fn take(&self, text: &str) -> bool {
        let Ok(mut sent) = self.0.lock() else { return false };
        match sent.iter().position(|s| s == text) {
            Some(idx) => {
                sent.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Strip CQ codes (`[CQ:record,...]`, `[CQ:at,...]`) and unescape the rest.
pub fn plain_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("[CQ:") {
        out.push_str(&rest[..start]);
        match rest[start..].find(']') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&#44;", ",")
        .replace("&amp;", "&")
}

/// Turn a decoded event into something the serve loop cares about.
pub fn to_inbound(event: OneBotEvent, sent: &SentHistory) -> Option<InboundMessage> {
    match event {
        OneBotEvent::Message(msg) => {
            let target = msg.target(false);
            Some(InboundMessage::User {
                target,
                content: msg.into_content(target),
            })
        }
        OneBotEvent::MessageSent(mut msg) => {
            let text = plain_text(&msg.raw_message);
            if text.trim().is_empty() || sent.take(&text) {
                return None;
            }
            let target = msg.target(true);
            msg.raw_message = text;
            Some(InboundMessage::BotReply {
                target,
                content: msg.into_content(target),
            })
        }
        _ => None,
    }
}

/// Hand an inbound message to the serve loop without blocking the socket task.
/// A full queue drops the message. Returns false once the receiver is gone.
pub fn forward_inbound(inbound_tx: &mpsc::Sender<InboundMessage>, inbound: InboundMessage) -> bool {
    match inbound_tx.try_send(inbound) {
        Ok(()) => true,
        Err(TrySendError::Full(dropped)) => {
            tracing::warn!("Inbound queue full, dropping message: {:?}", dropped);
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// `file://` URL the OneBot implementation can read the clip from.
pub fn file_url(path: &Path) -> Result<String> {
    let abs = std::fs::canonicalize(path)
        .with_context(|| format!("Clip not found: {}", path.display()))?;
    let url = Url::from_file_path(&abs)
        .map_err(|_| anyhow::anyhow!("Not an absolute path: {}", abs.display()))?;
    Ok(url.to_string())
}

pub struct OneBotClient {
    tx: mpsc::Sender<String>, // Channel to send outgoing messages to WS task
    sent: SentHistory,
}

impl OneBotClient {
    pub fn new(url: &str, access_token: Option<String>) -> Result<(Self, mpsc::Receiver<InboundMessage>)> {
        let ws_url = Url::parse(url).context("Invalid OneBot WS URL")?;
        let (tx, mut rx) = mpsc::channel::<String>(32);
        let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(32);
        let sent = SentHistory::default();

        let client = Self { tx, sent: sent.clone() };

        // Spawn the WebSocket handler task
        tokio::spawn(async move {
            let mut retry_count = 0;
            loop {
                tracing::info!("Connecting to OneBot at {}...", ws_url);
                let request = match Self::build_request(&ws_url, access_token.as_deref()) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::error!("Invalid OneBot handshake request: {}", e);
                        return;
                    }
                };
                match connect_async(request).await {
                    Ok((ws_stream, _)) => {
                        tracing::info!("Connected to OneBot!");
                        retry_count = 0; // Reset retry count on success
                        if let Err(e) = Self::handle_connection(ws_stream, &mut rx, &inbound_tx, &sent).await {
                            tracing::error!("OneBot connection error: {}", e);
                        }
                        if inbound_tx.is_closed() {
                            tracing::info!("Inbound receiver dropped, stopping OneBot task");
                            return;
                        }
                    }
                    Err(e) => {
                        let wait_secs = 5u64.min(2u64.pow(retry_count));
                        tracing::error!("Failed to connect to OneBot: {}. Retrying in {}s...", e, wait_secs);
                        tokio::time::sleep(tokio::time::Duration::from_secs(wait_secs)).await;
                        if retry_count < 6 { retry_count += 1; }
                        continue;
                    }
                }
                // Connection lost. Wait before reconnect.
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        });

        Ok((client, inbound_rx))
    }

    fn build_request(
        ws_url: &Url,
        access_token: Option<&str>,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = ws_url.as_str().into_client_request()?;
        if let Some(token) = access_token {
            request
                .headers_mut()
                .insert("Authorization", HeaderValue::from_str(&format!("Bearer {}", token))?);
        }
        Ok(request)
    }

    async fn handle_connection(
        stream: WsStream,
        rx: &mut mpsc::Receiver<String>,
        inbound_tx: &mpsc::Sender<InboundMessage>,
        sent: &SentHistory,
    ) -> Result<()> {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                // Incoming events from OneBot
                msg = read.next() => {
                    let Some(msg) = msg else {
                        anyhow::bail!("OneBot closed the connection");
                    };
                    if let Message::Text(text) = msg? {
                        match serde_json::from_str::<OneBotEvent>(&text) {
                            Ok(event) => {
                                if let Some(inbound) = to_inbound(event, sent) {
                                    if !forward_inbound(inbound_tx, inbound) {
                                        return Ok(());
                                    }
                                }
                            }
                            Err(_) => {
                                // API responses (echo/retcode) land here too
                                tracing::debug!("Ignored non-event frame or parse error.");
                            }
                        }
                    }
                }

                // Outgoing actions to OneBot (from send_reply)
                Some(json_payload) = rx.recv() => {
                    write.send(Message::Text(json_payload)).await?;
                }
            }
        }
    }

    pub async fn send_reply(&self, target: ChatTarget, reply: &Reply) -> Result<()> {
        let segment = match reply {
            Reply::Text(text) => {
                self.sent.remember(text);
                MessageSegment::Text { text: text.clone() }
            }
            Reply::Voice(path) => MessageSegment::Record { file: file_url(path)? },
        };
        let payload = SendMessageAction::new(target, vec![segment]);
        let json = serde_json::to_string(&payload)?;
        self.tx.send(json).await.map_err(|_| anyhow::anyhow!("WS task dropped"))?;
        Ok(())
    }

    /// A sink bound to one chat, for streaming voice clips into it.
    pub fn sink(&self, target: ChatTarget) -> ChatSink<'_> {
        ChatSink { client: self, target }
    }
}

pub struct ChatSink<'a> {
    client: &'a OneBotClient,
    target: ChatTarget,
}

#[async_trait]
impl ReplySink for ChatSink<'_> {
    async fn send(&self, reply: Reply) -> Result<()> {
        self.client.send_reply(self.target, &reply).await
    }
}
