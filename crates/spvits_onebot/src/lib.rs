//! OneBot v11 host adapter: receives chat events over a forward WebSocket
//! and posts text and voice (`record`) replies back.

mod client;
mod event;

pub use client::{file_url, forward_inbound, plain_text, to_inbound, ChatSink, OneBotClient, SentHistory};
pub use event::{
    ChatTarget, InboundMessage, MessageEvent, MessageSegment, MetaEvent, OneBotEvent,
    SendMessageAction, SendMessageParams, Sender,
};
