use serde::{Deserialize, Serialize};
use spvits_core::Content;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "post_type")]
pub enum OneBotEvent {
    #[serde(rename = "message")]
    Message(MessageEvent),
    /// Messages the bot account itself sent (reported by go-cqhttp, NapCat, Lagrange)
    #[serde(rename = "message_sent")]
    MessageSent(MessageEvent),
    #[serde(rename = "meta_event")]
    Meta(MetaEvent),
    #[serde(rename = "notice")]
    Notice(serde_json::Value),
    #[serde(rename = "request")]
    Request(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_type: String, // "private" or "group"
    pub sub_type: Option<String>,
    #[serde(default)]
    pub message_id: i64,
    pub user_id: i64,
    pub group_id: Option<i64>,
    /// Peer of a private `message_sent`; `user_id` is the bot itself there
    #[serde(default)]
    pub target_id: Option<i64>,
    pub raw_message: String,
    #[serde(default)]
    pub sender: Option<Sender>,
    pub time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: Option<i64>,
    pub nickname: Option<String>,
    pub card: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "meta_event_type")]
pub enum MetaEvent {
    #[serde(rename = "heartbeat")]
    Heartbeat {
        time: i64,
        status: serde_json::Value,
        interval: i64,
    },
    #[serde(rename = "lifecycle")]
    Lifecycle {
        time: i64,
        sub_type: String,
    },
}

/// Where a reply should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTarget {
    Private(i64),
    Group(i64),
}

impl ChatTarget {
    pub fn source(&self) -> String {
        match self {
            ChatTarget::Private(_) => "onebot:private".to_string(),
            ChatTarget::Group(id) => format!("onebot:group:{}", id),
        }
    }
}

impl MessageEvent {
    /// Chat this message belongs to. For the bot's own private messages
    /// that is the peer, not the bot.
    pub fn target(&self, sent_by_self: bool) -> ChatTarget {
        match self.group_id {
            Some(group_id) => ChatTarget::Group(group_id),
            None if sent_by_self => ChatTarget::Private(self.target_id.unwrap_or(self.user_id)),
            None => ChatTarget::Private(self.user_id),
        }
    }

    pub fn into_content(self, target: ChatTarget) -> Content {
        let mut content = Content::new(target.source(), self.user_id.to_string(), self.raw_message);
        content.timestamp = self.time;
        content
    }
}

/// What the adapter hands to the serve loop.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Someone wrote to the bot; candidate for a command
    User { target: ChatTarget, content: Content },
    /// The bot account's own text reply, i.e. a generated answer
    BotReply { target: ChatTarget, content: Content },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageSegment {
    Text { text: String },
    Record { file: String },
}

#[derive(Debug, Serialize)]
pub struct SendMessageAction {
    pub action: String,
    pub params: SendMessageParams,
}

#[derive(Debug, Serialize)]
pub struct SendMessageParams {
    pub message_type: String,
    pub user_id: Option<i64>,
    pub group_id: Option<i64>,
    pub message: Vec<MessageSegment>,
}

impl SendMessageAction {
    pub fn new(target: ChatTarget, message: Vec<MessageSegment>) -> Self {
        let (action, message_type, user_id, group_id) = match target {
            ChatTarget::Private(id) => ("send_private_msg", "private", Some(id), None),
            ChatTarget::Group(id) => ("send_group_msg", "group", None, Some(id)),
        };
        Self {
            action: action.to_string(),
            params: SendMessageParams {
                message_type: message_type.to_string(),
                user_id,
                group_id,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_group_message() {
        let raw = json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 42,
            "user_id": 10001,
            "group_id": 20002,
            "raw_message": "/say 你好",
            "font": 0,
            "sender": {"user_id": 10001, "nickname": "alice"},
            "time": 1700000000
        });
        let event: OneBotEvent = serde_json::from_value(raw).unwrap();
        match event {
            OneBotEvent::Message(msg) => {
                assert_eq!(msg.target(false), ChatTarget::Group(20002));
                let content = msg.into_content(ChatTarget::Group(20002));
                assert_eq!(content.source, "onebot:group:20002");
                assert_eq!(content.author, "10001");
                assert_eq!(content.body, "/say 你好");
                assert_eq!(content.timestamp, 1700000000);
            }
            other => panic!("Expected message event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_private_message_sent_targets_peer() {
        let raw = json!({
            "post_type": "message_sent",
            "message_type": "private",
            "sub_type": "friend",
            "message_id": 7,
            "user_id": 99999,
            "target_id": 10001,
            "raw_message": "今天天气不错！",
            "time": 1700000001
        });
        let event: OneBotEvent = serde_json::from_value(raw).unwrap();
        match event {
            OneBotEvent::MessageSent(msg) => {
                assert_eq!(msg.target(true), ChatTarget::Private(10001));
            }
            other => panic!("Expected message_sent event, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_heartbeat() {
        let raw = json!({
            "post_type": "meta_event",
            "meta_event_type": "heartbeat",
            "time": 1700000000,
            "status": {"online": true},
            "interval": 5000
        });
        let event: OneBotEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, OneBotEvent::Meta(MetaEvent::Heartbeat { .. })));
    }

    #[test]
    fn test_record_action_serialization() {
        let action = SendMessageAction::new(
            ChatTarget::Group(20002),
            vec![MessageSegment::Record {
                file: "file:///tmp/temp/vits_1.wav".into(),
            }],
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], "send_group_msg");
        assert_eq!(value["params"]["group_id"], 20002);
        assert_eq!(value["params"]["message"][0]["type"], "record");
        assert_eq!(
            value["params"]["message"][0]["data"]["file"],
            "file:///tmp/temp/vits_1.wav"
        );
    }

    #[test]
    fn test_text_action_serialization() {
        let action = SendMessageAction::new(
            ChatTarget::Private(10001),
            vec![MessageSegment::Text { text: "已开启LLM回复语音模式".into() }],
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], "send_private_msg");
        assert_eq!(value["params"]["user_id"], 10001);
        assert_eq!(value["params"]["message"][0]["type"], "text");
        assert_eq!(value["params"]["message"][0]["data"]["text"], "已开启LLM回复语音模式");
    }
}
