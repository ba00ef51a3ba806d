use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Update kinds Telegram can push, in the order they are checked by
/// [`Update::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
}

impl UpdateKind {
    pub const ALL: [UpdateKind; 14] = [
        UpdateKind::Message,
        UpdateKind::EditedMessage,
        UpdateKind::ChannelPost,
        UpdateKind::EditedChannelPost,
        UpdateKind::InlineQuery,
        UpdateKind::ChosenInlineResult,
        UpdateKind::CallbackQuery,
        UpdateKind::ShippingQuery,
        UpdateKind::PreCheckoutQuery,
        UpdateKind::Poll,
        UpdateKind::PollAnswer,
        UpdateKind::MyChatMember,
        UpdateKind::ChatMember,
        UpdateKind::ChatJoinRequest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpdateKind::Message => "message",
            UpdateKind::EditedMessage => "edited_message",
            UpdateKind::ChannelPost => "channel_post",
            UpdateKind::EditedChannelPost => "edited_channel_post",
            UpdateKind::InlineQuery => "inline_query",
            UpdateKind::ChosenInlineResult => "chosen_inline_result",
            UpdateKind::CallbackQuery => "callback_query",
            UpdateKind::ShippingQuery => "shipping_query",
            UpdateKind::PreCheckoutQuery => "pre_checkout_query",
            UpdateKind::Poll => "poll",
            UpdateKind::PollAnswer => "poll_answer",
            UpdateKind::MyChatMember => "my_chat_member",
            UpdateKind::ChatMember => "chat_member",
            UpdateKind::ChatJoinRequest => "chat_join_request",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

/// Inbound webhook payload. Only `message` is typed; the other kinds are
/// kept opaque since nothing acts on them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Value>,
    pub channel_post: Option<Value>,
    pub edited_channel_post: Option<Value>,
    pub inline_query: Option<Value>,
    pub chosen_inline_result: Option<Value>,
    pub callback_query: Option<Value>,
    pub shipping_query: Option<Value>,
    pub pre_checkout_query: Option<Value>,
    pub poll: Option<Value>,
    pub poll_answer: Option<Value>,
    pub my_chat_member: Option<Value>,
    pub chat_member: Option<Value>,
    pub chat_join_request: Option<Value>,
}

impl Update {
    /// First kind present in the envelope, if any.
    pub fn kind(&self) -> Option<UpdateKind> {
        if self.message.is_some() {
            return Some(UpdateKind::Message);
        }
        let opaque = [
            (UpdateKind::EditedMessage, &self.edited_message),
            (UpdateKind::ChannelPost, &self.channel_post),
            (UpdateKind::EditedChannelPost, &self.edited_channel_post),
            (UpdateKind::InlineQuery, &self.inline_query),
            (UpdateKind::ChosenInlineResult, &self.chosen_inline_result),
            (UpdateKind::CallbackQuery, &self.callback_query),
            (UpdateKind::ShippingQuery, &self.shipping_query),
            (UpdateKind::PreCheckoutQuery, &self.pre_checkout_query),
            (UpdateKind::Poll, &self.poll),
            (UpdateKind::PollAnswer, &self.poll_answer),
            (UpdateKind::MyChatMember, &self.my_chat_member),
            (UpdateKind::ChatMember, &self.chat_member),
            (UpdateKind::ChatJoinRequest, &self.chat_join_request),
        ];
        opaque
            .into_iter()
            .find(|(_, v)| v.is_some())
            .map(|(kind, _)| kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Up to 52 significant bits.
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Body of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    ReplyKeyboard(ReplyKeyboardMarkup),
    InlineKeyboard(InlineKeyboardMarkup),
    RemoveKeyboard(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_keyboard: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

/// Asks the client to open a reply to the bot's message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceReply {
    pub force_reply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

/// Body of `setWebhook`.
#[derive(Debug, Clone, Serialize)]
pub struct SetWebhook {
    pub url: String,
    pub secret_token: String,
    pub allowed_updates: Vec<UpdateKind>,
}

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub ok: bool,
    pub result: Option<Value>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_update_with_unknown_fields() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 7,
            "message": {
                "message_id": 11,
                "from": { "id": 5, "is_bot": false, "first_name": "Ann" },
                "chat": { "id": -1001234567890i64, "type": "supergroup", "title": "ops" },
                "date": 1700000000,
                "text": "flip coin",
                "entities": [],
                "reply_to_message": {
                    "message_id": 10,
                    "chat": { "id": -1001234567890i64, "type": "supergroup" },
                    "text": "menu"
                }
            }
        }))
        .unwrap();

        assert_eq!(update.kind(), Some(UpdateKind::Message));
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, -1001234567890);
        assert_eq!(message.chat.chat_type, "supergroup");
        assert_eq!(message.text.as_deref(), Some("flip coin"));
        assert_eq!(
            message.reply_to_message.unwrap().text.as_deref(),
            Some("menu")
        );
    }

    #[test]
    fn kind_reports_first_present_kind() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 8,
            "poll": { "id": "p" },
            "callback_query": { "id": "q", "data": "x" }
        }))
        .unwrap();
        assert_eq!(update.kind(), Some(UpdateKind::CallbackQuery));
        assert!(update.message.is_none());
    }

    #[test]
    fn empty_envelope_has_no_kind() {
        let update: Update = serde_json::from_value(json!({ "update_id": 9 })).unwrap();
        assert_eq!(update.kind(), None);
    }

    #[test]
    fn update_kind_tags_round_trip_through_parse() {
        for kind in UpdateKind::ALL {
            assert_eq!(UpdateKind::parse(kind.as_str()), Some(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        assert_eq!(UpdateKind::parse("business_message"), None);
    }

    #[test]
    fn plain_send_message_omits_markup() {
        let body = serde_json::to_value(SendMessage::text(42, "pong")).unwrap();
        assert_eq!(body, json!({ "chat_id": 42, "text": "pong" }));
    }

    #[test]
    fn keyboard_markup_serializes_flat() {
        let msg = SendMessage {
            chat_id: 1,
            text: "menu".into(),
            reply_markup: Some(ReplyMarkup::ReplyKeyboard(ReplyKeyboardMarkup {
                keyboard: vec![vec![KeyboardButton { text: "a".into() }]],
                resize_keyboard: Some(true),
                one_time_keyboard: None,
            })),
        };
        let body = serde_json::to_value(msg).unwrap();
        assert_eq!(
            body["reply_markup"],
            json!({ "keyboard": [[{ "text": "a" }]], "resize_keyboard": true })
        );
    }

    #[test]
    fn inline_markup_deserializes_to_inline_variant() {
        let markup: ReplyMarkup = serde_json::from_value(json!({
            "inline_keyboard": [[{ "text": "open", "url": "https://example.org" }]]
        }))
        .unwrap();
        assert!(matches!(markup, ReplyMarkup::InlineKeyboard(_)));
    }

    #[test]
    fn force_reply_markup_is_its_own_variant() {
        let markup = ReplyMarkup::ForceReply(ForceReply {
            force_reply: true,
            input_field_placeholder: Some("your guess".into()),
            selective: None,
        });
        let value = serde_json::to_value(&markup).unwrap();
        assert_eq!(
            value,
            json!({ "force_reply": true, "input_field_placeholder": "your guess" })
        );

        let parsed: ReplyMarkup = serde_json::from_value(json!({ "force_reply": true })).unwrap();
        match parsed {
            ReplyMarkup::ForceReply(force) => {
                assert!(force.force_reply);
                assert_eq!(force.input_field_placeholder, None);
            }
            other => panic!("unexpected markup: {other:?}"),
        }
    }

    #[test]
    fn set_webhook_body_shape() {
        let body = serde_json::to_value(SetWebhook {
            url: "https://bot.example/hook".into(),
            secret_token: "s3cr3t".into(),
            allowed_updates: vec![UpdateKind::Message, UpdateKind::CallbackQuery],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "url": "https://bot.example/hook",
                "secret_token": "s3cr3t",
                "allowed_updates": ["message", "callback_query"]
            })
        );
    }
}
