//! Reply pipeline: turn an inbound command into an outgoing message, and
//! send it back through the Bot API.

use crate::error::Result;
use crate::telegram::types::{KeyboardButton, ReplyKeyboardMarkup};
use crate::telegram::{ReplyMarkup, SendMessage, TelegramClient};
use async_trait::async_trait;
use rand::Rng;

/// Pure mapping from chat + command text to the reply to send.
pub trait ReplyGenerator: Send + Sync {
    fn make_reply(&self, chat_id: i64, command: &str) -> SendMessage;
}

/// Delivers one outgoing message. Single attempt, no retry.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, outgoing: &SendMessage) -> Result<()>;
}

#[async_trait]
impl ReplySender for TelegramClient {
    async fn send(&self, outgoing: &SendMessage) -> Result<()> {
        self.send_message(outgoing).await
    }
}

const FLIP_COIN: &str = "flip coin";
const RANDOM_NUMBER: &str = "random 1-10";

/// Default generator: a two-button menu with a coin flip and a dice roll.
pub struct CommandMenu;

impl ReplyGenerator for CommandMenu {
    fn make_reply(&self, chat_id: i64, command: &str) -> SendMessage {
        let command = command.trim().to_lowercase();
        let mut rng = rand::thread_rng();

        match command.as_str() {
            FLIP_COIN => {
                let text = if rng.gen_bool(0.5) {
                    "It's heads!"
                } else {
                    "It's tails!"
                };
                SendMessage::text(chat_id, text)
            }
            RANDOM_NUMBER => {
                let n: u8 = rng.gen_range(1..=10);
                SendMessage::text(chat_id, format!("Your number is {n}!"))
            }
            _ => SendMessage {
                chat_id,
                text: "Hey there! 👋 Here is your menu.".to_string(),
                reply_markup: Some(ReplyMarkup::ReplyKeyboard(ReplyKeyboardMarkup {
                    keyboard: vec![vec![
                        KeyboardButton {
                            text: FLIP_COIN.to_string(),
                        },
                        KeyboardButton {
                            text: RANDOM_NUMBER.to_string(),
                        },
                    ]],
                    ..Default::default()
                })),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_coin_answers_heads_or_tails() {
        for _ in 0..20 {
            let reply = CommandMenu.make_reply(7, "flip coin");
            assert_eq!(reply.chat_id, 7);
            assert!(reply.text == "It's heads!" || reply.text == "It's tails!");
            assert!(reply.reply_markup.is_none());
        }
    }

    #[test]
    fn random_number_is_between_one_and_ten() {
        for _ in 0..50 {
            let reply = CommandMenu.make_reply(7, "random 1-10");
            let n: u8 = reply
                .text
                .strip_prefix("Your number is ")
                .and_then(|rest| rest.strip_suffix('!'))
                .and_then(|n| n.parse().ok())
                .unwrap();
            assert!((1..=10).contains(&n));
        }
    }

    #[test]
    fn commands_are_normalized() {
        let reply = CommandMenu.make_reply(7, "  FLIP Coin \n");
        assert!(reply.text.starts_with("It's "));
    }

    #[test]
    fn unknown_command_shows_menu() {
        let reply = CommandMenu.make_reply(-100, "/start");
        assert_eq!(reply.chat_id, -100);
        assert_eq!(reply.text, "Hey there! 👋 Here is your menu.");
        match reply.reply_markup {
            Some(ReplyMarkup::ReplyKeyboard(markup)) => {
                let labels: Vec<_> = markup.keyboard[0].iter().map(|b| b.text.as_str()).collect();
                assert_eq!(labels, ["flip coin", "random 1-10"]);
            }
            other => panic!("unexpected markup: {other:?}"),
        }
    }

    #[test]
    fn empty_command_shows_menu() {
        let reply = CommandMenu.make_reply(1, "");
        assert!(reply.reply_markup.is_some());
    }
}
