use crate::reply::{ReplyGenerator, ReplySender};
use crate::telegram::Update;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Forwards chat messages to the reply pipeline on detached tasks.
#[derive(Clone)]
pub struct UpdateRouter {
    generator: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn ReplySender>,
}

impl UpdateRouter {
    pub fn new(generator: Arc<dyn ReplyGenerator>, sender: Arc<dyn ReplySender>) -> Self {
        Self { generator, sender }
    }

    /// Dispatch an authenticated update.
    ///
    /// Only `message` updates are acted on; anything else is dropped. The
    /// reply runs on its own task whose failures (errors or panics) end in
    /// the log. The returned handle may be dropped.
    pub fn route(&self, update: Update) -> Option<JoinHandle<()>> {
        let kind = update.kind();
        let Some(message) = update.message else {
            debug!(
                update_id = update.update_id,
                kind = kind.map(|k| k.as_str()).unwrap_or("none"),
                "ignoring update without message"
            );
            return None;
        };

        let generator = self.generator.clone();
        let sender = self.sender.clone();
        let chat_id = message.chat.id;
        let command = message.text.unwrap_or_default();

        Some(tokio::spawn(async move {
            let pipeline = async {
                let reply = generator.make_reply(chat_id, &command);
                sender.send(&reply).await
            };
            match AssertUnwindSafe(pipeline).catch_unwind().await {
                Ok(Ok(())) => debug!(chat_id, "reply sent"),
                Ok(Err(e)) => error!(chat_id, error = %e, "failed to send reply"),
                Err(panic) => error!(
                    chat_id,
                    panic = panic_message(panic.as_ref()),
                    "reply pipeline panicked"
                ),
            }
        }))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
