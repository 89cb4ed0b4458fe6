//! Append-only message log with progressive reveal.

use std::time::Duration;

use guidepost_core::domain::message::{Message, MessageId, Role};
use tokio::sync::watch;

use crate::pacing::{Cancelled, Pacer};

/// Messages are stored in the watch channel itself, so observers always see
/// the latest log. Only a `streaming` message is ever edited.
#[derive(Debug)]
pub struct Transcript {
    sender: watch::Sender<Vec<Message>>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.sender.subscribe()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.sender.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sender.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, message: Message) -> MessageId {
        let id = message.id.clone();
        self.sender.send_modify(|messages| messages.push(message));
        id
    }

    /// Appends an empty `streaming` message and reveals `text` one character
    /// per `char_delay`. A zero delay reveals everything at once.
    pub async fn stream(
        &self,
        pacer: &Pacer,
        role: Role,
        text: &str,
        char_delay: Duration,
    ) -> Result<MessageId, Cancelled> {
        pacer.checkpoint()?;
        let mut message = Message::new(role, "");
        message.streaming = true;
        let id = self.push(message);

        if char_delay.is_zero() {
            self.edit(pacer, &id, |message| message.content.push_str(text))?;
        } else {
            for character in text.chars() {
                pacer.pause(char_delay).await?;
                self.edit(pacer, &id, |message| message.content.push(character))?;
            }
        }

        self.edit(pacer, &id, |message| message.streaming = false)?;
        Ok(id)
    }

    pub fn clear(&self) {
        self.sender.send_modify(Vec::clear);
    }

    fn edit<F>(&self, pacer: &Pacer, id: &MessageId, apply: F) -> Result<(), Cancelled>
    where
        F: FnOnce(&mut Message),
    {
        let mut cancelled = false;
        self.sender.send_if_modified(|messages| {
            if pacer.is_cancelled() {
                cancelled = true;
                return false;
            }
            match messages.iter_mut().rev().find(|message| &message.id == id && message.streaming) {
                Some(message) => {
                    apply(message);
                    true
                }
                None => false,
            }
        });
        if cancelled {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
