//! Console implementation of the chat listener contract

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ringchat_framework::msg::{ChannelMsg, PrivateMsg};
use ringchat_framework::{ChatApp, ChatListener, NodeHandle};

/// Listener printing chat events to stdout; `quit` flips the shared end flag
/// the input loop polls
pub struct Console {
    end: Arc<AtomicBool>,
}

impl Console {
    pub fn new(end: Arc<AtomicBool>) -> Self {
        Self { end }
    }
}

impl ChatListener for Console {
    fn set_chat_app(&mut self, _app: Arc<ChatApp>) {}

    fn on_node_connected(&mut self, node: &NodeHandle) {
        println!("{} connected.", node);
    }

    fn on_node_disconnected(&mut self, node: &NodeHandle) {
        println!("{} disconnected.", node);
    }

    fn on_private_message(&mut self, msg: &PrivateMsg) {
        println!("{} --> {}: {}", msg.from_name, msg.to_name, msg.text);
    }

    fn on_channel_message(&mut self, msg: &ChannelMsg) {
        println!("{} @ {}: {}", msg.from_name, msg.channel_name, msg.text);
    }

    fn on_quit(&mut self) {
        self.end.store(true, Ordering::SeqCst);
    }

    fn on_println(&mut self, text: &str) {
        println!("{}", text);
    }
}
