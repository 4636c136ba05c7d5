//! The notification contract exposed to the surrounding application
//!
//! Implemented by user interfaces (console loop, GUI) and registered on a
//! [ChatApp](crate::app::ChatApp). All callbacks are invoked under one
//! exclusive lock held by the app, so a listener always observes events in a
//! strict total order and never concurrently.

use std::sync::Arc;

use crate::app::ChatApp;
use crate::msg::{ChannelMsg, PrivateMsg};
use crate::overlay::NodeHandle;

/// Event listener notified whenever something happens in the associated
/// [ChatApp]
pub trait ChatListener: Send {
    /// Called once on registration to inject the owning app handle
    fn set_chat_app(&mut self, app: Arc<ChatApp>);

    /// A node connected to the ring, as seen from this node
    fn on_node_connected(&mut self, node: &NodeHandle);

    /// A node disconnected from the ring, as seen from this node
    fn on_node_disconnected(&mut self, node: &NodeHandle);

    /// A private message addressed to this node arrived
    fn on_private_message(&mut self, msg: &PrivateMsg);

    /// A channel message addressed to this node arrived
    fn on_channel_message(&mut self, msg: &ChannelMsg);

    /// The user asked to quit
    fn on_quit(&mut self);

    /// The app wants to show the user a system message, such as a join
    /// confirmation or command feedback
    fn on_println(&mut self, text: &str);
}
