//! Definitions for all messages that may be exchanged between nodes
//!
//! Every chat message declares [Priority::Low] so that application traffic
//! never starves the overlay's own maintenance traffic.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Transport scheduling priority declared by a routed message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Overlay maintenance traffic
    High,
    /// Interactive application traffic
    Medium,
    /// Bulk application traffic that must yield to ring maintenance
    Low,
}

/// An enumeration over all application layer messages that may be routed
/// between nodes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMessage {
    /// Direct node-to-node text
    Private(PrivateMsg),
    /// Channel owner to one subscriber, the unit of broadcast fan-out
    Channel(ChannelMsg),
    /// Subscriber to channel owner, requesting fan-out to all members
    ChannelBroadcast(ChannelBroadcastMsg),
    /// Membership protocol message
    ChannelAdmin(ChannelAdminMsg),
}

impl ChatMessage {
    /// Scheduling priority of this message; chat traffic is always low
    pub const fn priority(&self) -> Priority {
        Priority::Low
    }
}

/// A private message routed directly to the recipient's identifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMsg {
    /// Identifier of the sending node
    pub from: NodeId,
    pub from_name: String,
    /// Identifier the message is addressed to; receivers discard messages
    /// whose `to` is not their own identifier
    pub to: NodeId,
    pub to_name: String,
    pub text: String,
}

/// One fan-out copy of a channel broadcast, sent by the channel owner to a
/// single subscriber
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMsg {
    /// Identifier of the original sender, not of the channel owner relaying
    /// the broadcast
    pub from: NodeId,
    pub from_name: String,
    pub to: NodeId,
    pub to_name: String,
    pub channel_id: NodeId,
    pub channel_name: String,
    pub text: String,
}

/// A broadcast request routed toward the channel's identifier, to be fanned
/// out by whichever node currently owns the channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBroadcastMsg {
    pub client_id: NodeId,
    pub client_name: String,
    pub channel_id: NodeId,
    pub channel_name: String,
    pub text: String,
}

/// Membership action carried by a [ChannelAdminMsg]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    Join,
    Leave,
}

/// Phase of the membership protocol a [ChannelAdminMsg] is in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminPhase {
    /// Client to channel owner
    Request,
    /// Channel owner back to the client after the membership list was updated
    Accepted,
}

/// Channel administration message used for distributing membership actions
/// such as a client joining or leaving
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAdminMsg {
    pub client_id: NodeId,
    pub client_name: String,
    pub channel_id: NodeId,
    pub channel_name: String,
    pub action: AdminAction,
    pub phase: AdminPhase,
}

impl ChannelAdminMsg {
    /// Rewrite this request as its accepted-phase reply, the only field a
    /// message ever changes in
    pub fn accepted(self) -> Self {
        Self {
            phase: AdminPhase::Accepted,
            ..self
        }
    }
}
