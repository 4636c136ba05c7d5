//! The per-node chat application: send API, inbound message dispatch, the
//! channel membership protocol, and user command handling
//!
//! A [ChatApp] is the application layer the overlay delivers into. It
//! classifies every inbound message by variant, runs the join/leave protocol
//! for channels this node currently owns, fans broadcasts out to channel
//! members, and notifies the registered [ChatListener] of everything
//! user-visible.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex as ListenerMutex;
use tokio::sync::Mutex;

use crate::channels::Channels;
use crate::command::{Command, HELP_LINES};
use crate::id::NodeId;
use crate::listener::ChatListener;
use crate::msg::{
    AdminAction, AdminPhase, ChannelAdminMsg, ChannelBroadcastMsg, ChannelMsg, ChatMessage,
    PrivateMsg,
};
use crate::overlay::{Application, NodeHandle, Overlay};
use crate::store::ChannelStore;

/// The main interface for one chat participant - holds the overlay endpoint,
/// the channel store access layer, and the registered UI listener.
///
/// Should be wrapped in an `Arc`; [ChatApp::new] returns one.
pub struct ChatApp {
    /// Nickname this node participates under; also the feed its identifier
    /// is derived from
    nickname: String,
    /// This node's identifier, `NodeId::derive(nickname)`
    node_id: NodeId,
    /// Overlay endpoint; the lock makes message construction and routing one
    /// exclusive critical section, so concurrently triggered sends cannot
    /// interleave
    endpoint: Mutex<Arc<dyn Overlay>>,
    /// Registered UI listener; the lock serializes registration and every
    /// callback invocation
    listener: ListenerMutex<Option<Box<dyn ChatListener>>>,
    /// Typed access to the external channel store
    channels: Channels,
    /// Handle to self for spawning continuations off the delivery path
    this: Weak<ChatApp>,
}

impl ChatApp {
    /// Create a new chat application for `nickname`, sending through
    /// `overlay` and persisting channel membership in `store`
    pub fn new(
        nickname: impl Into<String>,
        overlay: Arc<dyn Overlay>,
        store: Arc<dyn ChannelStore>,
    ) -> Arc<Self> {
        let nickname = nickname.into();
        let node_id = NodeId::derive(&nickname);

        Arc::new_cyclic(|this| Self {
            nickname,
            node_id,
            endpoint: Mutex::new(overlay),
            listener: ListenerMutex::new(None),
            channels: Channels::new(store),
            this: this.clone(),
        })
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Register the UI listener, injecting a handle to this app into it.
    /// Exactly one listener is registered at a time; a second registration
    /// replaces the first.
    pub fn register_listener(self: &Arc<Self>, mut listener: Box<dyn ChatListener>) {
        let mut guard = self.listener.lock();
        listener.set_chat_app(Arc::clone(self));
        *guard = Some(listener);
    }

    /// Run `f` against the registered listener, if any, under the listener
    /// lock
    fn with_listener(&self, f: impl FnOnce(&mut dyn ChatListener)) {
        let mut guard = self.listener.lock();
        if let Some(listener) = guard.as_deref_mut() {
            f(listener);
        }
    }

    /// Build-and-route critical section shared by every sending path.
    /// Routing failures are logged and absorbed; no error propagates to the
    /// caller.
    async fn route(&self, target: NodeId, msg: ChatMessage, direct: Option<NodeHandle>) {
        let endpoint = self.endpoint.lock().await;
        if let Err(e) = endpoint.route(target, msg, direct).await {
            log::error!("Failed to route message toward {}: {}", target.short(), e);
        }
    }

    /// Route a private message toward the node addressed by `to_name`
    pub async fn send_private_msg(&self, to_name: &str, text: &str) {
        let to = NodeId::derive(to_name);
        let msg = ChatMessage::Private(PrivateMsg {
            from: self.node_id,
            from_name: self.nickname.clone(),
            to,
            to_name: to_name.to_owned(),
            text: text.to_owned(),
        });

        self.route(to, msg, None).await;
    }

    /// Send a private message straight to an already-known node handle,
    /// bypassing identifier routing
    pub async fn send_private_msg_direct(&self, handle: NodeHandle, to_name: &str, text: &str) {
        let msg = ChatMessage::Private(PrivateMsg {
            from: self.node_id,
            from_name: self.nickname.clone(),
            to: handle.id,
            to_name: to_name.to_owned(),
            text: text.to_owned(),
        });

        self.route(handle.id, msg, Some(handle)).await;
    }

    /// Route a broadcast request to the owner of `channel_name`, who fans it
    /// out to the current members
    pub async fn send_channel_broadcast(&self, channel_name: &str, text: &str) {
        let channel_id = NodeId::derive(channel_name);
        let msg = ChatMessage::ChannelBroadcast(ChannelBroadcastMsg {
            client_id: self.node_id,
            client_name: self.nickname.clone(),
            channel_id,
            channel_name: channel_name.to_owned(),
            text: text.to_owned(),
        });

        self.route(channel_id, msg, None).await;
    }

    /// Send a join request to the owner of `channel_name`
    pub async fn send_join_request(&self, channel_name: &str) {
        self.send_admin_request(channel_name, AdminAction::Join).await;
    }

    /// Send a leave request to the owner of `channel_name`
    pub async fn send_leave_request(&self, channel_name: &str) {
        self.send_admin_request(channel_name, AdminAction::Leave).await;
    }

    async fn send_admin_request(&self, channel_name: &str, action: AdminAction) {
        let channel_id = NodeId::derive(channel_name);
        let msg = ChatMessage::ChannelAdmin(ChannelAdminMsg {
            client_id: self.node_id,
            client_name: self.nickname.clone(),
            channel_id,
            channel_name: channel_name.to_owned(),
            action,
            phase: AdminPhase::Request,
        });

        self.route(channel_id, msg, None).await;
    }

    /// Interpret one line of user input, issuing at most one routed message
    /// or listener notification
    pub async fn handle_command(&self, input: &str) {
        match Command::parse(input) {
            Command::Quit => self.with_listener(|l| l.on_quit()),
            Command::Help => self.with_listener(|l| {
                for line in HELP_LINES {
                    l.on_println(line);
                }
            }),
            Command::Join(channel) => self.send_join_request(&channel).await,
            Command::Leave(channel) => self.send_leave_request(&channel).await,
            Command::Msg { user, text } => self.send_private_msg(&user, &text).await,
            Command::Send { channel, text } => self.send_channel_broadcast(&channel, &text).await,
            Command::Unknown => self.with_listener(|l| l.on_println("Command unknown. Try 'help'.")),
        }
    }

    /// Fan a broadcast out to every current member of the channel. Runs at
    /// the node that owns the channel's identifier.
    ///
    /// Each member receives exactly one [ChannelMsg] carrying the original
    /// sender identity and text; no acknowledgment is collected.
    async fn fan_out(&self, broadcast: ChannelBroadcastMsg) {
        let record = match self.channels.fetch_or_create(&broadcast.channel_name).await {
            Ok(record) => record,
            Err(e) => {
                log::error!(
                    "Failed to fetch channel '{}' for broadcast: {}",
                    broadcast.channel_name,
                    e
                );
                return;
            }
        };

        for member in record.members() {
            let to = NodeId::derive(member);
            let msg = ChatMessage::Channel(ChannelMsg {
                from: broadcast.client_id,
                from_name: broadcast.client_name.clone(),
                to,
                to_name: member.clone(),
                channel_id: broadcast.channel_id,
                channel_name: broadcast.channel_name.clone(),
                text: broadcast.text.clone(),
            });

            self.route(to, msg, None).await;
        }
    }

    /// Apply a join/leave request against the channel record and reply to the
    /// requester. Runs at the node that owns the channel's identifier.
    ///
    /// The cycle is fetch, mutate, persist, reply; if the persist fails the
    /// failure is logged and no reply is sent, leaving the requester without
    /// a confirmation (there is no negative acknowledgment path).
    async fn handle_admin_request(&self, admin: ChannelAdminMsg) {
        let client_name = admin.client_name.clone();
        let result = match admin.action {
            AdminAction::Join => {
                self.channels
                    .update(&admin.channel_name, |record| record.add_member(&client_name))
                    .await
            }
            AdminAction::Leave => {
                self.channels
                    .update(&admin.channel_name, |record| record.remove_member(&client_name))
                    .await
            }
        };

        if let Err(e) = result {
            log::error!("Failed to update channel '{}': {}", admin.channel_name, e);
            return;
        }

        let target = NodeId::derive(&admin.client_name);
        self.route(target, ChatMessage::ChannelAdmin(admin.accepted()), None)
            .await;
    }

    /// Handle an accepted-phase reply to a join/leave request this node sent
    fn handle_admin_accepted(&self, admin: &ChannelAdminMsg) {
        // stale or misdirected echo of someone else's request
        if admin.client_name != self.nickname {
            return;
        }

        let text = match admin.action {
            AdminAction::Join => format!("Joined channel '{}'.", admin.channel_name),
            AdminAction::Leave => format!("Left channel '{}'.", admin.channel_name),
        };
        self.with_listener(|l| l.on_println(&text));
    }
}

#[async_trait]
impl Application for ChatApp {
    async fn deliver(&self, msg: ChatMessage) {
        match msg {
            ChatMessage::Private(msg) => {
                // misrouted; the overlay only approximates delivery
                if msg.to != self.node_id {
                    return;
                }
                self.with_listener(|l| l.on_private_message(&msg));
            }

            ChatMessage::Channel(msg) => {
                if msg.to != self.node_id {
                    return;
                }
                self.with_listener(|l| l.on_channel_message(&msg));
            }

            // the store round trip runs as its own task so the overlay's
            // delivery thread never stalls on channel-store I/O
            ChatMessage::ChannelBroadcast(broadcast) => {
                if let Some(app) = self.this.upgrade() {
                    tokio::spawn(async move { app.fan_out(broadcast).await });
                }
            }

            ChatMessage::ChannelAdmin(admin) => match admin.phase {
                AdminPhase::Request => {
                    if let Some(app) = self.this.upgrade() {
                        tokio::spawn(async move { app.handle_admin_request(admin).await });
                    }
                }
                AdminPhase::Accepted => self.handle_admin_accepted(&admin),
            },
        }
    }

    fn neighbor_update(&self, node: NodeHandle, joined: bool) {
        self.with_listener(|l| {
            if joined {
                l.on_node_connected(&node);
            } else {
                l.on_node_disconnected(&node);
            }
        });
    }
}
