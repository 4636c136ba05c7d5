//! # Ringchat Protocol
//!
//! A crate implementing a channel-based chat protocol over a
//! content-addressable overlay network: every participant and every channel
//! has a deterministic identifier in a shared address space, and messages are
//! routed to whichever node currently owns the identifier nearest the target.
//!
//! All operations can be accessed by the [ChatApp](app::ChatApp) struct,
//! which is created wrapped in an `Arc`. The overlay transport and the
//! replicated channel store are external collaborators consumed through the
//! [Overlay](overlay::Overlay) and [ChannelStore](store::ChannelStore)
//! traits.

pub mod app;
pub mod channels;
pub mod command;
pub mod id;
pub mod listener;
pub mod msg;
pub mod overlay;
pub mod store;

pub use app::ChatApp;
pub use id::NodeId;
pub use listener::ChatListener;
pub use msg::{ChatMessage, Priority};
pub use overlay::{Application, LocalRing, NodeHandle, Overlay, RouteError};
pub use store::{ChannelRecord, ChannelStore, MemoryStore, StoreError};
