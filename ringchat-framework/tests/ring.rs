//! End-to-end tests running two chat participants over an in-process ring
//! with a shared channel store

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use ringchat_framework::msg::{ChannelMsg, PrivateMsg};
use ringchat_framework::{ChatApp, ChatListener, LocalRing, MemoryStore, NodeHandle};

#[derive(Default)]
struct Captured {
    private: Vec<PrivateMsg>,
    channel: Vec<ChannelMsg>,
    printed: Vec<String>,
    connected: Vec<NodeHandle>,
}

struct Recorder {
    captured: Arc<Mutex<Captured>>,
}

impl ChatListener for Recorder {
    fn set_chat_app(&mut self, _app: Arc<ChatApp>) {}

    fn on_node_connected(&mut self, node: &NodeHandle) {
        self.captured.lock().connected.push(*node);
    }

    fn on_node_disconnected(&mut self, _node: &NodeHandle) {}

    fn on_private_message(&mut self, msg: &PrivateMsg) {
        self.captured.lock().private.push(msg.clone());
    }

    fn on_channel_message(&mut self, msg: &ChannelMsg) {
        self.captured.lock().channel.push(msg.clone());
    }

    fn on_quit(&mut self) {}

    fn on_println(&mut self, text: &str) {
        self.captured.lock().printed.push(text.to_owned());
    }
}

struct Participant {
    app: Arc<ChatApp>,
    captured: Arc<Mutex<Captured>>,
}

fn participant(nickname: &str, ring: &Arc<LocalRing>, store: &Arc<MemoryStore>) -> Participant {
    let app = ChatApp::new(nickname, ring.clone(), store.clone());

    let captured = Arc::new(Mutex::new(Captured::default()));
    app.register_listener(Box::new(Recorder {
        captured: captured.clone(),
    }));
    ring.join(app.node_id(), app.clone());

    Participant { app, captured }
}

/// Poll `cond` until it holds, failing the test after five seconds
async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    waited.unwrap_or_else(|_| panic!("timed out waiting for {}", what));
}

#[tokio::test]
async fn private_message_reaches_only_its_recipient() {
    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let alice = participant("alice", &ring, &store);
    let bob = participant("bobby", &ring, &store);

    alice.app.send_private_msg("bobby", "hi bob").await;

    wait_for("bob to receive the private message", || {
        !bob.captured.lock().private.is_empty()
    })
    .await;

    let captured = bob.captured.lock();
    assert_eq!(captured.private.len(), 1);
    assert_eq!(captured.private[0].from_name, "alice");
    assert_eq!(captured.private[0].text, "hi bob");
    assert!(alice.captured.lock().private.is_empty());
}

#[tokio::test]
async fn join_confirmations_come_back_to_the_requester() {
    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let alice = participant("alice", &ring, &store);
    let bob = participant("bobby", &ring, &store);

    alice.app.send_join_request("general").await;
    bob.app.send_join_request("general").await;

    wait_for("both join confirmations", || {
        let a = alice.captured.lock();
        let b = bob.captured.lock();
        a.printed.contains(&"Joined channel 'general'.".to_owned())
            && b.printed.contains(&"Joined channel 'general'.".to_owned())
    })
    .await;
}

#[tokio::test]
async fn broadcast_reaches_every_current_member() {
    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let alice = participant("alice", &ring, &store);
    let bob = participant("bobby", &ring, &store);

    alice.app.send_join_request("general").await;
    bob.app.send_join_request("general").await;
    wait_for("both members to be joined", || {
        alice.captured.lock().printed.len() + bob.captured.lock().printed.len() >= 2
    })
    .await;

    alice.app.send_channel_broadcast("general", "hello all").await;

    wait_for("the broadcast to fan out to both members", || {
        !alice.captured.lock().channel.is_empty() && !bob.captured.lock().channel.is_empty()
    })
    .await;

    for member in [&alice, &bob] {
        let captured = member.captured.lock();
        assert_eq!(captured.channel.len(), 1);
        assert_eq!(captured.channel[0].from_name, "alice");
        assert_eq!(captured.channel[0].channel_name, "general");
        assert_eq!(captured.channel[0].text, "hello all");
    }
}

#[tokio::test]
async fn leaving_stops_further_broadcasts() {
    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let alice = participant("alice", &ring, &store);
    let bob = participant("bobby", &ring, &store);

    alice.app.send_join_request("general").await;
    bob.app.send_join_request("general").await;
    wait_for("both join confirmations", || {
        alice.captured.lock().printed.len() + bob.captured.lock().printed.len() >= 2
    })
    .await;

    bob.app.send_leave_request("general").await;
    wait_for("bob's leave confirmation", || {
        bob.captured
            .lock()
            .printed
            .contains(&"Left channel 'general'.".to_owned())
    })
    .await;

    alice.app.send_channel_broadcast("general", "anyone there?").await;
    wait_for("alice to receive her own broadcast", || {
        !alice.captured.lock().channel.is_empty()
    })
    .await;

    assert!(bob.captured.lock().channel.is_empty());
}

#[tokio::test]
async fn ring_members_learn_of_new_neighbors() {
    let ring = LocalRing::new();
    let store = Arc::new(MemoryStore::new());
    let alice = participant("alice", &ring, &store);
    let bob = participant("bobby", &ring, &store);

    let connected = alice.captured.lock().connected.clone();
    assert_eq!(connected, vec![NodeHandle { id: bob.app.node_id() }]);
}
