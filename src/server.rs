use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::history::{is_hex_color, random_color, History, HISTORY_DEPTH};
use crate::identity::{self, IdentityResolver, UserIdentity};
use crate::messages::{ChatEntry, ClientEvent, OutgoingMessage, ServerEvent};
use crate::presence::PresenceSet;
use crate::typing::{TypingRegistry, TYPING_EXPIRY};

/// Name used by sessions that never learned one.
pub const FALLBACK_NAME: &str = "Usuario";

type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Default)]
struct HubState {
    connections: HashMap<Uuid, Outbox>,
    presence: PresenceSet,
    typing: TypingRegistry,
}

impl HubState {
    fn broadcast(&self, event: &ServerEvent) {
        for outbox in self.connections.values() {
            let _ = outbox.send(event.clone());
        }
    }

    fn send_to(&self, connection: &Uuid, event: ServerEvent) {
        if let Some(outbox) = self.connections.get(connection) {
            let _ = outbox.send(event);
        }
    }

    fn announce(&mut self, name: &str) {
        let change = self.presence.join(name);
        self.broadcast(&ServerEvent::UserCount(change.count));
        if change.changed {
            info!("{} joined the chat", name);
            self.broadcast(&ServerEvent::UserJoined(name.to_string()));
        }
    }

    fn broadcast_typing(&self) {
        self.broadcast(&ServerEvent::TypingUpdate(self.typing.names()));
    }
}

/// The single chat room: live connections, presence and typing state.
///
/// All three live behind one lock, and every broadcast is sent while holding
/// it, so every connection sees broadcasts in the same order.
#[derive(Clone)]
pub struct ChatHub {
    state: Arc<Mutex<HubState>>,
    history: History,
}

impl ChatHub {
    pub fn new(history: History) -> Self {
        ChatHub {
            state: Arc::new(Mutex::new(HubState::default())),
            history,
        }
    }

    /// Registers an authenticated connection: replays history to it, then
    /// announces its name if the handshake resolved one.
    pub async fn open(&self, identity: UserIdentity, outbox: Outbox) -> Session {
        let id = Uuid::new_v4();
        let backlog = self.backlog().await;

        let mut state = self.state.lock().await;
        state.connections.insert(id, outbox);
        state.send_to(&id, ServerEvent::ChatHistory(backlog));
        if let Some(name) = identity.display_name.as_deref() {
            state.announce(name);
        }
        drop(state);

        Session {
            id,
            hub: self.clone(),
            name: identity.display_name,
            color: random_color(),
            state: SessionState::Registered,
        }
    }

    async fn backlog(&self) -> Vec<ChatEntry> {
        match self.history.recent(HISTORY_DEPTH).await {
            Ok(messages) => messages.iter().map(ChatEntry::from).collect(),
            Err(e) => {
                error!("Failed to load chat history: {}", e);
                Vec::new()
            }
        }
    }

    async fn announce(&self, name: &str) {
        self.state.lock().await.announce(name);
    }

    async fn reply_history(&self, connection: Uuid) {
        let backlog = self.backlog().await;
        self.state
            .lock()
            .await
            .send_to(&connection, ServerEvent::ChatHistoryData(backlog));
    }

    async fn publish(&self, username: &str, message: &str, color: &str) {
        match self.history.append(username, message, color).await {
            Ok(stored) => {
                debug!("Stored message {} from {}", stored.id, stored.username);
                let event = ServerEvent::ChatMessage(ChatEntry::from(&stored));
                self.state.lock().await.broadcast(&event);
            }
            Err(e) => error!("Failed to save message from {}: {}", username, e),
        }
    }

    async fn start_typing(&self, name: &str) {
        let mut state = self.state.lock().await;
        let ticket = state.typing.start(name);

        let hub = self.clone();
        let owner = name.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(TYPING_EXPIRY).await;
            hub.expire_typing(&owner, ticket).await;
        });
        state.typing.arm(name, ticket, timer.abort_handle());
        state.broadcast_typing();
    }

    async fn stop_typing(&self, name: &str) {
        let mut state = self.state.lock().await;
        if state.typing.stop(name) {
            state.broadcast_typing();
        }
    }

    async fn expire_typing(&self, name: &str, ticket: u64) {
        let mut state = self.state.lock().await;
        if state.typing.expire(name, ticket) {
            state.broadcast_typing();
        }
    }

    /// `typing_name` is the name the session typed under, which is the
    /// fallback for sessions that never learned one.
    async fn close(&self, connection: Uuid, name: Option<&str>, typing_name: &str) {
        let mut state = self.state.lock().await;
        state.connections.remove(&connection);

        if state.typing.stop(typing_name) {
            state.broadcast_typing();
        }

        let Some(name) = name else {
            let count = state.presence.count();
            state.broadcast(&ServerEvent::UserCount(count));
            return;
        };

        let change = state.presence.leave(name);
        state.broadcast(&ServerEvent::UserCount(change.count));
        if change.changed {
            info!("{} left the chat", name);
            state.broadcast(&ServerEvent::UserLeft(name.to_string()));
        }
    }
}

/// Handshaking happens before the upgrade, in the `/ws` filter; a session
/// only exists once it has been registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Registered,
    Closed,
}

/// One live connection.
pub struct Session {
    id: Uuid,
    hub: ChatHub,
    name: Option<String>,
    color: &'static str,
    state: SessionState,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn typing_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| FALLBACK_NAME.to_string())
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        if self.state == SessionState::Closed {
            return;
        }

        match event {
            ClientEvent::UserJoined(announcement) => {
                if self.name.is_some() {
                    return;
                }
                let name = announcement
                    .as_ref()
                    .and_then(|a| a.username())
                    .unwrap_or(FALLBACK_NAME)
                    .to_string();
                self.hub.announce(&name).await;
                self.name = Some(name);
            }

            ClientEvent::GetHistory => self.hub.reply_history(self.id).await,

            ClientEvent::ChatMessage(outgoing) => self.send_message(outgoing).await,

            ClientEvent::Typing => {
                let name = self.typing_name();
                self.hub.start_typing(&name).await;
            }

            ClientEvent::StopTyping => {
                let name = self.typing_name();
                self.hub.stop_typing(&name).await;
            }
        }
    }

    async fn send_message(&self, outgoing: OutgoingMessage) {
        if outgoing.message.trim().is_empty() {
            warn!("Dropping empty chat message from {}", self.id);
            return;
        }

        let claimed = outgoing
            .username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let Some(username) = self.name.as_deref().or(claimed) else {
            warn!("Dropping chat message from unnamed session {}", self.id);
            return;
        };

        let color = outgoing
            .user_color
            .as_deref()
            .filter(|color| is_hex_color(color))
            .unwrap_or(self.color);

        self.hub.publish(username, &outgoing.message, color).await;
    }

    /// Leaves presence and typing state. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        let typing_name = self.typing_name();
        self.hub.close(self.id, self.name.as_deref(), &typing_name).await;
    }
}

pub async fn serve_socket(hub: ChatHub, ws: WebSocket, identity: UserIdentity) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode event: {}", e);
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::text(text)).await {
                warn!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let (user_id, role) = (identity.id.clone(), identity.role);
    let mut session = hub.open(identity, tx).await;
    info!("Connection {} registered for {} ({:?})", session.id(), user_id, role);

    while let Some(result) = ws_rx.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                warn!("WebSocket error on {}: {}", session.id(), e);
                break;
            }
        };
        if message.is_close() {
            break;
        }
        let Ok(text) = message.to_str() else {
            continue;
        };
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => session.handle(event).await,
            Err(e) => warn!("Ignoring malformed event from {}: {}", session.id(), e),
        }
    }

    session.close().await;
    info!("Connection {} closed", session.id());
}

pub fn route(
    hub: ChatHub,
    resolver: IdentityResolver,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("ws")
        .and(warp::ws())
        .and(identity::handshake(resolver))
        .map(move |ws: Ws, identity: UserIdentity| {
            let hub = hub.clone();
            ws.on_upgrade(move |socket| serve_socket(hub, socket, identity))
        })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::mpsc::UnboundedReceiver;
    use warp::Filter;

    use super::*;
    use crate::history::{ChatMessage, MessageLog, NewMessage};
    use crate::identity::testing::{token, SECRET};
    use crate::identity::{Role, TokenVerifier};
    use crate::messages::Announcement;
    use crate::rejection::recover;
    use crate::store::{SqliteStore, StoreError};

    struct FailingLog;

    #[async_trait]
    impl MessageLog for FailingLog {
        async fn append(&self, _message: NewMessage) -> Result<ChatMessage, StoreError> {
            Err(StoreError::Poisoned)
        }

        async fn latest(&self, _limit: usize) -> Result<Vec<ChatMessage>, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    fn hub() -> ChatHub {
        let store = SqliteStore::open_in_memory().expect("store");
        ChatHub::new(History::new(Arc::new(store)))
    }

    fn identity(name: Option<&str>) -> UserIdentity {
        UserIdentity {
            id: "u1".to_string(),
            display_name: name.map(str::to_string),
            role: Role::User,
        }
    }

    async fn connect(hub: &ChatHub, name: Option<&str>) -> (Session, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = hub.open(identity(name), tx).await;
        (session, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn chat(message: &str) -> ClientEvent {
        ClientEvent::ChatMessage(OutgoingMessage {
            username: Some("someone-else".to_string()),
            message: message.to_string(),
            user_color: Some("#2A9D8F".to_string()),
        })
    }

    fn typing_updates(events: &[ServerEvent]) -> Vec<Vec<String>> {
        events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::TypingUpdate(names) => Some(names.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn named_connect_replays_history_then_announces() {
        let hub = hub();
        let (_alice, mut rx) = connect(&hub, Some("alice")).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                ServerEvent::ChatHistory(vec![]),
                ServerEvent::UserCount(1),
                ServerEvent::UserJoined("alice".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn message_is_broadcast_with_resolved_name_and_timestamp() {
        let hub = hub();
        let connected_at = chrono::Utc::now();
        let (mut alice, mut alice_rx) = connect(&hub, Some("alice")).await;
        let (_bob, mut bob_rx) = connect(&hub, Some("bob")).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        alice.handle(chat("hi")).await;

        for rx in [&mut alice_rx, &mut bob_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            let ServerEvent::ChatMessage(entry) = &events[0] else {
                panic!("expected chat message, got {events:?}");
            };
            assert_eq!(entry.username, "alice");
            assert_eq!(entry.message, "hi");
            assert_eq!(entry.user_color, "#2A9D8F");
            let sent_at = chrono::DateTime::parse_from_rfc3339(&entry.timestamp).expect("timestamp");
            assert!(sent_at.timestamp_millis() >= connected_at.timestamp_millis());
        }
    }

    #[tokio::test]
    async fn unnamed_session_uses_claimed_name_and_session_color() {
        let hub = hub();
        let (mut anon, mut rx) = connect(&hub, None).await;
        drain(&mut rx);

        anon.handle(ClientEvent::ChatMessage(OutgoingMessage {
            username: Some("carol".to_string()),
            message: "hello".to_string(),
            user_color: Some("not-a-color".to_string()),
        }))
        .await;

        let events = drain(&mut rx);
        let [ServerEvent::ChatMessage(entry)] = events.as_slice() else {
            panic!("expected one chat message, got {events:?}");
        };
        assert_eq!(entry.username, "carol");
        assert_eq!(entry.user_color, anon.color);
    }

    #[tokio::test]
    async fn blank_messages_are_not_broadcast() {
        let hub = hub();
        let (mut alice, mut rx) = connect(&hub, Some("alice")).await;
        drain(&mut rx);

        alice.handle(chat("   ")).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn history_is_replayed_in_order_and_on_request() {
        let hub = hub();
        let (mut alice, mut alice_rx) = connect(&hub, Some("alice")).await;
        alice.handle(chat("first")).await;
        alice.handle(chat("second")).await;
        drain(&mut alice_rx);

        let (mut bob, mut bob_rx) = connect(&hub, Some("bob")).await;
        let events = drain(&mut bob_rx);
        let ServerEvent::ChatHistory(backlog) = &events[0] else {
            panic!("history first, got {events:?}");
        };
        let texts: Vec<_> = backlog.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        drain(&mut alice_rx);

        bob.handle(ClientEvent::GetHistory).await;
        let events = drain(&mut bob_rx);
        assert!(matches!(events.as_slice(), [ServerEvent::ChatHistoryData(b)] if b.len() == 2));
        assert!(drain(&mut alice_rx).is_empty(), "history reply goes to requester only");
    }

    #[tokio::test]
    async fn persistence_failure_drops_message_and_empties_history() {
        let hub = ChatHub::new(History::new(Arc::new(FailingLog)));
        let (mut alice, mut rx) = connect(&hub, Some("alice")).await;
        assert_eq!(drain(&mut rx)[0], ServerEvent::ChatHistory(vec![]));

        alice.handle(chat("lost")).await;
        assert!(drain(&mut rx).is_empty());

        alice.handle(ClientEvent::GetHistory).await;
        assert_eq!(drain(&mut rx), vec![ServerEvent::ChatHistoryData(vec![])]);
    }

    #[tokio::test]
    async fn duplicate_name_does_not_rejoin() {
        let hub = hub();
        let (_first, mut first_rx) = connect(&hub, Some("alice")).await;
        drain(&mut first_rx);

        let (_second, _second_rx) = connect(&hub, Some("alice")).await;
        assert_eq!(drain(&mut first_rx), vec![ServerEvent::UserCount(1)]);
    }

    #[tokio::test]
    async fn late_announcement_only_counts_without_resolved_name() {
        let hub = hub();
        let (mut named, mut named_rx) = connect(&hub, Some("alice")).await;
        drain(&mut named_rx);

        named
            .handle(ClientEvent::UserJoined(Some(Announcement::Name("mallory".to_string()))))
            .await;
        assert!(drain(&mut named_rx).is_empty());

        let (mut anon, _anon_rx) = connect(&hub, None).await;
        assert!(drain(&mut named_rx).is_empty(), "nameless connect is silent");

        anon.handle(ClientEvent::UserJoined(Some(Announcement::Name("bob".to_string()))))
            .await;
        assert_eq!(
            drain(&mut named_rx),
            vec![
                ServerEvent::UserCount(2),
                ServerEvent::UserJoined("bob".to_string()),
            ]
        );

        anon.handle(ClientEvent::UserJoined(Some(Announcement::Name("eve".to_string()))))
            .await;
        assert!(drain(&mut named_rx).is_empty(), "a name is only announced once");
    }

    #[tokio::test]
    async fn empty_announcement_falls_back_to_default_name() {
        let hub = hub();
        let (mut anon, mut rx) = connect(&hub, None).await;
        drain(&mut rx);

        anon.handle(ClientEvent::UserJoined(None)).await;
        assert_eq!(
            drain(&mut rx),
            vec![
                ServerEvent::UserCount(1),
                ServerEvent::UserJoined(FALLBACK_NAME.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn close_announces_departure_once() {
        let hub = hub();
        let (mut alice, _alice_rx) = connect(&hub, Some("alice")).await;
        let (_bob, mut bob_rx) = connect(&hub, Some("bob")).await;
        drain(&mut bob_rx);

        alice.close().await;
        alice.close().await;
        assert_eq!(alice.state(), SessionState::Closed);
        assert_eq!(
            drain(&mut bob_rx),
            vec![
                ServerEvent::UserCount(1),
                ServerEvent::UserLeft("alice".to_string()),
            ]
        );

        alice.handle(chat("ghost")).await;
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn typing_expires_after_idle_window() {
        let hub = hub();
        let (mut alice, mut rx) = connect(&hub, Some("alice")).await;
        drain(&mut rx);

        alice.handle(ClientEvent::Typing).await;
        tokio::time::sleep(Duration::from_millis(3100)).await;
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert_eq!(
            typing_updates(&drain(&mut rx)),
            vec![vec!["alice".to_string()], vec![]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_typing_resets_the_timer() {
        let hub = hub();
        let (mut alice, mut rx) = connect(&hub, Some("alice")).await;
        drain(&mut rx);

        alice.handle(ClientEvent::Typing).await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        alice.handle(ClientEvent::Typing).await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(
            typing_updates(&drain(&mut rx)),
            vec![vec!["alice".to_string()], vec!["alice".to_string()]],
            "first timer must not fire after being replaced"
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(typing_updates(&drain(&mut rx)), vec![Vec::<String>::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_typing_broadcasts_once_and_is_idempotent() {
        let hub = hub();
        let (mut alice, mut rx) = connect(&hub, Some("alice")).await;
        let (mut bob, _bob_rx) = connect(&hub, Some("bob")).await;
        drain(&mut rx);

        bob.handle(ClientEvent::StopTyping).await;
        assert!(drain(&mut rx).is_empty());

        alice.handle(ClientEvent::Typing).await;
        bob.handle(ClientEvent::Typing).await;
        alice.handle(ClientEvent::StopTyping).await;
        alice.handle(ClientEvent::StopTyping).await;
        assert_eq!(
            typing_updates(&drain(&mut rx)),
            vec![
                vec!["alice".to_string()],
                vec!["alice".to_string(), "bob".to_string()],
                vec!["bob".to_string()],
            ]
        );

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(typing_updates(&drain(&mut rx)), vec![Vec::<String>::new()]);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_clears_typing_and_leaves_no_live_timer() {
        let hub = hub();
        let (mut alice, _alice_rx) = connect(&hub, Some("alice")).await;
        let (_bob, mut bob_rx) = connect(&hub, Some("bob")).await;

        alice.handle(ClientEvent::Typing).await;
        drain(&mut bob_rx);

        alice.close().await;
        assert_eq!(
            drain(&mut bob_rx),
            vec![
                ServerEvent::TypingUpdate(vec![]),
                ServerEvent::UserCount(1),
                ServerEvent::UserLeft("alice".to_string()),
            ]
        );

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn nameless_disconnect_clears_fallback_typing_at_once() {
        let hub = hub();
        let (_bob, mut bob_rx) = connect(&hub, Some("bob")).await;
        let (mut anon, _anon_rx) = connect(&hub, None).await;

        anon.handle(ClientEvent::Typing).await;
        assert_eq!(
            typing_updates(&drain(&mut bob_rx)),
            vec![vec![FALLBACK_NAME.to_string()]]
        );

        anon.close().await;
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerEvent::TypingUpdate(vec![]), ServerEvent::UserCount(1)]
        );

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(drain(&mut bob_rx).is_empty());
    }

    fn ws_api_for(
        hub: ChatHub,
    ) -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
        let store = SqliteStore::open_in_memory().expect("store");
        let resolver = IdentityResolver::new(TokenVerifier::new(SECRET), Arc::new(store));
        route(hub, resolver).recover(recover)
    }

    fn ws_api() -> impl Filter<Extract = (impl Reply,), Error = std::convert::Infallible> + Clone {
        ws_api_for(hub())
    }

    async fn next_event(client: &mut warp::test::WsClient) -> Value {
        let message = client.recv().await.expect("frame");
        serde_json::from_str(message.to_str().expect("text frame")).expect("json")
    }

    #[tokio::test]
    async fn handshake_rejects_missing_or_invalid_tokens() {
        let hub = hub();
        let (_alice, mut alice_rx) = connect(&hub, Some("alice")).await;
        drain(&mut alice_rx);
        let api = ws_api_for(hub);
        assert!(warp::test::ws().path("/ws").handshake(api.clone()).await.is_err());
        assert!(warp::test::ws()
            .path("/ws?token=forged")
            .handshake(api.clone())
            .await
            .is_err());

        let expired = token("u1", Role::User, -60);
        assert!(warp::test::ws()
            .path(&format!("/ws?token={expired}"))
            .handshake(api)
            .await
            .is_err());

        assert!(
            drain(&mut alice_rx).is_empty(),
            "rejected handshakes are invisible to the room"
        );
    }

    #[tokio::test]
    async fn websocket_round_trip() {
        let api = ws_api();
        let mut client = warp::test::ws()
            .path("/ws")
            .header("authorization", format!("Bearer {}", token("u1", Role::User, 60)))
            .handshake(api)
            .await
            .expect("handshake");

        assert_eq!(next_event(&mut client).await, json!({ "event": "chat history", "data": [] }));

        client
            .send_text(json!({ "event": "user joined", "data": "dave" }).to_string())
            .await;
        assert_eq!(next_event(&mut client).await, json!({ "event": "user count", "data": 1 }));
        assert_eq!(
            next_event(&mut client).await,
            json!({ "event": "user joined", "data": "dave" })
        );

        client.send_text("not json").await;
        client
            .send_text(json!({ "event": "chat message", "data": { "message": "hey" } }).to_string())
            .await;
        let message = next_event(&mut client).await;
        assert_eq!(message["event"], "chat message");
        assert_eq!(message["data"]["username"], "dave");
        assert_eq!(message["data"]["message"], "hey");
    }
}
