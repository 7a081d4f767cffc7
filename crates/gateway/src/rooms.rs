//! In-memory room membership for one gateway instance.
//!
//! Membership is a many-to-many relation between live sessions and room
//! identifiers. It is never persisted and never shared between instances;
//! each instance only needs to know about its own locally connected sessions,
//! and the fan-out bus carries everything else.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parlor_messages::{is_valid_room, Envelope};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};
use crate::websocket::events::ServerEvent;

/// Identifier of one live WebSocket session.
pub type SessionId = Uuid;

struct SessionEntry {
    sender: mpsc::UnboundedSender<ServerEvent>,
    rooms: HashSet<String>,
}

#[derive(Default)]
struct RegistryInner {
    rooms: HashMap<String, HashSet<SessionId>>,
    sessions: HashMap<SessionId, SessionEntry>,
}

/// Per-instance session/room bookkeeping plus local delivery.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a session and its outbound event channel.
    pub async fn register(&self, session: SessionId, sender: mpsc::UnboundedSender<ServerEvent>) {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(
            session,
            SessionEntry {
                sender,
                rooms: HashSet::new(),
            },
        );
    }

    /// Join a session to a room. Idempotent: rejoining an already-joined
    /// room is a no-op.
    pub async fn join(&self, session: SessionId, room: &str) -> GatewayResult<()> {
        if !is_valid_room(room) {
            return Err(GatewayError::InvalidRoom);
        }

        let mut inner = self.inner.write().await;
        let Some(entry) = inner.sessions.get_mut(&session) else {
            return Err(GatewayError::WebSocketError(format!(
                "unknown session {session}"
            )));
        };

        entry.rooms.insert(room.to_string());
        inner
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(session);

        debug!(%session, room = %room, "session joined room");
        Ok(())
    }

    /// Remove a session from a room. Idempotent.
    pub async fn leave(&self, session: SessionId, room: &str) -> GatewayResult<()> {
        if !is_valid_room(room) {
            return Err(GatewayError::InvalidRoom);
        }

        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.sessions.get_mut(&session) {
            entry.rooms.remove(room);
        }
        let emptied = inner
            .rooms
            .get_mut(room)
            .map(|members| {
                members.remove(&session);
                members.is_empty()
            })
            .unwrap_or(false);
        if emptied {
            inner.rooms.remove(room);
        }

        debug!(%session, room = %room, "session left room");
        Ok(())
    }

    /// Detach a session from every room and drop its channel. Called on
    /// disconnect; has no persisted side effect.
    pub async fn remove_session(&self, session: SessionId) {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.sessions.remove(&session) else {
            return;
        };

        for room in entry.rooms {
            let emptied = inner
                .rooms
                .get_mut(&room)
                .map(|members| {
                    members.remove(&session);
                    members.is_empty()
                })
                .unwrap_or(false);
            if emptied {
                inner.rooms.remove(&room);
            }
        }

        debug!(%session, "session removed from all rooms");
    }

    /// Deliver an envelope to every local session currently joined to
    /// `room`, unchanged. Returns how many sessions were reached.
    pub async fn deliver(&self, room: &str, envelope: &Envelope) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for session in members {
            let Some(entry) = inner.sessions.get(session) else {
                continue;
            };
            let event = ServerEvent::Message {
                message: envelope.clone(),
            };
            if entry.sender.send(event).is_ok() {
                delivered += 1;
            } else {
                warn!(%session, room = %room, "dropping delivery to closed session channel");
            }
        }

        delivered
    }

    pub async fn is_joined(&self, session: SessionId, room: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(room)
            .map(|members| members.contains(&session))
            .unwrap_or(false)
    }

    pub async fn room_size(&self, room: &str) -> usize {
        let inner = self.inner.read().await;
        inner.rooms.get(room).map(HashSet::len).unwrap_or(0)
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}
