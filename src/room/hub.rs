//! Per-room broadcast fabric.
//!
//! Each connection owns an mpsc channel drained by its WebSocket send
//! task; events are Arc-wrapped once and the pointer is cloned per
//! connection. Because the orchestrator enqueues sequentially and mpsc
//! preserves order, every connection sees events in enqueue order.
//! Delivery is best-effort: a connection that errors or falls behind is
//! evicted without affecting the room.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{PlayerId, ServerEvent};

pub type ConnectionId = u64;

struct Connection {
    sender: mpsc::Sender<Arc<ServerEvent>>,
    player: Option<PlayerId>,
}

pub struct RoomHub {
    connections: DashMap<ConnectionId, Connection>,
    next_id: AtomicU64,
    buffer: usize,
}

impl RoomHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a connection, optionally bound to a player identity.
    /// Returns the connection id and the receiving end the socket's send
    /// task drains.
    pub fn attach(
        &self,
        player: Option<PlayerId>,
    ) -> (ConnectionId, mpsc::Receiver<Arc<ServerEvent>>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(
            id,
            Connection {
                sender: tx,
                player,
            },
        );
        (id, rx)
    }

    pub fn detach(&self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver an event to every connection, evicting any that fail.
    pub fn broadcast(&self, event: ServerEvent) {
        let event = Arc::new(event);
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            if entry.value().sender.try_send(Arc::clone(&event)).is_err() {
                dead.push(*entry.key());
            }
        }
        self.evict(dead);
    }

    /// Deliver an event to every connection bound to `player`.
    pub fn send_to_player(&self, player: PlayerId, event: ServerEvent) {
        let event = Arc::new(event);
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            if entry.value().player == Some(player)
                && entry.value().sender.try_send(Arc::clone(&event)).is_err()
            {
                dead.push(*entry.key());
            }
        }
        self.evict(dead);
    }

    /// Deliver an event to one connection.
    pub fn send_to_connection(&self, id: ConnectionId, event: ServerEvent) {
        let mut dead = false;
        if let Some(entry) = self.connections.get(&id) {
            dead = entry.value().sender.try_send(Arc::new(event)).is_err();
        }
        if dead {
            self.detach(id);
        }
    }

    /// Broadcast a terminal event, then drop every connection. Each send
    /// channel closing makes the socket task shut the connection down.
    pub fn close_all(&self, terminal: ServerEvent) {
        self.broadcast(terminal);
        self.connections.clear();
    }

    fn evict(&self, dead: Vec<ConnectionId>) {
        for id in dead {
            tracing::debug!(connection_id = id, "Evicting unresponsive connection");
            self.connections.remove(&id);
        }
    }
}
