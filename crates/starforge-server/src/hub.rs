//! Broadcast hub.
//!
//! One task owns the connection registry. Everything else talks to it
//! through a [`HubHandle`], so membership changes and deliveries are
//! applied in the order they were sent. Delivery never waits on a client:
//! each connection has a bounded outbound queue and a connection whose
//! queue is full is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::HubConfig;
use crate::error::HubClosed;
use crate::protocol::ServerMessage;

pub type ConnectionId = u64;

/// Serialized frame shared by every recipient of one message.
pub type Frame = Arc<str>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub authenticated: usize,
}

enum HubCommand {
    Register {
        id: ConnectionId,
        outbound: mpsc::Sender<Frame>,
    },
    Unregister {
        id: ConnectionId,
    },
    Broadcast {
        frame: Frame,
    },
    SendTo {
        id: ConnectionId,
        frame: Frame,
    },
    SendToUser {
        user_id: u64,
        frame: Frame,
    },
    Authenticate {
        id: ConnectionId,
        user_id: u64,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

struct Session {
    outbound: mpsc::Sender<Frame>,
    user_id: Option<u64>,
}

fn encode(message: &ServerMessage) -> Option<Frame> {
    match message.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            log::error!("Could not serialize {:?}: {}", message, e);
            None
        }
    }
}

// ============================================================================
// REGISTRY (owned by the hub task)
// ============================================================================

#[derive(Default)]
struct Registry {
    sessions: HashMap<ConnectionId, Session>,
}

impl Registry {
    fn apply(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register { id, outbound } => {
                self.sessions.insert(
                    id,
                    Session {
                        outbound,
                        user_id: None,
                    },
                );
                log::debug!("Connection {} registered ({} open)", id, self.sessions.len());
            }
            HubCommand::Unregister { id } => {
                if self.sessions.remove(&id).is_some() {
                    log::debug!("Connection {} closed ({} open)", id, self.sessions.len());
                }
            }
            HubCommand::Broadcast { frame } => {
                let ids: Vec<ConnectionId> = self.sessions.keys().copied().collect();
                for id in ids {
                    self.deliver(id, &frame);
                }
            }
            HubCommand::SendTo { id, frame } => {
                self.deliver(id, &frame);
            }
            HubCommand::SendToUser { user_id, frame } => {
                let ids: Vec<ConnectionId> = self
                    .sessions
                    .iter()
                    .filter(|(_, s)| s.user_id == Some(user_id))
                    .map(|(id, _)| *id)
                    .collect();
                for id in ids {
                    self.deliver(id, &frame);
                }
            }
            HubCommand::Authenticate { id, user_id } => {
                let Some(session) = self.sessions.get_mut(&id) else {
                    return;
                };
                session.user_id = Some(user_id);
                log::info!("Connection {} authenticated as user {}", id, user_id);
                if let Some(frame) = encode(&ServerMessage::AuthSuccess { user_id }) {
                    self.deliver(id, &frame);
                }
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(HubStats {
                    connections: self.sessions.len(),
                    authenticated: self
                        .sessions
                        .values()
                        .filter(|s| s.user_id.is_some())
                        .count(),
                });
            }
        }
    }

    /// Non-blocking enqueue. A full or closed queue drops the session,
    /// which closes its outbound channel and ends its writer.
    fn deliver(&mut self, id: ConnectionId, frame: &Frame) {
        let Some(session) = self.sessions.get(&id) else {
            return;
        };
        match session.outbound.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Connection {} is not keeping up, disconnecting", id);
                self.sessions.remove(&id);
            }
            Err(TrySendError::Closed(_)) => {
                self.sessions.remove(&id);
            }
        }
    }
}

async fn run(mut commands: mpsc::Receiver<HubCommand>) {
    let mut registry = Registry::default();
    while let Some(command) = commands.recv().await {
        registry.apply(command);
    }
    log::info!("Broadcast hub stopped");
}

// ============================================================================
// HANDLE
// ============================================================================

/// Cloneable front door to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    next_id: Arc<AtomicU64>,
    connection_queue: usize,
}

/// Start the hub task. It runs until every handle is dropped.
pub fn spawn(config: &HubConfig) -> (HubHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(config.command_queue.max(1));
    let handle = HubHandle {
        commands: tx,
        next_id: Arc::new(AtomicU64::new(1)),
        connection_queue: config.connection_queue.max(1),
    };
    (handle, tokio::spawn(run(rx)))
}

impl HubHandle {
    async fn send(&self, command: HubCommand) -> Result<(), HubClosed> {
        self.commands.send(command).await.map_err(|_| HubClosed)
    }

    /// Register a new connection and return its id and outbound queue.
    pub async fn open_connection(&self) -> Result<(ConnectionId, mpsc::Receiver<Frame>), HubClosed> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (outbound, rx) = mpsc::channel(self.connection_queue);
        self.send(HubCommand::Register { id, outbound }).await?;
        Ok((id, rx))
    }

    /// Safe to call more than once for the same id.
    pub async fn unregister(&self, id: ConnectionId) -> Result<(), HubClosed> {
        self.send(HubCommand::Unregister { id }).await
    }

    /// Deliver to every open connection. The message is serialized once.
    pub async fn broadcast(&self, message: &ServerMessage) -> Result<(), HubClosed> {
        match encode(message) {
            Some(frame) => self.send(HubCommand::Broadcast { frame }).await,
            None => Ok(()),
        }
    }

    pub async fn send_to(&self, id: ConnectionId, message: &ServerMessage) -> Result<(), HubClosed> {
        match encode(message) {
            Some(frame) => self.send(HubCommand::SendTo { id, frame }).await,
            None => Ok(()),
        }
    }

    /// Deliver to every connection authenticated as `user_id`.
    pub async fn send_to_user(&self, user_id: u64, message: &ServerMessage) -> Result<(), HubClosed> {
        match encode(message) {
            Some(frame) => self.send(HubCommand::SendToUser { user_id, frame }).await,
            None => Ok(()),
        }
    }

    /// Bind `id` to `user_id` and queue `auth_success` to it.
    pub async fn authenticate(&self, id: ConnectionId, user_id: u64) -> Result<(), HubClosed> {
        self.send(HubCommand::Authenticate { id, user_id }).await
    }

    pub async fn stats(&self) -> Result<HubStats, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubClosed)
    }
}
