//! Connection registry for real-time clients
//!
//! Tracks every open WebSocket connection together with the queue that
//! feeds its writer task.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Capacity of each connection's outbound queue
pub const OUTBOUND_QUEUE_CAPACITY: usize = 100;

/// Unique identifier for a WebSocket client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Set of live connections keyed by [`ClientId`]
///
/// Mutation and iteration both go through `DashMap` shard locks: a
/// broadcast holds read guards while it walks the map, so an `unregister`
/// racing with it waits until the walk is over. Once `unregister` returns
/// no later delivery can reach that connection.
pub struct ConnectionRegistry {
    next_client_id: AtomicU64,
    connections: DashMap<ClientId, mpsc::Sender<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_client_id: AtomicU64::new(1),
            connections: DashMap::new(),
        }
    }

    /// Generate a new unique client ID
    pub fn new_client_id(&self) -> ClientId {
        ClientId(self.next_client_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a new connection, returning its id and the receiving end of
    /// its outbound queue
    pub fn register(&self) -> (ClientId, mpsc::Receiver<String>) {
        let client_id = self.new_client_id();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.register_with(client_id, tx);
        (client_id, rx)
    }

    /// Register a connection under an existing id
    ///
    /// Registering an id that is already present keeps the existing queue.
    pub fn register_with(&self, client_id: ClientId, sender: mpsc::Sender<String>) {
        let inserted = match self.connections.entry(client_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(sender);
                true
            }
        };

        if inserted {
            info!("Registered {} ({} connected)", client_id, self.connections.len());
        } else {
            debug!("{} already registered", client_id);
        }
    }

    /// Remove a connection. No-op if the id is unknown.
    pub fn unregister(&self, client_id: ClientId) {
        if self.connections.remove(&client_id).is_some() {
            info!("Unregistered {} ({} connected)", client_id, self.connections.len());
        }
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.connections.contains_key(&client_id)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Ids of every registered connection, in no particular order
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    /// Queue a frame on every open connection
    ///
    /// Returns the number of send attempts. Closed queues are skipped; a
    /// full queue drops the frame for that client only.
    pub fn deliver_to_all(&self, frame: &str) -> usize {
        let mut attempts = 0;

        for entry in self.connections.iter() {
            let sender = entry.value();
            if sender.is_closed() {
                continue;
            }

            attempts += 1;
            Self::try_deliver(*entry.key(), sender, frame);
        }

        attempts
    }

    /// Queue a frame on a single connection
    ///
    /// Returns `false` if the connection is unknown or closed.
    pub fn deliver_to(&self, client_id: ClientId, frame: &str) -> bool {
        match self.connections.get(&client_id) {
            Some(sender) if !sender.is_closed() => {
                Self::try_deliver(client_id, sender.value(), frame);
                true
            }
            _ => false,
        }
    }

    fn try_deliver(client_id: ClientId, sender: &mpsc::Sender<String>, frame: &str) {
        match sender.try_send(frame.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for {}, dropping frame", client_id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("{} closed during delivery", client_id);
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish()
    }
}
