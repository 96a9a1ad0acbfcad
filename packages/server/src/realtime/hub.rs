use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

#[derive(Debug)]
struct Connection {
    user_id: Uuid,
    outgoing: UnboundedSender<String>,
}

/// Delivery counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registry of live real-time connections.
///
/// Each connection owns an unbounded channel drained by its socket writer,
/// so a broadcast never waits on a slow client.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: DashMap<Uuid, Connection>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection, returning its id and the receiving end of its queue.
    pub fn register(&self, user_id: Uuid) -> (Uuid, UnboundedReceiver<String>) {
        let (outgoing, incoming) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.connections.insert(id, Connection { user_id, outgoing });
        tracing::debug!(connection_id = %id, %user_id, "Real-time connection registered");
        (id, incoming)
    }

    /// Returns `true` if the connection was still registered.
    pub fn unregister(&self, id: Uuid) -> bool {
        match self.connections.remove(&id) {
            Some((_, conn)) => {
                tracing::debug!(connection_id = %id, user_id = %conn.user_id, "Real-time connection removed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue `text` on every connection.
    ///
    /// A failed send only affects its own connection, which is pruned once
    /// iteration is over.
    pub fn broadcast(&self, text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        for entry in self.connections.iter() {
            if entry.outgoing.send(text.to_owned()).is_ok() {
                report.delivered += 1;
            } else {
                report.failed += 1;
                dead.push(*entry.key());
            }
        }

        // Removing while iterating would deadlock on the shard lock.
        for id in dead {
            self.unregister(id);
        }
        report
    }
}
