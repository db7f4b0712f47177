//! N4 association state.

use std::net::SocketAddr;

use parking_lot::RwLock;

use crate::pfcp::ie::NodeId;

/// Heartbeat intervals without a response before the peer is marked down.
pub const MISSED_HEARTBEAT_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationState {
    Associated,
    /// Peer stopped answering heartbeats; sessions are retained until
    /// explicitly deleted.
    Down,
}

#[derive(Debug, Clone)]
pub struct Association {
    pub peer: SocketAddr,
    pub node_id: NodeId,
    pub state: AssociationState,
    pub outstanding_heartbeats: u32,
}

/// At most one association at a time; a second Setup replaces the first.
#[derive(Default)]
pub struct AssociationHandle {
    inner: RwLock<Option<Association>>,
}

impl AssociationHandle {
    pub fn establish(&self, peer: SocketAddr, node_id: NodeId) {
        *self.inner.write() = Some(Association {
            peer,
            node_id,
            state: AssociationState::Associated,
            outstanding_heartbeats: 0,
        });
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.inner.read().as_ref().map(|a| a.peer)
    }

    pub fn state(&self) -> Option<AssociationState> {
        self.inner.read().as_ref().map(|a| a.state)
    }

    /// Called when a heartbeat request goes out. Three unanswered requests
    /// flip the association to Down.
    pub fn note_heartbeat_sent(&self) {
        let mut guard = self.inner.write();
        if let Some(assoc) = guard.as_mut() {
            assoc.outstanding_heartbeats += 1;
            if assoc.outstanding_heartbeats >= MISSED_HEARTBEAT_LIMIT {
                assoc.state = AssociationState::Down;
            }
        }
    }

    pub fn note_heartbeat_answered(&self) {
        let mut guard = self.inner.write();
        if let Some(assoc) = guard.as_mut() {
            assoc.outstanding_heartbeats = 0;
            assoc.state = AssociationState::Associated;
        }
    }
}
