//! User relationship tracking.
//!
//! The entry projector only needs one question answered: is this author
//! blocked? Relationship updates arrive from the session layer; the
//! projector queries the shared set while building the display list.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::UserId;

/// Relationship between the current user and another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[allow(missing_docs)]
pub enum RelationshipStatus {
    #[default]
    None,
    Friend,
    Blocked,
    BlockedOther,
    Incoming,
    Outgoing,
}

impl RelationshipStatus {
    /// Returns true if the other user is blocked by us.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Shared set of blocked user identifiers.
///
/// Cheap to clone; all clones observe the same set.
#[derive(Debug, Clone, Default)]
pub struct RelationshipState {
    blocked_users: Arc<RwLock<HashSet<UserId>>>,
}

impl RelationshipState {
    /// Creates an empty relationship state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocked_users: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Records a relationship change for a user.
    pub fn update(&self, user_id: UserId, status: RelationshipStatus) {
        let mut blocked = self.blocked_users.write();
        if status.is_blocked() {
            blocked.insert(user_id);
        } else {
            blocked.remove(&user_id);
        }
    }

    /// Returns true if the user is currently blocked.
    #[must_use]
    pub fn is_blocked(&self, user_id: &UserId) -> bool {
        self.blocked_users.read().contains(user_id)
    }

    /// Number of blocked users.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked_users.read().len()
    }
}
