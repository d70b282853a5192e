use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Per-user export lock shared across requests.
///
/// A user has at most one export running at a time; a second request while
/// the first holds its permit is rejected instead of queued.
#[derive(Clone, Default)]
pub struct ExportGate {
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl ExportGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when `user_id` already has an export running.
    pub fn try_acquire(&self, user_id: Uuid) -> Option<ExportPermit> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(user_id) {
            return None;
        }
        Some(ExportPermit {
            active: Arc::clone(&self.active),
            user_id,
        })
    }

    pub fn is_active(&self, user_id: Uuid) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&user_id)
    }
}

/// Held for the duration of one export; releases the user on drop.
pub struct ExportPermit {
    active: Arc<Mutex<HashSet<Uuid>>>,
    user_id: Uuid,
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.user_id);
    }
}
