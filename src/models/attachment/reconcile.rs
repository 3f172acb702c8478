//! Attachment-set reconciliation.
//!
//! The client turns an edit session into an [`AttachmentDelta`]; the server
//! applies that delta with [`apply_reconciliation`]. After a successful update
//! the owner's list is `(previous - to_remove) ++ stored(to_add)`.

use super::types::{Attachment, LocalFile};

/// What one update call carries: identifiers to drop and files to store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentDelta {
    pub to_remove: Vec<String>,
    pub to_add: Vec<LocalFile>,
}

impl AttachmentDelta {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Client-side record of one editing session over an attachment list.
///
/// The starting list is captured once; the delta is always computed against
/// that snapshot.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    snapshot: Vec<Attachment>,
    removed: Vec<Attachment>,
    added: Vec<LocalFile>,
}

impl EditSession {
    pub fn start(current: &[Attachment]) -> Self {
        EditSession {
            snapshot: current.to_vec(),
            removed: Vec::new(),
            added: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &[Attachment] {
        &self.snapshot
    }

    pub fn added(&self) -> &[LocalFile] {
        &self.added
    }

    /// Stored descriptors still shown to the user.
    pub fn visible(&self) -> Vec<&Attachment> {
        self.snapshot
            .iter()
            .filter(|a| !self.removed.iter().any(|r| r.filename == a.filename))
            .collect()
    }

    /// Mark a stored descriptor as removed. Removing the same descriptor twice
    /// records it once.
    pub fn remove(&mut self, descriptor: &Attachment) {
        let already = !descriptor.filename.is_empty()
            && self.removed.iter().any(|r| r.filename == descriptor.filename);
        if !already {
            self.removed.push(descriptor.clone());
        }
    }

    /// Convenience for UIs that only hold the storage name.
    pub fn remove_by_filename(&mut self, filename: &str) -> bool {
        match self.snapshot.iter().find(|a| a.filename == filename).cloned() {
            Some(descriptor) => {
                self.remove(&descriptor);
                true
            }
            None => false,
        }
    }

    pub fn add(&mut self, file: LocalFile) -> usize {
        self.added.push(file);
        self.added.len() - 1
    }

    /// Drop a file added in this session. It never reached the server, so it
    /// contributes nothing to the delta.
    pub fn discard_added(&mut self, index: usize) -> Option<LocalFile> {
        if index < self.added.len() {
            Some(self.added.remove(index))
        } else {
            None
        }
    }

    pub fn delta(&self) -> AttachmentDelta {
        let mut to_remove: Vec<String> = Vec::with_capacity(self.removed.len());
        for descriptor in &self.removed {
            if descriptor.filename.is_empty() || to_remove.contains(&descriptor.filename) {
                continue;
            }
            to_remove.push(descriptor.filename.clone());
        }
        AttachmentDelta {
            to_remove,
            to_add: self.added.clone(),
        }
    }
}

/// Server-side contract: keep `current` in order minus every filename in
/// `to_remove`, then append `stored` in submission order. Unknown filenames
/// are ignored.
pub fn apply_reconciliation(
    current: &[Attachment],
    to_remove: &[String],
    stored: Vec<Attachment>,
) -> Vec<Attachment> {
    let mut next: Vec<Attachment> = current
        .iter()
        .filter(|a| !to_remove.iter().any(|f| *f == a.filename))
        .cloned()
        .collect();
    next.extend(stored);
    next
}
