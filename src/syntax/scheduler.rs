//! Deferred rehighlighting
//!
//! When a line's exit state changes in a way its successor cares about,
//! the successor is queued rather than relexed on the spot. Each task
//! remembers what it was queued for: the line's text revision and the
//! fingerprint of the predecessor state it should start from. A task
//! whose line changed in the meantime is dropped; the edit that changed
//! it has already queued fresh work.
//!
//! Pending lines are kept ordered by index, so taking the topmost one is
//! cheap. Inserting or removing lines shifts indices; the order is
//! recomputed once, on the next pop after such an edit.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use super::store::{LineId, LineStore};

/// A queued relex of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    /// Line to relex
    pub id: LineId,
    /// Index of the line when the task was queued
    pub index: usize,
    /// Text revision the task was queued for
    pub revision: u64,
    /// Fingerprint of the predecessor's exit state at queue time
    pub prev_fingerprint: u64,
}

impl Task {
    /// Capture a task for line `index` as the store stands now
    pub fn capture(store: &LineStore, index: usize) -> Option<Self> {
        Some(Self {
            id: store.id_at(index)?,
            index,
            revision: store.revision(index)?,
            prev_fingerprint: store.exit_before(index).fingerprint(),
        })
    }

    /// Current index of the task's line, if the task is still valid
    pub fn validate(&self, store: &LineStore) -> Option<usize> {
        let index = store.index_of(self.id)?;
        let current = store.revision(index) == Some(self.revision)
            && store.exit_before(index).fingerprint() == self.prev_fingerprint
            && (index == 0 || store.is_lexed(index - 1));
        current.then_some(index)
    }
}

/// Deduplicated queue of pending relex tasks
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    /// Newest task per line, with the index it is ordered under
    pending: HashMap<LineId, (usize, Task)>,
    order: BTreeSet<(usize, LineId)>,
    /// Store layout the order was computed against
    layout: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task, replacing any older task for the same line
    pub fn schedule(&mut self, task: Task) {
        trace!(id = ?task.id, revision = task.revision, "rehighlight scheduled");
        if let Some((key, _)) = self.pending.insert(task.id, (task.index, task)) {
            self.order.remove(&(key, task.id));
        }
        self.order.insert((task.index, task.id));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: LineId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.order.clear();
    }

    /// Take the next valid task: the one whose line is topmost
    ///
    /// Tasks for vanished or changed lines are dropped on the way.
    pub fn pop(&mut self, store: &LineStore) -> Option<(usize, Task)> {
        if self.layout != store.layout() {
            self.reorder(store);
        }
        while let Some((_, id)) = self.order.pop_first() {
            let Some((_, task)) = self.pending.remove(&id) else {
                continue;
            };
            match task.validate(store) {
                Some(index) => {
                    trace!(?id, index, "rehighlight run");
                    return Some((index, task));
                }
                None => trace!(?id, "rehighlight dropped: stale"),
            }
        }
        None
    }

    /// Re-key every pending task by its line's current index
    fn reorder(&mut self, store: &LineStore) {
        self.pending.retain(|id, (key, _)| match store.index_of(*id) {
            Some(index) => {
                *key = index;
                true
            }
            None => {
                trace!(?id, "rehighlight dropped: line removed");
                false
            }
        });
        self.order = self.pending.iter().map(|(id, (key, _))| (*key, *id)).collect();
        self.layout = store.layout();
    }
}
