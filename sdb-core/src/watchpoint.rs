//! Watchpoint pool
//!
//! A fixed number of slots, each either free or active. The slot index is
//! the watchpoint's id, so a freed id is handed out again by the next
//! allocation. Free slots form a stack; active slots form an index-linked
//! list with the most recently created watchpoint first. Create and delete
//! are O(1).

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchpointError {
    #[error("No free watchpoint slot (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("No watchpoint number {id}")]
    UnknownWatchpoint { id: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchpoint {
    pub id: usize,
    pub expression: String,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    watchpoint: Option<Watchpoint>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WatchpointPool {
    slots: Vec<Slot>,
    /// Free slot indices; the last element is the head
    free: Vec<usize>,
    /// Most recently created active slot
    head: Option<usize>,
}

impl WatchpointPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Slot::default(); capacity],
            // Reversed so that ids are handed out from 0 upwards
            free: (0..capacity).rev().collect(),
            head: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active watchpoints
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Allocate a watchpoint for `expression` and return its id
    pub fn create(&mut self, expression: impl Into<String>) -> Result<usize, WatchpointError> {
        let id = self.free.pop().ok_or(WatchpointError::PoolExhausted {
            capacity: self.capacity(),
        })?;

        let old_head = self.head;
        let slot = &mut self.slots[id];
        slot.watchpoint = Some(Watchpoint {
            id,
            expression: expression.into(),
        });
        slot.prev = None;
        slot.next = old_head;

        if let Some(h) = old_head {
            self.slots[h].prev = Some(id);
        }
        self.head = Some(id);

        debug!("created watchpoint {}", id);
        Ok(id)
    }

    /// Release the watchpoint `id`, returning what it watched
    pub fn delete(&mut self, id: usize) -> Result<Watchpoint, WatchpointError> {
        let slot = self
            .slots
            .get_mut(id)
            .filter(|slot| slot.watchpoint.is_some())
            .ok_or(WatchpointError::UnknownWatchpoint { id })?;

        let (prev, next) = (slot.prev.take(), slot.next.take());
        let watchpoint = slot.watchpoint.take();

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.slots[n].prev = prev;
        }

        self.free.push(id);
        debug!("deleted watchpoint {}", id);

        watchpoint.ok_or(WatchpointError::UnknownWatchpoint { id })
    }

    pub fn get(&self, id: usize) -> Option<&Watchpoint> {
        self.slots.get(id)?.watchpoint.as_ref()
    }

    /// Active watchpoints, most recently created first
    pub fn list(&self) -> Watchpoints<'_> {
        Watchpoints {
            pool: self,
            cursor: self.head,
        }
    }
}

/// Iterator over active watchpoints; clone it to restart from a position
#[derive(Debug, Clone)]
pub struct Watchpoints<'a> {
    pool: &'a WatchpointPool,
    cursor: Option<usize>,
}

impl<'a> Iterator for Watchpoints<'a> {
    type Item = &'a Watchpoint;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.pool.slots[self.cursor?];
        self.cursor = slot.next;
        slot.watchpoint.as_ref()
    }
}

/// Render watchpoints as the `info w` table
pub fn render_table<'a>(watchpoints: impl IntoIterator<Item = &'a Watchpoint>) -> String {
    let mut table = String::from("Num  What");
    for wp in watchpoints {
        table.push_str(&format!("\n{:<5}{}", wp.id, wp.expression));
    }
    table
}
