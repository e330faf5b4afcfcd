//! Ordered doubly-linked list stored in a generational slab.
//!
//! [`LinkedArena`] owns every node. Neighbour links are slot indices,
//! never handles held by the values themselves, so unlinking is O(1) and
//! cannot leave a dangling reference behind.

use crate::error::ArenaError;
use crate::handle::NodeHandle;

/// A single slab slot.
#[derive(Clone, Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
    prev: Option<u32>,
    next: Option<u32>,
}

/// An ordered, doubly-linked collection with stable generational handles.
///
/// The list starts at an implicit head. `insert_after(None, v)` places
/// `v` directly after the head, i.e. at the front; `insert_after(Some(h), v)`
/// places it after node `h`.
///
/// Vacated slots are reused, but a reused slot carries a newer
/// generation, so handles issued before the removal stop resolving.
#[derive(Clone, Debug)]
pub struct LinkedArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> Default for LinkedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkedArena<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Create an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle of the first node.
    pub fn first(&self) -> Option<NodeHandle> {
        self.head.map(|i| self.handle_at(i))
    }

    /// Handle of the last node.
    pub fn last(&self) -> Option<NodeHandle> {
        self.tail.map(|i| self.handle_at(i))
    }

    /// Insert `value` after `anchor`, or at the front when `anchor` is `None`.
    pub fn insert_after(
        &mut self,
        anchor: Option<NodeHandle>,
        value: T,
    ) -> Result<NodeHandle, ArenaError> {
        let prev = match anchor {
            Some(h) => Some(self.resolve(h)?),
            None => None,
        };
        let next = match prev {
            Some(p) => self.slots[p as usize].next,
            None => self.head,
        };
        let index = self.alloc(value, prev, next);
        match prev {
            Some(p) => self.slots[p as usize].next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(n) => self.slots[n as usize].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.len += 1;
        Ok(self.handle_at(index))
    }

    /// Insert `value` at the front.
    pub fn push_front(&mut self, value: T) -> NodeHandle {
        let index = self.alloc(value, None, self.head);
        match self.head {
            Some(h) => self.slots[h as usize].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;
        self.handle_at(index)
    }

    /// Insert `value` at the back.
    pub fn push_back(&mut self, value: T) -> NodeHandle {
        let index = self.alloc(value, self.tail, None);
        match self.tail {
            Some(t) => self.slots[t as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        self.handle_at(index)
    }

    /// Unlink the node and return its value, relinking its neighbours.
    pub fn pop(&mut self, handle: NodeHandle) -> Result<T, ArenaError> {
        let index = self.resolve(handle)?;
        let slot = &mut self.slots[index as usize];
        let (prev, next) = (slot.prev.take(), slot.next.take());
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);

        match prev {
            Some(p) => self.slots[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n as usize].prev = prev,
            None => self.tail = prev,
        }
        self.free_list.push(index);
        self.len -= 1;

        value.ok_or(ArenaError::StaleHandle {
            handle,
            current_generation: self.slots[index as usize].generation,
        })
    }

    /// Unlink the node and drop its value.
    pub fn delete(&mut self, handle: NodeHandle) -> Result<(), ArenaError> {
        self.pop(handle).map(drop)
    }

    /// Whether `handle` names a current member.
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Shared access to a node's value.
    pub fn get(&self, handle: NodeHandle) -> Result<&T, ArenaError> {
        let index = self.resolve(handle)?;
        self.slots[index as usize]
            .value
            .as_ref()
            .ok_or(self.stale(handle, index))
    }

    /// Mutable access to a node's value.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Result<&mut T, ArenaError> {
        let index = self.resolve(handle)?;
        let stale = self.stale(handle, index);
        self.slots[index as usize].value.as_mut().ok_or(stale)
    }

    /// The node following `handle`, if any.
    pub fn next(&self, handle: NodeHandle) -> Result<Option<NodeHandle>, ArenaError> {
        let index = self.resolve(handle)?;
        Ok(self.slots[index as usize].next.map(|i| self.handle_at(i)))
    }

    /// The node preceding `handle`, if any.
    pub fn prev(&self, handle: NodeHandle) -> Result<Option<NodeHandle>, ArenaError> {
        let index = self.resolve(handle)?;
        Ok(self.slots[index as usize].prev.map(|i| self.handle_at(i)))
    }

    /// Iterate `(handle, &value)` pairs in list order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            arena: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Iterate values in list order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, v)| v)
    }

    /// Snapshot of all handles in list order.
    ///
    /// Use this to walk the list while mutating or removing nodes.
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Drop every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.prev = None;
            slot.next = None;
            self.free_list.push(i as u32);
        }
        // Reuse low indices first.
        self.free_list.reverse();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Remove every value and hand them back in list order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(i) = cursor {
            let slot = &mut self.slots[i as usize];
            cursor = slot.next;
            if let Some(v) = slot.value.take() {
                slot.generation = slot.generation.wrapping_add(1);
                out.push(v);
            }
        }
        self.clear();
        out
    }

    fn alloc(&mut self, value: T, prev: Option<u32>, next: Option<u32>) -> u32 {
        match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                slot.prev = prev;
                slot.next = next;
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                    prev,
                    next,
                });
                index
            }
        }
    }

    fn resolve(&self, handle: NodeHandle) -> Result<u32, ArenaError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(ArenaError::OutOfBounds {
                handle,
                slots: self.slots.len(),
            })?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return Err(self.stale(handle, handle.index));
        }
        Ok(handle.index)
    }

    fn stale(&self, handle: NodeHandle, index: u32) -> ArenaError {
        ArenaError::StaleHandle {
            handle,
            current_generation: self.slots[index as usize].generation,
        }
    }

    fn handle_at(&self, index: u32) -> NodeHandle {
        NodeHandle::new(index, self.slots[index as usize].generation)
    }
}

/// Iterator over a [`LinkedArena`] in list order.
pub struct Iter<'a, T> {
    arena: &'a LinkedArena<T>,
    cursor: Option<u32>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.arena.slots[index as usize];
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        let value = slot.value.as_ref()?;
        Some((NodeHandle::new(index, slot.generation), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> IntoIterator for &'a LinkedArena<T> {
    type Item = (NodeHandle, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
