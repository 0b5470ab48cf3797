//! Fixed-capacity entity pool with steal-oldest recycling
//!
//! Slots are preallocated; acquisition takes a free slot when one exists and
//! otherwise overwrites the active entity with the greatest [`Pooled::age`].
//! Ties go to the entity spawned first. Handles carry a generation so a stale
//! or repeated release is a no-op.

use serde::{Deserialize, Serialize};

/// Entities stored in an [`EntityPool`] report how long they have been alive
pub trait Pooled {
    /// Seconds since the entity was acquired
    fn age(&self) -> f32;
}

/// Stable reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    generation: u32,
    /// Global acquisition order, used to break age ties
    spawn_seq: u64,
}

/// Outcome of an acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub handle: PoolHandle,
    /// Handle of the entity that was evicted to make room, if any
    pub evicted: Option<PoolHandle>,
}

#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    name: &'static str,
    slots: Vec<Slot<T>>,
    /// Free slot indices (popped from the back)
    free: Vec<u32>,
    next_seq: u64,
    log_recycling: bool,
}

impl<T: Pooled> EntityPool<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity)
            .map(|_| Slot {
                value: None,
                generation: 0,
                spawn_seq: 0,
            })
            .collect();
        // Reverse so slot 0 is handed out first
        let free = (0..capacity as u32).rev().collect();
        Self {
            name,
            slots,
            free,
            next_seq: 0,
            log_recycling: false,
        }
    }

    /// Enable eviction logging (from `Diagnostics::log_pool_recycling`)
    pub fn with_recycle_logging(mut self, enabled: bool) -> Self {
        self.log_recycling = enabled;
        self
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Store `value`, recycling the oldest active entity if the pool is full
    pub fn acquire(&mut self, value: T) -> Acquired {
        let (index, evicted) = match self.free.pop() {
            Some(index) => (index, None),
            None => {
                let index = self.oldest_index();
                let slot = &self.slots[index as usize];
                let evicted = PoolHandle {
                    index,
                    generation: slot.generation,
                };
                if self.log_recycling {
                    log::debug!(
                        "{} pool full ({}), recycling slot {} (age {:.2}s)",
                        self.name,
                        self.slots.len(),
                        index,
                        slot.value.as_ref().map(|v| v.age()).unwrap_or(0.0)
                    );
                }
                (index, Some(evicted))
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.spawn_seq = seq;
        slot.value = Some(value);

        Acquired {
            handle: PoolHandle {
                index,
                generation: slot.generation,
            },
            evicted,
        }
    }

    /// Active slot with the greatest age; ties go to the earliest spawn.
    /// Only called when every slot is active.
    fn oldest_index(&self) -> u32 {
        let mut best = 0usize;
        let mut best_age = f32::NEG_INFINITY;
        let mut best_seq = u64::MAX;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(value) = slot.value.as_ref() else {
                continue;
            };
            let age = value.age();
            if age > best_age || (age == best_age && slot.spawn_seq < best_seq) {
                best = i;
                best_age = age;
                best_seq = slot.spawn_seq;
            }
        }
        best as u32
    }

    /// Return an entity to the free list. Returns false for stale handles.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation || slot.value.is_none() {
            return false;
        }
        slot.value = None;
        self.free.push(handle.index);
        true
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Visit active entities in slot order
    pub fn for_each_active(&self, mut f: impl FnMut(PoolHandle, &T)) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(value) = slot.value.as_ref() {
                let handle = PoolHandle {
                    index: i as u32,
                    generation: slot.generation,
                };
                f(handle, value);
            }
        }
    }

    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(PoolHandle, &mut T)) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let Some(value) = slot.value.as_mut() {
                let handle = PoolHandle {
                    index: i as u32,
                    generation: slot.generation,
                };
                f(handle, value);
            }
        }
    }

    /// Handles of all active entities in slot order
    pub fn active_handles(&self) -> Vec<PoolHandle> {
        let mut handles = Vec::with_capacity(self.active_count());
        self.for_each_active(|h, _| handles.push(h));
        handles
    }

    /// Keep entities for which `keep` returns true; release the rest
    pub fn retain_active(&mut self, mut keep: impl FnMut(&mut T) -> bool) -> usize {
        let mut released = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(value) = slot.value.as_mut() else {
                continue;
            };
            if !keep(value) {
                slot.value = None;
                self.free.push(i as u32);
                released += 1;
            }
        }
        released
    }

    pub fn clear(&mut self) {
        self.retain_active(|_| false);
    }
}
