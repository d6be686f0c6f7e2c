//! Fixed-capacity entity pools with generational handles.
//!
//! One generic arena replaces per-kind "active" flags: a slot is either
//! occupied (active) or on the free list. Handles carry the slot generation
//! so a handle to a reclaimed slot resolves to nothing.
//!
//! # Invariants
//! - `len()` never exceeds `capacity()`.
//! - Ids are assigned from a counter and never reused within a pool.
//! - Iteration only visits occupied slots, in slot order.
//! - Pools are mutated only by the tick loop, never during iteration.

use isleworld_common::EntityId;
use serde::{Deserialize, Serialize};

/// Capability every pooled entity exposes to the tick loop.
pub trait PoolEntity {
    /// Per-tick inputs shared by every entity of the kind.
    type Context;

    fn update(&mut self, dt: f32, ctx: &Self::Context);

    /// Entities that report `false` after an update are reclaimed.
    fn is_active(&self) -> bool {
        true
    }
}

/// Opaque reference to a pool slot: (index, generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Occupant<T> {
    id: EntityId,
    value: T,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    occupant: Option<Occupant<T>>,
}

/// Fixed-capacity pool of entities of one kind.
#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    capacity: usize,
    len: usize,
    next_id: u32,
}

impl<T> EntityPool<T> {
    /// Backing slots are allocated lazily up to `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            len: 0,
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Claim a free slot and build its entity from a fresh id.
    ///
    /// Returns `None` when the pool is full; that is a soft limit and the
    /// caller decides whether to drop the request.
    pub fn spawn(&mut self, make: impl FnOnce(EntityId) -> T) -> Option<EntityHandle> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    generation: 0,
                    occupant: None,
                });
                (self.slots.len() - 1) as u32
            }
            None => {
                tracing::warn!(capacity = self.capacity, "entity pool exhausted, spawn dropped");
                return None;
            }
        };

        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let slot = &mut self.slots[index as usize];
        slot.occupant = Some(Occupant {
            id,
            value: make(id),
        });
        self.len += 1;
        tracing::debug!(%id, index, generation = slot.generation, "entity spawned");
        Some(EntityHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Reclaim the slot behind `handle`. Stale handles are ignored.
    pub fn despawn(&mut self, handle: EntityHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let occupant = slot.occupant.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        tracing::debug!(id = %occupant.id, index = handle.index, "entity despawned");
        Some(occupant.value)
    }

    /// Reclaim the entity with `id`; the id is invalid immediately after.
    pub fn despawn_id(&mut self, id: EntityId) -> Option<T> {
        let handle = self.handle_of(id)?;
        self.despawn(handle)
    }

    fn occupant(&self, handle: EntityHandle) -> Option<&Occupant<T>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.occupant.as_ref())
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&T> {
        self.occupant(handle).map(|o| &o.value)
    }

    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.occupant.as_mut())
            .map(|o| &mut o.value)
    }

    pub fn id_of(&self, handle: EntityHandle) -> Option<EntityId> {
        self.occupant(handle).map(|o| o.id)
    }

    /// Linear scan for the active entry with `id`.
    pub fn handle_of(&self, id: EntityId) -> Option<EntityHandle> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.occupant
                .as_ref()
                .filter(|o| o.id == id)
                .map(|_| EntityHandle {
                    index: index as u32,
                    generation: slot.generation,
                })
        })
    }

    pub fn get_by_id(&self, id: EntityId) -> Option<&T> {
        self.active_entries()
            .find(|(eid, _)| *eid == id)
            .map(|(_, value)| value)
    }

    pub fn get_by_id_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.active_entries_mut()
            .find(|(eid, _)| *eid == id)
            .map(|(_, value)| value)
    }

    /// Lazy iterator over active entries in slot order. Call again to restart.
    pub fn active_entries(&self) -> ActiveEntries<'_, T> {
        ActiveEntries {
            slots: self.slots.iter(),
        }
    }

    pub fn active_entries_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots
            .iter_mut()
            .filter_map(|s| s.occupant.as_mut().map(|o| (o.id, &mut o.value)))
    }

    /// Handles of all active entries, in slot order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.occupant.as_ref().map(|_| EntityHandle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// Despawn everything. Outstanding handles all become stale.
    pub fn clear(&mut self) {
        let handles: Vec<EntityHandle> = self.handles().collect();
        for handle in handles {
            self.despawn(handle);
        }
    }
}

impl<T: PoolEntity> EntityPool<T> {
    /// Update every active entry in slot order, then reclaim the ones that
    /// went inactive. Returns how many were reclaimed.
    pub fn update_active(&mut self, dt: f32, ctx: &T::Context) -> usize {
        let mut expired = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(occupant) = slot.occupant.as_mut() {
                occupant.value.update(dt, ctx);
                if !occupant.value.is_active() {
                    expired.push(EntityHandle {
                        index: index as u32,
                        generation: slot.generation,
                    });
                }
            }
        }
        let reaped = expired.len();
        for handle in expired {
            self.despawn(handle);
        }
        reaped
    }
}

/// Iterator returned by [`EntityPool::active_entries`].
pub struct ActiveEntries<'a, T> {
    slots: std::slice::Iter<'a, Slot<T>>,
}

impl<T> Clone for ActiveEntries<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<'a, T> Iterator for ActiveEntries<'a, T> {
    type Item = (EntityId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .by_ref()
            .find_map(|s| s.occupant.as_ref().map(|o| (o.id, &o.value)))
    }
}

pub fn crate_info() -> &'static str {
    "isleworld-pool v0.1.0"
}
