//! Block metadata layer: an arena-indexed, address-sorted doubly-linked list.
//!
//! The source this crate is grounded on links block records with raw
//! pointers. Here the heap instead owns a slab of block records addressed
//! by stable indices ([`BlockId`]), with `prev`/`next` as indices rather
//! than pointers — the same splice/merge cost, none of the aliasing
//! hazards, and a `verify` that can walk the list without `unsafe`.

use crate::error::{AllocError, Result};

/// A stable index into a [`BlockArena`]. Valid only for the arena that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

/// FREE or ALLOCATED. The only two states a block may be in; the only
/// transitions are FREE→ALLOCATED (on a successful allocate) and
/// ALLOCATED→FREE (on free).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Free,
    Allocated,
}

#[derive(Debug, Clone, Copy)]
struct BlockSlot {
    start_addr: usize,
    size: usize,
    state: BlockState,
    prev: Option<BlockId>,
    next: Option<BlockId>,
}

/// Owns every block record for one heap, in address-sorted order.
///
/// Slots are reused (via `free_slots`) when blocks are destroyed, so a long
/// alloc/free steady-state does not grow the arena unboundedly.
pub struct BlockArena {
    slots: Vec<Option<BlockSlot>>,
    free_slots: Vec<usize>,
    head: Option<BlockId>,
    len: usize,
}

impl BlockArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            head: None,
            len: 0,
        }
    }

    pub fn head(&self) -> Option<BlockId> {
        self.head
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, id: BlockId) -> &BlockSlot {
        self.slots[id.0].as_ref().expect("dangling BlockId")
    }

    fn slot_mut(&mut self, id: BlockId) -> &mut BlockSlot {
        self.slots[id.0].as_mut().expect("dangling BlockId")
    }

    pub fn start_addr(&self, id: BlockId) -> usize {
        self.slot(id).start_addr
    }

    pub fn size(&self, id: BlockId) -> usize {
        self.slot(id).size
    }

    pub fn state(&self, id: BlockId) -> BlockState {
        self.slot(id).state
    }

    pub fn next(&self, id: BlockId) -> Option<BlockId> {
        self.slot(id).next
    }

    pub fn prev(&self, id: BlockId) -> Option<BlockId> {
        self.slot(id).prev
    }

    pub fn set_state(&mut self, id: BlockId, state: BlockState) {
        self.slot_mut(id).state = state;
    }

    /// Construct a new, unlinked block record. Rejects zero size and a
    /// start address not 8-byte aligned. The caller links it into the list
    /// with [`Self::insert_sorted`].
    pub fn create(&mut self, start: usize, size: usize, state: BlockState) -> Result<BlockId> {
        if size == 0 || start % 8 != 0 {
            return Err(AllocError::InvalidArgument);
        }
        let slot = BlockSlot {
            start_addr: start,
            size,
            state,
            prev: None,
            next: None,
        };
        let id = if let Some(idx) = self.free_slots.pop() {
            self.slots[idx] = Some(slot);
            BlockId(idx)
        } else {
            self.slots.push(Some(slot));
            BlockId(self.slots.len() - 1)
        };
        self.len += 1;
        Ok(id)
    }

    /// Insert an unlinked block into the address-sorted list at the
    /// position dictated by its start address.
    pub fn insert_sorted(&mut self, id: BlockId) {
        let start = self.start_addr(id);
        let mut cursor = self.head;
        let mut prev = None;
        while let Some(cur) = cursor {
            if self.start_addr(cur) > start {
                break;
            }
            prev = Some(cur);
            cursor = self.next(cur);
        }
        self.slot_mut(id).prev = prev;
        self.slot_mut(id).next = cursor;
        match prev {
            Some(p) => self.slot_mut(p).next = Some(id),
            None => self.head = Some(id),
        }
        if let Some(c) = cursor {
            self.slot_mut(c).prev = Some(id);
        }
    }

    /// Unlink `id` from the list without destroying its record.
    fn unlink(&mut self, id: BlockId) {
        let (prev, next) = {
            let s = self.slot(id);
            (s.prev, s.next)
        };
        match prev {
            Some(p) => self.slot_mut(p).next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.slot_mut(n).prev = prev;
        }
    }

    /// Release the metadata record for `id`. Does not touch underlying
    /// memory. `id` must already be unlinked from the list.
    fn free_slot(&mut self, id: BlockId) {
        self.slots[id.0] = None;
        self.free_slots.push(id.0);
        self.len -= 1;
    }

    /// Unlink and destroy `id` in one step.
    pub fn destroy(&mut self, id: BlockId) {
        self.unlink(id);
        self.free_slot(id);
    }

    /// `true` if `b1` immediately precedes `b2` with no gap:
    /// `b1.start + b1.size == b2.start`.
    pub fn is_adjacent(&self, b1: BlockId, b2: BlockId) -> bool {
        self.start_addr(b1) + self.size(b1) == self.start_addr(b2)
    }

    pub fn contains(&self, id: BlockId, addr: usize) -> bool {
        let s = self.slot(id);
        addr >= s.start_addr && addr < s.start_addr + s.size
    }

    pub fn can_satisfy(&self, id: BlockId, size: usize) -> bool {
        let s = self.slot(id);
        s.state == BlockState::Free && s.size >= size
    }

    /// Split `b` at offset `k`: valid only when `b` is FREE, `0 < k <
    /// b.size`, and `k` is 8-aligned. Shortens `b` to `k`, creates a new
    /// FREE block `[b.start+k, b.start+b.size)`, and inserts it immediately
    /// after `b`. Returns the new block.
    ///
    /// Preserves address order: the new block's start is strictly greater
    /// than every block up to and including `b`, and strictly less than
    /// whatever followed `b`, so it belongs immediately after `b`.
    pub fn split(&mut self, b: BlockId, k: usize) -> Result<BlockId> {
        let s = self.slot(b);
        if s.state != BlockState::Free || k == 0 || k >= s.size || k % 8 != 0 {
            return Err(AllocError::InvalidArgument);
        }
        let new_start = s.start_addr + k;
        let new_size = s.size - k;
        let old_next = s.next;

        self.slot_mut(b).size = k;
        let new_id = self.create(new_start, new_size, BlockState::Free)?;
        self.slot_mut(new_id).prev = Some(b);
        self.slot_mut(new_id).next = old_next;
        self.slot_mut(b).next = Some(new_id);
        if let Some(n) = old_next {
            self.slot_mut(n).prev = Some(new_id);
        }
        Ok(new_id)
    }

    /// Merge `b2` into `b1`: valid only when both are FREE and
    /// `b1.start + b1.size == b2.start`. Grows `b1.size` by `b2.size`,
    /// unlinks and destroys `b2`. Returns `b1`.
    ///
    /// Preserves address order: removing a block strictly after `b1`
    /// cannot violate the strictly-increasing invariant.
    pub fn merge(&mut self, b1: BlockId, b2: BlockId) -> Result<BlockId> {
        if self.state(b1) != BlockState::Free || self.state(b2) != BlockState::Free {
            return Err(AllocError::InvalidArgument);
        }
        if !self.is_adjacent(b1, b2) {
            return Err(AllocError::InvalidArgument);
        }
        let b2_size = self.size(b2);
        self.slot_mut(b1).size += b2_size;
        self.destroy(b2);
        Ok(b1)
    }

    /// Checks, in a single linear pass, that addresses strictly increase
    /// along `next`, no two adjacent blocks are both FREE, and every slot
    /// is internally well-formed (non-zero size, 8-aligned start, no
    /// overflow of `start + size`).
    pub fn verify(&self) -> Result<()> {
        let mut cursor = self.head;
        let mut prev: Option<BlockId> = None;
        let mut count = 0usize;
        while let Some(id) = cursor {
            let s = self.slot(id);
            if s.size == 0 || s.start_addr % 8 != 0 {
                return Err(AllocError::Corruption);
            }
            if s.start_addr.checked_add(s.size).is_none() {
                return Err(AllocError::Corruption);
            }
            if let Some(p) = prev {
                if self.start_addr(p) >= s.start_addr {
                    return Err(AllocError::Corruption);
                }
                if self.state(p) == BlockState::Free && s.state == BlockState::Free {
                    return Err(AllocError::Corruption);
                }
            }
            prev = Some(id);
            cursor = s.next;
            count += 1;
        }
        if count != self.len {
            return Err(AllocError::Corruption);
        }
        Ok(())
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}
