//! Optional allocation tracing ring buffer.
//!
//! Gated behind the `trace` feature. Grounded on the bucketed-atomic-counter
//! style of a size histogram: a fixed-size array of atomics, no allocation
//! in the hot path, overwritten in ring fashion rather than growing without
//! bound.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Capacity of the trace ring. Chosen to be large enough for a debugging
/// session without costing much static memory.
const RING_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Alloc,
    Free,
}

/// One recorded alloc/free event.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub op: Op,
    pub addr: usize,
    pub size: usize,
    pub sequence: u64,
}

struct Slot {
    op: AtomicUsize,
    addr: AtomicUsize,
    size: AtomicUsize,
    sequence: AtomicUsize,
}

impl Slot {
    const fn new() -> Self {
        Self {
            op: AtomicUsize::new(0),
            addr: AtomicUsize::new(0),
            size: AtomicUsize::new(0),
            sequence: AtomicUsize::new(0),
        }
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const SLOT_INIT: Slot = Slot::new();
static RING: [Slot; RING_CAPACITY] = [SLOT_INIT; RING_CAPACITY];
static NEXT_SEQUENCE: AtomicUsize = AtomicUsize::new(0);

fn op_tag(op: Op) -> usize {
    match op {
        Op::Alloc => 1,
        Op::Free => 2,
    }
}

fn tag_op(tag: usize) -> Option<Op> {
    match tag {
        1 => Some(Op::Alloc),
        2 => Some(Op::Free),
        _ => None,
    }
}

/// Record one event, overwriting the oldest entry once the ring is full.
pub fn record(op: Op, addr: usize, size: usize) {
    let seq = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let slot = &RING[seq % RING_CAPACITY];
    slot.addr.store(addr, Ordering::Relaxed);
    slot.size.store(size, Ordering::Relaxed);
    slot.sequence.store(seq, Ordering::Relaxed);
    slot.op.store(op_tag(op), Ordering::Release);
}

/// Snapshot every populated slot, oldest first. Not globally consistent
/// with a concurrently-running `record`; diagnostic use only.
pub fn snapshot() -> Vec<Event> {
    let written = NEXT_SEQUENCE.load(Ordering::Relaxed);
    let count = written.min(RING_CAPACITY);
    let mut events = Vec::with_capacity(count);
    let start = written.saturating_sub(count);
    for seq in start..written {
        let slot = &RING[seq % RING_CAPACITY];
        let tag = slot.op.load(Ordering::Acquire);
        if let Some(op) = tag_op(tag) {
            events.push(Event {
                op,
                addr: slot.addr.load(Ordering::Relaxed),
                size: slot.size.load(Ordering::Relaxed),
                sequence: slot.sequence.load(Ordering::Relaxed) as u64,
            });
        }
    }
    events
}
