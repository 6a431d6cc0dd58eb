//! Shared transposition table.
//!
//! Lockless: each slot stores `(key ^ data, data)` in two `AtomicU64`s.
//! A torn read from a concurrent write makes the XOR verification fail
//! and the probe reports a miss, so no locking is needed even under
//! Lazy SMP. Buckets of four slots absorb index collisions; replacement
//! prefers same-key updates, then empty, older and shallower slots.

use std::mem;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::board::search::{MATE, MATE_IN_MAX};
use crate::board::Move;

/// How a stored score relates to the true value of the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Searched with an open window; the score is exact.
    Exact,
    /// Fail high: the true score is at least this value.
    Lower,
    /// Fail low: the true score is at most this value.
    Upper,
}

impl Bound {
    const fn to_bits(self) -> u8 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Bound::Exact,
            1 => Bound::Lower,
            _ => Bound::Upper,
        }
    }
}

/// Unpacked table entry.
#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub depth: u8,
    pub score: i16,
    pub bound: Bound,
    pub mv: Move,
    pub generation: u8,
}

impl TtEntry {
    /// Stored move, absent when the node failed low without one.
    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        if self.mv.is_null() {
            None
        } else {
            Some(self.mv)
        }
    }
}

/// Packed layout, 48 of 64 bits used:
/// move 0-15 | score 16-31 | depth 32-39 | bound 40-41 | generation 42-47
fn pack(depth: u8, score: i16, bound: Bound, mv: Move, generation: u8) -> u64 {
    u64::from(mv.as_u16())
        | (u64::from(score as u16) << 16)
        | (u64::from(depth) << 32)
        | (u64::from(bound.to_bits()) << 40)
        | (u64::from(generation & 0x3F) << 42)
}

fn unpack(data: u64) -> TtEntry {
    TtEntry {
        mv: Move::from_u16((data & 0xFFFF) as u16),
        score: ((data >> 16) & 0xFFFF) as u16 as i16,
        depth: ((data >> 32) & 0xFF) as u8,
        bound: Bound::from_bits(((data >> 40) & 0x3) as u8),
        generation: ((data >> 42) & 0x3F) as u8,
    }
}

#[repr(C)]
struct Slot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    const fn new() -> Self {
        Slot {
            key_xor: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn store(&self, hash: u64, packed: u64) {
        self.data.store(packed, Ordering::Relaxed);
        self.key_xor.store(hash ^ packed, Ordering::Relaxed);
    }

    fn probe(&self, hash: u64) -> Option<u64> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        if data != 0 && key_xor ^ data == hash {
            Some(data)
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        self.data.load(Ordering::Relaxed) == 0
    }

    fn raw(&self) -> u64 {
        self.data.load(Ordering::Relaxed)
    }
}

const BUCKET_SIZE: usize = 4;

#[repr(C)]
struct Bucket {
    slots: [Slot; BUCKET_SIZE],
}

impl Bucket {
    const fn new() -> Self {
        Bucket {
            slots: [Slot::new(), Slot::new(), Slot::new(), Slot::new()],
        }
    }
}

/// Fixed-capacity shared table. Resizing means building a new table,
/// which callers must only do with every search stopped.
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    pub const DEFAULT_MB: usize = 16;

    /// Build a table using roughly `size_mb` megabytes, rounded down
    /// to a power-of-two bucket count.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let bucket_bytes = mem::size_of::<Bucket>();
        let mut num_buckets = (size_mb.max(1) * 1024 * 1024) / bucket_bytes;
        num_buckets = num_buckets.next_power_of_two() / 2;
        if num_buckets == 0 {
            num_buckets = 1024;
        }
        let mut buckets = Vec::with_capacity(num_buckets);
        buckets.resize_with(num_buckets, Bucket::new);
        TranspositionTable {
            buckets,
            mask: num_buckets - 1,
            generation: AtomicU8::new(0),
        }
    }

    #[inline]
    fn bucket(&self, hash: u64) -> &Bucket {
        &self.buckets[(hash as usize) & self.mask]
    }

    /// Advance the generation counter at the start of a new search so
    /// stale entries age out of replacement decisions.
    pub fn new_search(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed) & 0x3F
    }

    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<TtEntry> {
        for slot in &self.bucket(hash).slots {
            if let Some(data) = slot.probe(hash) {
                return Some(unpack(data));
            }
        }
        None
    }

    /// Store a search result, replacing the least useful slot.
    pub fn store(&self, hash: u64, depth: u32, score: i32, bound: Bound, mv: Move) {
        let generation = self.generation();
        let depth = depth.min(255) as u8;
        let score = score.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let packed = pack(depth, score, bound, mv, generation);
        let bucket = self.bucket(hash);

        // Same position: update in place, but keep a deeper entry over
        // a shallow non-exact refresh.
        for slot in &bucket.slots {
            if let Some(data) = slot.probe(hash) {
                let old = unpack(data);
                if bound == Bound::Exact
                    || depth as u32 + 2 >= u32::from(old.depth)
                    || old.generation != generation
                {
                    slot.store(hash, packed);
                }
                return;
            }
        }
        for slot in &bucket.slots {
            if slot.is_empty() {
                slot.store(hash, packed);
                return;
            }
        }

        // All full: replace the slot with the worst depth-age score.
        let mut victim = &bucket.slots[0];
        let mut worst = i32::MAX;
        for slot in &bucket.slots {
            let entry = unpack(slot.raw());
            let age = i32::from(generation.wrapping_sub(entry.generation) & 0x3F);
            let priority = i32::from(entry.depth) * 2 - age * 3;
            if priority < worst {
                worst = priority;
                victim = slot;
            }
        }
        victim.store(hash, packed);
    }

    /// Occupancy in per mille, sampled from a fixed prefix of buckets.
    #[must_use]
    pub fn hashfull_per_mille(&self) -> u32 {
        let sample = self.buckets.len().min(1000);
        let mut used = 0;
        for bucket in self.buckets.iter().take(sample) {
            used += bucket.slots.iter().filter(|s| !s.is_empty()).count();
        }
        ((used * 1000) / (sample * BUCKET_SIZE)) as u32
    }

    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in &bucket.slots {
                slot.key_xor.store(0, Ordering::Relaxed);
                slot.data.store(0, Ordering::Relaxed);
            }
        }
        self.generation.store(0, Ordering::Relaxed);
    }
}

/// Convert a score to its stored form. Mate scores are ply-relative in
/// the search ("mate in N from here") but must be root-relative in the
/// table or the same entry would mean different things at different
/// plies.
#[must_use]
pub fn score_to_tt(score: i32, ply: u32) -> i32 {
    if score >= MATE_IN_MAX {
        score + ply as i32
    } else if score <= -MATE_IN_MAX {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of `score_to_tt` at the probing ply.
#[must_use]
pub fn score_from_tt(score: i32, ply: u32) -> i32 {
    if score >= MATE_IN_MAX {
        score - ply as i32
    } else if score <= -MATE_IN_MAX {
        score + ply as i32
    } else {
        score
    }
}
