//! Session-scoped slot arena.
//!
//! Values live in fixed-capacity blocks chained together and are addressed
//! by [Slot] indices rather than addresses, so resizing a value replaces the
//! slot contents without invalidating anyone's handle to it. Nothing is freed
//! individually; dropping the arena releases every block in one pass.

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::atomic::{AtomicU32, Ordering},
};

use tracing::trace;

use crate::{
    errors::{Error, Result},
    handle::Handle,
    stream::Stream,
};

/// Default number of slots per block.
pub const DEFAULT_BLOCK_CAPACITY: usize = 1024;

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

/// Typed index of a value inside an [Arena].
pub struct Slot<T> {
    arena: u32,
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.arena == other.arena && self.index == other.index
    }
}

impl<T> Eq for Slot<T> {}

impl<T> Hash for Slot<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arena.hash(state);
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({}:{})", self.arena, self.index)
    }
}

pub type StreamId = Slot<Stream>;
pub type HandleId = Slot<Handle>;

/// Allocation counters reported on session teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaStats {
    pub blocks: usize,
    pub slots: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl std::ops::Add for ArenaStats {
    type Output = ArenaStats;

    fn add(self, rhs: Self) -> Self::Output {
        ArenaStats {
            blocks: self.blocks + rhs.blocks,
            slots: self.slots + rhs.slots,
            cache_hits: self.cache_hits + rhs.cache_hits,
            cache_misses: self.cache_misses + rhs.cache_misses,
        }
    }
}

struct Block<T> {
    first: usize,
    items: Vec<T>,
}

pub struct Arena<T> {
    id: u32,
    block_capacity: usize,
    blocks: Vec<Block<T>>,
    len: usize,
    /// Most recently allocated or reallocated slot.
    last: Option<usize>,
    hits: u64,
    misses: u64,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_block_capacity(DEFAULT_BLOCK_CAPACITY)
    }

    pub fn with_block_capacity(block_capacity: usize) -> Self {
        let block_capacity = block_capacity.max(1);
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            block_capacity,
            blocks: vec![Block {
                first: 0,
                items: Vec::with_capacity(block_capacity),
            }],
            len: 0,
            last: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn alloc(&mut self, value: T) -> Slot<T> {
        let full = self
            .blocks
            .last()
            .is_none_or(|b| b.items.len() == self.block_capacity);

        if full {
            trace!(
                blocks = self.blocks.len() + 1,
                capacity = self.block_capacity,
                "arena block chain grown"
            );
            self.blocks.push(Block {
                first: self.len,
                items: Vec::with_capacity(self.block_capacity),
            });
        }

        let index = self.len;
        if let Some(block) = self.blocks.last_mut() {
            block.items.push(value);
        }
        self.len += 1;
        self.last = Some(index);

        Slot {
            arena: self.id,
            index: index as u32,
            _marker: PhantomData,
        }
    }

    fn check(&self, slot: Slot<T>) -> Result<usize> {
        if slot.arena != self.id {
            return Err(Error::misuse(format!(
                "{slot:?} belongs to arena {}, not {}",
                slot.arena, self.id
            )));
        }
        if slot.index() >= self.len {
            return Err(Error::misuse(format!("{slot:?} was never allocated")));
        }
        Ok(slot.index())
    }

    pub fn get(&self, slot: Slot<T>) -> Result<&T> {
        let index = self.check(slot)?;
        let block = &self.blocks[index / self.block_capacity];
        Ok(&block.items[index - block.first])
    }

    pub fn get_mut(&mut self, slot: Slot<T>) -> Result<&mut T> {
        let index = self.check(slot)?;
        let block = &mut self.blocks[index / self.block_capacity];
        Ok(&mut block.items[index - block.first])
    }

    /// Rewrites the contents of `slot` in place.
    ///
    /// The last allocated or reallocated slot is found in O(1); any other
    /// slot is located by walking the block chain.
    pub fn realloc(&mut self, slot: Slot<T>, update: impl FnOnce(&mut T)) -> Result<Slot<T>> {
        let index = self.check(slot)?;

        let item = if self.last == Some(index) {
            self.hits += 1;
            let block = &mut self.blocks[index / self.block_capacity];
            &mut block.items[index - block.first]
        } else {
            self.misses += 1;
            let block = self
                .blocks
                .iter_mut()
                .find(|b| index >= b.first && index < b.first + b.items.len())
                .ok_or_else(|| Error::misuse(format!("{slot:?} not found in any block")))?;
            &mut block.items[index - block.first]
        };

        update(item);
        self.last = Some(index);
        Ok(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.blocks.iter().flat_map(|b| b.items.iter())
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            blocks: self.blocks.len(),
            slots: self.len,
            cache_hits: self.hits,
            cache_misses: self.misses,
        }
    }
}

impl Arena<Vec<u8>> {
    pub fn alloc_zeroed(&mut self, size: usize) -> Slot<Vec<u8>> {
        self.alloc(vec![0u8; size])
    }

    pub fn resize(&mut self, slot: Slot<Vec<u8>>, new_size: usize) -> Result<Slot<Vec<u8>>> {
        self.realloc(slot, |buf| buf.resize(new_size, 0))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish()
    }
}
