//! # Frame Arena
//!
//! A pre-sized buffer for per-frame output that is released all at once.

use std::ops::{Deref, DerefMut};

/// A typed bump arena for frame-scoped data.
///
/// Storage is reserved once. Pushing is a bump; [`FrameArena::reset`]
/// releases everything without freeing memory, so steady-state frames do
/// not touch the allocator.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust
/// use strata_core::FrameArena;
///
/// let mut arena: FrameArena<u32> = FrameArena::new(64);
/// {
///     let mut frame = arena.begin_frame();
///     frame.push(7);
///     assert_eq!(frame.len(), 1);
/// } // released here
/// assert!(arena.is_empty());
/// ```
#[derive(Debug)]
pub struct FrameArena<T> {
    /// The backing storage.
    items: Vec<T>,
    /// Capacity reserved at construction.
    reserved: usize,
    /// Highest item count seen in a single frame.
    high_water: usize,
}

impl<T> FrameArena<T> {
    /// Creates a new arena with room for `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            reserved: capacity,
            high_water: 0,
        }
    }

    /// Returns the reserved capacity in items.
    #[inline]
    #[must_use]
    pub const fn reserved(&self) -> usize {
        self.reserved
    }

    /// Returns the largest number of items held in one frame so far.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }

    /// Returns the number of items currently held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the arena holds no items.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if the last frame outgrew the reserved capacity.
    #[inline]
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.high_water > self.reserved
    }

    /// Appends an item.
    #[inline]
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.high_water = self.high_water.max(self.items.len());
    }

    /// Appends every item from an iterator.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.items.extend(items);
        self.high_water = self.high_water.max(self.items.len());
    }

    /// Returns the items written this frame.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Resets the arena, dropping all items but keeping the storage.
    #[inline]
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Starts a frame scope. The arena is reset when the guard is dropped.
    pub fn begin_frame(&mut self) -> FrameScope<'_, T> {
        self.reset();
        FrameScope { arena: self }
    }
}

impl<T> Extend<T> for FrameArena<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        FrameArena::extend(self, items);
    }
}

impl<T> Default for FrameArena<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

/// RAII guard over a [`FrameArena`]; resets the arena on drop.
#[derive(Debug)]
pub struct FrameScope<'a, T> {
    arena: &'a mut FrameArena<T>,
}

impl<T> Deref for FrameScope<'_, T> {
    type Target = FrameArena<T>;

    fn deref(&self) -> &Self::Target {
        self.arena
    }
}

impl<T> DerefMut for FrameScope<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.arena
    }
}

impl<T> Drop for FrameScope<'_, T> {
    fn drop(&mut self) {
        self.arena.reset();
    }
}
