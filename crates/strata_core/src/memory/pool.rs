//! # Bounded Pool
//!
//! Recyclable object pool with eager pre-warming and lazy growth up to a
//! hard ceiling.

/// A pool of reusable objects addressed by [`PoolHandle`].
///
/// Objects are never destroyed individually: a released object goes back on
/// the available stack and is handed out again by a later
/// [`Pool::acquire_with`]. Each slot is in exactly one of
/// {available, in use} at any time.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust
/// use strata_core::Pool;
///
/// let mut pool: Pool<Vec<u8>> = Pool::new(1, 2, |_| Vec::with_capacity(16));
///
/// let a = pool.acquire_with(|_| Vec::new()).unwrap();
/// let b = pool.acquire_with(|_| Vec::new()).unwrap();
/// assert!(pool.acquire_with(|_| Vec::new()).is_none()); // ceiling reached
///
/// pool.release(a);
/// assert_eq!(pool.acquire_with(|_| Vec::new()), Some(a));
/// # let _ = b;
/// ```
#[derive(Debug)]
pub struct Pool<T> {
    /// Every object ever created, indexed by handle.
    slots: Vec<Slot<T>>,
    /// Stack of available slot indices (LIFO for cache warmth).
    available: Vec<usize>,
    /// Hard limit on the number of objects.
    ceiling: usize,
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    in_use: bool,
}

/// Handle to an object in a [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    /// Index into the pool.
    index: usize,
}

impl PoolHandle {
    /// Returns the slot index of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<T> Pool<T> {
    /// Creates a new pool, eagerly creating `prewarm` objects.
    ///
    /// `factory` receives the slot index of the object being created.
    /// `prewarm` is clamped to `ceiling`.
    #[must_use]
    pub fn new<F>(prewarm: usize, ceiling: usize, mut factory: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        let prewarm = prewarm.min(ceiling);
        let slots: Vec<Slot<T>> = (0..prewarm)
            .map(|index| Slot {
                value: factory(index),
                in_use: false,
            })
            .collect();

        let mut available = Vec::with_capacity(ceiling);
        available.extend((0..prewarm).rev());

        Self {
            slots,
            available,
            ceiling,
        }
    }

    /// Returns the hard ceiling.
    #[inline]
    #[must_use]
    pub const fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Returns the number of objects created so far.
    #[inline]
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of objects on the available stack.
    #[inline]
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Returns the number of objects currently handed out.
    #[inline]
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.slots.len() - self.available.len()
    }

    /// Acquires an object.
    ///
    /// Pops the available stack first; otherwise creates a new object with
    /// `factory` if the ceiling allows. Returns `None` when exhausted.
    pub fn acquire_with<F>(&mut self, factory: F) -> Option<PoolHandle>
    where
        F: FnOnce(usize) -> T,
    {
        let index = match self.available.pop() {
            Some(index) => index,
            None if self.slots.len() < self.ceiling => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    value: factory(index),
                    in_use: false,
                });
                index
            }
            None => return None,
        };

        self.slots[index].in_use = true;
        Some(PoolHandle { index })
    }

    /// Returns an object to the available stack.
    ///
    /// Returns false if the handle is unknown or already available.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.slots.get_mut(handle.index) {
            Some(slot) if slot.in_use => {
                slot.in_use = false;
                self.available.push(handle.index);
                true
            }
            _ => false,
        }
    }

    /// Returns true if the handle refers to an object currently in use.
    #[inline]
    #[must_use]
    pub fn is_in_use(&self, handle: PoolHandle) -> bool {
        self.slots.get(handle.index).is_some_and(|s| s.in_use)
    }

    /// Gets a reference to a pooled object.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.index).map(|s| &s.value)
    }

    /// Gets a mutable reference to a pooled object.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index).map(|s| &mut s.value)
    }
}
