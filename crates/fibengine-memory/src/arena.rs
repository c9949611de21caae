//! Bump arena for transform scratch buffers.
//!
//! All slices handed out by one arena are invalidated together on `reset`;
//! there is no individual free. Requests that exceed the current chunk fall
//! back to a fresh heap chunk (bumpalo's chunk chaining), so oversized
//! allocations never fail, they just miss the contiguous fast path.

use bumpalo::Bump;

/// Pointer-increment scratch allocator for FFT temporaries.
pub struct ScratchArena {
    bump: Bump,
}

impl ScratchArena {
    /// Create an empty arena; the first allocation picks the initial chunk.
    #[must_use]
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create an arena with `bytes` of contiguous capacity up front.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Hand out a zero-filled slice of `len` words.
    pub fn alloc_words(&self, len: usize) -> &mut [u64] {
        self.bump.alloc_slice_fill_default(len)
    }

    /// Access the underlying allocator for typed allocations.
    #[must_use]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Rewind the offset to zero, invalidating every slice at once.
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Bytes currently handed out.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new()
    }
}
